use clap::Parser;
use delivery_lib::{
    init_tracing_with_default, DeliveryConfig, MarkerAction, MarkerPublisher, PoseSample,
    TaskPhase, ZoneTracker,
};
use eyre::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "config_check")]
#[command(about = "Check delivery zone configuration files")]
struct Cli {
    #[arg(short, long, default_value = "config/delivery.toml")]
    config: String,

    /// Drive a straight-line run origin -> pickup -> dropoff through the
    /// tracker with this many samples per leg
    #[arg(long, value_name = "STEPS")]
    simulate: Option<usize>,
}

fn main() -> Result<()> {
    let _guard = init_tracing_with_default("warn");
    let cli = Cli::parse();

    info!("Checking configuration file: {}", cli.config);
    let config = check_config(&cli.config)?;

    if let Some(steps) = cli.simulate {
        simulate_run(&config, steps.max(1));
    }

    Ok(())
}

fn check_config(config_path: &str) -> Result<DeliveryConfig> {
    println!("Checking configuration file: {}", config_path);

    let config = match DeliveryConfig::load_from_file(config_path) {
        Ok(config) => {
            println!("✓ Delivery configuration loaded");
            config
        }
        Err(e) => {
            println!("✗ Failed to load delivery configuration: {:#}", e);
            return Err(e);
        }
    };

    if let Err(e) = config.validate() {
        println!("✗ Configuration validation failed: {}", e);
        return Err(e);
    }
    println!("✓ Configuration validation passed");

    println!(
        "  Pickup:  ({:.3}, {:.3}) w={:.3}",
        config.pickup.x, config.pickup.y, config.pickup.orientation_w
    );
    println!(
        "  Dropoff: ({:.3}, {:.3}) w={:.3}",
        config.dropoff.x, config.dropoff.y, config.dropoff.orientation_w
    );
    println!(
        "  Zone separation: {:.3}",
        config.pickup.position().distance_to(&config.dropoff.position())
    );
    println!("  Arrival threshold: {}", config.arrival_threshold);
    match config.orientation_tolerance {
        Some(tolerance) => println!("  Orientation tolerance: {}", tolerance),
        None => println!("  Orientation tolerance: disabled"),
    }
    println!("  Wait for consumer: {}", config.wait_for_consumer);
    println!(
        "  Marker: {}/{} {:?} scale={:?} color={:?} frame='{}'",
        config.marker.namespace,
        config.marker.id,
        config.marker.shape,
        config.marker.scale,
        config.marker.color,
        config.marker.frame_id
    );

    Ok(config)
}

/// Feed evenly spaced samples along origin -> pickup -> dropoff and print
/// every phase change with the marker the publisher would emit for it.
fn simulate_run(config: &DeliveryConfig, steps: usize) {
    let mut tracker = ZoneTracker::from_config(config);
    let mut publisher = MarkerPublisher::from_config(config);

    let legs = [
        ((0.0, 0.0, 1.0), (config.pickup.x, config.pickup.y, config.pickup.orientation_w)),
        (
            (config.pickup.x, config.pickup.y, config.pickup.orientation_w),
            (config.dropoff.x, config.dropoff.y, config.dropoff.orientation_w),
        ),
    ];

    println!("\nSimulated run ({} samples per leg):", steps);
    print_phase(&mut publisher, tracker.phase(), None);

    for ((x0, y0, w0), (x1, y1, w1)) in legs {
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            let sample = PoseSample::new(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, w0 + (w1 - w0) * t);

            let before = tracker.phase();
            let after = tracker.update(&sample);
            if after != before {
                print_phase(&mut publisher, after, Some(&sample));
            }
        }
    }

    if tracker.phase().is_terminal() {
        println!("✓ Run reached the dropoff");
    } else {
        println!("⚠ Run ended in phase '{}'", tracker.phase());
    }
}

fn print_phase(publisher: &mut MarkerPublisher, phase: TaskPhase, sample: Option<&PoseSample>) {
    let marker = match publisher.tick(phase) {
        Some(cmd) => match cmd.action {
            MarkerAction::Show => format!(
                "show at ({:.2}, {:.2})",
                cmd.pose.position.x, cmd.pose.position.y
            ),
            MarkerAction::Hide => "hide".to_string(),
        },
        None => "none".to_string(),
    };

    match sample {
        Some(s) => println!(
            "  ({:>8.3}, {:>8.3})  {:<11} marker: {}",
            s.position.x, s.position.y, phase.label(), marker
        ),
        None => println!("  {:>20}  {:<11} marker: {}", "start", phase.label(), marker),
    }
}
