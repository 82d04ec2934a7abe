use dora_node_api::arrow::array::Array;
use dora_node_api::{arrow::array::BinaryArray, dora_core::config::DataId, DoraNode, Event};
use delivery_lib::{
    init_tracing, ConsumerGate, DeliveryConfig, GateStatus, MarkerCommand, MarkerPublisher,
    PoseSample, RoverPose, SinkStatus, TaskPhase, ZoneTracker,
};
use eyre::{Result, WrapErr};
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tracker, publisher and consumer gate driven by the dora event loop
struct MarkerNode {
    tracker: ZoneTracker,
    publisher: MarkerPublisher,
    gate: ConsumerGate,
}

impl MarkerNode {
    fn new(config: &DeliveryConfig) -> Self {
        Self {
            tracker: ZoneTracker::from_config(config),
            publisher: MarkerPublisher::from_config(config),
            gate: ConsumerGate::new(config.wait_for_consumer),
        }
    }

    /// Pose samples update the phase even while emission is held back
    fn handle_pose(&mut self, sample: &PoseSample) -> TaskPhase {
        self.tracker.update(sample)
    }

    fn handle_sink_status(&mut self, status: SinkStatus) {
        debug!("Marker sink reports {} subscriber(s)", status.subscribers);
        self.gate.report_subscribers(status.subscribers);
    }

    fn handle_tick(&mut self, now: Instant) -> Option<MarkerCommand> {
        match self.gate.poll(now) {
            GateStatus::Open => self.publisher.tick(self.tracker.phase()),
            GateStatus::Waiting { warn } => {
                if warn {
                    warn!("Waiting for a subscriber to the marker output before publishing");
                }
                None
            }
        }
    }

    fn log_summary(&self) {
        let tracker_stats = self.tracker.stats();
        let publisher_stats = self.publisher.stats();

        info!("Final statistics:");
        info!("   Phase: {}", self.tracker.phase());
        info!(
            "   Pose samples: {} accepted, {} rejected",
            tracker_stats.accepted_samples, tracker_stats.rejected_samples
        );
        info!("   Phase transitions: {}", tracker_stats.transitions);
        info!(
            "   Markers: {} shown, {} hidden over {} ticks",
            publisher_stats.shown, publisher_stats.hidden, publisher_stats.ticks
        );
        if !self.gate.is_open() {
            info!("   No marker consumer attached, nothing was published");
        }
    }
}

/// Decode the first element of a binary array as JSON.
/// Returns None for empty arrays.
fn decode_json<T: DeserializeOwned>(array: &BinaryArray) -> Result<Option<T>> {
    if array.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_slice(array.value(0))?;
    Ok(Some(value))
}

fn main() -> Result<()> {
    let _guard = init_tracing();

    info!("Starting add_markers node");

    let config = DeliveryConfig::from_env().wrap_err("Refusing to start with invalid delivery config")?;

    info!("Delivery configuration:");
    info!(
        "  Pickup: ({:.2}, {:.2}) w={:.2}",
        config.pickup.x, config.pickup.y, config.pickup.orientation_w
    );
    info!(
        "  Dropoff: ({:.2}, {:.2}) w={:.2}",
        config.dropoff.x, config.dropoff.y, config.dropoff.orientation_w
    );
    info!("  Arrival threshold: {}", config.arrival_threshold);
    match config.orientation_tolerance {
        Some(tolerance) => info!("  Orientation tolerance: {}", tolerance),
        None => info!("  Orientation tolerance: disabled (position only)"),
    }
    info!(
        "  Marker: {}/{} {:?} in frame '{}'",
        config.marker.namespace, config.marker.id, config.marker.shape, config.marker.frame_id
    );

    let mut marker_node = MarkerNode::new(&config);
    let (mut node, mut events) = DoraNode::init_from_env()?;
    let marker_output = DataId::from("visualization_marker".to_owned());

    while let Some(event) = events.recv() {
        match event {
            Event::Input { id, data, metadata: _ } => match id.as_str() {
                "tick" => {
                    if let Some(command) = marker_node.handle_tick(Instant::now()) {
                        send_marker(&mut node, &marker_output, &command);
                    }
                }
                input => {
                    let Some(array) = data.as_any().downcast_ref::<BinaryArray>() else {
                        warn!("Input {} is not a binary array, ignoring", input);
                        continue;
                    };

                    match input {
                        "odom" => match decode_json::<PoseSample>(array) {
                            Ok(Some(sample)) => {
                                marker_node.handle_pose(&sample);
                            }
                            Ok(None) => {}
                            Err(e) => warn!("Failed to deserialize PoseSample: {}", e),
                        },
                        "rover_telemetry" => match decode_json::<RoverPose>(array) {
                            Ok(Some(pose)) => {
                                marker_node.handle_pose(&PoseSample::from(pose));
                            }
                            Ok(None) => {}
                            Err(e) => warn!("Failed to deserialize rover telemetry: {}", e),
                        },
                        "marker_subscribers" => match decode_json::<SinkStatus>(array) {
                            Ok(Some(status)) => marker_node.handle_sink_status(status),
                            Ok(None) => {}
                            Err(e) => warn!("Failed to deserialize SinkStatus: {}", e),
                        },
                        other => {
                            warn!("Unexpected input: {}", other);
                        }
                    }
                }
            },
            Event::InputClosed { id } => {
                info!("Input {} closed", id);
            }
            Event::Stop(_) => {
                info!("Received stop event");
                break;
            }
            other => {
                debug!("Other event type: {:?}", other);
            }
        }
    }

    marker_node.log_summary();
    info!("add_markers node finished");
    Ok(())
}

fn send_marker(node: &mut DoraNode, output: &DataId, command: &MarkerCommand) {
    let serialized = match serde_json::to_vec(command) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to serialize marker command: {}", e);
            return;
        }
    };

    let arrow_data = BinaryArray::from_vec(vec![serialized.as_slice()]);
    if let Err(e) = node.send_output(output.clone(), Default::default(), arrow_data) {
        warn!("Failed to send marker command: {}", e);
    }
}
