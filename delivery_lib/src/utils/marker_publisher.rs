use crate::{
    ColorRgba, DeliveryConfig, MarkerAction, MarkerCommand, MarkerHeader, MarkerPose,
    MarkerStyleConfig, Orientation, Point3, Scale3, TaskPhase, ZoneConfig,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherStats {
    pub ticks: u64,
    pub shown: u64,
    pub hidden: u64,
}

/// Decides which marker command, if any, reflects the current phase
#[derive(Debug, Clone)]
pub struct MarkerPublisher {
    style: MarkerStyleConfig,
    pickup: ZoneConfig,
    dropoff: ZoneConfig,
    last_phase: Option<TaskPhase>,
    stats: PublisherStats,
}

impl MarkerPublisher {
    pub fn new(style: MarkerStyleConfig, pickup: ZoneConfig, dropoff: ZoneConfig) -> Self {
        Self {
            style,
            pickup,
            dropoff,
            last_phase: None,
            stats: PublisherStats::default(),
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.marker.clone(), config.pickup, config.dropoff)
    }

    /// Marker command for `phase`, stamped with `stamp` (Unix ms).
    ///
    /// - MovingToPickup: show at the pickup pose
    /// - AtPickup: hide (same marker id)
    /// - MovingToDropoff: nothing
    /// - AtDropoff: show at the dropoff pose, replacing the pickup marker
    pub fn command_for(&self, phase: TaskPhase, stamp: u64) -> Option<MarkerCommand> {
        match phase {
            TaskPhase::MovingToPickup => Some(self.marker_at(&self.pickup, MarkerAction::Show, stamp)),
            TaskPhase::AtPickup => Some(self.marker_at(&self.pickup, MarkerAction::Hide, stamp)),
            TaskPhase::MovingToDropoff => None,
            TaskPhase::AtDropoff => Some(self.marker_at(&self.dropoff, MarkerAction::Show, stamp)),
        }
    }

    /// Run one publish tick. Repeats the same command on every tick while the
    /// phase is unchanged so a late or restarted sink catches up.
    pub fn tick(&mut self, phase: TaskPhase) -> Option<MarkerCommand> {
        self.stats.ticks += 1;

        if self.last_phase != Some(phase) {
            info!("Marker state: {}", phase);
            self.last_phase = Some(phase);
        }

        let stamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let command = self.command_for(phase, stamp);

        match &command {
            Some(cmd) => {
                match cmd.action {
                    MarkerAction::Show => self.stats.shown += 1,
                    MarkerAction::Hide => self.stats.hidden += 1,
                }
                debug!(
                    "{}: {:?} {}/{} at ({:.2}, {:.2})",
                    phase,
                    cmd.action,
                    cmd.namespace,
                    cmd.id,
                    cmd.pose.position.x,
                    cmd.pose.position.y
                );
            }
            None => debug!("{}: no marker", phase),
        }

        command
    }

    pub fn stats(&self) -> PublisherStats {
        self.stats
    }

    fn marker_at(&self, zone: &ZoneConfig, action: MarkerAction, stamp: u64) -> MarkerCommand {
        let [sx, sy, sz] = self.style.scale;
        let [r, g, b, a] = self.style.color;

        MarkerCommand {
            header: MarkerHeader {
                frame_id: self.style.frame_id.clone(),
                stamp,
            },
            namespace: self.style.namespace.clone(),
            id: self.style.id,
            action,
            shape: self.style.shape,
            pose: MarkerPose {
                position: Point3 {
                    x: zone.x,
                    y: zone.y,
                    z: 0.0,
                },
                orientation: Orientation {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                    w: zone.orientation_w,
                },
            },
            scale: Scale3 { x: sx, y: sy, z: sz },
            color: ColorRgba { r, g, b, a },
            lifetime_ms: self.style.lifetime_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MarkerShape, PoseSample, ZoneTracker};

    fn reference_publisher() -> MarkerPublisher {
        MarkerPublisher::from_config(&DeliveryConfig::default())
    }

    #[test]
    fn test_moving_to_pickup_shows_pickup_marker() {
        let mut publisher = reference_publisher();
        let cmd = publisher.tick(TaskPhase::MovingToPickup).unwrap();

        assert_eq!(cmd.action, MarkerAction::Show);
        assert_eq!(cmd.shape, MarkerShape::Cube);
        assert_eq!(cmd.header.frame_id, "map");
        assert_eq!(cmd.namespace, "basic_shapes");
        assert_eq!(cmd.id, 0);
        assert_eq!(cmd.pose.position, Point3 { x: 1.0, y: 0.0, z: 0.0 });
        assert_eq!(cmd.pose.orientation.w, 1.0);
        assert_eq!(cmd.scale, Scale3 { x: 0.25, y: 0.25, z: 0.25 });
        assert_eq!(cmd.color, ColorRgba { r: 0.0, g: 1.0, b: 0.0, a: 1.0 });
        assert!(cmd.lifetime_ms.is_none());
    }

    #[test]
    fn test_at_pickup_hides_same_marker() {
        let publisher = reference_publisher();
        let shown = publisher.command_for(TaskPhase::MovingToPickup, 1).unwrap();
        let hidden = publisher.command_for(TaskPhase::AtPickup, 2).unwrap();

        assert_eq!(hidden.action, MarkerAction::Hide);
        assert_eq!(hidden.namespace, shown.namespace);
        assert_eq!(hidden.id, shown.id);
    }

    #[test]
    fn test_moving_to_dropoff_emits_nothing() {
        let mut publisher = reference_publisher();
        assert!(publisher.tick(TaskPhase::MovingToDropoff).is_none());
        assert_eq!(publisher.stats().ticks, 1);
        assert_eq!(publisher.stats().shown + publisher.stats().hidden, 0);
    }

    #[test]
    fn test_at_dropoff_replaces_marker_at_dropoff_pose() {
        let publisher = reference_publisher();
        let pickup = publisher.command_for(TaskPhase::MovingToPickup, 1).unwrap();
        let dropoff = publisher.command_for(TaskPhase::AtDropoff, 2).unwrap();

        assert_eq!(dropoff.action, MarkerAction::Show);
        assert_eq!(dropoff.pose.position, Point3 { x: -10.0, y: 0.0, z: 0.0 });
        assert_eq!(dropoff.pose.orientation.w, 1.2);
        assert_eq!((dropoff.namespace.as_str(), dropoff.id), (pickup.namespace.as_str(), pickup.id));
        assert_eq!(dropoff.shape, pickup.shape);
        assert_eq!(dropoff.scale, pickup.scale);
        assert_eq!(dropoff.color, pickup.color);
    }

    #[test]
    fn test_repeated_ticks_emit_identical_state() {
        let mut publisher = reference_publisher();
        for phase in [TaskPhase::MovingToPickup, TaskPhase::AtPickup, TaskPhase::AtDropoff] {
            let first = publisher.tick(phase).unwrap();
            let second = publisher.tick(phase).unwrap();
            assert!(first.same_state_as(&second), "{:?}", phase);
        }
        assert_eq!(publisher.stats().shown, 4);
        assert_eq!(publisher.stats().hidden, 2);
    }

    #[test]
    fn test_reach_dropoff_then_publish() {
        let config = DeliveryConfig::default();
        let mut tracker = ZoneTracker::from_config(&config);
        let mut publisher = MarkerPublisher::from_config(&config);

        tracker.update(&PoseSample::new(1.0, 0.0, 1.0));
        tracker.update(&PoseSample::new(5.0, 5.0, 0.0));
        tracker.update(&PoseSample::new(-10.0, 0.0, 1.2));
        assert_eq!(tracker.phase(), TaskPhase::AtDropoff);

        let cmd = publisher.tick(tracker.phase()).unwrap();
        assert_eq!(cmd.action, MarkerAction::Show);
        assert_eq!(cmd.pose.position.x, -10.0);
        assert_eq!(cmd.pose.position.y, 0.0);
    }

    #[test]
    fn test_far_sample_keeps_pickup_marker() {
        let config = DeliveryConfig::default();
        let mut tracker = ZoneTracker::from_config(&config);
        let mut publisher = MarkerPublisher::from_config(&config);

        tracker.update(&PoseSample::new(100.0, 100.0, 0.0));
        let cmd = publisher.tick(tracker.phase()).unwrap();
        assert_eq!(cmd.action, MarkerAction::Show);
        assert_eq!(cmd.pose.position, Point3 { x: 1.0, y: 0.0, z: 0.0 });
    }

    #[test]
    fn test_custom_style_is_applied() {
        let mut config = DeliveryConfig::default();
        config.marker.shape = MarkerShape::Cylinder;
        config.marker.id = 3;
        config.marker.lifetime_ms = Some(1500);

        let cmd = MarkerPublisher::from_config(&config)
            .command_for(TaskPhase::MovingToPickup, 42)
            .unwrap();
        assert_eq!(cmd.shape, MarkerShape::Cylinder);
        assert_eq!(cmd.id, 3);
        assert_eq!(cmd.lifetime_ms, Some(1500));
        assert_eq!(cmd.header.stamp, 42);
    }

    #[test]
    fn test_command_wire_format() {
        let cmd = reference_publisher()
            .command_for(TaskPhase::AtPickup, 1000)
            .unwrap();
        let value = serde_json::to_value(&cmd).unwrap();

        assert_eq!(value["action"], "hide");
        assert_eq!(value["shape"], "cube");
        assert_eq!(value["namespace"], "basic_shapes");
        assert_eq!(value["header"]["stamp"], 1000);
        assert!(value.get("lifetime_ms").is_none());
    }
}
