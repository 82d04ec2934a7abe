use eyre::Result;
use nalgebra::{UnitQuaternion, Vector2};
use serde::{Deserialize, Serialize};

/// Planar position in the map frame (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2 {
    pub x: f64,
    pub y: f64,
}

impl Position2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance in the x/y plane
    pub fn distance_to(&self, other: &Position2) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Single odometry sample consumed by the zone tracker.
///
/// Only the w component of the orientation quaternion is carried. It is
/// not a heading, just the scalar the zone definitions are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub position: Position2,
    pub orientation_w: f64,
    #[serde(default)]
    pub timestamp: u64,
}

impl PoseSample {
    pub fn new(x: f64, y: f64, orientation_w: f64) -> Self {
        Self {
            position: Position2::new(x, y),
            orientation_w,
            timestamp: 0,
        }
    }

    /// Build a sample from a planar pose, using the w component of the
    /// pure-yaw rotation quaternion
    pub fn from_yaw(x: f64, y: f64, yaw: f64) -> Self {
        let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, yaw);
        Self::new(x, y, rotation.w)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation_w.is_finite()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(eyre::eyre!(
                "Non-finite pose sample: x={}, y={}, w={}",
                self.position.x,
                self.position.y,
                self.orientation_w
            ));
        }
        Ok(())
    }
}

/// Pose fields of the rover telemetry message.
/// Remaining telemetry fields (velocities, wheel states) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RoverPose {
    pub position: (f64, f64), // (x, y) in meters
    pub yaw: f64,             // Rotation about z-axis (rad)
    #[serde(default)]
    pub timestamp: u64,
}

impl From<RoverPose> for PoseSample {
    fn from(pose: RoverPose) -> Self {
        let mut sample = PoseSample::from_yaw(pose.position.0, pose.position.1, pose.yaw);
        sample.timestamp = pose.timestamp;
        sample
    }
}
