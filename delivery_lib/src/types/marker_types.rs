use serde::{Deserialize, Serialize};

/// What the sink should do with the marker identified by (namespace, id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Arrow,
    #[default]
    Cube,
    Sphere,
    Cylinder,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPose {
    pub position: Point3,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerHeader {
    pub frame_id: String,
    pub stamp: u64, // Unix milliseconds
}

/// Full marker state sent to the visualization sink.
///
/// Every command is a complete "set this marker" instruction. The sink
/// replaces whatever it holds under the same (namespace, id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerCommand {
    pub header: MarkerHeader,
    pub namespace: String,
    pub id: i32,
    pub action: MarkerAction,
    pub shape: MarkerShape,
    pub pose: MarkerPose,
    pub scale: Scale3,
    pub color: ColorRgba,
    /// None keeps the marker until it is replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_ms: Option<u64>,
}

impl MarkerCommand {
    /// Same marker state, ignoring the header stamp
    pub fn same_state_as(&self, other: &MarkerCommand) -> bool {
        self.header.frame_id == other.header.frame_id
            && self.namespace == other.namespace
            && self.id == other.id
            && self.action == other.action
            && self.shape == other.shape
            && self.pose == other.pose
            && self.scale == other.scale
            && self.color == other.color
            && self.lifetime_ms == other.lifetime_ms
    }
}

/// Consumer count reported by the visualization side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStatus {
    pub subscribers: usize,
}
