pub mod consumer_gate;
pub mod marker_publisher;
pub mod tracing;
pub mod zone_tracker;

pub use consumer_gate::*;
pub use marker_publisher::*;
pub use self::tracing::*;
pub use zone_tracker::*;
