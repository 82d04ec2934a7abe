pub mod config;
pub mod marker_types;
pub mod pose_types;
pub mod task_types;

pub use config::*;
pub use marker_types::*;
pub use pose_types::*;
pub use task_types::*;
