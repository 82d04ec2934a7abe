use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of the agent through the pickup/dropoff task.
///
/// Phases only ever move forward, in declaration order. `AtDropoff` is
/// absorbing for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    #[default]
    MovingToPickup,
    AtPickup,
    MovingToDropoff,
    AtDropoff,
}

impl TaskPhase {
    /// Position in the forward progression (0..=3)
    pub fn index(&self) -> u8 {
        match self {
            TaskPhase::MovingToPickup => 0,
            TaskPhase::AtPickup => 1,
            TaskPhase::MovingToDropoff => 2,
            TaskPhase::AtDropoff => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::AtDropoff)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPhase::MovingToPickup => "to pickup",
            TaskPhase::AtPickup => "at pickup",
            TaskPhase::MovingToDropoff => "to dropoff",
            TaskPhase::AtDropoff => "at dropoff",
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
