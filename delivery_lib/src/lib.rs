//! # Delivery Library
//!
//! Shared types and utilities for the pickup/dropoff marker nodes.
//! The zone tracker turns odometry into a task phase, and the marker
//! publisher turns that phase into visualization marker commands.

pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use types::*;
pub use utils::*;
