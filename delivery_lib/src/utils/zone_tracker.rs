//! Zone tracker: turns the odometry stream into a task phase.

use crate::{DeliveryConfig, PoseSample, TaskPhase, ZoneConfig};
use tracing::{debug, info, warn};

/// Distances from one sample to both zones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneReading {
    pub d_pickup: f64,
    pub d_dropoff: f64,
    pub dw_pickup: f64,  // |w - pickup_w|
    pub dw_dropoff: f64, // |w - dropoff_w|
}

impl ZoneReading {
    pub fn measure(sample: &PoseSample, pickup: &ZoneConfig, dropoff: &ZoneConfig) -> Self {
        Self {
            d_pickup: sample.position.distance_to(&pickup.position()),
            d_dropoff: sample.position.distance_to(&dropoff.position()),
            dw_pickup: (sample.orientation_w - pickup.orientation_w).abs(),
            dw_dropoff: (sample.orientation_w - dropoff.orientation_w).abs(),
        }
    }
}

/// Phase transition table.
///
/// Arrival is `distance < threshold`; a sample exactly at the threshold has
/// not arrived. The pickup distance governs the first two phases, the
/// dropoff distance the last two.
pub fn next_phase(phase: TaskPhase, d_pickup: f64, d_dropoff: f64, threshold: f64) -> TaskPhase {
    match phase {
        TaskPhase::MovingToPickup if d_pickup < threshold => TaskPhase::AtPickup,
        TaskPhase::MovingToPickup => TaskPhase::MovingToPickup,
        TaskPhase::AtPickup if d_pickup >= threshold => TaskPhase::MovingToDropoff,
        TaskPhase::AtPickup => TaskPhase::AtPickup,
        TaskPhase::MovingToDropoff if d_dropoff < threshold => TaskPhase::AtDropoff,
        TaskPhase::MovingToDropoff => TaskPhase::MovingToDropoff,
        TaskPhase::AtDropoff => TaskPhase::AtDropoff,
    }
}

/// When a sample counts as "arrived"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalPolicy {
    pub threshold: f64,
    pub orientation_tolerance: Option<f64>,
}

impl ArrivalPolicy {
    pub fn position_only(threshold: f64) -> Self {
        Self {
            threshold,
            orientation_tolerance: None,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            threshold: config.arrival_threshold,
            orientation_tolerance: config.orientation_tolerance,
        }
    }

    pub fn next_phase(&self, phase: TaskPhase, reading: &ZoneReading) -> TaskPhase {
        let tolerance = match self.orientation_tolerance {
            None => return next_phase(phase, reading.d_pickup, reading.d_dropoff, self.threshold),
            Some(tolerance) => tolerance,
        };

        // Heading-aware arrival. Departure from pickup stays position-only.
        match phase {
            TaskPhase::MovingToPickup
                if reading.d_pickup < self.threshold && reading.dw_pickup < tolerance =>
            {
                TaskPhase::AtPickup
            }
            TaskPhase::AtPickup if reading.d_pickup >= self.threshold => TaskPhase::MovingToDropoff,
            TaskPhase::MovingToDropoff
                if reading.d_dropoff < self.threshold && reading.dw_dropoff < tolerance =>
            {
                TaskPhase::AtDropoff
            }
            unchanged => unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub accepted_samples: u64,
    pub rejected_samples: u64,
    pub transitions: u64,
}

/// Owns the current task phase and advances it on each pose sample
#[derive(Debug, Clone)]
pub struct ZoneTracker {
    pickup: ZoneConfig,
    dropoff: ZoneConfig,
    policy: ArrivalPolicy,
    phase: TaskPhase,
    last_reading: Option<ZoneReading>,
    stats: TrackerStats,
}

impl ZoneTracker {
    pub fn new(pickup: ZoneConfig, dropoff: ZoneConfig, policy: ArrivalPolicy) -> Self {
        Self {
            pickup,
            dropoff,
            policy,
            phase: TaskPhase::MovingToPickup,
            last_reading: None,
            stats: TrackerStats::default(),
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.pickup, config.dropoff, ArrivalPolicy::from_config(config))
    }

    /// Consume one sample and return the (possibly new) phase.
    /// Non-finite samples are dropped and leave the phase untouched.
    pub fn update(&mut self, sample: &PoseSample) -> TaskPhase {
        if let Err(e) = sample.validate() {
            self.stats.rejected_samples += 1;
            warn!("Skipping pose sample: {}", e);
            return self.phase;
        }
        self.stats.accepted_samples += 1;

        let reading = ZoneReading::measure(sample, &self.pickup, &self.dropoff);
        let next = self.policy.next_phase(self.phase, &reading);

        debug!(
            "Pose ({:.2}, {:.2}) w={:.2}: d_pickup={:.3}, d_dropoff={:.3}",
            sample.position.x, sample.position.y, sample.orientation_w, reading.d_pickup, reading.d_dropoff
        );

        if next != self.phase {
            self.stats.transitions += 1;
            info!(
                "Phase {} -> {} (d_pickup={:.3}, d_dropoff={:.3})",
                self.phase, next, reading.d_pickup, reading.d_dropoff
            );
            self.phase = next;
        }

        self.last_reading = Some(reading);
        self.phase
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn last_reading(&self) -> Option<&ZoneReading> {
        self.last_reading.as_ref()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn pickup(&self) -> &ZoneConfig {
        &self.pickup
    }

    pub fn dropoff(&self) -> &ZoneConfig {
        &self.dropoff
    }
}
