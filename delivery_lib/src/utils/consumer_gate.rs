//! Holds marker emission back until a visualization consumer is attached.
//!
//! The gate never sleeps. The node polls it on every timer tick, so a stop
//! event ends the wait as soon as it arrives.

use std::time::{Duration, Instant};
use tracing::info;

const INITIAL_WARNING_BACKOFF: Duration = Duration::from_secs(1);
const MAX_WARNING_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Open,
    /// Still waiting; `warn` is set when the caller should log a warning
    Waiting { warn: bool },
}

#[derive(Debug, Clone)]
pub struct ConsumerGate {
    open: bool,
    subscribers: usize,
    backoff: Duration,
    next_warning: Option<Instant>,
    warnings: u32,
}

impl ConsumerGate {
    /// `wait_for_consumer = false` gives a gate that starts open
    pub fn new(wait_for_consumer: bool) -> Self {
        Self {
            open: !wait_for_consumer,
            subscribers: 0,
            backoff: INITIAL_WARNING_BACKOFF,
            next_warning: None,
            warnings: 0,
        }
    }

    /// Record the consumer count reported by the sink.
    /// Returns true when this report opened the gate.
    pub fn report_subscribers(&mut self, subscribers: usize) -> bool {
        self.subscribers = subscribers;
        if self.open || subscribers == 0 {
            return false;
        }

        // Stays open for the rest of the run
        self.open = true;
        info!("Marker consumer attached ({} subscriber(s))", subscribers);
        true
    }

    pub fn poll(&mut self, now: Instant) -> GateStatus {
        if self.open {
            return GateStatus::Open;
        }

        let due = match self.next_warning {
            None => true,
            Some(at) => now >= at,
        };
        if due {
            self.next_warning = Some(now + self.backoff);
            self.backoff = (self.backoff * 2).min(MAX_WARNING_BACKOFF);
            self.warnings += 1;
        }

        GateStatus::Waiting { warn: due }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn subscribers(&self) -> usize {
        self.subscribers
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_gate_starts_open() {
        let mut gate = ConsumerGate::new(false);
        assert!(gate.is_open());
        assert_eq!(gate.poll(Instant::now()), GateStatus::Open);
    }

    #[test]
    fn test_gate_opens_on_first_subscriber() {
        let mut gate = ConsumerGate::new(true);
        let now = Instant::now();

        assert!(!gate.report_subscribers(0));
        assert!(matches!(gate.poll(now), GateStatus::Waiting { .. }));

        assert!(gate.report_subscribers(2));
        assert_eq!(gate.poll(now), GateStatus::Open);
        assert_eq!(gate.subscribers(), 2);

        // Already open: later reports do not re-open or close it
        assert!(!gate.report_subscribers(1));
        assert!(!gate.report_subscribers(0));
        assert_eq!(gate.poll(now), GateStatus::Open);
    }

    #[test]
    fn test_warnings_back_off() {
        let mut gate = ConsumerGate::new(true);
        let start = Instant::now();
        let at = |secs: u64| start + Duration::from_secs(secs);

        let warned: Vec<u64> = (0..=20)
            .filter(|&s| gate.poll(at(s)) == GateStatus::Waiting { warn: true })
            .collect();

        // First warning immediately, then after 1, 2, 4, 8 seconds
        assert_eq!(warned, vec![0, 1, 3, 7, 15]);
        assert_eq!(gate.warnings(), 5);
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut gate = ConsumerGate::new(true);
        let start = Instant::now();

        let mut last_warning = 0;
        let mut largest_gap = 0;
        for s in 0..600 {
            if gate.poll(start + Duration::from_secs(s)) == (GateStatus::Waiting { warn: true }) {
                largest_gap = largest_gap.max(s - last_warning);
                last_warning = s;
            }
        }

        assert_eq!(largest_gap, MAX_WARNING_BACKOFF.as_secs());
    }
}
