use cn5_core::Timestamp;
use cn5_ports::Clock;
use chrono::Duration;
use std::sync::{Arc, RwLock};

/// Clock that only advances when explicitly moved
///
/// Shared behind an `Arc` so a test or backtest driver can move time while
/// the engine reads it.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    pub fn new(initial_time: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time),
        })
    }

    /// Advance the time by a specified duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current += duration;
    }

    /// Explicitly set the time
    pub fn set_time(&self, time: Timestamp) {
        let mut current = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
