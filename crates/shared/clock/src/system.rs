use cn5_core::{Timestamp, TradingDay, trading_day};
use cn5_ports::Clock;
use chrono::Utc;

/// Wall-clock time, used by the live runner and by rehydration on startup
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// Exchange trading day of the current wall-clock instant
    pub fn today(&self) -> TradingDay {
        trading_day(self.now())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
