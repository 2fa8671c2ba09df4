//! CN5 Clock Infrastructure
//!
//! Time sources for the engine:
//!
//! - [`SystemClock`]: wall-clock time for live trading
//! - [`ManualClock`]: time that only moves when told to, for backtests,
//!   restart replays and deterministic tests
//!
//! ## Usage
//!
//! ```ignore
//! use cn5_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(start);
//! clock.advance(Duration::minutes(1));
//! clock.set_time(bar.timestamp);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use cn5_ports::Clock;
