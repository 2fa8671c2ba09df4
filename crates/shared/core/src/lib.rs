//! CN5 Core Domain
//!
//! Pure domain types for the A-share strategy execution engine: bars,
//! signals, candidate orders, trades, positions, account snapshots and the
//! risk vocabulary shared by every crate.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod session;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    AccountState,
    AccountTag,
    // Market data
    Bar,
    Board,
    // Order flow
    CandidateOrder,
    MarketRejection,
    OrderSize,
    Position,
    PriceBand,
    Rejection,
    // Risk vocabulary
    RiskConfig,
    RiskRule,
    RiskVerdict,
    RuleBreach,
    Side,
    Signal,
    SignalAction,
    Trade,
    TradeId,
};
pub use error::{DataError, DataResult};
pub use session::{day_start, trading_day};
pub use values::{InstanceId, Money, Price, Quantity, Symbol, Timestamp, TradingDay};
