//! CN5 Ports
//!
//! Port definitions (traits) for the CN5 execution engine.
//! These define the boundaries between the engine and its infrastructure:
//! time, market data, trade persistence and the risk audit sink.

mod clock;
mod error;
mod market_data;
mod risk_log;
mod trade_store;

pub use clock::Clock;
pub use error::{HistoryError, HistoryResult, StoreError, StoreResult};
pub use market_data::{BarHistory, BarSource};
pub use risk_log::{RiskDecision, RiskLog};
pub use trade_store::TradeStore;
