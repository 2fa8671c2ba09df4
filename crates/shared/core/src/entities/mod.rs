mod account;
mod bar;
mod board;
mod order;
mod position;
mod rejection;
mod risk;
mod side;
mod signal;
mod trade;

pub use account::AccountState;
pub use bar::Bar;
pub use board::Board;
pub use order::{CandidateOrder, PriceBand};
pub use position::Position;
pub use rejection::{MarketRejection, Rejection};
pub use risk::{RiskConfig, RiskRule, RiskVerdict, RuleBreach};
pub use side::Side;
pub use signal::{OrderSize, Signal, SignalAction};
pub use trade::{AccountTag, Trade, TradeId};
