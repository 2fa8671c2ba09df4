//! CN5 Risk Rules
//!
//! Stateless pre-trade validation. Every candidate order is checked against
//! seven rules in a fixed order:
//!
//! ```text
//! 1 TOTAL_STOP_LOSS ─► 2 BLACKLISTED ─► 3 DAILY_LOSS_LIMIT ─► 4 STRATEGY_CAPITAL_EXCEEDED
//!        ─► 5 SINGLE_TRADE_TOO_LARGE ─► 6 TRADE_FREQUENCY_EXCEEDED ─► 7 PRICE_LIMIT
//! ```
//!
//! A breach of any rule except the daily loss limit stops evaluation. All
//! rules feed the 0-100 risk score whether or not they were evaluated.
//!
//! State (PnL, allocation, trade counts) is owned by the caller and passed in
//! as a [`RiskExposure`] snapshot.

mod score;
mod validator;

pub use score::{RiskScore, rule_weight};
pub use validator::{RiskExposure, RiskValidator};
