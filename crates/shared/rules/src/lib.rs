//! CN5 Market Rules
//!
//! Pure encoding of China A-share market structure. Turns a strategy
//! [`Signal`](cn5_core::Signal) into a priced, fee-annotated
//! [`CandidateOrder`](cn5_core::CandidateOrder) or a
//! [`MarketRejection`](cn5_core::MarketRejection).
//!
//! ```text
//! Signal ──► suspended? ──► limit band ──► T+1 / holdings ──► lot size ──► slippage + fees ──► CandidateOrder
//!                │               │                 │                 │                 │
//!                └───────────────┴─────────────────┴─────────────────┴─────────────────┴──► MarketRejection
//! ```
//!
//! Nothing in this crate holds state across calls except [`SessionTracker`],
//! which remembers each symbol's prior session close.

mod engine;
mod fees;
mod limits;
mod session;

pub use engine::{MarketContext, MarketRuleEngine, MarketRules};
pub use fees::{FeeSchedule, round_money};
pub use limits::LimitRates;
pub use session::SessionTracker;
