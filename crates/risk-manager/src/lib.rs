//! CN5 Risk Manager
//!
//! Owns the state the risk rules are evaluated against and serialises
//! access to it:
//!
//! - **Account Aggregate**: latest [`AccountState`](cn5_core::AccountState)
//!   of every instance, behind one async mutex
//! - **Risk Config Handle**: the live [`RiskConfig`](cn5_core::RiskConfig);
//!   updates land between gating passes, never during one
//! - **Risk Gate**: snapshot exposure, run the validator, record the verdict
//! - **Risk Log Sinks**: audit trail of every verdict
//!
//! ## Architecture
//!
//! ```text
//!  Instance A ──┐                     ┌──────────────────────────────┐
//!               │  lock()             │        Account Aggregate     │
//!  Instance B ──┼────────────────────►│  A: AccountState             │
//!               │                     │  B: AccountState  ...        │
//!  Instance C ──┘                     └──────────────┬───────────────┘
//!                                                    │ exposure
//!                     RiskConfigHandle ──snapshot──► RiskValidator ──► RiskVerdict ──► RiskLog
//! ```
//!
//! The aggregate lock is held across "validate → persist → apply → publish"
//! by the orchestrator, so two instances never gate against the same stale
//! aggregate.

pub mod aggregate;
pub mod config;
pub mod gate;
pub mod sink;

// Re-export main types
pub use aggregate::{AccountAggregate, SharedAggregate};
pub use config::RiskConfigHandle;
pub use gate::RiskGate;
pub use sink::{LogRiskSink, MemoryRiskLog};
