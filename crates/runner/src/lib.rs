//! Execution engine
//!
//! Wires the strategy adapter, market rules, risk gate and position ledger
//! into per-instance orchestrators, and runs them against historical or live
//! bars.
//!
//! ```text
//!              ┌────────────────┐
//!   Bar ──────►│  Orchestrator  │ (one per instance)
//!              └───────┬────────┘
//!                      │ Signal
//!              ┌───────▼────────┐
//!              │  Market rules  │──► MarketRejection
//!              └───────┬────────┘
//!                      │ CandidateOrder
//!              ┌───────▼────────┐     ┌──────────────────┐
//!              │   Risk gate    │◄───►│ AccountAggregate │ (shared, locked)
//!              └───────┬────────┘     └────────▲─────────┘
//!                      │ pass                  │ AccountState
//!              ┌───────▼────────┐     ┌────────┴─────────┐
//!              │  Trade store   │────►│ Position ledger  │
//!              └────────────────┘     └──────────────────┘
//! ```
//!
//! On restart the [`Rehydrator`] rebuilds each orchestrator from the trade
//! log and bar history before it accepts new bars.

pub mod backtest;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod live;
pub mod metrics;
pub mod orchestrator;
pub mod rehydrator;
pub mod sources;
pub mod store;

pub use backtest::{BacktestJob, BacktestReport, run_backtest, run_backtests};
pub use bootstrap::EngineBootstrap;
pub use config::{ConfigError, EngineConfig, InstanceConfig, RehydrationConfig, TradingMode};
pub use error::{EngineError, Result};
pub use live::{InstanceReport, LiveRunner};
pub use metrics::PerformanceMetrics;
pub use orchestrator::{BarOutcome, InstanceSettings, InstanceState, InstanceStats, Orchestrator};
pub use rehydrator::Rehydrator;
pub use sources::{ChannelBarSource, HistoricalBars, InMemoryBarHistory};
pub use store::{InMemoryTradeStore, JsonlTradeStore};
