//! CN5 Strategy Framework
//!
//! Provides the infrastructure for bar-driven strategies:
//! - Strategy trait: one bar in, one signal out
//! - Rolling indicators declared up front and fed by the adapter
//! - Execution adapter shared by backtest, live and restart replay
//! - Built-in moving-average crossover and mean reversion strategies
//!
//! ## Architecture
//!
//! ```text
//!  Bar source ─────► StrategyAdapter ──────────────────────────┐
//!  (history / live)        │                                   │
//!                          ▼                                   │
//!                   IndicatorSet.update(adjusted close)        │
//!                          │ IndicatorView + Position          │
//!                          ▼                                   │
//!                    ┌──────────┐                              │
//!                    │ Strategy │ ── Signal ──► orchestrator   │
//!                    └──────────┘      (dropped on replay) ◄───┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cn5_strategy::{MovingAverageCross, MovingAverageCrossConfig, StrategyAdapter};
//!
//! let strategy = MovingAverageCross::new(MovingAverageCrossConfig::default());
//! let mut adapter = StrategyAdapter::new("ma-1", Box::new(strategy));
//! let signal = adapter.on_bar(&bar, position);
//! ```

pub mod adapter;
pub mod indicators;
pub mod ma_cross;
pub mod mean_reversion;
pub mod spec;
pub mod strategy;

// Re-export main types
pub use adapter::StrategyAdapter;
pub use indicators::{IndicatorKind, IndicatorRegistry, IndicatorSet, IndicatorView};
pub use ma_cross::{MovingAverageCross, MovingAverageCrossConfig};
pub use mean_reversion::{MeanReversion, MeanReversionConfig};
pub use spec::StrategySpec;
pub use strategy::{BarContext, Strategy};
