//! CN5 Position Ledger
//!
//! Authoritative per-instance positions, cash and PnL, derived from the
//! append-only trade log:
//! - **Trade Fold**: `apply_trade` is the single state transition, used
//!   going forward and when replaying the log on restart
//! - **Session Roll**: first bar of a new trading day clears T+1 locks and
//!   resets the daily PnL baseline
//! - **Mark to Market**: positions are marked at each bar's close
//!
//! ## Architecture
//!
//! ```text
//!                ┌───────────────────────────── PositionLedger ───────────────────────────┐
//! Bar ─────────► │ begin_bar:  roll session ─► clear stale locks ─► mark close             │
//!                │                                                                        │
//! Candidate ───► │ build_trade (pure) ─► Trade ─┐                                         │
//!                │                              │  persisted by the caller first          │
//! Trade log ───► │ apply_trade ◄────────────────┘  cash / qty / avg cost / locks / PnL     │
//!                └────────────────────────────────────┬───────────────────────────────────┘
//!                                                     ▼
//!                                               AccountState
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cn5_order_manager::PositionLedger;
//!
//! let mut ledger = PositionLedger::fold("ma-1", dec!(100000), &trades)?;
//! ledger.begin_bar(&bar);
//! let trade = ledger.build_trade(&order, AccountTag::Live)?;
//! store.append(&trade).await?;
//! ledger.apply_trade(&trade)?;
//! ```

pub mod error;
pub mod ledger;
pub mod position;

// Re-export main types
pub use error::{Error, Result};
pub use ledger::PositionLedger;
pub use position::PositionFold;
