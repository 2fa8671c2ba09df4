//! Engine errors
//!
//! Rejections are not errors; they come back as `BarOutcome::Rejected`.
//! Everything here either halts one instance or stops it from starting.

use crate::config::ConfigError;
use cn5_core::{DataError, InstanceId, Symbol};
use cn5_ports::{HistoryError, StoreError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Data integrity error: {0}")]
    Data(#[from] DataError),

    #[error("Ledger integrity error: {0}")]
    Ledger(#[from] cn5_order_manager::Error),

    #[error("Trade store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bar history error: {0}")]
    History(#[from] HistoryError),

    #[error("Insufficient history for {instance_id}/{symbol}: {found} bars, need {required}")]
    MissingHistory {
        instance_id: InstanceId,
        symbol: Symbol,
        found: usize,
        required: usize,
    },

    #[error("Trade log for {instance_id} is inconsistent: {reason}")]
    InconsistentLedger {
        instance_id: InstanceId,
        reason: String,
    },

    #[error("Instance {instance_id} is halted: {reason}")]
    Halted {
        instance_id: InstanceId,
        reason: String,
    },

    #[error("Instance {0} is stopped")]
    Stopped(InstanceId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
