use cn5_core::{InstanceId, Symbol, TradeId};
use thiserror::Error;

/// Trade persistence failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Trade store I/O error: {0}")]
    Io(String),

    #[error("Corrupt trade record: {0}")]
    Corrupt(String),

    #[error("Duplicate trade {trade_id} for {instance_id}")]
    Duplicate {
        instance_id: InstanceId,
        trade_id: TradeId,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Historical bar lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("No history available for {0}")]
    Unavailable(Symbol),

    #[error("History source error: {0}")]
    Source(String),
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
