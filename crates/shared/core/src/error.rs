//! Data integrity errors
//!
//! Raised when an input violates the domain's structural invariants. These
//! halt the affected instance; they are never treated as trading rejections.

use crate::values::{Symbol, Timestamp};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Malformed bar for {symbol} at {timestamp}: {reason}")]
    MalformedBar {
        symbol: Symbol,
        timestamp: Timestamp,
        reason: String,
    },

    #[error("Non-monotonic bar for {symbol}: {current} is not after {previous}")]
    NonMonotonicTimestamp {
        symbol: Symbol,
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("Bar for unsubscribed symbol: {0}")]
    UnknownSymbol(Symbol),
}

pub type DataResult<T> = std::result::Result<T, DataError>;
