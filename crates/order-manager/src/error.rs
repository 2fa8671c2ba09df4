//! Position ledger errors
//!
//! Every variant means the trade log and the ledger disagree. They are
//! integrity failures: the instance halts (or refuses to start).

use cn5_core::{InstanceId, Money, Quantity, Symbol, Timestamp, TradeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Sell of {requested} {symbol} exceeds holding {held}")]
    Oversell {
        symbol: Symbol,
        requested: Quantity,
        held: Quantity,
    },

    #[error("Trade at {current} is earlier than last applied trade at {previous}")]
    OutOfOrder {
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("Trade {trade_id} belongs to {found}, not {expected}")]
    ForeignTrade {
        trade_id: TradeId,
        expected: InstanceId,
        found: InstanceId,
    },

    #[error("Trade {trade_id} records realized PnL {recorded}, fold computes {computed}")]
    RealizedMismatch {
        trade_id: TradeId,
        recorded: Money,
        computed: Money,
    },

    #[error("Invalid trade {trade_id}: {reason}")]
    InvalidTrade { trade_id: TradeId, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
