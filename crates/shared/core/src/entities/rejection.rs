use super::order::PriceBand;
use super::risk::RiskVerdict;
use super::side::Side;
use crate::values::{Money, Price, Quantity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market-structure reason a signal cannot become an order.
///
/// These are outcomes, not failures: the bar is skipped and the engine
/// carries on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketRejection {
    #[error("symbol suspended (zero volume)")]
    Suspended,

    #[error("{side} at {price} blocked by limit band [{}, {}]", band.lower, band.upper)]
    LimitLocked {
        side: Side,
        price: Price,
        band: PriceBand,
    },

    #[error("sell {requested} exceeds sellable {available} (T+1)")]
    SettlementLocked {
        requested: Quantity,
        available: Quantity,
    },

    #[error("sell {requested} exceeds holding {held}")]
    InsufficientPosition { requested: Quantity, held: Quantity },

    #[error("buy {requested} is below one lot of {lot}")]
    BelowMinLot { requested: Quantity, lot: Quantity },

    #[error("order quantity must be positive")]
    InvalidQuantity,

    #[error("order price must be positive")]
    InvalidPrice,

    #[error("buy needs {required} but only {available} cash is free")]
    InsufficientCash { required: Money, available: Money },
}

impl MarketRejection {
    pub fn code(&self) -> &'static str {
        match self {
            MarketRejection::Suspended => "SUSPENDED",
            MarketRejection::LimitLocked { .. } => "LIMIT_LOCKED",
            MarketRejection::SettlementLocked { .. } => "SETTLEMENT_LOCKED",
            MarketRejection::InsufficientPosition { .. } => "INSUFFICIENT_POSITION",
            MarketRejection::BelowMinLot { .. } => "BELOW_MIN_LOT",
            MarketRejection::InvalidQuantity => "INVALID_QUANTITY",
            MarketRejection::InvalidPrice => "INVALID_PRICE",
            MarketRejection::InsufficientCash { .. } => "INSUFFICIENT_CASH",
        }
    }
}

/// Why a non-hold signal produced no trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    Market(MarketRejection),
    Risk(RiskVerdict),
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Market(m) => m.code(),
            Rejection::Risk(v) => v.triggered_rule.map(|r| r.code()).unwrap_or("RISK_REJECTED"),
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Rejection::Market(m) => m.to_string(),
            Rejection::Risk(v) => v.reason.clone().unwrap_or_default(),
        }
    }
}
