use super::board::Board;
use super::side::Side;
use crate::values::{Money, Price, Quantity, Symbol, Timestamp};
use serde::{Deserialize, Serialize};

/// Daily price-limit band around the prior session close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub lower: Price,
    pub upper: Price,
}

impl PriceBand {
    /// A buy at/above the upper limit or a sell at/below the lower limit
    /// cannot be filled: the book is locked on that side.
    pub fn is_locked(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => price >= self.upper,
            Side::Sell => price <= self.lower,
        }
    }
}

/// Fully-resolved order awaiting risk validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOrder {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
    /// Quote before slippage (signal limit price or bar close)
    pub reference_price: Price,
    /// Simulated execution price after slippage
    pub fill_price: Price,
    pub commission: Money,
    pub stamp_tax: Money,
    /// Cost of slippage against the reference quote
    pub slippage_cost: Money,
    pub board: Board,
    /// Band in force for the session, if a prior close is known
    pub band: Option<PriceBand>,
    /// Timestamp of the bar that produced the order
    pub timestamp: Timestamp,
}

impl CandidateOrder {
    /// Gross traded value at the fill price
    pub fn notional(&self) -> Money {
        self.fill_price * self.quantity
    }

    pub fn fees(&self) -> Money {
        self.commission + self.stamp_tax
    }

    /// Signed cash impact: negative for buys, positive for sells
    pub fn cash_delta(&self) -> Money {
        match self.side {
            Side::Buy => -(self.notional() + self.fees()),
            Side::Sell => self.notional() - self.fees(),
        }
    }
}
