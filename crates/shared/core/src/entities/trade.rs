use super::order::CandidateOrder;
use super::side::Side;
use crate::values::{InstanceId, Money, Price, Quantity, Symbol, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a trade
pub type TradeId = Uuid;

/// Which book a trade was recorded against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountTag {
    Backtest,
    Shadow,
    Live,
}

/// An executed (simulated or live) fill. Append-only: the ordered trade log
/// of an instance is the source of truth for its positions and cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub instance_id: InstanceId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub commission: Money,
    pub tax: Money,
    /// Realized PnL net of sell fees; `None` for buys
    pub realized_pnl: Option<Money>,
    pub timestamp: Timestamp,
    pub account: AccountTag,
}

impl Trade {
    /// Build a trade from a validated order
    pub fn from_order(
        instance_id: impl Into<InstanceId>,
        order: &CandidateOrder,
        account: AccountTag,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instance_id: instance_id.into(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price: order.fill_price,
            commission: order.commission,
            tax: order.stamp_tax,
            realized_pnl: None,
            timestamp: order.timestamp,
            account,
        }
    }

    pub fn with_realized_pnl(mut self, pnl: Money) -> Self {
        self.realized_pnl = Some(pnl);
        self
    }

    pub fn notional(&self) -> Money {
        self.price * self.quantity
    }

    pub fn fees(&self) -> Money {
        self.commission + self.tax
    }

    /// Signed cash impact: negative for buys, positive for sells
    pub fn cash_delta(&self) -> Money {
        match self.side {
            Side::Buy => -(self.notional() + self.fees()),
            Side::Sell => self.notional() - self.fees(),
        }
    }
}
