use super::side::Side;
use crate::values::{Money, Price, Quantity, Symbol};
use serde::{Deserialize, Serialize};

/// What a strategy wants done on this bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// Requested size, either in shares or as a CNY amount to spend/raise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderSize {
    Shares(Quantity),
    Notional(Money),
}

/// Trading intent emitted by a strategy on a bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    pub symbol: Symbol,
    pub size: OrderSize,
    /// Quote to trade at; the bar close when absent
    pub limit_price: Option<Price>,
    /// Free-form explanation for logs
    pub reason: Option<String>,
}

impl Signal {
    pub fn new(action: SignalAction, symbol: impl Into<Symbol>, size: OrderSize) -> Self {
        Self {
            action,
            symbol: symbol.into(),
            size,
            limit_price: None,
            reason: None,
        }
    }

    pub fn hold(symbol: impl Into<Symbol>) -> Self {
        Self::new(SignalAction::Hold, symbol, OrderSize::Shares(Quantity::ZERO))
    }

    pub fn buy(symbol: impl Into<Symbol>, size: OrderSize) -> Self {
        Self::new(SignalAction::Buy, symbol, size)
    }

    pub fn sell(symbol: impl Into<Symbol>, size: OrderSize) -> Self {
        Self::new(SignalAction::Sell, symbol, size)
    }

    pub fn with_limit_price(mut self, price: Price) -> Self {
        self.limit_price = Some(price);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }

    /// Order side, or `None` for a hold
    pub fn side(&self) -> Option<Side> {
        match self.action {
            SignalAction::Buy => Some(Side::Buy),
            SignalAction::Sell => Some(Side::Sell),
            SignalAction::Hold => None,
        }
    }
}
