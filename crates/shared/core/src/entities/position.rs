use crate::values::{Money, Price, Quantity, Symbol, TradingDay};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Holding of one symbol by one strategy instance (long only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Quantity,
    /// Weighted average cost per share, buy fees included
    pub avg_cost: Price,
    /// Shares bought in the current session (T+1: not sellable yet)
    pub locked_quantity: Quantity,
    /// Session the lock belongs to
    pub lock_day: Option<TradingDay>,
    /// Latest mark (as-traded close)
    pub last_price: Price,
}

impl Position {
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            locked_quantity: Decimal::ZERO,
            lock_day: None,
            last_price: Decimal::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Shares that may be sold this session
    pub fn available(&self) -> Quantity {
        (self.quantity - self.locked_quantity).max(Decimal::ZERO)
    }

    pub fn cost_basis(&self) -> Money {
        self.quantity * self.avg_cost
    }

    pub fn market_value(&self) -> Money {
        self.quantity * self.last_price
    }

    pub fn unrealized_pnl(&self) -> Money {
        self.market_value() - self.cost_basis()
    }
}
