//! Per-position fold
//!
//! Long-only weighted-average accounting. The average cost is weighted by
//! fill price only; sell fees reduce the realized PnL of the sell, while buy
//! fees are carried by the account (see `AccountState::buy_fees`).

use cn5_core::{Money, Position, Price, Quantity, TradingDay};
use rust_decimal::Decimal;

pub trait PositionFold {
    /// Add shares bought on `day`; they stay locked for the rest of that day
    fn apply_buy(&mut self, quantity: Quantity, price: Price, day: TradingDay);

    /// Realized PnL a sell would book, without applying it
    fn realized_for_sell(&self, quantity: Quantity, price: Price, fees: Money) -> Money;

    /// Remove sold shares, returning the realized PnL
    fn apply_sell(&mut self, quantity: Quantity, price: Price, fees: Money) -> Money;
}

impl PositionFold for Position {
    fn apply_buy(&mut self, quantity: Quantity, price: Price, day: TradingDay) {
        let new_quantity = self.quantity + quantity;
        // Adding to position - price-weighted average
        let total_cost = self.cost_basis() + quantity * price;
        self.avg_cost = total_cost / new_quantity;
        self.quantity = new_quantity;

        if self.lock_day == Some(day) {
            self.locked_quantity += quantity;
        } else {
            self.locked_quantity = quantity;
            self.lock_day = Some(day);
        }
        if self.last_price.is_zero() {
            self.last_price = price;
        }
    }

    fn realized_for_sell(&self, quantity: Quantity, price: Price, fees: Money) -> Money {
        (price - self.avg_cost) * quantity - fees
    }

    fn apply_sell(&mut self, quantity: Quantity, price: Price, fees: Money) -> Money {
        let realized = self.realized_for_sell(quantity, price, fees);
        self.quantity -= quantity;
        self.locked_quantity = self.locked_quantity.min(self.quantity);
        if self.quantity.is_zero() {
            // Flat, reset avg cost
            self.avg_cost = Decimal::ZERO;
            self.lock_day = None;
        }
        realized
    }
}
