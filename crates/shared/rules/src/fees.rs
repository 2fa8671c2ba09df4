//! Transaction costs
//!
//! Commission is charged on both sides with a flat minimum; stamp tax is
//! charged on sells only. Slippage moves the fill price against the trader.

use cn5_core::{Money, Price, Side};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Round a CNY amount to the fen
pub fn round_money(amount: Decimal) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Broker commission rate, both sides
    pub commission_rate: Decimal,
    /// Minimum commission per trade
    pub min_commission: Money,
    /// Stamp tax rate, sells only
    pub stamp_tax_rate: Decimal,
    /// Simulated slippage as a fraction of price
    pub slippage_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            commission_rate: dec!(0.0003),
            min_commission: dec!(5),
            stamp_tax_rate: dec!(0.001),
            slippage_rate: dec!(0.001),
        }
    }
}

impl FeeSchedule {
    pub fn with_slippage_rate(mut self, rate: Decimal) -> Self {
        self.slippage_rate = rate;
        self
    }

    pub fn commission(&self, notional: Money) -> Money {
        round_money((notional * self.commission_rate).max(self.min_commission))
    }

    pub fn stamp_tax(&self, side: Side, notional: Money) -> Money {
        match side {
            Side::Buy => Decimal::ZERO,
            Side::Sell => round_money(notional * self.stamp_tax_rate),
        }
    }

    /// Fill price after slippage, rounded to the price tick. `None` if the
    /// price is out of range.
    pub fn fill_price(&self, side: Side, reference: Price) -> Option<Price> {
        let factor = match side {
            Side::Buy => Decimal::ONE + self.slippage_rate,
            Side::Sell => Decimal::ONE - self.slippage_rate,
        };
        reference.checked_mul(factor).map(round_money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_floor() {
        let fees = FeeSchedule::default();
        // 0.0003 * 1000 = 0.30, below the floor
        assert_eq!(fees.commission(dec!(1000)), dec!(5));
        assert_eq!(fees.commission(dec!(100000)), dec!(30));
    }

    #[test]
    fn test_stamp_tax_sell_only() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.stamp_tax(Side::Sell, dec!(1000)), dec!(1));
        assert_eq!(fees.stamp_tax(Side::Buy, dec!(1000)), dec!(0));
    }

    #[test]
    fn test_slippage_against_trader() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.fill_price(Side::Buy, dec!(10)), Some(dec!(10.01)));
        assert_eq!(fees.fill_price(Side::Sell, dec!(10)), Some(dec!(9.99)));

        let none = FeeSchedule::default().with_slippage_rate(Decimal::ZERO);
        assert_eq!(none.fill_price(Side::Buy, dec!(10)), Some(dec!(10)));
        assert_eq!(fees.fill_price(Side::Buy, Decimal::MAX), None);
    }
}
