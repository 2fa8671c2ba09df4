//! Moving Average Crossover
//!
//! Buys a fixed CNY amount when the fast average crosses above the slow one
//! and the instance is flat; sells everything sellable on the opposite cross.

use crate::indicators::IndicatorRegistry;
use crate::strategy::{BarContext, Strategy};
use cn5_core::{Bar, Money, OrderSize, Signal};
use log::info;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const FAST: &str = "ma_fast";
const SLOW: &str = "ma_slow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageCrossConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// CNY to spend on each entry
    pub trade_value: Money,
}

impl Default for MovingAverageCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: 5,
            slow_period: 20,
            trade_value: dec!(20000),
        }
    }
}

pub struct MovingAverageCross {
    config: MovingAverageCrossConfig,
}

impl MovingAverageCross {
    pub fn new(config: MovingAverageCrossConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn register(&self, indicators: &mut IndicatorRegistry) {
        indicators
            .sma(FAST, self.config.fast_period)
            .sma(SLOW, self.config.slow_period);
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &BarContext<'_>) -> Signal {
        let ind = &ctx.indicators;
        let (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
            ind.get(FAST),
            ind.get(SLOW),
            ind.previous(FAST),
            ind.previous(SLOW),
        ) else {
            return Signal::hold(bar.symbol.clone());
        };

        let golden = prev_fast <= prev_slow && fast > slow;
        let death = prev_fast >= prev_slow && fast < slow;

        if golden && ctx.is_flat() {
            info!("[MaCross] BUY {}: fast={} slow={}", bar.symbol, fast, slow);
            return Signal::buy(bar.symbol.clone(), OrderSize::Notional(self.config.trade_value))
                .with_reason("golden cross");
        }
        if death && !ctx.sellable().is_zero() {
            info!("[MaCross] SELL {}: fast={} slow={}", bar.symbol, fast, slow);
            return Signal::sell(bar.symbol.clone(), OrderSize::Shares(ctx.sellable()))
                .with_reason("death cross");
        }
        Signal::hold(bar.symbol.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StrategyAdapter;
    use chrono::{Duration, TimeZone, Utc};
    use cn5_core::{Position, SignalAction};
    use rust_decimal::Decimal;

    fn feed(adapter: &mut StrategyAdapter, prices: &[Decimal], pos: Option<&Position>) -> Vec<Signal> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 1, 30, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, px)| {
                let bar = Bar::flat("SH600000", start + Duration::days(i as i64), *px, dec!(1000));
                adapter.on_bar(&bar, pos)
            })
            .collect()
    }

    fn strategy() -> StrategyAdapter {
        StrategyAdapter::new(
            "ma",
            Box::new(MovingAverageCross::new(MovingAverageCrossConfig {
                fast_period: 2,
                slow_period: 3,
                trade_value: dec!(10000),
            })),
        )
    }

    #[test]
    fn test_golden_cross_buys_when_flat() {
        let mut adapter = strategy();
        let signals = feed(&mut adapter, &[dec!(10), dec!(10), dec!(10), dec!(12)], None);
        assert!(signals[..3].iter().all(|s| s.is_hold()));
        assert_eq!(signals[3].action, SignalAction::Buy);
        assert_eq!(signals[3].size, OrderSize::Notional(dec!(10000)));
    }

    #[test]
    fn test_death_cross_sells_sellable() {
        let mut adapter = strategy();
        let mut pos = Position::new("SH600000");
        pos.quantity = dec!(300);
        pos.locked_quantity = dec!(100);
        let signals = feed(&mut adapter, &[dec!(10), dec!(10), dec!(10), dec!(8)], Some(&pos));
        assert_eq!(signals[3].action, SignalAction::Sell);
        assert_eq!(signals[3].size, OrderSize::Shares(dec!(200)));
    }
}
