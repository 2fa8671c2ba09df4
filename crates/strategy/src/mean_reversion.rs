//! Mean Reversion Strategy
//!
//! Trades deviations of price from its moving average:
//! - Buys when the close is far enough below the average (expects a rebound)
//! - Sells the sellable holding once the close is back above the average
//!   by the exit threshold
//! - Never holds more than `max_position` shares

use crate::indicators::IndicatorRegistry;
use crate::strategy::{BarContext, Strategy};
use cn5_core::{Bar, Money, OrderSize, Quantity, Signal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const MEAN: &str = "mean";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    /// Moving-average lookback in bars
    pub period: usize,
    /// Deviation below the mean to enter (in basis points)
    /// e.g., 300 = enter when price is 3% under the mean
    pub entry_threshold_bps: Decimal,
    /// Deviation above the mean to exit (in basis points)
    pub exit_threshold_bps: Decimal,
    /// CNY to spend on each entry
    pub trade_value: Money,
    /// Maximum shares held
    pub max_position: Quantity,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            period: 20,
            entry_threshold_bps: dec!(300), // 3% under the mean
            exit_threshold_bps: dec!(50),   // 0.5% over the mean
            trade_value: dec!(10000),
            max_position: dec!(5000),
        }
    }
}

pub struct MeanReversion {
    config: MeanReversionConfig,
}

impl MeanReversion {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }
}

impl Strategy for MeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn register(&self, indicators: &mut IndicatorRegistry) {
        indicators.sma(MEAN, self.config.period);
    }

    fn on_bar(&mut self, bar: &Bar, ctx: &BarContext<'_>) -> Signal {
        let Some(mean) = ctx.indicators.get(MEAN).filter(|m| !m.is_zero()) else {
            return Signal::hold(bar.symbol.clone());
        };

        // Deviation = (price - mean) / mean * 10000
        let price = bar.adjusted_close();
        let deviation_bps = (price - mean) / mean * dec!(10000);

        if deviation_bps < -self.config.entry_threshold_bps && ctx.held() < self.config.max_position {
            log::info!(
                "[MeanReversion] BUY {}: deviation={:.2}bps, close={}, mean={}",
                bar.symbol, deviation_bps, bar.close, mean
            );
            return Signal::buy(bar.symbol.clone(), OrderSize::Notional(self.config.trade_value))
                .with_reason(format!("{:.0}bps under mean", -deviation_bps));
        }

        if deviation_bps > self.config.exit_threshold_bps && ctx.sellable() > Decimal::ZERO {
            log::info!(
                "[MeanReversion] SELL {}: deviation={:.2}bps, close={}, mean={}",
                bar.symbol, deviation_bps, bar.close, mean
            );
            return Signal::sell(bar.symbol.clone(), OrderSize::Shares(ctx.sellable()))
                .with_reason("reverted to mean");
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

    fn run(prices: &[Decimal], pos: Option<&Position>) -> Vec<Signal> {
        let mut adapter = StrategyAdapter::new(
            "mr",
            Box::new(MeanReversion::new(MeanReversionConfig {
                period: 3,
                ..Default::default()
            })),
        );
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 1, 30, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, px)| {
                let bar = Bar::flat("SZ000001", start + Duration::days(i as i64), *px, dec!(1000));
                adapter.on_bar(&bar, pos)
            })
            .collect()
    }

    #[test]
    fn test_buys_on_drop_below_mean() {
        // mean of (10, 10, 9) = 9.667; 9 is ~690bps under
        let signals = run(&[dec!(10), dec!(10), dec!(9)], None);
        assert_eq!(signals[2].action, SignalAction::Buy);
    }

    #[test]
    fn test_sells_when_back_above_mean() {
        let mut pos = Position::new("SZ000001");
        pos.quantity = dec!(1000);
        let signals = run(&[dec!(10), dec!(10), dec!(10.5)], Some(&pos));
        assert_eq!(signals[2].action, SignalAction::Sell);
        assert_eq!(signals[2].size, OrderSize::Shares(dec!(1000)));
    }

    #[test]
    fn test_respects_max_position() {
        let mut pos = Position::new("SZ000001");
        pos.quantity = dec!(5000);
        pos.locked_quantity = dec!(5000);
        let signals = run(&[dec!(10), dec!(10), dec!(9)], Some(&pos));
        assert!(signals[2].is_hold());
    }
}
