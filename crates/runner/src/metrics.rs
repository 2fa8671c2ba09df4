//! Backtest performance metrics

use cn5_core::{Money, Side, Timestamp, Trade, TradingDay, trading_day};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Periods per year for the Sharpe ratio
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Annual risk-free rate subtracted from daily returns
pub const RISK_FREE_RATE: f64 = 0.03;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    /// Compounded on a 365-day calendar basis
    pub annualized_return: f64,
    /// Largest peak-to-trough equity decline, as a positive fraction
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Share of closing (sell) trades with positive realized PnL
    pub win_rate: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    /// Compute from an equity curve sampled per bar and the trade list
    pub fn compute(
        initial_capital: Money,
        equity_curve: &[(Timestamp, Money)],
        trades: &[Trade],
    ) -> Self {
        let initial = initial_capital.to_f64().unwrap_or(0.0);
        let mut metrics = Self {
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            ..Default::default()
        };

        let (Some((first_ts, _)), Some((last_ts, last_equity))) =
            (equity_curve.first(), equity_curve.last())
        else {
            return metrics;
        };
        if initial <= 0.0 {
            return metrics;
        }

        let final_equity = last_equity.to_f64().unwrap_or(initial);
        metrics.total_return = final_equity / initial - 1.0;

        let days = (*last_ts - *first_ts).num_days().max(1) as f64;
        metrics.annualized_return = (1.0 + metrics.total_return).powf(365.0 / days) - 1.0;

        let equity: Vec<f64> = equity_curve
            .iter()
            .map(|(_, e)| e.to_f64().unwrap_or(0.0))
            .collect();
        metrics.max_drawdown = max_drawdown(&equity);
        metrics.sharpe_ratio = sharpe_ratio(&daily_closes(equity_curve), initial);

        metrics
    }
}

fn win_rate(trades: &[Trade]) -> f64 {
    let closes: Vec<Money> = trades
        .iter()
        .filter(|t| t.side == Side::Sell)
        .filter_map(|t| t.realized_pnl)
        .collect();
    if closes.is_empty() {
        return 0.0;
    }
    let wins = closes.iter().filter(|pnl| pnl.is_sign_positive() && !pnl.is_zero()).count();
    wins as f64 / closes.len() as f64
}

fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}

/// Last equity of each trading day
fn daily_closes(equity_curve: &[(Timestamp, Money)]) -> Vec<f64> {
    let mut closes: BTreeMap<TradingDay, f64> = BTreeMap::new();
    for (ts, equity) in equity_curve {
        closes.insert(trading_day(*ts), equity.to_f64().unwrap_or(0.0));
    }
    closes.into_values().collect()
}

fn sharpe_ratio(daily_equity: &[f64], initial: f64) -> f64 {
    let mut previous = initial;
    let mut returns = Vec::with_capacity(daily_equity.len());
    for &equity in daily_equity {
        if previous > 0.0 {
            returns.push(equity / previous - 1.0);
        }
        previous = equity;
    }
    if returns.len() < 2 {
        return 0.0;
    }

    let daily_rf = RISK_FREE_RATE / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return 0.0;
    }
    mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}
