//! Strategy Execution Adapter
//!
//! Drives a strategy identically in every mode. For each bar:
//!
//! ```text
//! Bar ──► IndicatorSet.update(adjusted close) ──► Strategy.on_bar(bar, ctx) ──► Signal
//! ```
//!
//! `replay` walks the exact same path and drops the signal; restart
//! rehydration uses it to rebuild indicator and strategy state.

use crate::indicators::{IndicatorRegistry, IndicatorSet};
use crate::strategy::{BarContext, Strategy};
use cn5_core::{Bar, Position, Signal, Timestamp};
use log::{debug, warn};

pub struct StrategyAdapter {
    instance_id: String,
    strategy: Box<dyn Strategy>,
    indicators: IndicatorSet,
    bars_processed: u64,
    last_bar: Option<Timestamp>,
}

impl StrategyAdapter {
    pub fn new(instance_id: impl Into<String>, strategy: Box<dyn Strategy>) -> Self {
        let mut registry = IndicatorRegistry::new();
        strategy.register(&mut registry);
        Self {
            instance_id: instance_id.into(),
            strategy,
            indicators: IndicatorSet::new(registry),
            bars_processed: 0,
            last_bar: None,
        }
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_processed
    }

    pub fn last_bar(&self) -> Option<Timestamp> {
        self.last_bar
    }

    /// Bars of history a restart needs to warm every indicator
    pub fn warmup_bars(&self) -> usize {
        self.indicators.registry().warmup_bars()
    }

    /// Live/backtest path: update indicators, ask the strategy, return its signal
    pub fn on_bar(&mut self, bar: &Bar, position: Option<&Position>) -> Signal {
        self.indicators.update(&bar.symbol, bar.adjusted_close());
        self.bars_processed += 1;
        self.last_bar = Some(bar.timestamp);

        let ctx = BarContext {
            indicators: self.indicators.view(&bar.symbol),
            position,
        };
        let signal = self.strategy.on_bar(bar, &ctx);

        if !signal.is_hold() && signal.symbol != bar.symbol {
            warn!(
                "[{}] {} signalled {} on a {} bar, treated as hold",
                self.instance_id,
                self.strategy.name(),
                signal.symbol,
                bar.symbol
            );
            return Signal::hold(bar.symbol.clone());
        }
        signal
    }

    /// Replay path: identical state transitions, signal discarded
    pub fn replay(&mut self, bar: &Bar, position: Option<&Position>) {
        let signal = self.on_bar(bar, position);
        if !signal.is_hold() {
            debug!(
                "[{}] replay discarded {:?} {} at {}",
                self.instance_id, signal.action, signal.symbol, bar.timestamp
            );
        }
    }
}
