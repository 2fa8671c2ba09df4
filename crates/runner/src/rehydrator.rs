//! State Rehydrator
//!
//! Rebuilds an orchestrator after a restart from two sources of truth: the
//! instance's trade log and stored bar history.
//!
//! ```text
//!   trade log ──► trades before window ──► ledger fold
//!                                               │
//!   history   ──► last N sessions ──┬──► replay bar (marks, indicators)
//!                                   └──► interleave trades by timestamp
//!                                               │
//!                          re-derive T+1 locks for today ──► publish ──► Idle
//! ```
//!
//! Replay never calls the trade store or the risk gate, and strategy signals
//! produced while warming up are discarded.

use crate::config::RehydrationConfig;
use crate::error::{EngineError, Result};
use crate::orchestrator::{InstanceSettings, Orchestrator};
use chrono::Duration;
use cn5_core::{Bar, Symbol, Trade, trading_day};
use cn5_ports::{BarHistory, Clock, HistoryError, TradeStore};
use cn5_risk_manager::RiskGate;
use cn5_rules::MarketRules;
use cn5_strategy::Strategy;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

pub struct Rehydrator {
    store: Arc<dyn TradeStore>,
    history: Arc<dyn BarHistory>,
    clock: Arc<dyn Clock>,
    config: RehydrationConfig,
}

impl Rehydrator {
    pub fn new(
        store: Arc<dyn TradeStore>,
        history: Arc<dyn BarHistory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            history,
            clock,
            config: RehydrationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RehydrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Restore an instance to the state it would have had without the restart
    pub async fn rehydrate(
        &self,
        settings: InstanceSettings,
        strategy: Box<dyn Strategy>,
        rules: MarketRules,
        gate: RiskGate,
    ) -> Result<Orchestrator> {
        let instance_id = settings.instance_id.clone();
        let inconsistent = |reason: String| EngineError::InconsistentLedger {
            instance_id: instance_id.clone(),
            reason,
        };

        let trades = self.store.trades_for(&instance_id).await?;
        if let Some(pair) = trades.windows(2).find(|w| w[1].timestamp < w[0].timestamp) {
            return Err(inconsistent(format!(
                "trade {} at {} precedes trade {} at {}",
                pair[1].id, pair[1].timestamp, pair[0].id, pair[0].timestamp
            )));
        }

        let mut orchestrator =
            Orchestrator::new(settings, strategy, rules, gate, self.store.clone());
        let bars = self.load_window(&orchestrator).await?;

        for step in replay_plan(&bars, &trades) {
            match step {
                ReplayStep::Bar(bar) => orchestrator.replay_bar(bar)?,
                ReplayStep::Trade(trade) => orchestrator
                    .replay_trade(trade)
                    .map_err(|e| inconsistent(e.to_string()))?,
            }
        }

        let today = trading_day(self.clock.now());
        orchestrator.ledger_mut().rederive_locks(&trades, today);
        orchestrator.publish().await;

        log::info!(
            "[{}] Rehydrated: {} trades, {} bars, cash {}, {} open positions",
            instance_id,
            trades.len(),
            bars.len(),
            orchestrator.ledger().cash(),
            orchestrator.ledger().positions().count()
        );

        Ok(orchestrator)
    }

    /// Bars of the trailing sessions for every subscribed symbol, merged in
    /// replay order
    async fn load_window(&self, orchestrator: &Orchestrator) -> Result<Vec<Bar>> {
        let settings = orchestrator.settings();
        let required = orchestrator.adapter().warmup_bars();
        let now = self.clock.now();

        // Calendar span wide enough to cover the sessions through weekends and holidays
        let sessions = self.config.lookback_sessions as i64;
        let from = now - Duration::days(sessions * 7 / 5 + 15);

        let symbols: BTreeSet<Symbol> = settings.symbols.iter().cloned().collect();

        let mut merged = Vec::new();
        for symbol in symbols {
            let series = match self.history.bars_between(&symbol, from, now).await {
                Ok(series) => series,
                Err(HistoryError::Unavailable(_)) => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            let series = trailing_sessions(series, self.config.lookback_sessions);

            if series.is_empty() || series.len() < required {
                if self.config.allow_partial_history {
                    log::warn!(
                        "[{}] Partial history for {}: {} bars, warm-up needs {}",
                        settings.instance_id,
                        symbol,
                        series.len(),
                        required
                    );
                } else {
                    return Err(EngineError::MissingHistory {
                        instance_id: settings.instance_id.clone(),
                        symbol,
                        found: series.len(),
                        required: required.max(1),
                    });
                }
            }
            merged.extend(series);
        }

        merged.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(merged)
    }
}

/// One step of a replay, in the order it happened live
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReplayStep<'a> {
    Bar(&'a Bar),
    Trade(&'a Trade),
}

/// Interleave the bar window with the trade log. Trades older than the
/// window come first; a fill follows the bar of its own symbol and instant,
/// even when another symbol's fill at that instant was logged ahead of it.
fn replay_plan<'a>(bars: &'a [Bar], trades: &'a [Trade]) -> Vec<ReplayStep<'a>> {
    let mut steps = Vec::with_capacity(bars.len() + trades.len());
    let mut pending: VecDeque<&Trade> = trades.iter().collect();

    let window_start = bars.first().map(|bar| bar.timestamp);
    while let Some(&trade) = pending.front() {
        if window_start.is_some_and(|start| trade.timestamp >= start) {
            break;
        }
        steps.push(ReplayStep::Trade(trade));
        pending.pop_front();
    }

    for bar in bars {
        while let Some(&trade) = pending.front() {
            if trade.timestamp >= bar.timestamp {
                break;
            }
            steps.push(ReplayStep::Trade(trade));
            pending.pop_front();
        }

        steps.push(ReplayStep::Bar(bar));

        let mut index = 0;
        while let Some(&trade) = pending.get(index) {
            if trade.timestamp != bar.timestamp {
                break;
            }
            if trade.symbol == bar.symbol {
                steps.push(ReplayStep::Trade(trade));
                pending.remove(index);
            } else {
                index += 1;
            }
        }
    }

    steps.extend(pending.into_iter().map(ReplayStep::Trade));
    steps
}

/// Keep only the bars of the last `sessions` trading days present
fn trailing_sessions(bars: Vec<Bar>, sessions: usize) -> Vec<Bar> {
    let days: BTreeSet<_> = bars.iter().map(|bar| bar.trading_day()).collect();
    let Some(first) = days.iter().rev().take(sessions).last().copied() else {
        return Vec::new();
    };
    bars.into_iter()
        .filter(|bar| bar.trading_day() >= first)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use cn5_core::{AccountTag, Side, Timestamp};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn bar_on(day: u32) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 3, day, 2, 0, 0).unwrap();
        Bar::flat("SH600000", ts, dec!(10), dec!(1000))
    }

    #[test]
    fn test_trailing_sessions_keeps_latest_days() {
        let bars = vec![bar_on(4), bar_on(5), bar_on(6), bar_on(7)];

        let kept = trailing_sessions(bars.clone(), 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(
            kept[0].trading_day(),
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
        );

        assert_eq!(trailing_sessions(bars, 10).len(), 4);
        assert!(trailing_sessions(Vec::new(), 3).is_empty());
    }

    fn fill(symbol: &str, ts: Timestamp) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            instance_id: "plan".to_string(),
            symbol: symbol.to_string(),
            side: Side::Buy,
            quantity: dec!(100),
            price: dec!(10),
            commission: dec!(5),
            tax: dec!(0),
            realized_pnl: None,
            timestamp: ts,
            account: AccountTag::Shadow,
        }
    }

    #[test]
    fn test_replay_plan_pairs_fills_with_their_bar() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap();
        let t1 = t0 + Duration::minutes(5);
        let bars = vec![
            Bar::flat("SH600000", t0, dec!(10), dec!(1000)),
            Bar::flat("SZ000001", t0, dec!(10), dec!(1000)),
            Bar::flat("SH600000", t1, dec!(10), dec!(1000)),
        ];
        // SZ000001 was processed first live, so its fill was logged first
        let trades = vec![
            fill("SH600000", t0 - Duration::days(1)),
            fill("SZ000001", t0),
            fill("SH600000", t0),
        ];

        let plan = replay_plan(&bars, &trades);
        assert_eq!(
            plan,
            vec![
                ReplayStep::Trade(&trades[0]),
                ReplayStep::Bar(&bars[0]),
                ReplayStep::Trade(&trades[2]),
                ReplayStep::Bar(&bars[1]),
                ReplayStep::Trade(&trades[1]),
                ReplayStep::Bar(&bars[2]),
            ]
        );
    }
}
