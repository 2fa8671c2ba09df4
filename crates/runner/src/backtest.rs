//! Backtest runner
//!
//! A backtest is the orchestrator fed from a finite bar source. Independent
//! backtests run as parallel tokio tasks, each with its own aggregate and
//! trade store so they cannot gate one another.

use crate::error::Result;
use crate::metrics::PerformanceMetrics;
use crate::orchestrator::{BarOutcome, InstanceSettings, InstanceStats, Orchestrator};
use crate::sources::HistoricalBars;
use crate::store::InMemoryTradeStore;
use cn5_core::{AccountState, AccountTag, Bar, InstanceId, Money, RiskConfig, Timestamp, Trade};
use cn5_ports::BarSource;
use cn5_risk_manager::{AccountAggregate, RiskConfigHandle, RiskGate};
use cn5_rules::MarketRules;
use cn5_strategy::StrategySpec;
use std::sync::Arc;

/// Result of driving one instance over a bar sequence
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub instance_id: InstanceId,
    pub strategy: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<(Timestamp, Money)>,
    pub stats: InstanceStats,
    pub final_account: AccountState,
    pub metrics: PerformanceMetrics,
    /// Set when the run ended on an integrity failure
    pub halted: Option<String>,
}

/// Drive an orchestrator until the source is exhausted or the instance halts
pub async fn run_backtest(
    mut orchestrator: Orchestrator,
    source: &mut dyn BarSource,
) -> BacktestReport {
    let instance_id = orchestrator.instance_id().to_string();
    log::info!(
        "[{}] Backtest started ({} via {})",
        instance_id,
        orchestrator.adapter().strategy_name(),
        source.name()
    );

    let mut trades = Vec::new();
    let mut equity_curve = Vec::new();
    let mut halted = None;

    while let Some(bar) = source.next_bar().await {
        match orchestrator.process_bar(&bar).await {
            Ok(BarOutcome::Filled(trade)) => trades.push(trade),
            Ok(_) => {}
            Err(e) => {
                log::error!("[{}] Backtest halted: {}", instance_id, e);
                halted = Some(e.to_string());
                break;
            }
        }
        equity_curve.push((bar.timestamp, orchestrator.account().equity()));
    }
    orchestrator.stop();

    let initial_capital = orchestrator.account().initial_capital;
    let metrics = PerformanceMetrics::compute(initial_capital, &equity_curve, &trades);
    log::info!(
        "[{}] Backtest finished: {} trades, return {:.4}, max drawdown {:.4}",
        instance_id,
        metrics.trade_count,
        metrics.total_return,
        metrics.max_drawdown
    );

    BacktestReport {
        instance_id,
        strategy: orchestrator.adapter().strategy_name().to_string(),
        trades,
        equity_curve,
        stats: orchestrator.stats().clone(),
        final_account: orchestrator.ledger().snapshot(),
        metrics,
        halted,
    }
}

/// One independent backtest
#[derive(Debug, Clone)]
pub struct BacktestJob {
    pub instance_id: InstanceId,
    pub symbols: Vec<String>,
    pub initial_capital: Money,
    pub strategy: StrategySpec,
    pub risk: RiskConfig,
    pub market: MarketRules,
    pub bars: Vec<Bar>,
}

impl BacktestJob {
    fn into_parts(self) -> (Orchestrator, HistoricalBars) {
        let gate = RiskGate::new(AccountAggregate::shared(), RiskConfigHandle::new(self.risk));
        let settings = InstanceSettings::new(self.instance_id, self.symbols, self.initial_capital)
            .with_account(AccountTag::Backtest);
        let orchestrator = Orchestrator::new(
            settings,
            self.strategy.build(),
            self.market,
            gate,
            Arc::new(InMemoryTradeStore::new()),
        );
        (orchestrator, HistoricalBars::new(self.bars))
    }
}

/// Run backtests concurrently; results come back in job order
pub async fn run_backtests(jobs: Vec<BacktestJob>) -> Vec<Result<BacktestReport>> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let instance_id = job.instance_id.clone();
            let handle = tokio::spawn(async move {
                let (orchestrator, mut source) = job.into_parts();
                run_backtest(orchestrator, &mut source).await
            });
            (instance_id, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (instance_id, handle) in handles {
        let report = handle.await.map_err(|e| crate::error::EngineError::Halted {
            instance_id,
            reason: format!("backtest task failed: {}", e),
        });
        reports.push(report);
    }
    reports
}
