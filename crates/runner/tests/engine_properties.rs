//! Engine integration tests
//!
//! Drives orchestrators over scripted bars and checks the A-share market
//! rules, the risk gate and persistence behave end to end:
//! - Lot flooring and T+1 settlement
//! - Price-limit bands
//! - Commission floor and stamp tax
//! - Aggregate stop-loss across instances
//! - Trade frequency window
//! - Halting on persistence failure
//! - Parallel backtests and the live runner

use chrono::{Duration, TimeZone, Utc};
use cn5_core::{
    Bar, MarketRejection, OrderSize, Rejection, RiskConfig, RiskRule, Signal, Timestamp,
};
use cn5_ports::TradeStore;
use cn5_risk_manager::{AccountAggregate, MemoryRiskLog, RiskConfigHandle, RiskGate};
use cn5_rules::{FeeSchedule, MarketRules};
use cn5_runner::{
    BacktestJob, BarOutcome, ChannelBarSource, EngineError, InMemoryTradeStore, InstanceSettings,
    InstanceState, LiveRunner, Orchestrator, run_backtests,
};
use cn5_strategy::{BarContext, IndicatorRegistry, MovingAverageCrossConfig, Strategy, StrategySpec};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// One scripted action per bar
#[derive(Debug, Clone, Copy)]
enum Step {
    Hold,
    Buy(Decimal),
    Sell(Decimal),
}

/// Emits the next scripted step on every bar, then holds
struct Script {
    steps: Vec<Step>,
    cursor: usize,
}

impl Script {
    fn new(steps: Vec<Step>) -> Box<Self> {
        Box::new(Self { steps, cursor: 0 })
    }
}

impl Strategy for Script {
    fn name(&self) -> &str {
        "script"
    }

    fn register(&self, _registry: &mut IndicatorRegistry) {}

    fn on_bar(&mut self, bar: &Bar, _ctx: &BarContext<'_>) -> Signal {
        let step = self.steps.get(self.cursor).copied().unwrap_or(Step::Hold);
        self.cursor += 1;
        match step {
            Step::Hold => Signal::hold(bar.symbol.clone()),
            Step::Buy(qty) => Signal::buy(bar.symbol.clone(), OrderSize::Shares(qty)),
            Step::Sell(qty) => Signal::sell(bar.symbol.clone(), OrderSize::Shares(qty)),
        }
    }
}

/// 09:30 China time on 2024-03-`day`, plus `minutes`
fn at(day: u32, minutes: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, day, 1, 30, 0).unwrap() + Duration::minutes(minutes)
}

fn bar(symbol: &str, day: u32, minutes: i64, close: Decimal) -> Bar {
    Bar::flat(symbol, at(day, minutes), close, dec!(100000))
}

fn gate(risk: RiskConfig) -> RiskGate {
    RiskGate::new(AccountAggregate::shared(), RiskConfigHandle::new(risk))
}

fn instance(
    id: &str,
    symbol: &str,
    steps: Vec<Step>,
    gate: RiskGate,
    store: Arc<InMemoryTradeStore>,
) -> Orchestrator {
    Orchestrator::new(
        InstanceSettings::new(id, vec![symbol.to_string()], dec!(100000)),
        Script::new(steps),
        MarketRules::default(),
        gate,
        store,
    )
}

fn filled(outcome: BarOutcome) -> cn5_core::Trade {
    match outcome {
        BarOutcome::Filled(trade) => trade,
        other => panic!("expected a fill, got {:?}", other),
    }
}

fn rejected(outcome: BarOutcome) -> Rejection {
    match outcome {
        BarOutcome::Rejected(rejection) => rejection,
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_buy_is_floored_to_whole_lots() {
    let _ = env_logger::try_init();
    let store = Arc::new(InMemoryTradeStore::new());
    let mut orch = instance(
        "lots",
        "SH600000",
        vec![Step::Buy(dec!(150)), Step::Buy(dec!(99))],
        gate(RiskConfig::default()),
        store.clone(),
    );

    let trade = filled(orch.process_bar(&bar("SH600000", 4, 0, dec!(10))).await.unwrap());
    assert_eq!(trade.quantity, dec!(100));
    assert_eq!(trade.price, dec!(10.01));
    assert_eq!(trade.commission, dec!(5));
    assert_eq!(trade.tax, dec!(0));

    let rejection = rejected(orch.process_bar(&bar("SH600000", 4, 1, dec!(10))).await.unwrap());
    assert!(matches!(
        rejection,
        Rejection::Market(MarketRejection::BelowMinLot { .. })
    ));
    // Rejection is recorded and the instance is ready for the next bar
    assert_eq!(orch.state(), InstanceState::Idle);
    assert_eq!(orch.stats().rejected(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_same_session_sell_is_settlement_locked() {
    let _ = env_logger::try_init();
    let mut orch = instance(
        "t-plus-one",
        "SH600000",
        vec![Step::Buy(dec!(100)), Step::Sell(dec!(100)), Step::Sell(dec!(100))],
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );

    filled(orch.process_bar(&bar("SH600000", 4, 0, dec!(10))).await.unwrap());

    let rejection = rejected(orch.process_bar(&bar("SH600000", 4, 30, dec!(10.2))).await.unwrap());
    assert_eq!(rejection.code(), "SETTLEMENT_LOCKED");
    assert_eq!(orch.ledger().position("SH600000").unwrap().available(), dec!(0));

    // Next session the shares have settled
    let trade = filled(orch.process_bar(&bar("SH600000", 5, 0, dec!(10.2))).await.unwrap());
    assert_eq!(trade.quantity, dec!(100));
    assert!(trade.realized_pnl.is_some());
    assert!(orch.ledger().position("SH600000").is_none());
    assert_eq!(orch.state(), InstanceState::Idle);
}

#[tokio::test]
async fn test_upper_band_buy_is_limit_locked() {
    let _ = env_logger::try_init();
    let mut orch = instance(
        "band",
        "SH600000",
        vec![Step::Hold, Step::Buy(dec!(100)), Step::Buy(dec!(100))],
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );

    // Prior close 10.00 puts the main-board band at [9.00, 11.00]
    orch.process_bar(&bar("SH600000", 4, 0, dec!(10))).await.unwrap();

    let rejection = rejected(orch.process_bar(&bar("SH600000", 5, 0, dec!(11))).await.unwrap());
    match rejection {
        Rejection::Market(MarketRejection::LimitLocked { band, .. }) => {
            assert_eq!(band.upper, dec!(11.00));
            assert_eq!(band.lower, dec!(9.00));
        }
        other => panic!("expected LIMIT_LOCKED, got {:?}", other),
    }

    let trade = filled(orch.process_bar(&bar("SH600000", 5, 1, dec!(10.99))).await.unwrap());
    assert_eq!(trade.quantity, dec!(100));
}

#[tokio::test]
async fn test_commission_floor_and_stamp_tax() {
    let _ = env_logger::try_init();
    let rules = MarketRules::default().with_fees(FeeSchedule::default().with_slippage_rate(dec!(0)));
    let mut orch = Orchestrator::new(
        InstanceSettings::new("fees", vec!["SH600000".to_string()], dec!(100000)),
        Script::new(vec![Step::Buy(dec!(100)), Step::Sell(dec!(100))]),
        rules,
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );

    let buy = filled(orch.process_bar(&bar("SH600000", 4, 0, dec!(10))).await.unwrap());
    assert_eq!(buy.notional(), dec!(1000));
    assert_eq!(buy.commission, dec!(5));
    assert_eq!(buy.tax, dec!(0));

    let sell = filled(orch.process_bar(&bar("SH600000", 5, 0, dec!(10))).await.unwrap());
    assert_eq!(sell.notional(), dec!(1000));
    assert_eq!(sell.commission, dec!(5));
    assert_eq!(sell.tax, dec!(1));
    assert_eq!(sell.realized_pnl, Some(dec!(-6)));
    assert_eq!(orch.ledger().cash(), dec!(99989));
    assert_eq!(orch.account().total_pnl(), dec!(-11));
}

#[tokio::test]
async fn test_total_stop_loss_blocks_buys_across_instances() {
    let _ = env_logger::try_init();
    let risk = RiskConfig {
        max_strategy_capital_rate: dec!(1),
        max_single_trade_rate: dec!(1),
        ..RiskConfig::default()
    };
    let log = Arc::new(MemoryRiskLog::new());
    let shared = gate(risk).with_sink(log.clone());
    let store = Arc::new(InMemoryTradeStore::new());

    let mut loser = instance(
        "loser",
        "SH600000",
        vec![Step::Buy(dec!(5000)), Step::Hold, Step::Hold, Step::Sell(dec!(100))],
        shared.clone(),
        store.clone(),
    );
    let mut other = instance(
        "other",
        "SZ000001",
        vec![Step::Buy(dec!(100))],
        shared.clone(),
        store.clone(),
    );

    filled(loser.process_bar(&bar("SH600000", 4, 0, dec!(10))).await.unwrap());
    loser.process_bar(&bar("SH600000", 5, 0, dec!(9))).await.unwrap();
    loser.process_bar(&bar("SH600000", 6, 0, dec!(8.1))).await.unwrap();

    // Marks at 8.00 take aggregate losses past 10% of 100,000
    let sell_bar = bar("SH600000", 7, 0, dec!(8));
    let outcome = loser.process_bar(&sell_bar).await.unwrap();
    assert!(loser.account().total_pnl() <= dec!(-10000));

    // Reducing exposure is still allowed
    let sell = filled(outcome);
    assert_eq!(sell.quantity, dec!(100));

    let rejection = rejected(other.process_bar(&bar("SZ000001", 7, 1, dec!(12))).await.unwrap());
    match rejection {
        Rejection::Risk(verdict) => {
            assert!(!verdict.passed);
            assert_eq!(verdict.triggered_rule, Some(RiskRule::TotalStopLoss));
            assert!(verdict.risk_score > 0);
        }
        other => panic!("expected a risk rejection, got {:?}", other),
    }

    assert_eq!(log.rejected_count(), 1);
    assert!(store.trades_for("other").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_twenty_first_buy_in_an_hour_is_rejected() {
    let _ = env_logger::try_init();
    let mut orch = instance(
        "busy",
        "SH600000",
        vec![Step::Buy(dec!(100)); 22],
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );

    for minute in 0..20 {
        filled(orch.process_bar(&bar("SH600000", 4, minute, dec!(10))).await.unwrap());
    }

    let rejection = rejected(orch.process_bar(&bar("SH600000", 4, 20, dec!(10))).await.unwrap());
    assert_eq!(rejection.code(), "TRADE_FREQUENCY_EXCEEDED");

    // Exactly an hour on, the first fill has left the trailing window
    filled(orch.process_bar(&bar("SH600000", 4, 60, dec!(10))).await.unwrap());
    assert_eq!(orch.stats().fills, 21);
    assert_eq!(orch.stats().rejected(), 1);
}

#[tokio::test]
async fn test_store_failure_halts_without_applying() {
    let _ = env_logger::try_init();
    let store = Arc::new(InMemoryTradeStore::new());
    store.set_failing(true);
    let mut orch = instance(
        "fragile",
        "SH600000",
        vec![Step::Buy(dec!(100)), Step::Buy(dec!(100))],
        gate(RiskConfig::default()),
        store.clone(),
    );

    let err = orch
        .process_bar(&bar("SH600000", 4, 0, dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(orch.state(), InstanceState::Halted);
    assert_eq!(orch.ledger().cash(), dec!(100000));
    assert!(orch.ledger().position("SH600000").is_none());
    assert!(orch.gate().lock().await.halt_reason("fragile").is_some());

    store.set_failing(false);
    let err = orch
        .process_bar(&bar("SH600000", 4, 1, dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Halted { .. }));
    assert!(store.is_empty());
}

/// Gently oscillating closes around 10
fn wave(symbol: &str, bars: usize) -> Vec<Bar> {
    (0..bars)
        .map(|i| {
            let swing = Decimal::from((i % 20) as i64 - 10).abs() * dec!(0.05);
            bar(symbol, 4 + (i / 30) as u32, (i % 30) as i64 * 5, dec!(9.5) + swing)
        })
        .collect()
}

#[tokio::test]
async fn test_parallel_backtests_are_independent() {
    let _ = env_logger::try_init();
    let job = |id: &str, fast: usize, slow: usize| BacktestJob {
        instance_id: id.to_string(),
        symbols: vec!["SH600000".to_string()],
        initial_capital: dec!(100000),
        strategy: StrategySpec::MaCross(MovingAverageCrossConfig {
            fast_period: fast,
            slow_period: slow,
            trade_value: dec!(10000),
        }),
        risk: RiskConfig::default(),
        market: MarketRules::default(),
        bars: wave("SH600000", 120),
    };

    let reports = run_backtests(vec![job("fast", 3, 8), job("slow", 5, 15)]).await;
    assert_eq!(reports.len(), 2);

    for (report, id) in reports.into_iter().zip(["fast", "slow"]) {
        let report = report.unwrap();
        assert_eq!(report.instance_id, id);
        assert!(report.halted.is_none());
        assert_eq!(report.equity_curve.len(), 120);
        assert_eq!(report.stats.bars, 120);
        assert_eq!(report.metrics.trade_count, report.trades.len());

        let cash = report
            .trades
            .iter()
            .fold(dec!(100000), |cash, trade| cash + trade.cash_delta());
        assert_eq!(report.final_account.cash, cash);
    }
}

#[tokio::test]
async fn test_live_runner_drains_source_then_stops() {
    let _ = env_logger::try_init();
    let orch = instance(
        "live",
        "SH600000",
        vec![Step::Buy(dec!(100))],
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );
    let (tx, source) = ChannelBarSource::channel();
    let mut runner = LiveRunner::new();
    runner.spawn(orch, Box::new(source));
    assert_eq!(runner.len(), 1);

    for minute in 0..3 {
        tx.send(bar("SH600000", 4, minute, dec!(10))).unwrap();
    }
    drop(tx);

    let reports = runner.join().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stats.bars, 3);
    assert_eq!(reports[0].stats.fills, 1);
    assert!(reports[0].halted.is_none());
}

#[tokio::test]
async fn test_live_runner_stop_signal() {
    let _ = env_logger::try_init();
    let orch = instance(
        "idle",
        "SH600000",
        Vec::new(),
        gate(RiskConfig::default()),
        Arc::new(InMemoryTradeStore::new()),
    );
    let (_tx, source) = ChannelBarSource::channel();
    let mut runner = LiveRunner::new();
    runner.spawn(orch, Box::new(source));

    let reports = runner.shutdown().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].stats.bars, 0);
    assert_eq!(reports[0].account.cash, dec!(100000));
}

#[tokio::test]
async fn test_stopping_one_instance_leaves_the_other_running() {
    let _ = env_logger::try_init();
    let shared = gate(RiskConfig::default());
    let store = Arc::new(InMemoryTradeStore::new());
    let first = instance("first", "SH600000", Vec::new(), shared.clone(), store.clone());
    let second = instance(
        "second",
        "SZ000001",
        vec![Step::Hold, Step::Buy(dec!(100))],
        shared.clone(),
        store.clone(),
    );
    first.publish().await;
    second.publish().await;

    let (_first_tx, first_source) = ChannelBarSource::channel();
    let (second_tx, second_source) = ChannelBarSource::channel();
    let mut runner = LiveRunner::new();
    runner.spawn(first, Box::new(first_source));
    runner.spawn(second, Box::new(second_source));

    let report = runner.stop_instance("first").await.unwrap();
    assert_eq!(report.instance_id, "first");
    assert_eq!(runner.len(), 1);
    assert_eq!(runner.instance_ids().collect::<Vec<_>>(), vec!["second"]);
    assert!(runner.stop_instance("first").await.is_none());
    assert!(shared.lock().await.account("first").is_none());

    for minute in 0..3 {
        second_tx.send(bar("SZ000001", 4, minute, dec!(12))).unwrap();
    }
    drop(second_tx);

    let reports = runner.join().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].instance_id, "second");
    assert_eq!(reports[0].stats.bars, 3);
    assert_eq!(reports[0].stats.fills, 1);
    assert!(shared.lock().await.account("second").is_some());
}
