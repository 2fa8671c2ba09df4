//! Execution Orchestrator
//!
//! Drives one strategy instance through a bar:
//!
//! ```text
//!  Idle ──bar──► ProcessingBar ──signal──► AwaitingRisk ──pass──► Settling ──► Idle
//!                     │                         │                     │
//!                     │ hold                    │ reject              │ store/ledger failure
//!                     ▼                         ▼                     ▼
//!                   Idle                Rejected ──► Idle          Halted
//! ```
//!
//! Risk validation, trade persistence, ledger update and the publication of
//! the new AccountState happen while the shared aggregate is locked, so no
//! other instance can validate against a stale view.

use crate::error::{EngineError, Result};
use cn5_core::{
    AccountState, AccountTag, Bar, DataError, InstanceId, Money, Rejection, Symbol, Timestamp,
    Trade,
};
use cn5_order_manager::PositionLedger;
use cn5_ports::TradeStore;
use cn5_risk_manager::{AccountAggregate, RiskGate};
use cn5_rules::{MarketContext, MarketRuleEngine, MarketRules, SessionTracker};
use cn5_strategy::{Strategy, StrategyAdapter};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Idle,
    ProcessingBar,
    AwaitingRisk,
    Settling,
    /// Signal rejected; returns to `Idle` once the rejection is recorded
    Rejected,
    /// Integrity or persistence failure; no further bars are processed
    Halted,
    /// Explicitly stopped
    Stopped,
}

impl InstanceState {
    pub fn accepts_bars(&self) -> bool {
        matches!(self, InstanceState::Idle | InstanceState::Rejected)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What happened to a bar
#[derive(Debug, Clone, PartialEq)]
pub enum BarOutcome {
    Hold,
    Rejected(Rejection),
    Filled(Trade),
}

/// Identity and subscription of an instance
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSettings {
    pub instance_id: InstanceId,
    pub symbols: Vec<Symbol>,
    pub initial_capital: Money,
    pub account: AccountTag,
}

impl InstanceSettings {
    pub fn new(
        instance_id: impl Into<InstanceId>,
        symbols: Vec<Symbol>,
        initial_capital: Money,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            symbols,
            initial_capital,
            account: AccountTag::Backtest,
        }
    }

    pub fn with_account(mut self, account: AccountTag) -> Self {
        self.account = account;
        self
    }
}

/// Counters kept per instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceStats {
    pub bars: u64,
    pub holds: u64,
    pub fills: u64,
    /// Rejections by code
    pub rejections: BTreeMap<String, u64>,
}

impl InstanceStats {
    pub fn rejected(&self) -> u64 {
        self.rejections.values().sum()
    }
}

/// Orchestrator for a single strategy instance
pub struct Orchestrator {
    settings: InstanceSettings,
    state: InstanceState,
    halt_reason: Option<String>,
    adapter: StrategyAdapter,
    ledger: PositionLedger,
    sessions: SessionTracker,
    rules: MarketRuleEngine,
    gate: RiskGate,
    store: Arc<dyn TradeStore>,
    last_bar_at: HashMap<Symbol, Timestamp>,
    stats: InstanceStats,
}

impl Orchestrator {
    pub fn new(
        settings: InstanceSettings,
        strategy: Box<dyn Strategy>,
        rules: MarketRules,
        gate: RiskGate,
        store: Arc<dyn TradeStore>,
    ) -> Self {
        let adapter = StrategyAdapter::new(settings.instance_id.clone(), strategy);
        let ledger = PositionLedger::new(settings.instance_id.clone(), settings.initial_capital);

        Self {
            settings,
            state: InstanceState::Idle,
            halt_reason: None,
            adapter,
            ledger,
            sessions: SessionTracker::new(),
            rules: MarketRuleEngine::new(rules),
            gate,
            store,
            last_bar_at: HashMap::new(),
            stats: InstanceStats::default(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.settings.instance_id
    }

    pub fn settings(&self) -> &InstanceSettings {
        &self.settings
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halt_reason.as_deref()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn account(&self) -> &AccountState {
        self.ledger.account()
    }

    pub fn adapter(&self) -> &StrategyAdapter {
        &self.adapter
    }

    pub fn stats(&self) -> &InstanceStats {
        &self.stats
    }

    pub fn gate(&self) -> &RiskGate {
        &self.gate
    }

    /// Publish the current account state to the shared aggregate
    pub async fn publish(&self) {
        self.gate.lock().await.publish(self.ledger.snapshot());
    }

    /// Process one bar end to end
    pub async fn process_bar(&mut self, bar: &Bar) -> Result<BarOutcome> {
        self.ensure_accepting()?;
        self.transition(InstanceState::ProcessingBar);
        self.stats.bars += 1;

        if let Err(e) = self.advance(bar) {
            self.halt(e.to_string()).await;
            return Err(e.into());
        }

        let signal = self
            .adapter
            .on_bar(bar, self.ledger.position(&bar.symbol));

        if signal.is_hold() {
            self.stats.holds += 1;
            self.publish().await;
            self.transition(InstanceState::Idle);
            return Ok(BarOutcome::Hold);
        }

        let context = MarketContext {
            bar,
            prior_close: self.sessions.prior_close(&bar.symbol),
            position: self.ledger.position(&bar.symbol),
            available_cash: self.ledger.cash(),
        };
        let order = match self.rules.resolve(&signal, &context) {
            Ok(order) => order,
            Err(rejection) => {
                log::warn!(
                    "[{}] {:?} {} rejected by market rules: {}",
                    self.settings.instance_id,
                    signal.action,
                    bar.symbol,
                    rejection
                );
                self.publish().await;
                return Ok(self.reject(Rejection::Market(rejection)));
            }
        };

        self.transition(InstanceState::AwaitingRisk);
        let config = self.gate.config().snapshot().await;
        let gate = self.gate.clone();
        let mut aggregate = gate.lock().await;

        // Validate against this bar's marks, not the previous publication
        aggregate.publish(self.ledger.snapshot());
        let verdict = gate.check(&aggregate, &self.settings.instance_id, &order, &config);
        if !verdict.passed {
            drop(aggregate);
            return Ok(self.reject(Rejection::Risk(verdict)));
        }

        self.transition(InstanceState::Settling);
        let trade = match self.ledger.build_trade(&order, self.settings.account) {
            Ok(trade) => trade,
            Err(e) => {
                self.halt_locked(&mut aggregate, e.to_string());
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.append(&trade).await {
            self.halt_locked(&mut aggregate, format!("trade persistence failed: {}", e));
            return Err(e.into());
        }

        if let Err(e) = self.ledger.apply_trade(&trade) {
            self.halt_locked(&mut aggregate, e.to_string());
            return Err(e.into());
        }

        aggregate.publish(self.ledger.snapshot());
        drop(aggregate);

        self.stats.fills += 1;
        log::info!(
            "[{}] FILLED {} {} x {} @ {} (fees {}, risk score {})",
            self.settings.instance_id,
            trade.side,
            trade.symbol,
            trade.quantity,
            trade.price,
            trade.fees(),
            verdict.risk_score
        );
        self.transition(InstanceState::Idle);
        Ok(BarOutcome::Filled(trade))
    }

    /// Stop the instance; it keeps its published account state
    pub fn stop(&mut self) {
        if self.state != InstanceState::Stopped {
            log::info!(
                "[{}] Instance stopped after {} bars",
                self.settings.instance_id,
                self.stats.bars
            );
            self.state = InstanceState::Stopped;
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, InstanceState::Halted | InstanceState::Stopped)
    }

    /// Bar bookkeeping shared by live processing and replay
    fn advance(&mut self, bar: &Bar) -> std::result::Result<(), DataError> {
        bar.validate()?;

        if !self.settings.symbols.is_empty() && !self.settings.symbols.contains(&bar.symbol) {
            return Err(DataError::UnknownSymbol(bar.symbol.clone()));
        }

        if let Some(previous) = self.last_bar_at.get(&bar.symbol) {
            if bar.timestamp <= *previous {
                return Err(DataError::NonMonotonicTimestamp {
                    symbol: bar.symbol.clone(),
                    previous: *previous,
                    current: bar.timestamp,
                });
            }
        }
        self.last_bar_at.insert(bar.symbol.clone(), bar.timestamp);

        self.sessions.observe(bar);
        self.ledger.begin_bar(bar);
        Ok(())
    }

    /// Replay a historical bar: indicators and marks advance, signals are dropped
    pub(crate) fn replay_bar(&mut self, bar: &Bar) -> std::result::Result<(), DataError> {
        self.advance(bar)?;
        self.adapter
            .replay(bar, self.ledger.position(&bar.symbol));
        Ok(())
    }

    /// Replay a persisted trade straight into the ledger
    pub(crate) fn replay_trade(&mut self, trade: &Trade) -> cn5_order_manager::Result<()> {
        self.ledger.apply_trade(trade)
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut PositionLedger {
        &mut self.ledger
    }

    fn ensure_accepting(&self) -> Result<()> {
        match self.state {
            InstanceState::Halted => Err(EngineError::Halted {
                instance_id: self.settings.instance_id.clone(),
                reason: self.halt_reason.clone().unwrap_or_default(),
            }),
            InstanceState::Stopped => {
                Err(EngineError::Stopped(self.settings.instance_id.clone()))
            }
            _ => Ok(()),
        }
    }

    fn reject(&mut self, rejection: Rejection) -> BarOutcome {
        *self
            .stats
            .rejections
            .entry(rejection.code().to_string())
            .or_default() += 1;
        self.transition(InstanceState::Rejected);
        log::info!(
            "[{}] Signal rejected: {}",
            self.settings.instance_id,
            rejection.code()
        );
        self.transition(InstanceState::Idle);
        BarOutcome::Rejected(rejection)
    }

    fn transition(&mut self, next: InstanceState) {
        log::debug!(
            "[{}] {} -> {}",
            self.settings.instance_id,
            self.state,
            next
        );
        self.state = next;
    }

    async fn halt(&mut self, reason: String) {
        let gate = self.gate.clone();
        let mut aggregate = gate.lock().await;
        self.halt_locked(&mut aggregate, reason);
    }

    fn halt_locked(&mut self, aggregate: &mut AccountAggregate, reason: String) {
        aggregate.mark_halted(&self.settings.instance_id, reason.clone());
        self.halt_reason = Some(reason);
        self.state = InstanceState::Halted;
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("instance_id", &self.settings.instance_id)
            .field("strategy", &self.adapter.strategy_name())
            .field("state", &self.state)
            .field("cash", &self.ledger.cash())
            .finish()
    }
}
