//! Bootstrap - engine setup from configuration
//!
//! Handles initial setup of an engine:
//! - Validating configuration
//! - Creating the shared aggregate, risk config handle and trade store
//! - Building one orchestrator per instance, fresh in backtest mode or
//!   rehydrated from the trade log in shadow and live mode

use crate::config::EngineConfig;
use crate::error::Result;
use crate::orchestrator::{InstanceSettings, Orchestrator};
use crate::rehydrator::Rehydrator;
use crate::store::{InMemoryTradeStore, JsonlTradeStore};
use cn5_clock::SystemClock;
use cn5_ports::{BarHistory, Clock, TradeStore};
use cn5_risk_manager::{AccountAggregate, RiskConfigHandle, RiskGate};
use std::sync::Arc;

/// Shared components of a running engine
pub struct EngineBootstrap {
    config: EngineConfig,
    gate: RiskGate,
    store: Arc<dyn TradeStore>,
}

impl EngineBootstrap {
    /// Validate configuration and create shared components
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn TradeStore> = match &config.trade_log {
            Some(path) => Arc::new(JsonlTradeStore::new(path)),
            None => Arc::new(InMemoryTradeStore::new()),
        };
        Ok(Self::with_store(config, store))
    }

    /// Use an explicit trade store instead of the configured one
    pub fn with_store(config: EngineConfig, store: Arc<dyn TradeStore>) -> Self {
        let gate = RiskGate::new(
            AccountAggregate::shared(),
            RiskConfigHandle::new(config.risk.clone()),
        );
        Self {
            config,
            gate,
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate(&self) -> &RiskGate {
        &self.gate
    }

    pub fn store(&self) -> Arc<dyn TradeStore> {
        self.store.clone()
    }

    /// Build every instance against wall-clock time, for a process starting
    /// up in shadow or live mode
    pub async fn build_now(&self, history: Arc<dyn BarHistory>) -> Result<Vec<Orchestrator>> {
        self.build(history, Arc::new(SystemClock::new())).await
    }

    /// Build every configured instance, stopping at the first startup error
    pub async fn build(
        &self,
        history: Arc<dyn BarHistory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Vec<Orchestrator>> {
        let mode = self.config.mode;
        let rehydrator = Rehydrator::new(self.store.clone(), history, clock)
            .with_config(self.config.rehydration.clone());

        let mut orchestrators = Vec::with_capacity(self.config.instances.len());
        for instance in &self.config.instances {
            let settings = InstanceSettings::new(
                instance.id.clone(),
                instance.symbols.clone(),
                instance.initial_capital,
            )
            .with_account(mode.account_tag());
            let strategy = instance.strategy.build();

            let orchestrator = if mode.rehydrates() {
                rehydrator
                    .rehydrate(
                        settings,
                        strategy,
                        self.config.market.clone(),
                        self.gate.clone(),
                    )
                    .await?
            } else {
                let orchestrator = Orchestrator::new(
                    settings,
                    strategy,
                    self.config.market.clone(),
                    self.gate.clone(),
                    self.store.clone(),
                );
                orchestrator.publish().await;
                orchestrator
            };

            log::info!(
                "Instance {} ready ({:?} mode, {})",
                instance.id,
                mode,
                orchestrator.adapter().strategy_name()
            );
            orchestrators.push(orchestrator);
        }

        Ok(orchestrators)
    }
}
