//! Cross-instance account aggregate

use chrono::Duration;
use cn5_core::{AccountState, InstanceId, Money, RiskConfig, Timestamp, trading_day};
use cn5_risk::RiskExposure;
use log::{error, info};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Aggregate guarded by one async mutex
pub type SharedAggregate = Arc<Mutex<AccountAggregate>>;

/// Trailing window of the trade-frequency rule
pub fn frequency_window() -> Duration {
    Duration::minutes(RiskConfig::FREQUENCY_WINDOW_MINUTES)
}

/// Latest published account state of every instance
#[derive(Debug, Default)]
pub struct AccountAggregate {
    accounts: HashMap<InstanceId, AccountState>,
    halted: HashMap<InstanceId, String>,
}

impl AccountAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedAggregate {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Replace an instance's state with a newer snapshot
    pub fn publish(&mut self, state: AccountState) {
        self.accounts.insert(state.instance_id.clone(), state);
    }

    pub fn account(&self, instance_id: &str) -> Option<&AccountState> {
        self.accounts.get(instance_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountState> {
        self.accounts.values()
    }

    /// Realized + unrealized PnL across every instance
    pub fn total_pnl(&self) -> Money {
        self.accounts.values().map(|a| a.total_pnl()).sum()
    }

    /// Today's PnL across every instance. Accounts that have not yet seen a
    /// bar of `now`'s trading day contribute nothing.
    pub fn daily_pnl(&self, now: Timestamp) -> Money {
        let today = trading_day(now);
        self.accounts
            .values()
            .filter(|a| a.trading_day == Some(today))
            .map(|a| a.daily_pnl)
            .sum()
    }

    /// Exposure snapshot for an order placed by `instance_id` at `now`
    pub fn exposure_for(&self, instance_id: &str, now: Timestamp) -> RiskExposure {
        let account = self.accounts.get(instance_id);
        RiskExposure {
            total_pnl: self.total_pnl(),
            daily_pnl: self.daily_pnl(now),
            allocated_capital: account
                .map(|a| a.allocated_capital)
                .unwrap_or(Decimal::ZERO),
            trades_last_hour: account
                .map(|a| a.trades_since(now - frequency_window()))
                .unwrap_or(0),
        }
    }

    /// Record that an instance stopped on an integrity or persistence failure
    pub fn mark_halted(&mut self, instance_id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        error!("[RISK] Instance {} halted: {}", instance_id, reason);
        self.halted.insert(instance_id.to_string(), reason);
    }

    pub fn halt_reason(&self, instance_id: &str) -> Option<&str> {
        self.halted.get(instance_id).map(String::as_str)
    }

    /// Drop an instance (explicit stop)
    pub fn remove(&mut self, instance_id: &str) -> Option<AccountState> {
        info!("[RISK] Instance {} removed from aggregate", instance_id);
        self.halted.remove(instance_id);
        self.accounts.remove(instance_id)
    }
}
