use crate::values::{InstanceId, Money, Timestamp, TradingDay};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-instance capital and PnL snapshot.
///
/// `cash + market value - initial_capital == total_pnl()` holds after every
/// bar and every trade. Positions are costed at fill price, so buy fees are
/// tracked separately in `buy_fees` and charged against total PnL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub instance_id: InstanceId,
    pub initial_capital: Money,
    pub cash: Money,
    /// Cost basis of all open holdings
    pub allocated_capital: Money,
    pub realized_pnl: Money,
    pub unrealized_pnl: Money,
    /// Commissions paid on buys, not part of any position's cost
    #[serde(default)]
    pub buy_fees: Money,
    /// Total PnL at the start of the current trading day
    pub day_start_pnl: Money,
    /// Total PnL accrued since the start of the trading day
    pub daily_pnl: Money,
    /// Timestamps of trades within the trailing frequency window
    pub recent_trades: Vec<Timestamp>,
    pub trading_day: Option<TradingDay>,
    pub updated_at: Option<Timestamp>,
}

impl AccountState {
    pub fn new(instance_id: impl Into<InstanceId>, initial_capital: Money) -> Self {
        Self {
            instance_id: instance_id.into(),
            initial_capital,
            cash: initial_capital,
            allocated_capital: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            buy_fees: Decimal::ZERO,
            day_start_pnl: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            recent_trades: Vec::new(),
            trading_day: None,
            updated_at: None,
        }
    }

    pub fn total_pnl(&self) -> Money {
        self.realized_pnl + self.unrealized_pnl - self.buy_fees
    }

    pub fn equity(&self) -> Money {
        self.initial_capital + self.total_pnl()
    }

    /// Trades strictly after `since`
    pub fn trades_since(&self, since: Timestamp) -> usize {
        self.recent_trades.iter().filter(|t| **t > since).count()
    }
}
