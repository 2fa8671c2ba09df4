//! Position Ledger
//!
//! Per-instance positions, cash and PnL. The ledger is a pure fold over the
//! instance's trade log: [`PositionLedger::apply_trade`] is the only way a
//! trade changes state, and it is the same call on the live path and during
//! restart rehydration.

use crate::error::{Error, Result};
use crate::position::PositionFold;
use chrono::Duration;
use cn5_core::{
    AccountState, AccountTag, Bar, CandidateOrder, InstanceId, Money, Position, RiskConfig,
    Side, Symbol, Timestamp, Trade, TradingDay, trading_day,
};
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    instance_id: InstanceId,
    positions: BTreeMap<Symbol, Position>,
    account: AccountState,
    last_trade_at: Option<Timestamp>,
}

impl PositionLedger {
    pub fn new(instance_id: impl Into<InstanceId>, initial_capital: Money) -> Self {
        let instance_id = instance_id.into();
        Self {
            account: AccountState::new(instance_id.clone(), initial_capital),
            instance_id,
            positions: BTreeMap::new(),
            last_trade_at: None,
        }
    }

    /// Rebuild a ledger from scratch by folding an ordered trade log
    pub fn fold(
        instance_id: impl Into<InstanceId>,
        initial_capital: Money,
        trades: &[Trade],
    ) -> Result<Self> {
        let mut ledger = Self::new(instance_id, initial_capital);
        for trade in trades {
            ledger.apply_trade(trade)?;
        }
        Ok(ledger)
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    /// Owned copy of the account state, for publishing
    pub fn snapshot(&self) -> AccountState {
        self.account.clone()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Open positions, ordered by symbol
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn cash(&self) -> Money {
        self.account.cash
    }

    pub fn last_trade_at(&self) -> Option<Timestamp> {
        self.last_trade_at
    }

    /// Start-of-bar housekeeping: roll the session if the bar opens a new
    /// trading day (clearing T+1 locks and the daily PnL baseline), then mark
    /// the bar's symbol to its close.
    pub fn begin_bar(&mut self, bar: &Bar) {
        self.roll_to(bar.trading_day());
        if let Some(pos) = self.positions.get_mut(&bar.symbol) {
            pos.last_price = bar.close;
        }
        self.touch(bar.timestamp);
        self.recompute();
    }

    /// Price a validated order into a trade. Pure: the ledger is unchanged.
    pub fn build_trade(&self, order: &CandidateOrder, account: AccountTag) -> Result<Trade> {
        let trade = Trade::from_order(self.instance_id.clone(), order, account);
        match order.side {
            Side::Buy => Ok(trade),
            Side::Sell => {
                let pos = self.sellable_position(&order.symbol, order.quantity)?;
                let realized =
                    pos.realized_for_sell(order.quantity, order.fill_price, order.fees());
                Ok(trade.with_realized_pnl(realized))
            }
        }
    }

    /// Fold one trade into the ledger
    pub fn apply_trade(&mut self, trade: &Trade) -> Result<()> {
        if trade.instance_id != self.instance_id {
            return Err(Error::ForeignTrade {
                trade_id: trade.id,
                expected: self.instance_id.clone(),
                found: trade.instance_id.clone(),
            });
        }
        if trade.quantity <= Decimal::ZERO || trade.price <= Decimal::ZERO {
            return Err(Error::InvalidTrade {
                trade_id: trade.id,
                reason: "quantity and price must be positive".to_string(),
            });
        }
        if let Some(previous) = self.last_trade_at {
            if trade.timestamp < previous {
                return Err(Error::OutOfOrder {
                    previous,
                    current: trade.timestamp,
                });
            }
        }

        let day = trading_day(trade.timestamp);
        self.roll_to(day);

        match trade.side {
            Side::Buy => {
                self.positions
                    .entry(trade.symbol.clone())
                    .or_insert_with(|| Position::new(trade.symbol.clone()))
                    .apply_buy(trade.quantity, trade.price, day);
                self.account.buy_fees += trade.fees();
            }
            Side::Sell => {
                let computed = self
                    .sellable_position(&trade.symbol, trade.quantity)?
                    .realized_for_sell(trade.quantity, trade.price, trade.fees());
                if let Some(recorded) = trade.realized_pnl {
                    if recorded != computed {
                        return Err(Error::RealizedMismatch {
                            trade_id: trade.id,
                            recorded,
                            computed,
                        });
                    }
                }
                if let Some(pos) = self.positions.get_mut(&trade.symbol) {
                    pos.apply_sell(trade.quantity, trade.price, trade.fees());
                    if pos.is_flat() {
                        self.positions.remove(&trade.symbol);
                    }
                }
                self.account.realized_pnl += computed;
            }
        }

        self.account.cash += trade.cash_delta();
        self.record_trade_time(trade.timestamp);
        self.last_trade_at = Some(trade.timestamp);
        self.touch(trade.timestamp);
        self.recompute();

        debug!(
            "[LEDGER] [{}] {} {} {} @ {} cash={} realized={}",
            self.instance_id,
            trade.side,
            trade.quantity,
            trade.symbol,
            trade.price,
            self.account.cash,
            self.account.realized_pnl
        );
        Ok(())
    }

    /// Recompute T+1 locks from the buys made on `today`
    pub fn rederive_locks(&mut self, trades: &[Trade], today: TradingDay) {
        for pos in self.positions.values_mut() {
            pos.locked_quantity = Decimal::ZERO;
            pos.lock_day = None;
        }
        for trade in trades
            .iter()
            .filter(|t| t.side == Side::Buy && trading_day(t.timestamp) == today)
        {
            if let Some(pos) = self.positions.get_mut(&trade.symbol) {
                pos.locked_quantity = (pos.locked_quantity + trade.quantity).min(pos.quantity);
                pos.lock_day = Some(today);
            }
        }
    }

    fn sellable_position(&self, symbol: &str, quantity: Decimal) -> Result<&Position> {
        match self.positions.get(symbol) {
            Some(pos) if quantity <= pos.quantity => Ok(pos),
            other => Err(Error::Oversell {
                symbol: symbol.to_string(),
                requested: quantity,
                held: other.map(|p| p.quantity).unwrap_or(Decimal::ZERO),
            }),
        }
    }

    /// Open a new session if `day` is later than the current one
    fn roll_to(&mut self, day: TradingDay) {
        if self.account.trading_day.is_some_and(|current| day <= current) {
            return;
        }
        let previous = self.account.trading_day.replace(day);

        for pos in self.positions.values_mut() {
            if pos.lock_day.is_some_and(|locked| locked < day) {
                pos.locked_quantity = Decimal::ZERO;
                pos.lock_day = None;
            }
        }

        self.recompute();
        self.account.day_start_pnl = self.account.total_pnl();
        self.account.daily_pnl = Decimal::ZERO;

        if let Some(previous) = previous {
            debug!(
                "[LEDGER] [{}] session {} -> {}, day-start PnL {}",
                self.instance_id, previous, day, self.account.day_start_pnl
            );
        }
    }

    fn record_trade_time(&mut self, ts: Timestamp) {
        let cutoff = ts - Duration::minutes(RiskConfig::FREQUENCY_WINDOW_MINUTES);
        self.account.recent_trades.retain(|t| *t > cutoff);
        self.account.recent_trades.push(ts);
    }

    fn touch(&mut self, ts: Timestamp) {
        if self.account.updated_at.is_none_or(|u| ts > u) {
            self.account.updated_at = Some(ts);
        }
    }

    fn recompute(&mut self) {
        let (basis, value) = self
            .positions
            .values()
            .fold((Decimal::ZERO, Decimal::ZERO), |(b, v), p| {
                (b + p.cost_basis(), v + p.market_value())
            });
        self.account.allocated_capital = basis;
        self.account.unrealized_pnl = value - basis;
        self.account.daily_pnl = self.account.total_pnl() - self.account.day_start_pnl;
    }
}
