use crate::fees::{FeeSchedule, round_money};
use crate::limits::LimitRates;
use cn5_core::{
    Bar, Board, CandidateOrder, MarketRejection, Money, OrderSize, Position, Price, Quantity,
    Side, Signal,
};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Market-structure constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketRules {
    /// Buy quantities must be a multiple of this
    pub lot_size: Quantity,
    pub limits: LimitRates,
    pub fees: FeeSchedule,
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            lot_size: dec!(100),
            limits: LimitRates::default(),
            fees: FeeSchedule::default(),
        }
    }
}

impl MarketRules {
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }
}

/// Everything the rule engine needs to know about the moment of the signal
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub bar: &'a Bar,
    /// Close of the previous session; no band check without it
    pub prior_close: Option<Price>,
    pub position: Option<&'a Position>,
    pub available_cash: Money,
}

/// Pure resolver from signal to candidate order
#[derive(Debug, Clone, Default)]
pub struct MarketRuleEngine {
    rules: MarketRules,
}

impl MarketRuleEngine {
    pub fn new(rules: MarketRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &MarketRules {
        &self.rules
    }

    /// Apply A-share rules to a signal. Rejections are reject-only: no
    /// partial fills at the limit, no quantity trimming beyond lot flooring.
    pub fn resolve(
        &self,
        signal: &Signal,
        ctx: &MarketContext<'_>,
    ) -> Result<CandidateOrder, MarketRejection> {
        let side = signal.side().ok_or(MarketRejection::InvalidQuantity)?;
        let bar = ctx.bar;

        if bar.is_suspended() {
            return Err(MarketRejection::Suspended);
        }

        let reference_price = signal.limit_price.unwrap_or(bar.close);
        if reference_price <= Decimal::ZERO {
            return Err(MarketRejection::InvalidPrice);
        }

        let board = Board::classify(&signal.symbol);
        let band = ctx
            .prior_close
            .map(|prior| self.rules.limits.band(board, prior));
        if let Some(band) = band {
            if band.is_locked(side, reference_price) {
                return Err(MarketRejection::LimitLocked {
                    side,
                    price: reference_price,
                    band,
                });
            }
        }

        let requested = match signal.size {
            OrderSize::Shares(q) => Some(q),
            OrderSize::Notional(amount) => amount.checked_div(reference_price),
        }
        .ok_or(MarketRejection::InvalidQuantity)?
        .floor();

        let quantity = match side {
            Side::Buy => self.round_to_lot(requested)?,
            Side::Sell => self.check_sellable(requested, ctx.position)?,
        };

        // Sizes no account could fund are rejected rather than overflowing
        let fill_price = self
            .rules
            .fees
            .fill_price(side, reference_price)
            .ok_or(MarketRejection::InvalidPrice)?;
        let notional = fill_price
            .checked_mul(quantity)
            .ok_or(MarketRejection::InvalidQuantity)?;
        let commission = self.rules.fees.commission(notional);
        let stamp_tax = self.rules.fees.stamp_tax(side, notional);

        if side == Side::Buy {
            let required = notional
                .checked_add(commission + stamp_tax)
                .ok_or(MarketRejection::InvalidQuantity)?;
            if required > ctx.available_cash {
                return Err(MarketRejection::InsufficientCash {
                    required,
                    available: ctx.available_cash,
                });
            }
        }

        let order = CandidateOrder {
            symbol: signal.symbol.clone(),
            side,
            quantity,
            reference_price,
            fill_price,
            commission,
            stamp_tax,
            slippage_cost: round_money((fill_price - reference_price).abs() * quantity),
            board,
            band,
            timestamp: bar.timestamp,
        };
        debug!(
            "[RULES] {} {} {} @ {} (ref {}) fees {}",
            order.side,
            order.quantity,
            order.symbol,
            order.fill_price,
            order.reference_price,
            order.fees()
        );
        Ok(order)
    }

    /// Buys are floored to whole lots; anything under one lot is rejected
    fn round_to_lot(&self, requested: Quantity) -> Result<Quantity, MarketRejection> {
        let lot = self.rules.lot_size;
        if lot <= Decimal::ZERO {
            // lot rule disabled
            return if requested > Decimal::ZERO {
                Ok(requested)
            } else {
                Err(MarketRejection::InvalidQuantity)
            };
        }
        let lots = (requested / lot).floor();
        if lots < Decimal::ONE {
            return Err(MarketRejection::BelowMinLot { requested, lot });
        }
        Ok(lots * lot)
    }

    /// Sells may be odd lots but never exceed what is held and settled
    fn check_sellable(
        &self,
        requested: Quantity,
        position: Option<&Position>,
    ) -> Result<Quantity, MarketRejection> {
        if requested <= Decimal::ZERO {
            return Err(MarketRejection::InvalidQuantity);
        }
        let (held, available) = position
            .map(|p| (p.quantity, p.available()))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        if requested > held {
            return Err(MarketRejection::InsufficientPosition { requested, held });
        }
        if requested > available {
            return Err(MarketRejection::SettlementLocked {
                requested,
                available,
            });
        }
        Ok(requested)
    }
}
