//! Risk score
//!
//! Weighted sum of each rule's proximity to its limit. Proximity is 0 when
//! far from the limit and 1 at or beyond it. Weights sum to 100.

use cn5_core::RiskRule;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Weight of a rule in the 0-100 score
pub fn rule_weight(rule: RiskRule) -> u8 {
    match rule {
        RiskRule::TotalStopLoss => 20,
        RiskRule::Blacklisted => 10,
        RiskRule::DailyLossLimit => 15,
        RiskRule::StrategyCapitalExceeded => 15,
        RiskRule::SingleTradeTooLarge => 20,
        RiskRule::TradeFrequencyExceeded => 10,
        RiskRule::PriceLimit => 10,
    }
}

/// Accumulates per-rule proximities
#[derive(Debug, Clone, Default)]
pub struct RiskScore {
    total: Decimal,
}

impl RiskScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: RiskRule, proximity: Decimal) {
        let clipped = proximity.max(Decimal::ZERO).min(Decimal::ONE);
        self.total += clipped * Decimal::from(rule_weight(rule));
    }

    pub fn value(&self) -> u8 {
        self.total
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u8()
            .unwrap_or(100)
            .min(100)
    }
}
