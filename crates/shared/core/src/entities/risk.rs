use crate::values::{Money, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Risk limits shared by every instance. Rates are fractions of `total_capital`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub total_capital: Money,
    pub max_total_loss_rate: Decimal,
    pub max_daily_loss_rate: Decimal,
    pub max_strategy_capital_rate: Decimal,
    pub max_single_trade_rate: Decimal,
    pub max_trades_per_hour: u32,
    pub blacklist: HashSet<Symbol>,
    /// Treat every special-treatment (ST) symbol as blacklisted
    pub block_special_treatment: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            total_capital: dec!(100000),
            max_total_loss_rate: dec!(0.10),
            max_daily_loss_rate: dec!(0.05),
            max_strategy_capital_rate: dec!(0.30),
            max_single_trade_rate: dec!(0.20),
            max_trades_per_hour: 20,
            blacklist: HashSet::new(),
            block_special_treatment: false,
        }
    }
}

impl RiskConfig {
    /// Trailing window of the trade-frequency rule
    pub const FREQUENCY_WINDOW_MINUTES: i64 = 60;

    pub fn with_total_capital(mut self, capital: Money) -> Self {
        self.total_capital = capital;
        self
    }

    pub fn with_blacklisted(mut self, symbol: impl Into<Symbol>) -> Self {
        self.blacklist.insert(symbol.into());
        self
    }

    pub fn with_max_trades_per_hour(mut self, max: u32) -> Self {
        self.max_trades_per_hour = max;
        self
    }

    pub fn total_loss_limit(&self) -> Money {
        self.total_capital * self.max_total_loss_rate
    }

    pub fn daily_loss_limit(&self) -> Money {
        self.total_capital * self.max_daily_loss_rate
    }
}

/// The seven pre-trade rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskRule {
    TotalStopLoss,
    Blacklisted,
    DailyLossLimit,
    StrategyCapitalExceeded,
    SingleTradeTooLarge,
    TradeFrequencyExceeded,
    PriceLimit,
}

impl RiskRule {
    pub const ALL: [RiskRule; 7] = [
        RiskRule::TotalStopLoss,
        RiskRule::Blacklisted,
        RiskRule::DailyLossLimit,
        RiskRule::StrategyCapitalExceeded,
        RiskRule::SingleTradeTooLarge,
        RiskRule::TradeFrequencyExceeded,
        RiskRule::PriceLimit,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RiskRule::TotalStopLoss => "TOTAL_STOP_LOSS",
            RiskRule::Blacklisted => "BLACKLISTED",
            RiskRule::DailyLossLimit => "DAILY_LOSS_LIMIT",
            RiskRule::StrategyCapitalExceeded => "STRATEGY_CAPITAL_EXCEEDED",
            RiskRule::SingleTradeTooLarge => "SINGLE_TRADE_TOO_LARGE",
            RiskRule::TradeFrequencyExceeded => "TRADE_FREQUENCY_EXCEEDED",
            RiskRule::PriceLimit => "PRICE_LIMIT",
        }
    }

    /// Hard rules stop evaluation on breach; the daily loss rule rejects the
    /// order but lets the remaining rules report.
    pub fn is_hard(&self) -> bool {
        !matches!(self, RiskRule::DailyLossLimit)
    }
}

impl fmt::Display for RiskRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One breached rule with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBreach {
    pub rule: RiskRule,
    pub message: String,
}

/// Outcome of validating a candidate order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub passed: bool,
    /// Aggregate proximity to all limits, 0 (far) to 100 (at every limit)
    pub risk_score: u8,
    pub reason: Option<String>,
    /// First rule that rejected the order
    pub triggered_rule: Option<RiskRule>,
    /// Every breach seen before evaluation stopped
    pub breaches: Vec<RuleBreach>,
}

impl RiskVerdict {
    pub fn pass(risk_score: u8) -> Self {
        Self {
            passed: true,
            risk_score,
            reason: None,
            triggered_rule: None,
            breaches: Vec::new(),
        }
    }

    pub fn reject(risk_score: u8, breaches: Vec<RuleBreach>) -> Self {
        let first = breaches.first();
        Self {
            passed: false,
            risk_score,
            reason: first.map(|b| b.message.clone()),
            triggered_rule: first.map(|b| b.rule),
            breaches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = RiskConfig::default();
        assert_eq!(config.total_loss_limit(), dec!(10000));
        assert_eq!(config.daily_loss_limit(), dec!(5000));
        assert_eq!(config.max_trades_per_hour, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RiskConfig =
            serde_json::from_str(r#"{"total_capital":"200000","blacklist":["SZ000002"]}"#)
                .unwrap();
        assert_eq!(config.total_capital, dec!(200000));
        assert_eq!(config.max_daily_loss_rate, dec!(0.05));
        assert!(config.blacklist.contains("SZ000002"));
    }

    #[test]
    fn test_verdict_reject_takes_first_breach() {
        let verdict = RiskVerdict::reject(
            80,
            vec![
                RuleBreach {
                    rule: RiskRule::DailyLossLimit,
                    message: "daily".into(),
                },
                RuleBreach {
                    rule: RiskRule::SingleTradeTooLarge,
                    message: "single".into(),
                },
            ],
        );
        assert!(!verdict.passed);
        assert_eq!(verdict.triggered_rule, Some(RiskRule::DailyLossLimit));
        assert_eq!(verdict.reason.as_deref(), Some("daily"));
    }
}
