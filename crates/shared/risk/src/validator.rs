use crate::score::RiskScore;
use cn5_core::{
    Board, CandidateOrder, Money, RiskConfig, RiskRule, RiskVerdict, RuleBreach, Side,
};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// PnL and activity figures the rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskExposure {
    /// Realized + unrealized PnL summed over every instance
    pub total_pnl: Money,
    /// Today's PnL summed over every instance
    pub daily_pnl: Money,
    /// Cost basis currently held by the ordering instance
    pub allocated_capital: Money,
    /// Trades by the ordering instance in the trailing hour
    pub trades_last_hour: usize,
}

/// Validates candidate orders against [`RiskConfig`]
///
/// This is stateless - the caller supplies a consistent exposure snapshot and
/// must hold it steady for the duration of the call.
pub struct RiskValidator;

impl RiskValidator {
    pub fn validate(
        order: &CandidateOrder,
        exposure: &RiskExposure,
        config: &RiskConfig,
    ) -> RiskVerdict {
        let capital = config.total_capital;
        let notional = order.notional();
        let is_buy = order.side == Side::Buy;

        let mut score = RiskScore::new();
        let mut breaches = Vec::new();

        for rule in RiskRule::ALL {
            let (proximity, breach) = match rule {
                RiskRule::TotalStopLoss => {
                    let limit = config.total_loss_limit();
                    let loss = (-exposure.total_pnl).max(Decimal::ZERO);
                    let breach = (is_buy && loss >= limit && limit > Decimal::ZERO).then(|| {
                        format!(
                            "Total loss {} reached stop {} ({}% of capital)",
                            loss,
                            limit,
                            config.max_total_loss_rate * dec!(100)
                        )
                    });
                    (ratio(loss, limit), breach)
                }
                RiskRule::Blacklisted => {
                    let listed = config.blacklist.contains(&order.symbol)
                        || (config.block_special_treatment
                            && order.board == Board::SpecialTreatment);
                    let breach = listed.then(|| format!("{} is blacklisted", order.symbol));
                    (if listed { Decimal::ONE } else { Decimal::ZERO }, breach)
                }
                RiskRule::DailyLossLimit => {
                    let limit = config.daily_loss_limit();
                    let loss = (-exposure.daily_pnl).max(Decimal::ZERO);
                    let breach = (is_buy && loss >= limit && limit > Decimal::ZERO).then(|| {
                        format!("Daily loss {} reached limit {}", loss, limit)
                    });
                    (ratio(loss, limit), breach)
                }
                RiskRule::StrategyCapitalExceeded => {
                    let after = if is_buy {
                        exposure.allocated_capital + notional
                    } else {
                        exposure.allocated_capital
                    };
                    let limit = capital * config.max_strategy_capital_rate;
                    let breach = (is_buy && after > limit).then(|| {
                        format!(
                            "Strategy allocation {} would exceed {} ({}% of capital)",
                            after,
                            limit,
                            config.max_strategy_capital_rate * dec!(100)
                        )
                    });
                    (ratio(after, limit), breach)
                }
                RiskRule::SingleTradeTooLarge => {
                    let limit = capital * config.max_single_trade_rate;
                    let breach = (notional > limit).then(|| {
                        format!("Trade value {} exceeds single-trade limit {}", notional, limit)
                    });
                    (ratio(notional, limit), breach)
                }
                RiskRule::TradeFrequencyExceeded => {
                    let max = config.max_trades_per_hour as usize;
                    let count = exposure.trades_last_hour;
                    let breach = (count >= max).then(|| {
                        format!("{} trades in the last hour, limit {}", count, max)
                    });
                    (
                        ratio(Decimal::from(count as u64), Decimal::from(max as u64)),
                        breach,
                    )
                }
                RiskRule::PriceLimit => {
                    let (proximity, locked) = match order.band {
                        Some(band) => {
                            let mid = (band.upper + band.lower) / dec!(2);
                            let p = match order.side {
                                Side::Buy => ratio(order.reference_price - mid, band.upper - mid),
                                Side::Sell => ratio(mid - order.reference_price, mid - band.lower),
                            };
                            (p, band.is_locked(order.side, order.reference_price))
                        }
                        None => (Decimal::ZERO, false),
                    };
                    let breach = locked.then(|| {
                        format!(
                            "{} {} at {} is at the daily price limit",
                            order.side, order.symbol, order.reference_price
                        )
                    });
                    (proximity, breach)
                }
            };

            score.add(rule, proximity);

            // Once a hard rule has rejected, later rules only contribute score
            let stopped = breaches.iter().any(|b: &RuleBreach| b.rule.is_hard());
            if let Some(message) = breach {
                if !stopped {
                    breaches.push(RuleBreach { rule, message });
                }
            }
        }

        let risk_score = score.value();
        if breaches.is_empty() {
            debug!(
                "[RISK] {} {} {} passed (score {})",
                order.side, order.quantity, order.symbol, risk_score
            );
            RiskVerdict::pass(risk_score)
        } else {
            let verdict = RiskVerdict::reject(risk_score, breaches);
            warn!(
                "[RISK REJECTED] {:?}: {}",
                verdict.triggered_rule,
                verdict.reason.as_deref().unwrap_or_default()
            );
            verdict
        }
    }
}

/// `value / limit`, zero when the limit is not positive
fn ratio(value: Decimal, limit: Decimal) -> Decimal {
    if limit > Decimal::ZERO {
        value / limit
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cn5_core::PriceBand;

    fn order(side: Side, quantity: Decimal, price: Decimal) -> CandidateOrder {
        CandidateOrder {
            symbol: "SH600000".to_string(),
            side,
            quantity,
            reference_price: price,
            fill_price: price,
            commission: dec!(5),
            stamp_tax: Decimal::ZERO,
            slippage_cost: Decimal::ZERO,
            board: Board::Main,
            band: Some(PriceBand {
                lower: dec!(9),
                upper: dec!(11),
            }),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap(),
        }
    }

    fn config() -> RiskConfig {
        RiskConfig::default().with_total_capital(dec!(100000))
    }

    #[test]
    fn test_small_buy_passes() {
        let _ = env_logger::try_init();
        let verdict = RiskValidator::validate(
            &order(Side::Buy, dec!(100), dec!(10)),
            &RiskExposure::default(),
            &config(),
        );
        assert!(verdict.passed);
        assert!(verdict.triggered_rule.is_none());
        assert!(verdict.risk_score < 10);
    }

    #[test]
    fn test_total_stop_blocks_buys_not_sells() {
        let exposure = RiskExposure {
            total_pnl: dec!(-10000),
            ..Default::default()
        };
        let buy = RiskValidator::validate(&order(Side::Buy, dec!(100), dec!(10)), &exposure, &config());
        assert!(!buy.passed);
        assert_eq!(buy.triggered_rule, Some(RiskRule::TotalStopLoss));
        // hard rule: nothing after it is reported
        assert_eq!(buy.breaches.len(), 1);

        let sell = RiskValidator::validate(&order(Side::Sell, dec!(100), dec!(10)), &exposure, &config());
        assert!(sell.passed);
        assert!(sell.risk_score >= 20);
    }

    #[test]
    fn test_blacklist_blocks_both_sides() {
        let cfg = config().with_blacklisted("SH600000");
        for side in [Side::Buy, Side::Sell] {
            let verdict =
                RiskValidator::validate(&order(side, dec!(100), dec!(10)), &RiskExposure::default(), &cfg);
            assert_eq!(verdict.triggered_rule, Some(RiskRule::Blacklisted));
        }
    }

    #[test]
    fn test_special_treatment_blocking_is_opt_in() {
        let mut st = order(Side::Buy, dec!(100), dec!(10));
        st.symbol = "*ST康美".to_string();
        st.board = Board::SpecialTreatment;

        let open = RiskValidator::validate(&st, &RiskExposure::default(), &config());
        assert!(open.passed);

        let mut cfg = config();
        cfg.block_special_treatment = true;
        let blocked = RiskValidator::validate(&st, &RiskExposure::default(), &cfg);
        assert_eq!(blocked.triggered_rule, Some(RiskRule::Blacklisted));
    }

    #[test]
    fn test_daily_loss_is_soft_and_later_rules_still_report() {
        let exposure = RiskExposure {
            daily_pnl: dec!(-5000),
            ..Default::default()
        };
        // 3000 shares at 10 = 30000 > 20% single trade limit
        let verdict =
            RiskValidator::validate(&order(Side::Buy, dec!(3000), dec!(10)), &exposure, &config());
        assert!(!verdict.passed);
        assert_eq!(verdict.triggered_rule, Some(RiskRule::DailyLossLimit));
        let rules: Vec<_> = verdict.breaches.iter().map(|b| b.rule).collect();
        assert_eq!(
            rules,
            vec![RiskRule::DailyLossLimit, RiskRule::SingleTradeTooLarge]
        );
    }

    #[test]
    fn test_strategy_capital_counts_existing_allocation() {
        let exposure = RiskExposure {
            allocated_capital: dec!(25000),
            ..Default::default()
        };
        let verdict =
            RiskValidator::validate(&order(Side::Buy, dec!(600), dec!(10)), &exposure, &config());
        assert_eq!(verdict.triggered_rule, Some(RiskRule::StrategyCapitalExceeded));

        let sell =
            RiskValidator::validate(&order(Side::Sell, dec!(600), dec!(10)), &exposure, &config());
        assert!(sell.passed);
    }

    #[test]
    fn test_single_trade_limit_applies_to_sells() {
        let verdict = RiskValidator::validate(
            &order(Side::Sell, dec!(2100), dec!(10)),
            &RiskExposure::default(),
            &config(),
        );
        assert_eq!(verdict.triggered_rule, Some(RiskRule::SingleTradeTooLarge));
    }

    #[test]
    fn test_frequency_limit() {
        let at_limit = RiskExposure {
            trades_last_hour: 20,
            ..Default::default()
        };
        let verdict =
            RiskValidator::validate(&order(Side::Buy, dec!(100), dec!(10)), &at_limit, &config());
        assert_eq!(verdict.triggered_rule, Some(RiskRule::TradeFrequencyExceeded));

        let below = RiskExposure {
            trades_last_hour: 19,
            ..Default::default()
        };
        assert!(RiskValidator::validate(&order(Side::Buy, dec!(100), dec!(10)), &below, &config()).passed);
    }

    #[test]
    fn test_price_limit_recheck() {
        let verdict = RiskValidator::validate(
            &order(Side::Buy, dec!(100), dec!(11)),
            &RiskExposure::default(),
            &config(),
        );
        assert_eq!(verdict.triggered_rule, Some(RiskRule::PriceLimit));
    }

    #[test]
    fn test_score_rises_with_proximity() {
        let calm = RiskValidator::validate(
            &order(Side::Buy, dec!(100), dec!(10)),
            &RiskExposure::default(),
            &config(),
        );
        let stressed = RiskValidator::validate(
            &order(Side::Buy, dec!(100), dec!(10.8)),
            &RiskExposure {
                total_pnl: dec!(-8000),
                daily_pnl: dec!(-2500),
                allocated_capital: dec!(20000),
                trades_last_hour: 15,
            },
            &config(),
        );
        assert!(stressed.passed);
        assert!(stressed.risk_score > calm.risk_score);
        assert!(stressed.risk_score > 50);
    }
}
