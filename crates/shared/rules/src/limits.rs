use crate::fees::round_money;
use cn5_core::{Board, Price, PriceBand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Daily price-limit rate per board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitRates {
    pub main: Decimal,
    pub special_treatment: Decimal,
    pub growth: Decimal,
}

impl Default for LimitRates {
    fn default() -> Self {
        Self {
            main: dec!(0.10),
            special_treatment: dec!(0.05),
            growth: dec!(0.20),
        }
    }
}

impl LimitRates {
    pub fn rate(&self, board: Board) -> Decimal {
        match board {
            Board::Main => self.main,
            Board::SpecialTreatment => self.special_treatment,
            Board::Growth => self.growth,
        }
    }

    /// Limit band around `prior_close`, each side rounded to the tick
    pub fn band(&self, board: Board, prior_close: Price) -> PriceBand {
        let rate = self.rate(board);
        PriceBand {
            lower: round_money(prior_close * (Decimal::ONE - rate)),
            upper: round_money(prior_close * (Decimal::ONE + rate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_per_board() {
        let rates = LimitRates::default();

        let main = rates.band(Board::Main, dec!(10));
        assert_eq!((main.lower, main.upper), (dec!(9), dec!(11)));

        let st = rates.band(Board::SpecialTreatment, dec!(10));
        assert_eq!((st.lower, st.upper), (dec!(9.5), dec!(10.5)));

        let growth = rates.band(Board::Growth, dec!(10));
        assert_eq!((growth.lower, growth.upper), (dec!(8), dec!(12)));
    }

    #[test]
    fn test_band_rounds_to_tick() {
        let band = LimitRates::default().band(Board::Main, dec!(12.34));
        // 13.574 -> 13.57, 11.106 -> 11.11
        assert_eq!(band.upper, dec!(13.57));
        assert_eq!(band.lower, dec!(11.11));
    }
}
