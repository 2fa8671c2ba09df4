use crate::error::{DataError, DataResult};
use crate::session::trading_day;
use crate::values::{Price, Quantity, Symbol, Timestamp, TradingDay};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a single symbol.
///
/// Prices are as-traded (unadjusted) and drive fills, bands and marks.
/// `adjustment_factor` is the cumulative forward-adjustment factor; indicator
/// inputs use [`Bar::adjusted_close`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: Symbol,
    pub timestamp: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Quantity,
    #[serde(default = "default_adjustment_factor")]
    pub adjustment_factor: Decimal,
}

fn default_adjustment_factor() -> Decimal {
    Decimal::ONE
}

impl Bar {
    pub fn new(
        symbol: impl Into<Symbol>,
        timestamp: Timestamp,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            adjustment_factor: Decimal::ONE,
        }
    }

    /// Flat bar where open = high = low = close
    pub fn flat(
        symbol: impl Into<Symbol>,
        timestamp: Timestamp,
        price: Price,
        volume: Quantity,
    ) -> Self {
        Self::new(symbol, timestamp, price, price, price, price, volume)
    }

    pub fn with_adjustment_factor(mut self, factor: Decimal) -> Self {
        self.adjustment_factor = factor;
        self
    }

    /// Close adjusted for corporate actions. A zero factor means unadjusted.
    pub fn adjusted_close(&self) -> Price {
        if self.adjustment_factor > Decimal::ZERO {
            self.close * self.adjustment_factor
        } else {
            self.close
        }
    }

    pub fn trading_day(&self) -> TradingDay {
        trading_day(self.timestamp)
    }

    /// Zero volume marks a suspended (halted) session for the symbol
    pub fn is_suspended(&self) -> bool {
        self.volume.is_zero()
    }

    /// Check OHLC consistency
    pub fn validate(&self) -> DataResult<()> {
        let fail = |reason: &str| {
            Err(DataError::MalformedBar {
                symbol: self.symbol.clone(),
                timestamp: self.timestamp,
                reason: reason.to_string(),
            })
        };

        if self.open <= Decimal::ZERO
            || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO
            || self.close <= Decimal::ZERO
        {
            return fail("prices must be positive");
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return fail("high below open/close/low");
        }
        if self.low > self.open.min(self.close) {
            return fail("low above open/close");
        }
        if self.volume < Decimal::ZERO {
            return fail("negative volume");
        }
        if self.adjustment_factor < Decimal::ZERO {
            return fail("negative adjustment factor");
        }
        Ok(())
    }
}
