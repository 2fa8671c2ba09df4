//! Strategy Trait
//!
//! A strategy sees one bar at a time, plus the indicator values and position
//! the adapter hands it. It has no access to history, the clock, or any I/O,
//! which is what makes live trading and backtests take the same decisions.

use crate::indicators::{IndicatorRegistry, IndicatorView};
use cn5_core::{Bar, Position, Quantity, Signal};
use rust_decimal::Decimal;

/// Read-only context for one bar
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    /// Indicator values for the bar's symbol, updated with this bar
    pub indicators: IndicatorView<'a>,
    /// Current holding of the bar's symbol
    pub position: Option<&'a Position>,
}

impl BarContext<'_> {
    pub fn held(&self) -> Quantity {
        self.position.map(|p| p.quantity).unwrap_or(Decimal::ZERO)
    }

    /// Shares that can be sold this session
    pub fn sellable(&self) -> Quantity {
        self.position.map(|p| p.available()).unwrap_or(Decimal::ZERO)
    }

    pub fn is_flat(&self) -> bool {
        self.held().is_zero()
    }
}

/// Trading strategy interface
///
/// Strategies must be deterministic in their inputs: given the same bars,
/// indicator values and positions they must emit the same signals.
pub trait Strategy: Send + Sync {
    /// Strategy name (for logging)
    fn name(&self) -> &str;

    /// Declare rolling indicators. Called once, before the first bar.
    fn register(&self, indicators: &mut IndicatorRegistry);

    /// Decide on one bar. Return [`Signal::hold`] to do nothing.
    fn on_bar(&mut self, bar: &Bar, ctx: &BarContext<'_>) -> Signal;
}
