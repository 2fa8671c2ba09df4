//! Rolling indicators
//!
//! Strategies declare the indicators they need once, at registration. The
//! adapter then feeds every bar's adjusted close through them before the
//! strategy sees the bar, so a strategy can only read values derived from
//! bars up to and including the current one.

use cn5_core::{Price, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};

/// Indicator kinds with their lookback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    /// Simple moving average over `n` bars
    Sma(usize),
    /// Exponential moving average, seeded with the first `n`-bar SMA
    Ema(usize),
}

impl IndicatorKind {
    pub fn period(&self) -> usize {
        match self {
            IndicatorKind::Sma(n) | IndicatorKind::Ema(n) => *n,
        }
    }
}

/// Declarations collected from a strategy's `register` call
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    specs: Vec<(String, IndicatorKind)>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sma(&mut self, name: impl Into<String>, period: usize) -> &mut Self {
        self.register(name, IndicatorKind::Sma(period))
    }

    pub fn ema(&mut self, name: impl Into<String>, period: usize) -> &mut Self {
        self.register(name, IndicatorKind::Ema(period))
    }

    pub fn register(&mut self, name: impl Into<String>, kind: IndicatorKind) -> &mut Self {
        let name = name.into();
        self.specs.retain(|(existing, _)| existing != &name);
        self.specs.push((name, kind.clamped()));
        self
    }

    pub fn specs(&self) -> &[(String, IndicatorKind)] {
        &self.specs
    }

    /// Longest lookback declared; bars needed before every value is warm
    pub fn warmup_bars(&self) -> usize {
        self.specs.iter().map(|(_, k)| k.period()).max().unwrap_or(0)
    }
}

impl IndicatorKind {
    fn clamped(self) -> Self {
        match self {
            IndicatorKind::Sma(n) => IndicatorKind::Sma(n.max(1)),
            IndicatorKind::Ema(n) => IndicatorKind::Ema(n.max(1)),
        }
    }
}

#[derive(Debug, Clone)]
enum Rolling {
    Sma {
        period: usize,
        window: VecDeque<Decimal>,
        sum: Decimal,
    },
    Ema {
        period: usize,
        alpha: Decimal,
        seed: Vec<Decimal>,
        value: Option<Decimal>,
    },
}

impl Rolling {
    fn new(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Sma(period) => Rolling::Sma {
                period,
                window: VecDeque::with_capacity(period),
                sum: Decimal::ZERO,
            },
            IndicatorKind::Ema(period) => Rolling::Ema {
                period,
                alpha: dec!(2) / Decimal::from(period as u64 + 1),
                seed: Vec::with_capacity(period),
                value: None,
            },
        }
    }

    fn update(&mut self, x: Decimal) -> Option<Decimal> {
        match self {
            Rolling::Sma {
                period,
                window,
                sum,
            } => {
                window.push_back(x);
                *sum += x;
                if window.len() > *period {
                    if let Some(old) = window.pop_front() {
                        *sum -= old;
                    }
                }
                (window.len() == *period).then(|| *sum / Decimal::from(*period as u64))
            }
            Rolling::Ema {
                period,
                alpha,
                seed,
                value,
            } => {
                *value = match *value {
                    Some(prev) => Some(*alpha * x + (Decimal::ONE - *alpha) * prev),
                    None => {
                        seed.push(x);
                        (seed.len() == *period).then(|| {
                            seed.iter().copied().sum::<Decimal>() / Decimal::from(*period as u64)
                        })
                    }
                };
                *value
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    rolling: Rolling,
    current: Option<Decimal>,
    previous: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
struct SymbolIndicators {
    bars_seen: u64,
    values: HashMap<String, Tracked>,
}

/// Live indicator state for every symbol an instance trades
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    registry: IndicatorRegistry,
    symbols: HashMap<Symbol, SymbolIndicators>,
}

impl IndicatorSet {
    pub fn new(registry: IndicatorRegistry) -> Self {
        Self {
            registry,
            symbols: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    /// Feed one observation for a symbol
    pub fn update(&mut self, symbol: &str, value: Price) {
        let registry = &self.registry;
        let entry = self
            .symbols
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolIndicators {
                bars_seen: 0,
                values: registry
                    .specs()
                    .iter()
                    .map(|(name, kind)| {
                        (
                            name.clone(),
                            Tracked {
                                rolling: Rolling::new(*kind),
                                current: None,
                                previous: None,
                            },
                        )
                    })
                    .collect(),
            });

        entry.bars_seen += 1;
        for tracked in entry.values.values_mut() {
            tracked.previous = tracked.current;
            tracked.current = tracked.rolling.update(value);
        }
    }

    /// Read-only view for one symbol
    pub fn view(&self, symbol: &str) -> IndicatorView<'_> {
        IndicatorView {
            inner: self.symbols.get(symbol),
        }
    }
}

/// What a strategy may read: indicator values, never raw history
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView<'a> {
    inner: Option<&'a SymbolIndicators>,
}

impl IndicatorView<'_> {
    /// Value after the current bar, `None` until warmed up
    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.inner?.values.get(name)?.current
    }

    /// Value after the previous bar
    pub fn previous(&self, name: &str) -> Option<Decimal> {
        self.inner?.values.get(name)?.previous
    }

    pub fn bars_seen(&self) -> u64 {
        self.inner.map(|s| s.bars_seen).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_warms_up_then_rolls() {
        let mut registry = IndicatorRegistry::new();
        registry.sma("sma3", 3);
        let mut set = IndicatorSet::new(registry);

        set.update("SH600000", dec!(1));
        set.update("SH600000", dec!(2));
        assert_eq!(set.view("SH600000").get("sma3"), None);

        set.update("SH600000", dec!(3));
        assert_eq!(set.view("SH600000").get("sma3"), Some(dec!(2)));

        set.update("SH600000", dec!(7));
        let view = set.view("SH600000");
        assert_eq!(view.get("sma3"), Some(dec!(4)));
        assert_eq!(view.previous("sma3"), Some(dec!(2)));
        assert_eq!(view.bars_seen(), 4);
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let mut registry = IndicatorRegistry::new();
        registry.ema("ema3", 3);
        let mut set = IndicatorSet::new(registry);

        for x in [dec!(2), dec!(4), dec!(6)] {
            set.update("SZ000001", x);
        }
        assert_eq!(set.view("SZ000001").get("ema3"), Some(dec!(4)));

        // alpha = 0.5
        set.update("SZ000001", dec!(8));
        assert_eq!(set.view("SZ000001").get("ema3"), Some(dec!(6)));
    }

    #[test]
    fn test_symbols_are_independent() {
        let mut registry = IndicatorRegistry::new();
        registry.sma("sma1", 1);
        let mut set = IndicatorSet::new(registry);
        set.update("A", dec!(10));
        set.update("B", dec!(20));
        assert_eq!(set.view("A").get("sma1"), Some(dec!(10)));
        assert_eq!(set.view("B").get("sma1"), Some(dec!(20)));
        assert_eq!(set.view("C").get("sma1"), None);
    }

    #[test]
    fn test_warmup_is_longest_period() {
        let mut registry = IndicatorRegistry::new();
        registry.sma("fast", 5).ema("slow", 20);
        assert_eq!(registry.warmup_bars(), 20);
    }
}
