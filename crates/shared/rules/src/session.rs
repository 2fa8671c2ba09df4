use cn5_core::{Bar, Price, Symbol, TradingDay};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct SymbolSession {
    day: TradingDay,
    prior_close: Option<Price>,
    last_close: Price,
}

/// Remembers each symbol's previous-session close, the anchor of the
/// daily price-limit band.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    sessions: HashMap<Symbol, SymbolSession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bar. The first bar of a new trading day rolls the last
    /// close of the previous day into the prior close.
    pub fn observe(&mut self, bar: &Bar) {
        let day = bar.trading_day();
        match self.sessions.get_mut(&bar.symbol) {
            Some(session) => {
                if day > session.day {
                    session.prior_close = Some(session.last_close);
                    session.day = day;
                }
                session.last_close = bar.close;
            }
            None => {
                self.sessions.insert(
                    bar.symbol.clone(),
                    SymbolSession {
                        day,
                        prior_close: None,
                        last_close: bar.close,
                    },
                );
            }
        }
    }

    /// Close of the session before the current one, if seen
    pub fn prior_close(&self, symbol: &str) -> Option<Price> {
        self.sessions.get(symbol).and_then(|s| s.prior_close)
    }
}
