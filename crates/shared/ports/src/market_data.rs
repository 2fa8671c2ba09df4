use crate::error::HistoryResult;
use async_trait::async_trait;
use cn5_core::{Bar, Timestamp};

/// Ordered stream of bars for one strategy instance.
///
/// Historical sources are finite and restartable; live sources block until
/// the next bar arrives and are not restartable. `None` means the source is
/// exhausted or closed.
#[async_trait]
pub trait BarSource: Send {
    async fn next_bar(&mut self) -> Option<Bar>;

    fn name(&self) -> &str {
        "BarSource"
    }
}

/// Random access to stored history, used for warm-up and rehydration
#[async_trait]
pub trait BarHistory: Send + Sync {
    /// Bars for `symbol` with `from <= timestamp < to`, oldest first
    async fn bars_between(
        &self,
        symbol: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> HistoryResult<Vec<Bar>>;
}
