//! Bar sources and history adapters

use async_trait::async_trait;
use cn5_core::{Bar, Symbol, Timestamp};
use cn5_ports::{BarHistory, BarSource, HistoryError, HistoryResult};
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Finite, restartable source over a recorded bar sequence
#[derive(Debug, Clone)]
pub struct HistoricalBars {
    bars: Vec<Bar>,
    cursor: usize,
}

impl HistoricalBars {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, cursor: 0 }
    }

    /// Start again from the first bar
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn remaining(&self) -> usize {
        self.bars.len() - self.cursor
    }
}

#[async_trait]
impl BarSource for HistoricalBars {
    async fn next_bar(&mut self) -> Option<Bar> {
        let bar = self.bars.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(bar)
    }

    fn name(&self) -> &str {
        "HistoricalBars"
    }
}

/// Live source fed by a market-data task over a channel
pub struct ChannelBarSource {
    rx: mpsc::UnboundedReceiver<Bar>,
}

impl ChannelBarSource {
    /// Create a connected (sender, source) pair
    pub fn channel() -> (mpsc::UnboundedSender<Bar>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl BarSource for ChannelBarSource {
    async fn next_bar(&mut self) -> Option<Bar> {
        self.rx.recv().await
    }

    fn name(&self) -> &str {
        "ChannelBarSource"
    }
}

/// Bar history held in memory, per symbol and sorted by timestamp
#[derive(Default)]
pub struct InMemoryBarHistory {
    bars: DashMap<Symbol, Vec<Bar>>,
}

impl InMemoryBarHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        let history = Self::new();
        history.extend(bars);
        history
    }

    pub fn extend(&self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.bars.entry(bar.symbol.clone()).or_default().push(bar);
        }
        for mut series in self.bars.iter_mut() {
            series.sort_by_key(|bar| bar.timestamp);
        }
    }
}

#[async_trait]
impl BarHistory for InMemoryBarHistory {
    async fn bars_between(
        &self,
        symbol: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> HistoryResult<Vec<Bar>> {
        let series = self
            .bars
            .get(symbol)
            .ok_or_else(|| HistoryError::Unavailable(symbol.to_string()))?;

        Ok(series
            .iter()
            .filter(|bar| bar.timestamp >= from && bar.timestamp < to)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar(symbol: &str, minute: i64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 2, 0, 0).unwrap() + Duration::minutes(minute);
        Bar::flat(symbol, ts, dec!(10), dec!(1000))
    }

    #[tokio::test]
    async fn test_historical_bars_rewind() {
        let mut source = HistoricalBars::new(vec![bar("A", 0), bar("A", 1)]);

        assert_eq!(source.next_bar().await.unwrap().timestamp, bar("A", 0).timestamp);
        assert_eq!(source.remaining(), 1);
        assert!(source.next_bar().await.is_some());
        assert!(source.next_bar().await.is_none());

        source.rewind();
        assert_eq!(source.remaining(), 2);
    }

    #[tokio::test]
    async fn test_channel_source_closes_with_sender() {
        let (tx, mut source) = ChannelBarSource::channel();
        tx.send(bar("A", 0)).unwrap();
        drop(tx);

        assert!(source.next_bar().await.is_some());
        assert!(source.next_bar().await.is_none());
    }

    #[tokio::test]
    async fn test_history_range_is_half_open() {
        let history = InMemoryBarHistory::from_bars(vec![bar("A", 2), bar("A", 0), bar("A", 1)]);

        let bars = history
            .bars_between("A", bar("A", 0).timestamp, bar("A", 2).timestamp)
            .await
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);

        let missing = history
            .bars_between("B", bar("A", 0).timestamp, bar("A", 2).timestamp)
            .await;
        assert_eq!(missing, Err(HistoryError::Unavailable("B".to_string())));
    }
}
