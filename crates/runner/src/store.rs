//! Trade store adapters
//!
//! `InMemoryTradeStore` backs backtests and tests. `JsonlTradeStore` appends
//! one JSON object per line so a restarted process can rehydrate from disk.

use async_trait::async_trait;
use cn5_core::{InstanceId, Trade};
use cn5_ports::{StoreError, StoreResult, TradeStore};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// In-memory trade log keyed by instance
#[derive(Default)]
pub struct InMemoryTradeStore {
    trades: DashMap<InstanceId, Vec<Trade>>,
    fail_appends: AtomicBool,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail (storage outage simulation)
    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.trades.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn append(&self, trade: &Trade) -> StoreResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Io("trade store unavailable".to_string()));
        }

        let mut trades = self.trades.entry(trade.instance_id.clone()).or_default();
        if trades.iter().any(|t| t.id == trade.id) {
            return Err(StoreError::Duplicate {
                instance_id: trade.instance_id.clone(),
                trade_id: trade.id,
            });
        }
        trades.push(trade.clone());
        Ok(())
    }

    async fn trades_for(&self, instance_id: &str) -> StoreResult<Vec<Trade>> {
        Ok(self
            .trades
            .get(instance_id)
            .map(|trades| trades.value().clone())
            .unwrap_or_default())
    }
}

/// Append-only JSON-lines trade log shared by all instances
pub struct JsonlTradeStore {
    path: PathBuf,
    // Serializes appends so lines never interleave
    write_lock: Mutex<()>,
}

impl JsonlTradeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TradeStore for JsonlTradeStore {
    async fn append(&self, trade: &Trade) -> StoreResult<()> {
        let mut line =
            serde_json::to_string(trade).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        // Durable before the ledger applies the trade
        file.sync_data()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    async fn trades_for(&self, instance_id: &str) -> StoreResult<Vec<Trade>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(format!("{}: {}", self.path.display(), e)));
            }
        };

        let mut trades = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let trade: Trade = serde_json::from_str(line)
                .map_err(|e| StoreError::Corrupt(format!("line {}: {}", index + 1, e)))?;
            if trade.instance_id == instance_id {
                trades.push(trade);
            }
        }
        Ok(trades)
    }
}
