//! Live risk configuration
//!
//! Gating passes take an `Arc` snapshot once and use it throughout, so an
//! update never changes the limits halfway through a decision.

use cn5_core::RiskConfig;
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct RiskConfigHandle {
    current: Arc<RwLock<Arc<RiskConfig>>>,
    version: Arc<AtomicU64>,
}

impl RiskConfigHandle {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Config in force right now
    pub async fn snapshot(&self) -> Arc<RiskConfig> {
        self.current.read().await.clone()
    }

    /// Replace the config; passes already running keep their snapshot
    pub async fn update(&self, config: RiskConfig) -> u64 {
        let mut current = self.current.write().await;
        *current = Arc::new(config);
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        info!("[RISK] Risk config updated (v{})", version);
        version
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

impl Default for RiskConfigHandle {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_snapshot_survives_update() {
        let handle = RiskConfigHandle::default();
        let before = handle.snapshot().await;

        let version = handle
            .update(RiskConfig::default().with_total_capital(dec!(500000)))
            .await;
        assert_eq!(version, 1);

        assert_eq!(before.total_capital, dec!(100000));
        assert_eq!(handle.snapshot().await.total_capital, dec!(500000));
    }
}
