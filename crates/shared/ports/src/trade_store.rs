use crate::error::StoreResult;
use async_trait::async_trait;
use cn5_core::Trade;

/// Append-only trade log.
///
/// `append` must be durable once it returns `Ok`: the engine applies a trade
/// to its in-memory ledger only after it has been persisted.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn append(&self, trade: &Trade) -> StoreResult<()>;

    /// All trades of an instance in append order
    async fn trades_for(&self, instance_id: &str) -> StoreResult<Vec<Trade>>;
}
