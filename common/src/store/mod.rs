pub mod memory;

use crate::errors::StoreError;
use crate::types::cluster::{ClusterId, ClusterRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Whether a read should also claim exclusive ownership of the key for the
/// lifetime of the transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LockMode {
    /// A plain read; does not block concurrent writers.
    Default,
    /// Read with intent to write; excludes other `Update`-mode readers and
    /// writers of the same key until this transaction commits or aborts.
    Update,
}

#[async_trait]
pub trait StoreTransaction: Send {
    async fn try_get(
        &mut self,
        key: &ClusterId,
        lock_mode: LockMode,
    ) -> Result<Option<ClusterRecord>, StoreError>;

    async fn add(&mut self, key: ClusterId, value: ClusterRecord) -> Result<(), StoreError>;

    async fn set(&mut self, key: ClusterId, value: ClusterRecord) -> Result<(), StoreError>;

    async fn try_remove(&mut self, key: &ClusterId) -> Result<bool, StoreError>;

    /// Snapshot of every record, with this transaction's own uncommitted
    /// writes applied on top.
    async fn enumerate(&self) -> Result<Vec<ClusterRecord>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn abort(self: Box<Self>);
}

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read-only snapshot, outside of any transaction.
    async fn enumerate(&self) -> Result<Vec<ClusterRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn begin_transaction(&self) -> Box<dyn StoreTransaction>;
}

#[async_trait]
pub trait StoreManager: Send + Sync {
    async fn get_or_create_dictionary(&self, name: &str) -> Arc<dyn DurableStore>;
}
