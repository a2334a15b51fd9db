use crate::errors::StoreError;
use crate::store::{DurableStore, LockMode, StoreManager, StoreTransaction};
use crate::types::cluster::{ClusterId, ClusterRecord};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

type RecordMap = BTreeMap<ClusterId, ClusterRecord>;

struct Inner {
    records: RwLock<RecordMap>,
    key_locks: std::sync::Mutex<HashMap<ClusterId, Arc<Mutex<()>>>>,
}

impl Inner {
    fn key_lock(&self, key: &ClusterId) -> Arc<Mutex<()>> {
        let mut guard = self.key_locks.lock().expect("key lock registry poisoned");
        guard.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

pub struct InMemoryStore {
    #[allow(dead_code)]
    name: String,
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(Inner {
                records: RwLock::new(BTreeMap::new()),
                key_locks: std::sync::Mutex::new(HashMap::new()),
            }),
        }
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn enumerate(&self) -> Result<Vec<ClusterRecord>, StoreError> {
        Ok(self.inner.records.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.records.read().await.len())
    }

    async fn begin_transaction(&self) -> Box<dyn StoreTransaction> {
        Box::new(InMemoryTransaction {
            inner: self.inner.clone(),
            overlay: HashMap::new(),
            held_locks: HashMap::new(),
        })
    }
}

struct InMemoryTransaction {
    inner: Arc<Inner>,
    /// `None` is a staged removal; `Some` is a staged insert/update.
    overlay: HashMap<ClusterId, Option<ClusterRecord>>,
    held_locks: HashMap<ClusterId, OwnedMutexGuard<()>>,
}

impl InMemoryTransaction {
    async fn ensure_locked(&mut self, key: &ClusterId) {
        if self.held_locks.contains_key(key) {
            return;
        }
        let lock = self.inner.key_lock(key);
        let guard = lock.lock_owned().await;
        self.held_locks.insert(key.clone(), guard);
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn try_get(
        &mut self,
        key: &ClusterId,
        lock_mode: LockMode,
    ) -> Result<Option<ClusterRecord>, StoreError> {
        if let Some(staged) = self.overlay.get(key) {
            return Ok(staged.clone());
        }
        if lock_mode == LockMode::Update {
            self.ensure_locked(key).await;
        }
        Ok(self.inner.records.read().await.get(key).cloned())
    }

    async fn add(&mut self, key: ClusterId, value: ClusterRecord) -> Result<(), StoreError> {
        self.ensure_locked(&key).await;
        self.overlay.insert(key, Some(value));
        Ok(())
    }

    async fn set(&mut self, key: ClusterId, value: ClusterRecord) -> Result<(), StoreError> {
        self.ensure_locked(&key).await;
        self.overlay.insert(key, Some(value));
        Ok(())
    }

    async fn try_remove(&mut self, key: &ClusterId) -> Result<bool, StoreError> {
        self.ensure_locked(key).await;
        let existed = match self.overlay.get(key) {
            Some(staged) => staged.is_some(),
            None => self.inner.records.read().await.contains_key(key),
        };
        self.overlay.insert(key.clone(), None);
        Ok(existed)
    }

    async fn enumerate(&self) -> Result<Vec<ClusterRecord>, StoreError> {
        let live = self.inner.records.read().await;
        let mut merged: BTreeMap<ClusterId, ClusterRecord> = live.clone();
        for (key, staged) in &self.overlay {
            match staged {
                Some(record) => {
                    merged.insert(key.clone(), record.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_values().collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut records = self.inner.records.write().await;
        for (key, staged) in self.overlay {
            match staged {
                Some(record) => {
                    records.insert(key, record);
                }
                None => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn abort(self: Box<Self>) {}
}

pub struct InMemoryStoreManager {
    dictionaries: std::sync::Mutex<HashMap<String, Arc<InMemoryStore>>>,
}

impl InMemoryStoreManager {
    pub fn new() -> Self {
        Self {
            dictionaries: std::sync::Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStoreManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreManager for InMemoryStoreManager {
    async fn get_or_create_dictionary(&self, name: &str) -> Arc<dyn DurableStore> {
        let mut guard = self.dictionaries.lock().expect("dictionary registry poisoned");
        let store = guard
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryStore::new(name)))
            .clone();
        store as Arc<dyn DurableStore>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cluster::ClusterStatus;

    fn record(id: &str) -> ClusterRecord {
        ClusterRecord::new(ClusterId::new(id))
    }

    #[tokio::test]
    async fn add_is_visible_after_commit() {
        let store = InMemoryStore::new("test");
        let mut tx = store.begin_transaction().await;
        tx.add(ClusterId::new("a"), record("a")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn abort_discards_staged_writes() {
        let store = InMemoryStore::new("test");
        let tx = store.begin_transaction().await;
        let mut tx = tx;
        tx.add(ClusterId::new("a"), record("a")).await.unwrap();
        tx.abort().await;

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_lock_serializes_concurrent_writers() {
        let store = Arc::new(InMemoryStore::new("test"));
        {
            let mut tx = store.begin_transaction().await;
            tx.add(ClusterId::new("a"), record("a")).await.unwrap();
            tx.commit().await.unwrap();
        }

        let store_a = store.clone();
        let first = tokio::spawn(async move {
            let mut tx = store_a.begin_transaction().await;
            let mut record = tx
                .try_get(&ClusterId::new("a"), LockMode::Update)
                .await
                .unwrap()
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            record.status = ClusterStatus::Ready;
            tx.set(ClusterId::new("a"), record).await.unwrap();
            tx.commit().await.unwrap();
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let store_b = store.clone();
        let second = tokio::spawn(async move {
            let mut tx = store_b.begin_transaction().await;
            let record = tx
                .try_get(&ClusterId::new("a"), LockMode::Update)
                .await
                .unwrap()
                .unwrap();
            // Blocked on the lock until `first` commits, so this always
            // observes the post-commit state.
            assert_eq!(record.status, ClusterStatus::Ready);
            tx.commit().await.unwrap();
        });

        first.await.unwrap();
        second.await.unwrap();
    }
}
