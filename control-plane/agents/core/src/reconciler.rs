use crate::{balancer, planner, registry::Registry, state_machine};
use common_lib::clock::Clock;
use common_lib::errors::EngineError;
use common_lib::store::LockMode;
use common_lib::types::cluster::ClusterStatus;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

struct AdvanceSummary {
    advanced: usize,
    removed: usize,
}

#[instrument(skip(registry))]
async fn advance_all(registry: &Registry) -> Result<AdvanceSummary, EngineError> {
    let store = registry.store();
    let provisioner = registry.provisioner();
    let now = registry.clock().now();

    let mut tx = store.begin_transaction().await;
    let snapshot = tx.enumerate().await?;

    let mut advanced = 0;
    let mut removed = 0;
    for candidate in snapshot {
        let key = candidate.id.clone();
        let mut current = match tx.try_get(&key, LockMode::Update).await? {
            Some(record) => record,
            // Removed by a concurrent transaction since the snapshot was
            // taken.
            None => continue,
        };

        state_machine::advance(&mut current, now, provisioner.as_ref(), registry.config()).await?;

        if current.status == ClusterStatus::Deleted {
            tx.try_remove(&key).await?;
            removed += 1;
        } else {
            tx.set(key, current).await?;
        }
        advanced += 1;
    }

    tx.commit().await?;
    Ok(AdvanceSummary { advanced, removed })
}

pub struct Reconciler {
    registry: Arc<Registry>,
}

impl Reconciler {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    async fn tick(&self) {
        match advance_all(&self.registry).await {
            Ok(summary) => debug!(
                advanced = summary.advanced,
                removed = summary.removed,
                "advance phase complete"
            ),
            Err(error) => warn!(%error, "advance phase failed, will retry next tick"),
        }

        let fleet = match self.registry.store().enumerate().await {
            Ok(fleet) => fleet,
            Err(error) => {
                warn!(%error, "could not read fleet snapshot for planning");
                return;
            }
        };
        let active_count = fleet.iter().filter(|r| r.is_active()).count();
        let target = planner::compute_target(&fleet, self.registry.config());

        match balancer::balance(self.registry.store().as_ref(), target, self.registry.config()).await
        {
            Ok(outcome) => debug!(
                active_count,
                target,
                inserted = outcome.inserted,
                flagged_remove = outcome.flagged_remove,
                "balance phase complete"
            ),
            Err(error) => warn!(%error, "balance phase failed, will retry next tick"),
        }
    }

    /// Run the reconciler loop until `cancellation` fires.
    pub async fn run(&self, cancellation: CancellationToken) {
        info!("reconciler starting");

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = self.tick() => {}
            }

            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(self.registry.config().refresh_interval) => {}
            }
        }

        info!("reconciler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission;
    use async_trait::async_trait;
    use chrono::Utc;
    use common_lib::clock::SystemClock;
    use common_lib::config::FleetConfig;
    use common_lib::errors::ProvisionerError;
    use common_lib::notify::NoopNotifier;
    use common_lib::provisioner::mock::MockProvisioner;
    use common_lib::provisioner::{Provisioner, ProvisionerStatus};
    use common_lib::store::memory::InMemoryStore;
    use common_lib::store::DurableStore;
    use common_lib::types::cluster::{ClusterId, ClusterRecord};
    use std::time::Duration;

    #[tokio::test]
    async fn ticks_converge_fleet_to_target_and_ready() {
        let store = Arc::new(InMemoryStore::new("test"));
        let provisioner = Arc::new(MockProvisioner::with_delays(vec![80, 81], 1, 1));
        let mut config = FleetConfig::default();
        config.minimum_cluster_count = 2;
        config.maximum_cluster_count = 2;

        let registry = Arc::new(Registry::new(
            store.clone() as Arc<dyn DurableStore>,
            provisioner,
            Arc::new(NoopNotifier),
            Arc::new(SystemClock),
            config,
        ));
        let reconciler = Reconciler::new(registry);

        for _ in 0..6 {
            reconciler.tick().await;
        }

        let fleet = store.enumerate().await.unwrap();
        assert_eq!(fleet.len(), 2);
        assert!(fleet.iter().all(|r| r.status == ClusterStatus::Ready));
        assert!(fleet.iter().all(|r| !r.ports.is_empty()));
    }

    /// Delegates to a [`MockProvisioner`] after a fixed delay, so a test can
    /// widen the window during which `advance_all` holds a record's update
    /// lock.
    struct DelayedProvisioner {
        inner: MockProvisioner,
        delay: Duration,
    }

    #[async_trait]
    impl Provisioner for DelayedProvisioner {
        async fn create(&self, name: &str) -> Result<String, ProvisionerError> {
            tokio::time::sleep(self.delay).await;
            self.inner.create(name).await
        }

        async fn delete(&self, address: &str) -> Result<(), ProvisionerError> {
            self.inner.delete(address).await
        }

        async fn status(&self, address: &str) -> Result<ProvisionerStatus, ProvisionerError> {
            tokio::time::sleep(self.delay).await;
            self.inner.status(address).await
        }

        async fn ports(&self, address: &str) -> Result<Vec<u16>, ProvisionerError> {
            self.inner.ports(address).await
        }
    }

    #[tokio::test]
    async fn join_waits_out_a_concurrent_advance_phase_on_the_same_record() {
        let store = Arc::new(InMemoryStore::new("test"));
        let mut record = ClusterRecord::new(ClusterId::new("a"));
        record.status = ClusterStatus::Ready;
        record.ports = vec![80];
        record.created_on = Some(Utc::now());
        {
            let mut tx = store.begin_transaction().await;
            tx.add(record.id.clone(), record).await.unwrap();
            tx.commit().await.unwrap();
        }

        let provisioner = Arc::new(DelayedProvisioner {
            inner: MockProvisioner::new(vec![80]),
            delay: Duration::from_millis(30),
        });
        let registry = Arc::new(Registry::new(
            store.clone() as Arc<dyn DurableStore>,
            provisioner,
            Arc::new(NoopNotifier),
            Arc::new(SystemClock),
            FleetConfig::default(),
        ));

        let advancing = registry.clone();
        let advance_task = tokio::spawn(async move {
            advance_all(&advancing).await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        let join_result = admission::join(&registry, "alice", &ClusterId::new("a")).await;
        advance_task.await.unwrap();

        assert!(join_result.is_ok());
        let fleet = store.enumerate().await.unwrap();
        let updated = fleet.into_iter().find(|r| r.id.as_str() == "a").unwrap();
        assert_eq!(updated.users.len(), 1);
    }
}
