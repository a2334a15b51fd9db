use common_lib::clock::Clock;
use common_lib::errors::EngineError;
use common_lib::store::DurableStore;
use common_lib::types::cluster::ClusterStatus;
use common_lib::types::view::ClusterView;
use std::time::Duration;

pub async fn list_clusters(
    store: &dyn DurableStore,
    clock: &dyn Clock,
) -> Result<Vec<ClusterView>, EngineError> {
    let fleet = store.enumerate().await?;
    let now = clock.now();

    Ok(fleet
        .into_iter()
        .filter(|record| record.status == ClusterStatus::Ready)
        .map(|record| {
            let uptime = record
                .created_on
                .and_then(|created_on| (now - created_on).to_std().ok())
                .unwrap_or(Duration::ZERO);

            ClusterView {
                name: format!("Party Cluster {}", record.id),
                app_count: record.app_count,
                service_count: record.service_count,
                uptime,
                user_count: record.user_count(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_lib::clock::SystemClock;
    use common_lib::store::memory::InMemoryStore;
    use common_lib::types::cluster::{ClusterId, ClusterRecord};

    #[tokio::test]
    async fn only_ready_clusters_are_listed() {
        let store = InMemoryStore::new("test");
        let clock = SystemClock;

        let mut ready = ClusterRecord::new(ClusterId::new("ready"));
        ready.status = ClusterStatus::Ready;
        ready.created_on = Some(clock.now());

        let creating = ClusterRecord::new(ClusterId::new("creating"));

        let mut tx = store.begin_transaction().await;
        tx.add(ready.id.clone(), ready).await.unwrap();
        tx.add(creating.id.clone(), creating).await.unwrap();
        tx.commit().await.unwrap();

        let views = list_clusters(&store, &clock).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Party Cluster ready");
    }
}
