use crate::registry::Registry;
use common_lib::clock::Clock;
use common_lib::errors::EngineError;
use common_lib::store::LockMode;
use common_lib::types::cluster::{ClusterId, ClusterStatus, ClusterUser};
use tracing::instrument;

#[instrument(skip(registry), fields(cluster_id = %cluster_id))]
pub async fn join(
    registry: &Registry,
    username: &str,
    cluster_id: &ClusterId,
) -> Result<(), EngineError> {
    if username.trim().is_empty() {
        return Err(EngineError::InvalidArgument { field: "username" });
    }
    if cluster_id.as_str().trim().is_empty() {
        return Err(EngineError::InvalidArgument { field: "clusterId" });
    }

    let store = registry.store();
    let mut tx = store.begin_transaction().await;

    let mut record = match tx.try_get(cluster_id, LockMode::Update).await? {
        Some(record) => record,
        None => {
            tx.abort().await;
            return Err(EngineError::NotFound {
                cluster_id: cluster_id.clone(),
            });
        }
    };

    if record.status != ClusterStatus::Ready {
        tx.abort().await;
        return Err(EngineError::NotJoinable {
            cluster_id: cluster_id.clone(),
            reason: "cluster is not ready".to_string(),
        });
    }

    let created_on = match record.created_on {
        Some(created_on) => created_on,
        None => {
            tx.abort().await;
            return Err(EngineError::NotJoinable {
                cluster_id: cluster_id.clone(),
                reason: "cluster has no creation time".to_string(),
            });
        }
    };

    let config = registry.config();
    let max_uptime = chrono::Duration::from_std(config.max_cluster_uptime)
        .unwrap_or_else(|_| chrono::Duration::max_value());
    let guard = chrono::Duration::from_std(config.join_expiry_guard()).unwrap_or_default();
    let elapsed = registry.clock().now() - created_on;

    if elapsed > max_uptime - guard {
        tx.abort().await;
        return Err(EngineError::NotJoinable {
            cluster_id: cluster_id.clone(),
            reason: "cluster is expiring soon".to_string(),
        });
    }

    let port = match record.free_port() {
        Some(port) => port,
        None => {
            tx.abort().await;
            return Err(EngineError::NoCapacity {
                cluster_id: cluster_id.clone(),
            });
        }
    };

    record.users.push(ClusterUser {
        name: username.to_string(),
        port,
    });
    tx.set(cluster_id.clone(), record).await?;
    tx.commit().await?;

    // Publish-after-commit: the notifier never gets a say in whether the
    // join itself succeeded.
    registry.notifier().notify_joined(username, cluster_id).await;

    Ok(())
}
