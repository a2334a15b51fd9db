use common_lib::config::FleetConfig;
use common_lib::errors::EngineError;
use common_lib::store::DurableStore;
use common_lib::types::cluster::{ClusterId, ClusterRecord, ClusterStatus};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BalanceOutcome {
    pub inserted: usize,
    pub flagged_remove: usize,
}

fn fresh_id() -> ClusterId {
    ClusterId::new(format!("cluster-{:x}", rand::random::<u64>()))
}

pub async fn balance(
    store: &dyn DurableStore,
    target: usize,
    config: &FleetConfig,
) -> Result<BalanceOutcome, EngineError> {
    let target = target.clamp(config.minimum_cluster_count, config.maximum_cluster_count);

    let mut tx = store.begin_transaction().await;
    let snapshot = tx.enumerate().await?;
    let active: Vec<&ClusterRecord> = snapshot.iter().filter(|r| r.is_active()).collect();
    let active_count = active.len();

    let mut outcome = BalanceOutcome::default();

    if active_count < target {
        for _ in 0..(target - active_count) {
            let id = fresh_id();
            tx.add(id.clone(), ClusterRecord::new(id)).await?;
            outcome.inserted += 1;
        }
    } else if active_count > target {
        let removable_without_breaching_floor = active_count - config.minimum_cluster_count;
        let desired = active_count - target;
        let remove_count = removable_without_breaching_floor.min(desired);

        let mut flagged = 0;
        for record in active.iter().filter(|r| r.user_count() == 0) {
            if flagged >= remove_count {
                break;
            }
            let mut updated = (*record).clone();
            updated.status = ClusterStatus::Remove;
            tx.set(updated.id.clone(), updated).await?;
            flagged += 1;
        }
        outcome.flagged_remove = flagged;
    }

    tx.commit().await?;
    Ok(outcome)
}
