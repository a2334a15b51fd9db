//! The per-record state machine: advances one [`ClusterRecord`] in place.
//!
//! Driven entirely by what the provisioner reports, never by local
//! assumptions about how much time a request should have taken. Crash
//! recovery falls out of this for free, since the next tick just asks the
//! provisioner again.

use chrono::{DateTime, Utc};
use common_lib::config::FleetConfig;
use common_lib::errors::EngineError;
use common_lib::provisioner::{Provisioner, ProvisionerStatus};
use common_lib::types::cluster::{ClusterRecord, ClusterStatus};

fn random_name() -> String {
    format!("cluster-{:x}", rand::random::<u64>())
}

fn address_of(record: &ClusterRecord) -> &str {
    record
        .address
        .as_deref()
        .expect("record in this status must carry a provisioner address")
}

/// Step `record` once against the provisioner's current view of the world.
pub async fn advance(
    record: &mut ClusterRecord,
    now: DateTime<Utc>,
    provisioner: &dyn Provisioner,
    config: &FleetConfig,
) -> Result<(), EngineError> {
    match record.status {
        ClusterStatus::New => {
            let address = provisioner.create(&random_name()).await?;
            record.address = Some(address);
            record.status = ClusterStatus::Creating;
        }

        ClusterStatus::Creating => {
            let status = provisioner.status(address_of(record)).await?;
            match status {
                ProvisionerStatus::Creating => {}
                ProvisionerStatus::Ready => {
                    record.ports = provisioner.ports(address_of(record)).await?;
                    record.created_on = Some(now);
                    record.status = ClusterStatus::Ready;
                }
                ProvisionerStatus::CreateFailed => {
                    // Retry with a fresh name next tick.
                    record.address = None;
                    record.status = ClusterStatus::New;
                }
                ProvisionerStatus::Deleting => {
                    record.status = ClusterStatus::Deleting;
                }
                ProvisionerStatus::DeleteFailed | ProvisionerStatus::ClusterNotFound => {
                    // Not a reachable state per the transition table; hold
                    // position and let the next poll resolve it.
                }
            }
        }

        ClusterStatus::Ready => {
            let created_on = record
                .created_on
                .expect("Ready record must have a creation timestamp");
            let uptime = now - created_on;
            let max_uptime = chrono::Duration::from_std(config.max_cluster_uptime)
                .unwrap_or_else(|_| chrono::Duration::max_value());

            if uptime >= max_uptime {
                provisioner.delete(address_of(record)).await?;
                record.status = ClusterStatus::Deleting;
            } else {
                let status = provisioner.status(address_of(record)).await?;
                if status == ProvisionerStatus::Deleting {
                    record.status = ClusterStatus::Deleting;
                }
                // Otherwise stays Ready; counter refresh is optional and
                // has no lifecycle effect (see `refresh_counters`).
            }
        }

        ClusterStatus::Remove => {
            let status = provisioner.status(address_of(record)).await?;
            match status {
                ProvisionerStatus::Creating
                | ProvisionerStatus::Ready
                | ProvisionerStatus::CreateFailed
                | ProvisionerStatus::DeleteFailed => {
                    provisioner.delete(address_of(record)).await?;
                    record.status = ClusterStatus::Deleting;
                }
                ProvisionerStatus::Deleting => {
                    record.status = ClusterStatus::Deleting;
                }
                ProvisionerStatus::ClusterNotFound => {
                    // Already gone; no point routing through Deleting.
                    record.status = ClusterStatus::Deleted;
                }
            }
        }

        ClusterStatus::Deleting => {
            let status = provisioner.status(address_of(record)).await?;
            match status {
                ProvisionerStatus::Creating | ProvisionerStatus::Ready => {
                    // Idempotent retry.
                    provisioner.delete(address_of(record)).await?;
                    record.status = ClusterStatus::Deleting;
                }
                ProvisionerStatus::Deleting => {}
                ProvisionerStatus::ClusterNotFound => {
                    record.status = ClusterStatus::Deleted;
                }
                ProvisionerStatus::CreateFailed | ProvisionerStatus::DeleteFailed => {
                    record.status = ClusterStatus::Remove;
                }
            }
        }

        ClusterStatus::Deleted => {
            // Terminal; the caller removes the record from the store in
            // the same transaction it observes this, so this is never
            // actually reached again.
        }
    }

    Ok(())
}

/// Optional observational refresh of `appCount`/`serviceCount`. A no-op
/// hook: no edge in this crate drives these counters from anything real.
pub fn refresh_counters(_record: &mut ClusterRecord) {}
