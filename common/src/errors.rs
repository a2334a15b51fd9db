use crate::types::cluster::ClusterId;
use snafu::Snafu;

/// Failure surfaced by a [`crate::provisioner::Provisioner`] implementation.
#[derive(Debug, Snafu)]
pub enum ProvisionerError {
    #[snafu(display("no such cluster address '{}'", address))]
    UnknownAddress { address: String },

    #[snafu(display("simulated provisioning failure for '{}'", name))]
    Simulated { name: String },
}

/// Failure surfaced by a [`crate::store::DurableStore`] implementation.
#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("transaction aborted: {}", reason))]
    Aborted { reason: String },

    #[snafu(display("concurrent writer holds the lock for '{}'", key))]
    Locked { key: String },
}

/// Top-level error type returned by every engine operation.
///
/// Each variant corresponds to one of the outcomes callers are expected to
/// branch on; `ProvisionerFailure` and `StoreFailure` wrap the collaborator
/// error instead of re-describing it.
#[derive(Debug, Snafu)]
pub enum EngineError {
    #[snafu(display("'{}' must not be empty", field))]
    InvalidArgument { field: &'static str },

    #[snafu(display("cluster '{}' not found", cluster_id))]
    NotFound { cluster_id: ClusterId },

    #[snafu(display("cluster '{}' is not joinable: {}", cluster_id, reason))]
    NotJoinable {
        cluster_id: ClusterId,
        reason: String,
    },

    #[snafu(display("cluster '{}' has no free ports", cluster_id))]
    NoCapacity { cluster_id: ClusterId },

    #[snafu(display("provisioner failure: {}", source))]
    ProvisionerFailure { source: ProvisionerError },

    #[snafu(display("store failure: {}", source))]
    StoreFailure { source: StoreError },
}

impl From<ProvisionerError> for EngineError {
    fn from(source: ProvisionerError) -> Self {
        EngineError::ProvisionerFailure { source }
    }
}

impl From<StoreError> for EngineError {
    fn from(source: StoreError) -> Self {
        EngineError::StoreFailure { source }
    }
}
