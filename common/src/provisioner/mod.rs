pub mod mock;

use crate::errors::ProvisionerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProvisionerStatus {
    Creating,
    Ready,
    Deleting,
    CreateFailed,
    DeleteFailed,
    ClusterNotFound,
}

#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Request a new cluster be created under the given name. Returns the
    /// address the cluster will be reachable at once ready.
    async fn create(&self, name: &str) -> Result<String, ProvisionerError>;

    /// Request teardown of the cluster at `address`.
    async fn delete(&self, address: &str) -> Result<(), ProvisionerError>;

    /// Poll the current status of the cluster at `address`.
    async fn status(&self, address: &str) -> Result<ProvisionerStatus, ProvisionerError>;

    /// Port pool exposed by the cluster at `address`, once `Ready`.
    async fn ports(&self, address: &str) -> Result<Vec<u16>, ProvisionerError>;
}
