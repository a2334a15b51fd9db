use crate::errors::{ProvisionerError, UnknownAddress};
use crate::provisioner::{Provisioner, ProvisionerStatus};
use async_trait::async_trait;
use snafu::OptionExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

struct MockEntry {
    ports: Vec<u16>,
    remaining_creating_polls: u32,
    remaining_deleting_polls: u32,
    deleting: bool,
    not_found: bool,
    forced: Option<ProvisionerStatus>,
}

pub struct MockProvisioner {
    state: Mutex<HashMap<String, MockEntry>>,
    default_ports: Vec<u16>,
    creating_polls: u32,
    deleting_polls: u32,
    sequence: AtomicU64,
}

impl MockProvisioner {
    pub fn new(default_ports: Vec<u16>) -> Self {
        Self::with_delays(default_ports, 1, 1)
    }

    pub fn with_delays(default_ports: Vec<u16>, creating_polls: u32, deleting_polls: u32) -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            default_ports,
            creating_polls,
            deleting_polls,
            sequence: AtomicU64::new(0),
        }
    }

    /// Pin `address`'s reported status until [`clear_forced`] is called.
    /// Used by tests to drive `CreateFailed` / `DeleteFailed` /
    /// `ClusterNotFound` paths deterministically.
    pub async fn force_status(&self, address: &str, status: ProvisionerStatus) {
        if let Some(entry) = self.state.lock().await.get_mut(address) {
            entry.forced = Some(status);
        }
    }

    pub async fn clear_forced(&self, address: &str) {
        if let Some(entry) = self.state.lock().await.get_mut(address) {
            entry.forced = None;
        }
    }

    fn next_name_suffix(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl Provisioner for MockProvisioner {
    async fn create(&self, name: &str) -> Result<String, ProvisionerError> {
        let address = format!("mock://{}-{}", name, self.next_name_suffix());
        self.state.lock().await.insert(
            address.clone(),
            MockEntry {
                ports: self.default_ports.clone(),
                remaining_creating_polls: self.creating_polls,
                remaining_deleting_polls: self.deleting_polls,
                deleting: false,
                not_found: false,
                forced: None,
            },
        );
        Ok(address)
    }

    async fn delete(&self, address: &str) -> Result<(), ProvisionerError> {
        let mut guard = self.state.lock().await;
        let entry = guard
            .get_mut(address)
            .context(UnknownAddress { address })?;
        entry.deleting = true;
        Ok(())
    }

    async fn status(&self, address: &str) -> Result<ProvisionerStatus, ProvisionerError> {
        let mut guard = self.state.lock().await;
        let entry = guard
            .get_mut(address)
            .context(UnknownAddress { address })?;

        if let Some(forced) = entry.forced {
            return Ok(forced);
        }
        if entry.not_found {
            return Ok(ProvisionerStatus::ClusterNotFound);
        }
        if entry.deleting {
            return if entry.remaining_deleting_polls > 0 {
                entry.remaining_deleting_polls -= 1;
                Ok(ProvisionerStatus::Deleting)
            } else {
                entry.not_found = true;
                Ok(ProvisionerStatus::ClusterNotFound)
            };
        }
        if entry.remaining_creating_polls > 0 {
            entry.remaining_creating_polls -= 1;
            return Ok(ProvisionerStatus::Creating);
        }
        Ok(ProvisionerStatus::Ready)
    }

    async fn ports(&self, address: &str) -> Result<Vec<u16>, ProvisionerError> {
        let guard = self.state.lock().await;
        let entry = guard.get(address).context(UnknownAddress { address })?;
        Ok(entry.ports.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_creating_then_ready() {
        let provisioner = MockProvisioner::with_delays(vec![9000, 9001], 1, 1);
        let address = provisioner.create("alpha").await.unwrap();
        assert_eq!(
            provisioner.status(&address).await.unwrap(),
            ProvisionerStatus::Creating
        );
        assert_eq!(
            provisioner.status(&address).await.unwrap(),
            ProvisionerStatus::Ready
        );
    }

    #[tokio::test]
    async fn reports_deleting_then_not_found() {
        let provisioner = MockProvisioner::with_delays(vec![9000], 0, 1);
        let address = provisioner.create("beta").await.unwrap();
        provisioner.delete(&address).await.unwrap();
        assert_eq!(
            provisioner.status(&address).await.unwrap(),
            ProvisionerStatus::Deleting
        );
        assert_eq!(
            provisioner.status(&address).await.unwrap(),
            ProvisionerStatus::ClusterNotFound
        );
    }

    #[tokio::test]
    async fn forced_status_overrides_progression() {
        let provisioner = MockProvisioner::with_delays(vec![9000], 5, 5);
        let address = provisioner.create("gamma").await.unwrap();
        provisioner
            .force_status(&address, ProvisionerStatus::CreateFailed)
            .await;
        assert_eq!(
            provisioner.status(&address).await.unwrap(),
            ProvisionerStatus::CreateFailed
        );
    }

    #[tokio::test]
    async fn unknown_address_is_an_error() {
        let provisioner = MockProvisioner::new(vec![9000]);
        assert!(provisioner.status("mock://nope").await.is_err());
    }
}
