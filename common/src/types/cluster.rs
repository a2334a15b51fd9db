//! The cluster record and its lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier for a cluster record.
///
/// Newtype over `String` rather than `Uuid`: ids are chosen by the engine
/// itself (a random integer rendered as a string is enough), not handed
/// back by an external system that would mandate a particular format.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClusterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ClusterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a cluster record.
///
/// Transitions are driven exclusively by the state machine; nothing else
/// is allowed to write `status` directly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ClusterStatus {
    /// Freshly inserted by the balancer, provisioning not yet requested.
    New,
    /// Provisioning requested; waiting for the provisioner to report ready.
    Creating,
    /// Provisioned, has a port pool, accepts joins.
    Ready,
    /// Marked by the balancer or the uptime guard for retirement; still
    /// holds its provisioned resources until the reconciler starts
    /// tearing it down.
    Remove,
    /// Teardown requested; waiting for the provisioner to confirm removal.
    Deleting,
    /// Terminal. The record is removed from the store in the same
    /// transaction that observes this state, so it should never actually
    /// be read back.
    Deleted,
}

impl ClusterStatus {
    /// `true` for the states the balancer and admission count as part of
    /// the live fleet.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ClusterStatus::New | ClusterStatus::Creating | ClusterStatus::Ready
        )
    }
}

/// A single user occupying one port on a cluster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterUser {
    pub name: String,
    pub port: u16,
}

/// The durable record for one cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: ClusterId,
    pub status: ClusterStatus,

    /// Set once the provisioner hands back an address; cleared again if a
    /// `Creating` attempt fails so the next attempt starts clean.
    #[serde(default)]
    pub address: Option<String>,

    /// Port pool reported by the provisioner once `Ready`. Each entry is
    /// either free or claimed by exactly one entry in `users`.
    #[serde(default)]
    pub ports: Vec<u16>,

    #[serde(default)]
    pub users: Vec<ClusterUser>,

    /// `None` until the provisioner reports `Ready`; absence stands in
    /// for the "not yet started" sentinel instead of a magic timestamp.
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub app_count: u32,

    #[serde(default)]
    pub service_count: u32,
}

impl ClusterRecord {
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            status: ClusterStatus::New,
            address: None,
            ports: Vec::new(),
            users: Vec::new(),
            created_on: None,
            app_count: 0,
            service_count: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// First port in the pool not currently claimed by a user, if any.
    pub fn free_port(&self) -> Option<u16> {
        self.ports
            .iter()
            .copied()
            .find(|port| !self.users.iter().any(|user| user.port == *port))
    }
}
