use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// How often the reconciler wakes up to advance records and rebalance.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,

    /// Floor on the number of active (non-terminal) clusters the balancer
    /// keeps around.
    pub minimum_cluster_count: usize,

    /// Ceiling on the number of active clusters the balancer will create.
    pub maximum_cluster_count: usize,

    /// Per-cluster user capacity; also the size of the port pool a freshly
    /// provisioned cluster is expected to expose.
    pub maximum_users_per_cluster: usize,

    /// A `Ready` cluster older than this is scheduled for retirement.
    #[serde(with = "humantime_serde")]
    pub max_cluster_uptime: Duration,

    /// Fleet-wide occupancy above this fraction pushes `computeTarget`
    /// upward.
    pub user_capacity_high_percent_threshold: f64,

    /// Fleet-wide occupancy below this fraction lets `computeTarget` shrink
    /// back towards the minimum.
    pub user_capacity_low_percent_threshold: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(1),
            minimum_cluster_count: 10,
            maximum_cluster_count: 100,
            maximum_users_per_cluster: 10,
            max_cluster_uptime: Duration::from_secs(2 * 60 * 60),
            user_capacity_high_percent_threshold: 0.75,
            user_capacity_low_percent_threshold: 0.25,
        }
    }
}

impl FleetConfig {
    /// A cluster within this long of its `MaxClusterUptime` deadline is
    /// treated by admission as "about to be recycled" and rejected even
    /// while it is still nominally `Ready`.
    pub fn join_expiry_guard(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }
}
