use common_lib::config::FleetConfig;
use common_lib::types::cluster::ClusterRecord;

/// Desired number of active clusters given the current fleet.
///
/// The numerator (`users` summed over *every* record, including ones
/// flagged `Remove`/`Deleting`) and the denominator (capacity of only the
/// *active* set) don't match the same population. That's preserved
/// deliberately rather than "fixed": it's how the source computes
/// occupancy, and changing it changes behaviour at the scaling
/// boundaries.
pub fn compute_target(fleet: &[ClusterRecord], config: &FleetConfig) -> usize {
    let active_count = fleet.iter().filter(|record| record.is_active()).count();
    let total_users: usize = fleet.iter().map(|record| record.user_count()).sum();
    let capacity = active_count * config.maximum_users_per_cluster;
    let occupancy = if capacity == 0 {
        0.0
    } else {
        total_users as f64 / capacity as f64
    };

    if occupancy >= config.user_capacity_high_percent_threshold {
        let headroom = (active_count as f64 * (1.0 - config.user_capacity_high_percent_threshold))
            .ceil() as usize;
        (active_count + headroom).min(config.maximum_cluster_count)
    } else if occupancy <= config.user_capacity_low_percent_threshold {
        let slack = (active_count as f64
            * (config.user_capacity_high_percent_threshold
                - config.user_capacity_low_percent_threshold))
            .floor() as usize;
        active_count
            .saturating_sub(slack)
            .max(config.minimum_cluster_count)
    } else {
        active_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_lib::types::cluster::{ClusterId, ClusterRecord, ClusterStatus, ClusterUser};

    fn ready_with_users(id: &str, user_count: usize) -> ClusterRecord {
        let mut record = ClusterRecord::new(ClusterId::new(id));
        record.status = ClusterStatus::Ready;
        record.ports = (0..user_count as u16 + 1).map(|p| 8000 + p).collect();
        record.users = (0..user_count)
            .map(|i| ClusterUser {
                name: format!("user{}", i),
                port: 8000 + i as u16,
            })
            .collect();
        record
    }

    #[test]
    fn empty_fleet_targets_the_minimum() {
        let config = FleetConfig::default();
        assert_eq!(compute_target(&[], &config), config.minimum_cluster_count);
    }

    #[test]
    fn high_occupancy_scales_up() {
        let config = FleetConfig::default();
        let fleet: Vec<_> = (0..10).map(|i| ready_with_users(&i.to_string(), 8)).collect();
        assert_eq!(compute_target(&fleet, &config), 13);
    }

    #[test]
    fn low_occupancy_scales_down_to_floor() {
        let config = FleetConfig::default();
        let fleet: Vec<_> = (0..20).map(|i| ready_with_users(&i.to_string(), 0)).collect();
        assert_eq!(compute_target(&fleet, &config), config.minimum_cluster_count);
    }

    #[test]
    fn mid_occupancy_holds_steady() {
        let config = FleetConfig::default();
        let fleet: Vec<_> = (0..10).map(|i| ready_with_users(&i.to_string(), 5)).collect();
        assert_eq!(compute_target(&fleet, &config), 10);
    }
}
