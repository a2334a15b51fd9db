pub mod clock;
pub mod config;
pub mod errors;
pub mod notify;
pub mod provisioner;
pub mod store;
pub mod types;

/// Name of the keyed mapping the durable store exposes for cluster records.
///
/// The external state manager's `getOrCreate` is keyed by name; this crate
/// only ever opens one dictionary, and it is always this one.
pub const CLUSTER_DICTIONARY_NAME: &str = "clusterDictionary";
