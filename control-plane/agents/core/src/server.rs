use agents_core::reconciler::Reconciler;
use agents_core::registry::Registry;
use common_lib::clock::SystemClock;
use common_lib::config::FleetConfig;
use common_lib::notify::NoopNotifier;
use common_lib::provisioner::mock::MockProvisioner;
use common_lib::store::memory::InMemoryStoreManager;
use common_lib::store::StoreManager;
use common_lib::CLUSTER_DICTIONARY_NAME;
use std::sync::Arc;
use structopt::StructOpt;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(name = env!("CARGO_PKG_NAME"), version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    /// How often the reconciler advances records and rebalances the fleet.
    #[structopt(long, default_value = "1s")]
    refresh_interval: humantime::Duration,

    /// Floor on the number of active clusters.
    #[structopt(long, default_value = "10")]
    minimum_cluster_count: usize,

    /// Ceiling on the number of active clusters.
    #[structopt(long, default_value = "100")]
    maximum_cluster_count: usize,

    /// Per-cluster user capacity.
    #[structopt(long, default_value = "10")]
    maximum_users_per_cluster: usize,

    /// Age at which a Ready cluster is retired.
    #[structopt(long, default_value = "2h")]
    max_cluster_uptime: humantime::Duration,

    /// Fleet-wide occupancy fraction that triggers an upscale.
    #[structopt(long, default_value = "0.75")]
    user_capacity_high_percent_threshold: f64,

    /// Fleet-wide occupancy fraction that triggers a downscale.
    #[structopt(long, default_value = "0.25")]
    user_capacity_low_percent_threshold: f64,
}

impl From<CliArgs> for FleetConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            refresh_interval: args.refresh_interval.into(),
            minimum_cluster_count: args.minimum_cluster_count,
            maximum_cluster_count: args.maximum_cluster_count,
            maximum_users_per_cluster: args.maximum_users_per_cluster,
            max_cluster_uptime: args.max_cluster_uptime.into(),
            user_capacity_high_percent_threshold: args.user_capacity_high_percent_threshold,
            user_capacity_low_percent_threshold: args.user_capacity_low_percent_threshold,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::from_args();
    tracing_subscriber::fmt::init();

    info!(?cli_args, "starting core-agent");
    let config = FleetConfig::from(cli_args);

    let store_manager = InMemoryStoreManager::new();
    let store = store_manager
        .get_or_create_dictionary(CLUSTER_DICTIONARY_NAME)
        .await;
    let provisioner = Arc::new(MockProvisioner::new(
        (0..config.maximum_users_per_cluster as u16)
            .map(|offset| 8080 + offset)
            .collect(),
    ));

    let registry = Arc::new(Registry::new(
        store,
        provisioner,
        Arc::new(NoopNotifier),
        Arc::new(SystemClock),
        config,
    ));

    let cancellation = CancellationToken::new();
    let reconciler = Reconciler::new(registry.clone());
    let reconciler_cancellation = cancellation.clone();
    let reconciler_task = tokio::spawn(async move { reconciler.run(reconciler_cancellation).await });

    agents_core::shutdown::wait_for_shutdown_signal().await;
    info!("shutting down core-agent");
    cancellation.cancel();
    let _ = reconciler_task.await;
}
