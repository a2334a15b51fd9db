use common_lib::clock::Clock;
use common_lib::config::FleetConfig;
use common_lib::notify::Notifier;
use common_lib::provisioner::Provisioner;
use common_lib::store::DurableStore;
use std::sync::Arc;

pub struct Registry {
    store: Arc<dyn DurableStore>,
    provisioner: Arc<dyn Provisioner>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: FleetConfig,
}

impl Registry {
    pub fn new(
        store: Arc<dyn DurableStore>,
        provisioner: Arc<dyn Provisioner>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: FleetConfig,
    ) -> Self {
        Self {
            store,
            provisioner,
            notifier,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    pub fn provisioner(&self) -> &Arc<dyn Provisioner> {
        &self.provisioner
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }
}
