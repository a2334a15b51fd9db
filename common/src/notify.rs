use crate::types::cluster::ClusterId;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_joined(&self, username: &str, cluster_id: &ClusterId);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_joined(&self, _username: &str, _cluster_id: &ClusterId) {}
}
