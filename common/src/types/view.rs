use serde::Serialize;
use std::time::Duration;

#[derive(Clone, Debug, Serialize)]
pub struct ClusterView {
    pub name: String,
    pub app_count: u32,
    pub service_count: u32,
    pub uptime: Duration,
    pub user_count: usize,
}
