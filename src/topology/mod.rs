use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::DirectoryError;

pub mod probe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    #[default]
    Up,
    Down,
    Unreachable,
    Unknown,
}

/// One candidate instance as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_status_port")]
    pub status_port: u16,
    #[serde(default)]
    pub status: ComponentStatus,
}

fn default_port() -> u16 {
    4000
}

fn default_status_port() -> u16 {
    10080
}

impl InstanceInfo {
    pub fn new(ip: &str, status: ComponentStatus) -> Self {
        Self {
            ip: ip.to_string(),
            port: default_port(),
            status_port: default_status_port(),
            status,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ComponentStatus::Up
    }
}

/// Source of the current cluster topology.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<InstanceInfo>, DirectoryError>;
}

/// Fixed instance list with statuses taken as given.
pub struct StaticDirectory {
    instances: Vec<InstanceInfo>,
}

impl StaticDirectory {
    pub fn new(instances: Vec<InstanceInfo>) -> Self {
        Self { instances }
    }
}

#[async_trait]
impl InstanceDirectory for StaticDirectory {
    async fn list_targets(&self) -> Result<Vec<InstanceInfo>, DirectoryError> {
        Ok(self.instances.clone())
    }
}
