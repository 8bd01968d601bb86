use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use crate::error::DirectoryError;
use crate::topology::{ComponentStatus, InstanceDirectory, InstanceInfo};

/// Directory over a configured instance list whose statuses are decided by
/// probing each instance's status endpoint.
pub struct ProbingDirectory {
    client: Client,
    instances: Vec<InstanceInfo>,
}

impl ProbingDirectory {
    pub fn new(instances: Vec<InstanceInfo>, probe_timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(probe_timeout)
            .build()
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        Ok(Self { client, instances })
    }

    async fn probe(client: Client, instance: &InstanceInfo) -> ComponentStatus {
        let url = format!("http://{}:{}/status", instance.ip, instance.status_port);
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => ComponentStatus::Up,
            Ok(resp) => {
                debug!(url = %url, status = resp.status().as_u16(), "Instance probe rejected");
                ComponentStatus::Down
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Instance probe failed");
                ComponentStatus::Unreachable
            }
        }
    }
}

#[async_trait]
impl InstanceDirectory for ProbingDirectory {
    async fn list_targets(&self) -> Result<Vec<InstanceInfo>, DirectoryError> {
        let handles: Vec<JoinHandle<InstanceInfo>> = self.instances.iter().cloned()
            .map(|mut instance| {
                let client = self.client.clone();
                tokio::spawn(async move {
                    instance.status = Self::probe(client, &instance).await;
                    instance
                })
            })
            .collect();

        let mut result = Vec::with_capacity(handles.len());
        for handle in handles {
            let instance = handle.await
                .map_err(|e| DirectoryError::Unavailable(format!("probe task failed: {}", e)))?;
            result.push(instance);
        }
        Ok(result)
    }
}
