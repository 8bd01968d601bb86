use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use crate::channel::DEFAULT_COMMAND_PORT;
use crate::channel::http::HttpCommandChannel;
use crate::runtime::orchestrator::Orchestrator;
use crate::runtime::redis_storage::RedisTaskStore;
use crate::runtime::storage::{InMemoryTaskStore, TaskStore};
use crate::topology::probe::ProbingDirectory;
use crate::topology::{InstanceDirectory, InstanceInfo, StaticDirectory};

/// Task store used by the CLI when neither a config file nor `--redis` is given.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_command_port")]
    pub command_port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    Redis {
        url: String,
        #[serde(default = "default_namespace")]
        namespace: String,
    },
}

impl StoreConfig {
    pub fn redis(url: &str) -> Self {
        StoreConfig::Redis {
            url: url.to_string(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectoryConfig {
    Static {
        #[serde(default)]
        instances: Vec<InstanceInfo>,
    },
    Probe {
        #[serde(default)]
        instances: Vec<InstanceInfo>,
        #[serde(default = "default_probe_timeout_ms")]
        probe_timeout_ms: u64,
    },
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig::Static { instances: Vec::new() }
    }
}

fn default_command_port() -> u16 {
    DEFAULT_COMMAND_PORT
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_namespace() -> String {
    "recordreplay".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_port: default_command_port(),
            request_timeout_ms: default_request_timeout_ms(),
            store: StoreConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Configuration for one CLI invocation. Each invocation is its own
    /// process, so without a config file tasks go to the default Redis
    /// store rather than memory. `redis` overrides the store either way.
    pub fn resolve(path: Option<&Path>, redis: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self {
                store: StoreConfig::redis(DEFAULT_REDIS_URL),
                ..Self::default()
            },
        };
        if let Some(url) = redis {
            config.store = StoreConfig::redis(url);
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn build_store(&self) -> Result<Arc<dyn TaskStore>> {
        Ok(match &self.store {
            StoreConfig::Memory => Arc::new(InMemoryTaskStore::new()),
            StoreConfig::Redis { url, namespace } => {
                let client = redis::Client::open(url.as_str())
                    .with_context(|| format!("invalid Redis URL {}", url))?;
                Arc::new(RedisTaskStore::new(client, namespace.clone()))
            }
        })
    }

    pub fn build_directory(&self) -> Result<Arc<dyn InstanceDirectory>> {
        Ok(match &self.directory {
            DirectoryConfig::Static { instances } => Arc::new(StaticDirectory::new(instances.clone())),
            DirectoryConfig::Probe { instances, probe_timeout_ms } => Arc::new(ProbingDirectory::new(
                instances.clone(),
                Duration::from_millis(*probe_timeout_ms),
            )?),
        })
    }

    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        let channel = HttpCommandChannel::new(self.command_port, self.request_timeout())?;
        Ok(Orchestrator::new(
            self.build_directory()?,
            self.build_store()?,
            Arc::new(channel),
        ))
    }
}
