use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use crate::channel::{Command, CommandChannel};
use crate::error::DispatchError;

/// Result of one command against one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOutcome {
    pub host: String,
    pub result: Result<(), DispatchError>,
}

/// Per-instance outcomes of one fan-out, in the order instances were given.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<InstanceOutcome>,
}

impl DispatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// True for an empty batch too.
    pub fn all_failed(&self) -> bool {
        self.success_count() == 0
    }
}

/// Fans a command out to many instances at once. One tokio task per
/// instance, no concurrency cap, one attempt each.
#[derive(Clone)]
pub struct Dispatcher {
    channel: Arc<dyn CommandChannel>,
}

/// A fan-out whose commands have all been issued but not yet awaited.
///
/// Dropping it detaches the outstanding commands instead of cancelling them.
pub struct InFlight {
    action: &'static str,
    handles: Vec<(String, JoinHandle<Result<(), DispatchError>>)>,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
        Self { channel }
    }

    /// Issues `build(host)` to every host without waiting for any of them.
    pub fn launch<F>(&self, hosts: &[String], build: F) -> InFlight
    where
        F: Fn(&str) -> Command,
    {
        let mut action = "dispatch";
        let handles = hosts.iter()
            .map(|host| {
                let command = build(host);
                action = command.describe();
                let channel = self.channel.clone();
                let target = host.clone();
                let handle = tokio::spawn(async move {
                    channel.send(&target, &command).await
                });
                (host.clone(), handle)
            })
            .collect();
        InFlight { action, handles }
    }

    pub async fn dispatch<F>(&self, hosts: &[String], build: F) -> DispatchReport
    where
        F: Fn(&str) -> Command,
    {
        self.launch(hosts, build).wait().await
    }
}

impl InFlight {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Barrier: returns once every command has finished, successfully or not.
    pub async fn wait(self) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(self.handles.len());
        for (host, handle) in self.handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(DispatchError::Request(format!("dispatch task aborted: {}", e))),
            };
            match &result {
                Ok(()) => debug!(host = %host, action = self.action, "Instance accepted command"),
                Err(e) => warn!(host = %host, action = self.action, error = %e, "Failed to {} on instance", self.action),
            }
            outcomes.push(InstanceOutcome { host, result });
        }
        DispatchReport { outcomes }
    }
}
