#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recordreplay::channel::{Command, CommandChannel};
use recordreplay::error::DispatchError;
use recordreplay::runtime::clock::{Clock, ManualClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SentCommand {
    pub host: String,
    pub command: Command,
    pub at: DateTime<Utc>,
}

/// Channel with per-host scripted failures and latencies. Records every
/// command it receives, stamped with the clock's time at receipt.
#[derive(Debug, Default)]
pub struct FakeChannel {
    failing: Vec<String>,
    delays: HashMap<String, Duration>,
    sent: Mutex<Vec<SentCommand>>,
    clock: Option<Arc<ManualClock>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, host: &str) -> Self {
        self.failing.push(host.to_string());
        self
    }

    pub fn delay(mut self, host: &str, delay: Duration) -> Self {
        self.delays.insert(host.to_string(), delay);
        self
    }

    pub fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandChannel for FakeChannel {
    async fn send(&self, host: &str, command: &Command) -> Result<(), DispatchError> {
        let at = match &self.clock {
            Some(clock) => clock.now(),
            None => Utc::now(),
        };
        self.sent.lock().unwrap().push(SentCommand {
            host: host.to_string(),
            command: command.clone(),
            at,
        });

        if let Some(delay) = self.delays.get(host) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|h| h == host) {
            return Err(DispatchError::Request(format!("connection refused: {}", host)));
        }
        Ok(())
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}
