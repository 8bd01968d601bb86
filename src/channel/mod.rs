use async_trait::async_trait;
use std::fmt::{self, Debug};
use crate::error::DispatchError;

pub mod http;

/// Port the instance-side record/replay handlers listen on.
pub const DEFAULT_COMMAND_PORT: u16 = 10080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Switch::On => f.write_str("on"),
            Switch::Off => f.write_str("off"),
        }
    }
}

/// A record/replay command addressed to a single instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Record { name: String, switch: Switch, timestamp: i64 },
    Replay { name: String, switch: Switch },
}

impl Command {
    /// Path layout is fixed by the instance-side handlers.
    pub fn url(&self, host: &str, port: u16) -> String {
        match self {
            Command::Record { name, switch, timestamp } => {
                format!("http://{}:{}/record/{}/{}/{}", host, port, name, switch, timestamp)
            }
            Command::Replay { name, switch } => {
                format!("http://{}:{}/replay/{}/{}", host, port, name, switch)
            }
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Command::Record { switch: Switch::On, .. } => "start recording",
            Command::Record { switch: Switch::Off, .. } => "stop recording",
            Command::Replay { switch: Switch::On, .. } => "start replaying",
            Command::Replay { switch: Switch::Off, .. } => "stop replaying",
        }
    }
}

/// Sends one command to one instance. A single call either succeeds or
/// fails as a whole.
#[async_trait]
pub trait CommandChannel: Send + Sync + Debug {
    async fn send(&self, host: &str, command: &Command) -> Result<(), DispatchError>;
}
