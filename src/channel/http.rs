use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use std::time::Duration;
use tracing::debug;
use crate::channel::{Command, CommandChannel, DEFAULT_COMMAND_PORT};
use crate::error::DispatchError;

/// Issues commands as bodiless `GET` requests against the instance's
/// command port.
#[derive(Debug)]
pub struct HttpCommandChannel {
    client: Client,
    port: u16,
}

impl HttpCommandChannel {
    pub fn new(port: u16, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Request(e.to_string()))?;
        Ok(Self { client, port })
    }

    pub fn with_client(client: Client, port: u16) -> Self {
        Self { client, port }
    }
}

impl Default for HttpCommandChannel {
    fn default() -> Self {
        Self::with_client(Client::new(), DEFAULT_COMMAND_PORT)
    }
}

#[async_trait]
impl CommandChannel for HttpCommandChannel {
    async fn send(&self, host: &str, command: &Command) -> Result<(), DispatchError> {
        let url = command.url(host, self.port);
        debug!(url = %url, "Sending command");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout
            } else {
                DispatchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }
        Ok(())
    }
}
