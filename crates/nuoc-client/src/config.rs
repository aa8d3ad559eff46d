//! Client configuration.

use crate::ClientError;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Chat service the dashboard widget talks to.
pub const DEFAULT_ENDPOINT: &str = "wss://nuocgpt-chat-bl9fc.ondigitalocean.app/ws/chat";

/// Fixed delay between a disconnect and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// Where to connect and how long to wait before reconnecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: String,
    retry_delay: Duration,
}

impl ClientConfig {
    /// Validate `endpoint` as a `ws://` or `wss://` URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let endpoint = endpoint.into();
        let request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        match request.uri().scheme_str() {
            Some("ws" | "wss") => Ok(Self {
                endpoint,
                retry_delay: DEFAULT_RETRY_DELAY,
            }),
            other => Err(ClientError::InvalidEndpoint {
                reason: format!("unsupported scheme: {}", other.unwrap_or("none")),
                endpoint,
            }),
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
