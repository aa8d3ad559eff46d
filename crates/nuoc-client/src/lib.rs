//! Self-reconnecting chat connection for the water-quality dashboard.
//!
//! The crate is split in two layers:
//!
//! - [`Connection`]: a sans-IO state machine that owns the connection state,
//!   the append-only [`MessageLog`] and a single-slot retry timer. Transport
//!   events go in through `on_*` methods; side effects come out as
//!   [`Action`]s.
//! - [`ChatClient`]: a tokio actor that drives a [`Connection`] over a
//!   WebSocket, reconnecting at a fixed interval until stopped.
//!
//! Failures never surface as errors: they become state changes and system
//! notices in the log.

mod client;
mod config;
mod connection;
mod input;
mod log;
mod retry;
mod state;

pub use client::ChatClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_RETRY_DELAY};
pub use connection::{Action, Connection, SendOutcome};
pub use input::PendingInput;
pub use log::{LogEntry, MessageLog, Origin};
pub use retry::{RetrySlot, TimerId};
pub use state::{transition, ConnectionState, Effect, Notice, Transition, Trigger};

/// Errors from configuring or talking to a [`ChatClient`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("invalid chat endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("chat client has shut down")]
    Shutdown,
}
