//! Connection lifecycle states and the transition table.
//!
//! ```text
//!              start                   open
//! Disconnected ─────▶ Connecting ─────────────▶ Connected
//!      ▲                  │                         │
//!      └──── close/error ─┴──────── close/error ────┘
//! ```
//!
//! `close` additionally schedules one retry; `error` does not (the driver
//! always follows an error with a close for the same attempt).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exactly one is active at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        *self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

/// Inputs that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    Opened,
    Closed,
    Errored,
    Stop,
}

/// Side effects a transition asks for, applied in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Begin a new connection attempt.
    Connect,
    /// Append a system notice.
    Notify(Notice),
    /// Arm the retry timer, replacing any pending one.
    ScheduleRetry,
    /// Disarm the retry timer.
    CancelRetry,
    /// Tear down the current link.
    Disconnect,
}

/// A transition's outcome: the next state plus its effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConnectionState,
    pub effects: &'static [Effect],
}

const CONNECT: &[Effect] = &[Effect::Connect];
const ANNOUNCE_OPEN: &[Effect] = &[Effect::Notify(Notice::Connected)];
const ANNOUNCE_CLOSE: &[Effect] = &[Effect::Notify(Notice::Disconnected), Effect::ScheduleRetry];
const ANNOUNCE_ERROR: &[Effect] = &[Effect::Notify(Notice::Error)];
const SHUT_DOWN: &[Effect] = &[Effect::CancelRetry, Effect::Disconnect];

/// Look up `(state, trigger)`. `None` means the pair is a no-op.
pub fn transition(state: ConnectionState, trigger: Trigger) -> Option<Transition> {
    use ConnectionState::*;

    let (next, effects) = match (state, trigger) {
        (Disconnected, Trigger::Start) => (Connecting, CONNECT),
        (Connecting | Connected, Trigger::Start) => return None,

        (Connected, Trigger::Opened) => return None,
        (Disconnected | Connecting, Trigger::Opened) => (Connected, ANNOUNCE_OPEN),

        (_, Trigger::Closed) => (Disconnected, ANNOUNCE_CLOSE),
        (_, Trigger::Errored) => (Disconnected, ANNOUNCE_ERROR),
        (_, Trigger::Stop) => (Disconnected, SHUT_DOWN),
    };
    Some(Transition { next, effects })
}

/// System notices appended to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Connected,
    Disconnected,
    Error,
    SendRejected,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Connected => "Connected to the chatbot",
            Self::Disconnected => "Disconnected from the chatbot. Attempting to reconnect...",
            Self::Error => "Error connecting to the chatbot",
            Self::SendRejected => "Not connected to the server. Attempting to reconnect...",
        }
    }
}
