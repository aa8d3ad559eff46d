//! Append-only record of everything shown in the chat.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Typed by the local user.
    #[serde(rename = "user")]
    LocalUser,
    /// Received from the chat service.
    #[serde(rename = "bot")]
    RemotePeer,
    /// A connection lifecycle notice.
    #[serde(rename = "system")]
    SystemNotice,
}

/// One line of the conversation. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub origin: Origin,
    /// Opaque text; never parsed.
    pub content: String,
    /// Unix milliseconds; non-decreasing across a log.
    pub created_at: u64,
}

/// Ordered, append-only message log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry stamped with the current time.
    pub fn append(&mut self, origin: Origin, content: impl Into<String>) -> &LogEntry {
        self.append_at(origin, content, now_millis())
    }

    /// Append with an explicit timestamp, clamped so ordering never regresses.
    pub(crate) fn append_at(
        &mut self,
        origin: Origin,
        content: impl Into<String>,
        stamp: u64,
    ) -> &LogEntry {
        let floor = self.entries.last().map_or(0, |e| e.created_at);
        self.entries.push(LogEntry {
            origin,
            content: content.into(),
            created_at: stamp.max(floor),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Every entry in insertion order.
    pub fn all(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
