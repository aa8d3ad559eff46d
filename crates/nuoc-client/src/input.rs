//! Text the user is composing, not yet part of the log.

use crate::connection::{Connection, SendOutcome};

/// Staged input owned by the UI. Cleared only by a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInput {
    text: String,
}

impl PendingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether sending now would be a no-op.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Send the staged text through `connection`.
    pub fn submit(&mut self, connection: &mut Connection) -> SendOutcome {
        let outcome = connection.send(&self.text);
        self.settle(outcome);
        outcome
    }

    pub(crate) fn settle(&mut self, outcome: SendOutcome) {
        if outcome == SendOutcome::Sent {
            self.clear();
        }
    }
}
