//! Terminal rendering for the chat widget.

use nuoc_client::{LogEntry, Origin};

/// What a line typed into the widget asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Quit,
    Status,
    Message(String),
}

impl InputLine {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/status" => Self::Status,
            _ => Self::Message(line.to_string()),
        }
    }
}

pub fn icon(origin: Origin) -> &'static str {
    match origin {
        Origin::LocalUser => "👤",
        Origin::RemotePeer => "🤖",
        Origin::SystemNotice => "⚙️",
    }
}

/// One log entry as a printable line.
pub fn render(entry: &LogEntry) -> String {
    format!("{} {}", icon(entry.origin), entry.content)
}
