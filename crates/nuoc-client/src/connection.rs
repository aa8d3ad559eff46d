//! Sans-IO connection manager.
//!
//! [`Connection`] owns the lifecycle state, the message log and the retry
//! slot. It performs no I/O: every side effect it needs is queued as an
//! [`Action`] which the caller drains with [`Connection::poll_action`] and
//! carries out, reporting transport events back through the `on_*` methods.

use crate::log::{MessageLog, Origin};
use crate::retry::{RetrySlot, TimerId};
use crate::state::{transition, ConnectionState, Effect, Notice, Trigger};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Work the driver must perform on behalf of a [`Connection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a new link. Events from older attempts must be discarded.
    Connect { attempt: u64 },
    /// Write one text message to the open link.
    Transmit(String),
    /// Call [`Connection::on_retry_elapsed`] with `timer` after `delay`.
    ScheduleRetry { timer: TimerId, delay: Duration },
    /// The timer will be ignored if it fires; the driver may drop it.
    CancelRetry { timer: TimerId },
    /// Close the current link without reporting further events for it.
    Disconnect,
}

/// What [`Connection::send`] did with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Logged and queued for transmission.
    Sent,
    /// Not connected. The text was dropped and a reconnect requested.
    Rejected,
}

/// Connection manager and transmission gate for a single remote endpoint.
#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    log: MessageLog,
    retry: RetrySlot,
    retry_delay: Duration,
    actions: VecDeque<Action>,
    attempts: u64,
    writable: bool,
    halted: bool,
}

impl Connection {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            log: MessageLog::new(),
            retry: RetrySlot::default(),
            retry_delay,
            actions: VecDeque::new(),
            attempts: 0,
            writable: false,
            halted: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Number of connection attempts initiated so far.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts
    }

    /// The retry currently armed, if any.
    pub fn pending_retry(&self) -> Option<TimerId> {
        self.retry.pending()
    }

    /// True after [`stop`](Self::stop) until the next [`start`](Self::start).
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Begin connecting unless an attempt is already in flight or open.
    pub fn start(&mut self) {
        self.halted = false;
        self.apply(Trigger::Start);
    }

    pub fn on_open(&mut self) {
        if self.ignore_when_halted("open") {
            return;
        }
        if self.apply(Trigger::Opened) {
            self.writable = true;
        }
    }

    pub fn on_message(&mut self, data: impl Into<String>) {
        if self.ignore_when_halted("message") {
            return;
        }
        self.log.append(Origin::RemotePeer, data);
    }

    /// The link closed. Schedules exactly one retry.
    pub fn on_close(&mut self) {
        if self.ignore_when_halted("close") {
            return;
        }
        self.apply(Trigger::Closed);
    }

    /// The link failed. The matching close is expected to follow.
    pub fn on_error(&mut self) {
        if self.ignore_when_halted("error") {
            return;
        }
        self.apply(Trigger::Errored);
    }

    /// A scheduled retry elapsed. Stale or cancelled timers are ignored.
    pub fn on_retry_elapsed(&mut self, timer: TimerId) {
        if !self.retry.fire(timer) {
            debug!(%timer, "ignoring stale retry");
            return;
        }
        debug!(%timer, "retrying connection");
        self.start();
    }

    /// The link can no longer be written even though no close arrived yet.
    pub fn mark_unwritable(&mut self) {
        self.writable = false;
    }

    /// Close the connection and cancel any pending retry. No further
    /// reconnection happens until [`start`](Self::start) is called again.
    pub fn stop(&mut self) {
        self.apply(Trigger::Stop);
        self.halted = true;
    }

    /// Send `text` if the link is open; otherwise drop it and reconnect.
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        if self.state.is_connected() && self.writable {
            self.log.append(Origin::LocalUser, text);
            self.actions.push_back(Action::Transmit(text.to_string()));
            SendOutcome::Sent
        } else {
            self.log
                .append(Origin::SystemNotice, Notice::SendRejected.text());
            self.start();
            SendOutcome::Rejected
        }
    }

    /// Next side effect for the driver to perform.
    pub fn poll_action(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    fn ignore_when_halted(&self, event: &str) -> bool {
        if self.halted {
            debug!(event, "connection stopped, ignoring transport event");
        }
        self.halted
    }

    fn apply(&mut self, trigger: Trigger) -> bool {
        let Some(t) = transition(self.state, trigger) else {
            debug!(state = %self.state, ?trigger, "no-op transition");
            return false;
        };

        debug!(from = %self.state, to = %t.next, ?trigger, "transition");
        self.state = t.next;
        if !self.state.is_connected() {
            self.writable = false;
        }

        for effect in t.effects {
            match *effect {
                Effect::Connect => {
                    self.attempts += 1;
                    self.actions.push_back(Action::Connect {
                        attempt: self.attempts,
                    });
                }
                Effect::Notify(notice) => {
                    self.log.append(Origin::SystemNotice, notice.text());
                }
                Effect::ScheduleRetry => {
                    let (timer, replaced) = self.retry.arm();
                    if let Some(old) = replaced {
                        self.actions.push_back(Action::CancelRetry { timer: old });
                    }
                    self.actions.push_back(Action::ScheduleRetry {
                        timer,
                        delay: self.retry_delay,
                    });
                }
                Effect::CancelRetry => {
                    if let Some(timer) = self.retry.cancel() {
                        self.actions.push_back(Action::CancelRetry { timer });
                    }
                }
                Effect::Disconnect => self.actions.push_back(Action::Disconnect),
            }
        }
        true
    }
}
