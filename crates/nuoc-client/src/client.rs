//! Async driver for [`Connection`] over tokio-tungstenite.
//!
//! A single actor task owns the [`Connection`]; handles talk to it over a
//! command channel. Each connection attempt runs in its own link task whose
//! events are tagged with the attempt number, so events from a superseded
//! link never reach the state machine. Every transport failure is reported
//! as an error followed by a close for the same attempt.

use crate::connection::{Action, Connection, SendOutcome};
use crate::input::PendingInput;
use crate::log::LogEntry;
use crate::retry::TimerId;
use crate::state::ConnectionState;
use crate::{ClientConfig, ClientError};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

const ENTRY_CHANNEL_CAPACITY: usize = 256;

/// Handle to a running chat connection.
///
/// Dropping every handle stops the connection.
#[derive(Debug)]
pub struct ChatClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    entries: broadcast::Sender<LogEntry>,
}

#[derive(Debug)]
enum Command {
    Start,
    Send {
        text: String,
        reply: oneshot::Sender<SendOutcome>,
    },
    Log {
        reply: oneshot::Sender<Vec<LogEntry>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug)]
enum LinkEvent {
    Opened {
        attempt: u64,
        outbound: mpsc::UnboundedSender<String>,
    },
    Message {
        attempt: u64,
        text: String,
    },
    Errored {
        attempt: u64,
        reason: String,
    },
    Closed {
        attempt: u64,
    },
    RetryElapsed(TimerId),
}

impl ChatClient {
    /// Spawn the connection actor on the current tokio runtime.
    ///
    /// Nothing connects until [`start`](Self::start) is called.
    pub fn spawn(config: ClientConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (entries_tx, _) = broadcast::channel(ENTRY_CHANNEL_CAPACITY);

        let driver = Driver {
            connection: Connection::new(config.retry_delay()),
            config,
            link: None,
            retry: None,
            events_tx,
            state_tx,
            entries_tx: entries_tx.clone(),
            published: 0,
        };
        tokio::spawn(driver.run(commands_rx, events_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            entries: entries_tx,
        }
    }

    /// Connect, unless already connecting or connected.
    pub fn start(&self) -> Result<(), ClientError> {
        self.command(Command::Start)
    }

    /// Send `text` through the transmission gate.
    pub async fn send(&self, text: impl Into<String>) -> Result<SendOutcome, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Send {
            text: text.into(),
            reply,
        })?;
        rx.await.map_err(|_| ClientError::Shutdown)
    }

    /// Send the staged input, clearing it if it was sent.
    pub async fn submit(&self, input: &mut PendingInput) -> Result<SendOutcome, ClientError> {
        let outcome = self.send(input.as_str()).await?;
        input.settle(outcome);
        Ok(outcome)
    }

    /// Snapshot of the whole log.
    pub async fn log(&self) -> Result<Vec<LogEntry>, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Log { reply })?;
        rx.await.map_err(|_| ClientError::Shutdown)
    }

    /// Close the connection and cancel any pending retry.
    pub async fn stop(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Stop { reply })?;
        rx.await.map_err(|_| ClientError::Shutdown)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Entries appended from now on, in log order.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.entries.subscribe()
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::Shutdown)
    }
}

struct Link {
    attempt: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: JoinHandle<()>,
}

impl Link {
    fn is_writable(&self) -> bool {
        self.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn shutdown(self) {
        match self.outbound {
            // Dropping the sender makes the link close the socket itself.
            Some(outbound) => drop(outbound),
            None => self.task.abort(),
        }
    }
}

struct Driver {
    config: ClientConfig,
    connection: Connection,
    link: Option<Link>,
    retry: Option<(TimerId, JoinHandle<()>)>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    state_tx: watch::Sender<ConnectionState>,
    entries_tx: broadcast::Sender<LogEntry>,
    published: usize,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<LinkEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        tracing::debug!("all handles dropped, shutting down");
        self.connection.stop();
        self.flush();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => {
                self.connection.start();
                self.flush();
            }
            Command::Send { text, reply } => {
                if self.connection.state().is_connected()
                    && !self.link.as_ref().is_some_and(Link::is_writable)
                {
                    self.connection.mark_unwritable();
                }
                let outcome = self.connection.send(&text);
                self.flush();
                let _ = reply.send(outcome);
            }
            Command::Log { reply } => {
                let _ = reply.send(self.connection.log().all().to_vec());
            }
            Command::Stop { reply } => {
                self.connection.stop();
                self.flush();
                let _ = reply.send(());
            }
        }
    }

    fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened { attempt, outbound } => {
                let Some(link) = self.current_link(attempt) else {
                    return;
                };
                link.outbound = Some(outbound);
                tracing::info!(attempt, endpoint = self.config.endpoint(), "connected");
                self.connection.on_open();
            }
            LinkEvent::Message { attempt, text } => {
                if self.current_link(attempt).is_some() {
                    self.connection.on_message(text);
                }
            }
            LinkEvent::Errored { attempt, reason } => {
                if self.current_link(attempt).is_some() {
                    tracing::warn!(attempt, %reason, "connection error");
                    self.connection.on_error();
                }
            }
            LinkEvent::Closed { attempt } => {
                if self.current_link(attempt).is_some() {
                    self.link = None;
                    tracing::info!(attempt, "disconnected");
                    self.connection.on_close();
                }
            }
            LinkEvent::RetryElapsed(timer) => {
                if self.retry.as_ref().is_some_and(|(id, _)| *id == timer) {
                    self.retry = None;
                }
                self.connection.on_retry_elapsed(timer);
            }
        }
        self.flush();
    }

    fn current_link(&mut self, attempt: u64) -> Option<&mut Link> {
        match self.link.as_mut() {
            Some(link) if link.attempt == attempt => Some(link),
            _ => {
                tracing::debug!(attempt, "dropping event from superseded link");
                None
            }
        }
    }

    /// Perform queued actions, then publish new entries and state.
    fn flush(&mut self) {
        while let Some(action) = self.connection.poll_action() {
            self.perform(action);
        }

        let entries = self.connection.log().all();
        for entry in &entries[self.published..] {
            // No subscribers is fine; the log itself is authoritative.
            let _ = self.entries_tx.send(entry.clone());
        }
        self.published = entries.len();

        let state = self.connection.state();
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Connect { attempt } => {
                if let Some(old) = self.link.take() {
                    old.shutdown();
                }
                tracing::debug!(attempt, endpoint = self.config.endpoint(), "connecting");
                let task = tokio::spawn(run_link(
                    self.config.endpoint().to_string(),
                    attempt,
                    self.events_tx.clone(),
                ));
                self.link = Some(Link {
                    attempt,
                    outbound: None,
                    task,
                });
            }
            Action::Transmit(text) => {
                let sent = self
                    .link
                    .as_ref()
                    .and_then(|link| link.outbound.as_ref())
                    .is_some_and(|tx| tx.send(text).is_ok());
                if !sent {
                    tracing::warn!("link closed before message could be written");
                }
            }
            Action::ScheduleRetry { timer, delay } => {
                if let Some((_, handle)) = self.retry.take() {
                    handle.abort();
                }
                tracing::info!(%timer, ?delay, "reconnect scheduled");
                let events = self.events_tx.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(LinkEvent::RetryElapsed(timer));
                });
                self.retry = Some((timer, handle));
            }
            Action::CancelRetry { timer } => {
                if self.retry.as_ref().is_some_and(|(id, _)| *id == timer) {
                    if let Some((_, handle)) = self.retry.take() {
                        handle.abort();
                    }
                }
            }
            Action::Disconnect => {
                if let Some(link) = self.link.take() {
                    link.shutdown();
                }
            }
        }
    }
}

/// One connection attempt, from dial to close.
async fn run_link(endpoint: String, attempt: u64, events: mpsc::UnboundedSender<LinkEvent>) {
    let ws = match tokio_tungstenite::connect_async(endpoint.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            let _ = events.send(LinkEvent::Errored {
                attempt,
                reason: e.to_string(),
            });
            let _ = events.send(LinkEvent::Closed { attempt });
            return;
        }
    };

    let (mut sink, mut stream) = ws.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    if events
        .send(LinkEvent::Opened {
            attempt,
            outbound: outbound_tx,
        })
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        let _ = events.send(LinkEvent::Errored { attempt, reason: e.to_string() });
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(LinkEvent::Message {
                        attempt,
                        text: text.as_str().to_owned(),
                    });
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong are answered by tungstenite; binary is not chat text.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(LinkEvent::Errored { attempt, reason: e.to_string() });
                    break;
                }
            },
        }
    }

    let _ = events.send(LinkEvent::Closed { attempt });
}
