//! Driver tests against a local WebSocket server.

use futures_util::{SinkExt, StreamExt};
use nuoc_client::{ChatClient, ClientConfig, ConnectionState, LogEntry, Origin, PendingInput, SendOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);
const DISCONNECTED: &str = "Disconnected from the chatbot. Attempting to reconnect...";

#[derive(Clone, Copy)]
enum Behaviour {
    /// Reply to every text message with `echo: <text>`.
    Echo,
    /// Complete the handshake, then close immediately.
    HangUp,
}

/// Start a server and return its URL plus a count of accepted sessions.
async fn serve(behaviour: Behaviour) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let counter = counter.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                match behaviour {
                    Behaviour::Echo => {
                        while let Some(Ok(msg)) = ws.next().await {
                            if let Message::Text(text) = msg {
                                let reply = format!("echo: {}", text.as_str());
                                if ws.send(Message::Text(reply.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Behaviour::HangUp => {
                        let _ = ws.close(None).await;
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                }
            });
        }
    });

    (format!("ws://{addr}/ws/chat"), accepted)
}

fn client(endpoint: &str, retry_ms: u64) -> ChatClient {
    let config = ClientConfig::new(endpoint)
        .unwrap()
        .with_retry_delay(Duration::from_millis(retry_ms));
    ChatClient::spawn(config)
}

async fn wait_for_state(client: &ChatClient, want: ConnectionState) {
    let mut rx = client.watch_state();
    timeout(WAIT, rx.wait_for(|state| *state == want))
        .await
        .expect("timed out waiting for state")
        .expect("client shut down");
}

async fn wait_for_entry(rx: &mut broadcast::Receiver<LogEntry>, origin: Origin, content: &str) {
    timeout(WAIT, async {
        loop {
            let entry = rx.recv().await.expect("entry stream closed");
            if entry.origin == origin && entry.content == content {
                return;
            }
        }
    })
    .await
    .expect("timed out waiting for log entry");
}

#[tokio::test]
async fn echo_round_trip() {
    let (endpoint, _) = serve(Behaviour::Echo).await;
    let client = client(&endpoint, 3000);
    let mut entries = client.subscribe();

    client.start().unwrap();
    wait_for_state(&client, ConnectionState::Connected).await;

    let mut input = PendingInput::new();
    input.set("hello");
    assert_eq!(client.submit(&mut input).await.unwrap(), SendOutcome::Sent);
    assert_eq!(input.as_str(), "");

    wait_for_entry(&mut entries, Origin::RemotePeer, "echo: hello").await;

    let log = client.log().await.unwrap();
    let summary: Vec<_> = log.iter().map(|e| (e.origin, e.content.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (Origin::SystemNotice, "Connected to the chatbot"),
            (Origin::LocalUser, "hello"),
            (Origin::RemotePeer, "echo: hello"),
        ]
    );

    client.stop().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn reconnects_after_server_hangs_up() {
    let (endpoint, accepted) = serve(Behaviour::HangUp).await;
    let client = client(&endpoint, 50);
    let mut entries = client.subscribe();

    client.start().unwrap();
    wait_for_entry(&mut entries, Origin::SystemNotice, DISCONNECTED).await;

    timeout(WAIT, async {
        while accepted.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never reconnected");

    client.stop().await.unwrap();
}

#[tokio::test]
async fn stop_cancels_pending_retry() {
    let (endpoint, accepted) = serve(Behaviour::HangUp).await;
    let client = client(&endpoint, 300);
    let mut entries = client.subscribe();

    client.start().unwrap();
    wait_for_entry(&mut entries, Origin::SystemNotice, DISCONNECTED).await;
    client.stop().await.unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn refused_connection_reports_error_then_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("ws://{addr}/ws/chat"), 5000);
    let mut entries = client.subscribe();
    client.start().unwrap();
    wait_for_entry(&mut entries, Origin::SystemNotice, DISCONNECTED).await;
    client.stop().await.unwrap();

    let log = client.log().await.unwrap();
    let notices: Vec<_> = log.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(notices, vec!["Error connecting to the chatbot", DISCONNECTED]);
}

#[tokio::test]
async fn send_before_start_requests_connection() {
    let (endpoint, _) = serve(Behaviour::Echo).await;
    let client = client(&endpoint, 3000);

    assert_eq!(client.send("hi").await.unwrap(), SendOutcome::Rejected);
    wait_for_state(&client, ConnectionState::Connected).await;

    let log = client.log().await.unwrap();
    assert_eq!(
        log[0].content,
        "Not connected to the server. Attempting to reconnect..."
    );
    assert!(log.iter().all(|e| e.origin != Origin::LocalUser));

    assert_eq!(client.send("   ").await.unwrap(), SendOutcome::Ignored);
    client.stop().await.unwrap();
}
