//! End-to-end lifecycle tests against a local WebSocket server.

use std::sync::{Arc, Once};
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use signaling_lifecycle::{
    ConfigureOutcome, ConnectionStatus, LifecycleManager, LifecycleState, Role, SignalingConfig,
    WebSocketClientFactory, WebSocketClientOptions, WebSocketSignalingClient,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helpers
// ============================================================================

const ARN: &str = "arn:aws:kinesisvideo:us-west-2:123456789012:channel/demo/1";
const WAIT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn publisher(endpoint: &str) -> Result<SignalingConfig> {
    Ok(SignalingConfig::builder()
        .channel_arn(ARN)
        .region("us-west-2")
        .role(Role::Publisher)
        .endpoint(endpoint)
        .build()?)
}

async fn wait_for_status(client: &WebSocketSignalingClient, status: ConnectionStatus) -> Result<()> {
    let deadline = Instant::now() + WAIT;
    while client.status() != status {
        anyhow::ensure!(
            Instant::now() < deadline,
            "client stuck in {:?}, wanted {status:?}",
            client.status()
        );
        sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Accepts WebSocket connections, replies "pong" to "ping", and reports
/// each connection's termination on `closed_tx`.
async fn spawn_server() -> Result<(String, mpsc::UnboundedReceiver<usize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("ws://{}", listener.local_addr()?);
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut index = 0usize;
        while let Ok((stream, _)) = listener.accept().await {
            let closed_tx = closed_tx.clone();
            let connection = index;
            index += 1;

            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    match message {
                        Message::Text(text) if text.as_str() == "ping" => {
                            let _ = ws.send(Message::Text(String::from("pong").into())).await;
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                let _ = closed_tx.send(connection);
            });
        }
    });

    Ok((url, closed_rx))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn refused_connection_lands_in_error_slot() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = format!("ws://{}", listener.local_addr()?);
    drop(listener);

    let mut manager = LifecycleManager::new(WebSocketClientFactory::default());
    let mut errors = manager.watch_error();

    let outcome = manager.configure(publisher(&endpoint)?);
    assert!(matches!(outcome, ConfigureOutcome::Opened(_)));

    timeout(WAIT, errors.changed()).await.context("no error surfaced")??;
    let error = manager.error().context("slot empty")?;
    assert!(error.is_connection_error(), "unexpected error: {error}");

    // The handle stays current until the caller supplies a new configuration
    assert_eq!(manager.state(), LifecycleState::Open);
    assert!(manager.client().is_some());
    Ok(())
}

#[tokio::test]
async fn open_client_exchanges_messages() -> Result<()> {
    init_tracing();

    let (endpoint, _closed) = spawn_server().await?;
    let mut manager = LifecycleManager::new(WebSocketClientFactory::default());
    manager.configure(publisher(&endpoint)?);

    let client = manager.client().context("no client")?;
    wait_for_status(&client, ConnectionStatus::Connected).await?;

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    client.set_message_handler(Arc::new(move |text: String| {
        let _ = message_tx.send(text);
    }));
    client.send_text("ping")?;

    let reply = timeout(WAIT, message_rx.recv()).await?.context("handler dropped")?;
    assert_eq!(reply, "pong");
    assert!(manager.error().is_none());
    Ok(())
}

#[tokio::test]
async fn message_handler_can_clear_itself() -> Result<()> {
    init_tracing();

    let (endpoint, _closed) = spawn_server().await?;
    let mut manager = LifecycleManager::new(WebSocketClientFactory::default());
    manager.configure(publisher(&endpoint)?);

    let client = manager.client().context("no client")?;
    wait_for_status(&client, ConnectionStatus::Connected).await?;

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    let weak = Arc::downgrade(&client);
    client.set_message_handler(Arc::new(move |text: String| {
        let _ = message_tx.send(text);
        if let Some(client) = weak.upgrade() {
            client.clear_message_handler();
        }
    }));
    client.send_text("ping")?;

    let reply = timeout(WAIT, message_rx.recv()).await?.context("handler dropped")?;
    assert_eq!(reply, "pong");

    // The handler was dropped once cleared, closing the channel
    assert!(timeout(WAIT, message_rx.recv()).await?.is_none());

    // The event loop is still serving the connection
    client.send_text("ping")?;
    assert_eq!(client.status(), ConnectionStatus::Connected);
    Ok(())
}

#[tokio::test]
async fn reconfigure_closes_previous_connection() -> Result<()> {
    init_tracing();

    let (endpoint, mut closed) = spawn_server().await?;
    let mut manager = LifecycleManager::new(WebSocketClientFactory::default());

    manager.configure(publisher(&endpoint)?);
    let first = manager.client().context("no first client")?;
    wait_for_status(&first, ConnectionStatus::Connected).await?;

    let viewer = SignalingConfig::builder()
        .channel_arn(ARN)
        .region("us-west-2")
        .role(Role::Viewer)
        .client_id("viewer-1")
        .endpoint(endpoint.as_str())
        .build()?;
    manager.configure(viewer);

    let closed_index = timeout(WAIT, closed.recv()).await?.context("server gone")?;
    assert_eq!(closed_index, 0);
    assert_eq!(first.status(), ConnectionStatus::Closed);

    let second = manager.client().context("no second client")?;
    assert!(second.url().as_str().contains("X-Amz-ClientId=viewer-1"));
    wait_for_status(&second, ConnectionStatus::Connected).await?;
    assert!(manager.error().is_none());
    Ok(())
}

#[tokio::test]
async fn stalled_handshake_times_out() -> Result<()> {
    init_tracing();

    // Accepts TCP but never answers the upgrade request
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = format!("ws://{}", listener.local_addr()?);

    let factory = WebSocketClientFactory::new(
        WebSocketClientOptions::default().with_connect_timeout(Duration::from_millis(100)),
    );
    let mut manager = LifecycleManager::new(factory);
    let mut errors = manager.watch_error();
    manager.configure(publisher(&endpoint)?);

    timeout(WAIT, errors.changed()).await.context("no error surfaced")??;
    assert!(manager.error().context("slot empty")?.is_timeout());

    drop(listener);
    Ok(())
}

#[tokio::test]
async fn error_after_release_is_ignored() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let endpoint = format!("ws://{}", listener.local_addr()?);

    let factory = WebSocketClientFactory::new(
        WebSocketClientOptions::default().with_connect_timeout(Duration::from_millis(100)),
    );
    let mut manager = LifecycleManager::new(factory);
    manager.configure(publisher(&endpoint)?);
    assert!(manager.release());

    // Longer than the connect timeout of the released client
    sleep(Duration::from_millis(300)).await;

    assert!(manager.error().is_none());
    assert_eq!(manager.state(), LifecycleState::Idle);
    drop(listener);
    Ok(())
}
