//! WebSocket-backed signaling client.
//!
//! Connects to the configured signaling endpoint and relays opaque text
//! frames. Message contents (SDP offers, ICE candidates) are left to the
//! peer-connection layer.
//!
//! # Event Loop
//!
//! [`SignalingClient::open`] spawns a tokio task that:
//!
//! - Connects with a timeout, aborting early if `close` is requested
//! - Forwards incoming text frames to the message handler
//! - Sends outgoing text queued by [`WebSocketSignalingClient::send_text`]
//! - Reports transport failures to error listeners
//!
//! # Connection URL
//!
//! ```text
//! {endpoint}?X-Amz-ChannelARN={arn}[&X-Amz-ClientId={client_id}]
//! ```
//!
//! The URL is passed through a [`RequestSigner`] before connecting.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::SignalingConfig;
use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;

use super::listeners::ErrorListeners;
use super::signer::{RequestSigner, UnsignedRequests};
use super::{ClientFactory, ErrorListener, SignalingClient};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for establishing the WebSocket connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter carrying the channel ARN.
const CHANNEL_ARN_PARAM: &str = "X-Amz-ChannelARN";

/// Query parameter carrying the client identifier.
const CLIENT_ID_PARAM: &str = "X-Amz-ClientId";

// ============================================================================
// Types
// ============================================================================

/// Handler for incoming text frames.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Write half of the signaling socket.
type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

// ============================================================================
// WebSocketClientOptions
// ============================================================================

/// Tunables for [`WebSocketSignalingClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebSocketClientOptions {
    /// Maximum time allowed for the WebSocket handshake.
    pub connect_timeout: Duration,
}

impl Default for WebSocketClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl WebSocketClientOptions {
    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Observable connection status of a [`WebSocketSignalingClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Constructed, `open` not called yet.
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Socket open.
    Connected,
    /// Closed locally, remotely, or after a failure.
    Closed,
}

// ============================================================================
// ClientCommand
// ============================================================================

/// Internal commands for the event loop.
enum ClientCommand {
    /// Send a text frame.
    Send(String),
    /// Close the connection.
    Close,
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Internal state shared with the event loop.
enum ConnectionState {
    Idle,
    Connecting(mpsc::UnboundedSender<ClientCommand>),
    Connected(mpsc::UnboundedSender<ClientCommand>),
    Closed,
}

impl ConnectionState {
    fn status(&self) -> ConnectionStatus {
        match self {
            Self::Idle => ConnectionStatus::Idle,
            Self::Connecting(_) => ConnectionStatus::Connecting,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Closed => ConnectionStatus::Closed,
        }
    }
}

// ============================================================================
// WebSocketSignalingClient
// ============================================================================

/// Signaling client speaking text frames over a WebSocket.
///
/// # Thread Safety
///
/// `WebSocketSignalingClient` is `Send + Sync`. All methods are
/// non-blocking; `open` needs to be called from within a tokio runtime.
pub struct WebSocketSignalingClient {
    /// Signed connection URL.
    url: Url,
    /// Connection tunables.
    options: WebSocketClientOptions,
    /// Error listeners (shared with event loop).
    listeners: Arc<ErrorListeners>,
    /// Incoming message handler (shared with event loop).
    message_handler: Arc<Mutex<Option<MessageHandler>>>,
    /// Connection state (shared with event loop).
    state: Arc<Mutex<ConnectionState>>,
}

impl fmt::Debug for WebSocketSignalingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketSignalingClient")
            .field("host", &self.url.host_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebSocketSignalingClient - Constructor
// ============================================================================

impl WebSocketSignalingClient {
    /// Creates an unopened client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the endpoint is missing or
    /// malformed, or if signing fails.
    pub fn new(
        config: &SignalingConfig,
        options: WebSocketClientOptions,
        signer: &dyn RequestSigner,
    ) -> Result<Self> {
        let url = Self::connection_url(config)
            .and_then(|url| signer.sign(url, config, config.corrected_time(SystemTime::now())))
            .map_err(|e| Error::construction(e.to_string()))?;

        debug!(
            host = url.host_str().unwrap_or_default(),
            role = %config.role,
            "Signaling client constructed"
        );

        Ok(Self {
            url,
            options,
            listeners: Arc::new(ErrorListeners::new()),
            message_handler: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(ConnectionState::Idle)),
        })
    }

    /// Builds the unsigned connection URL.
    fn connection_url(config: &SignalingConfig) -> Result<Url> {
        let mut url = config.endpoint_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(CHANNEL_ARN_PARAM, &config.channel_arn);
            if let Some(client_id) = config.client_id() {
                query.append_pair(CLIENT_ID_PARAM, client_id);
            }
        }
        Ok(url)
    }
}

// ============================================================================
// WebSocketSignalingClient - Public API
// ============================================================================

impl WebSocketSignalingClient {
    /// Returns the connection URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the current connection status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status()
    }

    /// Sets the handler for incoming text frames.
    pub fn set_message_handler(&self, handler: MessageHandler) {
        *self.message_handler.lock() = Some(handler);
    }

    /// Clears the message handler.
    pub fn clear_message_handler(&self) {
        *self.message_handler.lock() = None;
    }

    /// Queues a text frame for sending.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the socket is not open
    /// - [`Error::ConnectionClosed`] if the event loop has exited
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        match &*self.state.lock() {
            ConnectionState::Connected(command_tx) => command_tx
                .send(ClientCommand::Send(text.into()))
                .map_err(|_| Error::ConnectionClosed),
            _ => Err(Error::NotConnected),
        }
    }
}

// ============================================================================
// SignalingClient Implementation
// ============================================================================

impl SignalingClient for WebSocketSignalingClient {
    fn open(&self) {
        let mut state = self.state.lock();
        if !matches!(*state, ConnectionState::Idle) {
            warn!(status = ?state.status(), "Ignoring open on a client that was already opened");
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                *state = ConnectionState::Closed;
                drop(state);
                let err = Error::connection(format!("no async runtime available: {e}"));
                warn!(error = %err, "Failed to open signaling client");
                self.listeners.emit(err);
                return;
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        *state = ConnectionState::Connecting(command_tx);
        drop(state);

        runtime.spawn(Self::run_event_loop(
            self.url.clone(),
            self.options,
            command_rx,
            Arc::clone(&self.state),
            Arc::clone(&self.listeners),
            Arc::clone(&self.message_handler),
        ));
    }

    fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        match previous {
            ConnectionState::Connecting(command_tx) | ConnectionState::Connected(command_tx) => {
                let _ = command_tx.send(ClientCommand::Close);
                debug!("Close requested");
            }
            ConnectionState::Idle | ConnectionState::Closed => {}
        }
    }

    fn on_error(&self, listener: ErrorListener) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    fn off_error(&self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }
}

impl Drop for WebSocketSignalingClient {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// WebSocketSignalingClient - Event Loop
// ============================================================================

impl WebSocketSignalingClient {
    /// Connects, then pumps frames until closed.
    async fn run_event_loop(
        url: Url,
        options: WebSocketClientOptions,
        mut command_rx: mpsc::UnboundedReceiver<ClientCommand>,
        state: Arc<Mutex<ConnectionState>>,
        listeners: Arc<ErrorListeners>,
        message_handler: Arc<Mutex<Option<MessageHandler>>>,
    ) {
        let Some(ws_stream) = Self::connect(&url, options, &mut command_rx, &state, &listeners).await
        else {
            return;
        };

        // Close may have raced with the handshake
        {
            let mut guard = state.lock();
            let current = std::mem::replace(&mut *guard, ConnectionState::Closed);
            match current {
                ConnectionState::Connecting(command_tx) => {
                    *guard = ConnectionState::Connected(command_tx);
                }
                other => *guard = other,
            }
        }

        info!(host = url.host_str().unwrap_or_default(), "Signaling connection open");

        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            // Called unlocked so the handler may replace itself
                            let handler = message_handler.lock().clone();
                            if let Some(handler) = handler {
                                handler(text.as_str().to_owned());
                            } else {
                                trace!("Dropping message with no handler");
                            }
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "Signaling connection closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            Self::fail(&state, &listeners, Error::WebSocket(e));
                            break;
                        }

                        None => {
                            debug!("Signaling stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(ClientCommand::Send(text)) => {
                            Self::handle_send(text, &mut ws_write, &state, &listeners).await;
                        }

                        Some(ClientCommand::Close) | None => {
                            debug!("Closing signaling connection");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        *state.lock() = ConnectionState::Closed;
        debug!("Signaling event loop terminated");
    }

    /// Performs the handshake, racing it against a close request.
    async fn connect(
        url: &Url,
        options: WebSocketClientOptions,
        command_rx: &mut mpsc::UnboundedReceiver<ClientCommand>,
        state: &Mutex<ConnectionState>,
        listeners: &ErrorListeners,
    ) -> Option<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        let handshake = timeout(options.connect_timeout, connect_async(url.as_str()));
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                biased;

                command = command_rx.recv() => {
                    match command {
                        Some(ClientCommand::Close) | None => {
                            debug!("Close requested before handshake completed");
                            *state.lock() = ConnectionState::Closed;
                            return None;
                        }
                        Some(ClientCommand::Send(_)) => {
                            warn!("Dropping message queued before handshake completed");
                        }
                    }
                }

                result = &mut handshake => {
                    return match result {
                        Ok(Ok((ws_stream, _response))) => Some(ws_stream),
                        Ok(Err(e)) => {
                            Self::fail(state, listeners, Error::WebSocket(e));
                            None
                        }
                        Err(_) => {
                            let timeout_ms = timeout_millis(options.connect_timeout);
                            Self::fail(state, listeners, Error::connection_timeout(timeout_ms));
                            None
                        }
                    };
                }
            }
        }
    }

    /// Sends one text frame.
    async fn handle_send(
        text: String,
        ws_write: &mut WsSink,
        state: &Mutex<ConnectionState>,
        listeners: &ErrorListeners,
    ) {
        let len = text.len();
        match ws_write.send(Message::Text(text.into())).await {
            Ok(()) => trace!(len, "Message sent"),
            Err(e) => Self::fail(state, listeners, Error::WebSocket(e)),
        }
    }

    /// Marks the connection closed and notifies listeners.
    fn fail(state: &Mutex<ConnectionState>, listeners: &ErrorListeners, err: Error) {
        *state.lock() = ConnectionState::Closed;
        warn!(error = %err, "Signaling connection error");
        listeners.emit(err);
    }
}

/// Converts a timeout to whole milliseconds, saturating at `u64::MAX`.
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// WebSocketClientFactory
// ============================================================================

/// Builds [`WebSocketSignalingClient`]s.
#[derive(Clone)]
pub struct WebSocketClientFactory {
    /// Options applied to every client.
    options: WebSocketClientOptions,
    /// Signer applied to every connection URL.
    signer: Arc<dyn RequestSigner>,
}

impl fmt::Debug for WebSocketClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketClientFactory")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for WebSocketClientFactory {
    fn default() -> Self {
        Self::new(WebSocketClientOptions::default())
    }
}

impl WebSocketClientFactory {
    /// Creates a factory producing unsigned clients.
    #[must_use]
    pub fn new(options: WebSocketClientOptions) -> Self {
        Self {
            options,
            signer: Arc::new(UnsignedRequests),
        }
    }

    /// Replaces the request signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// Returns the client options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> WebSocketClientOptions {
        self.options
    }
}

impl ClientFactory for WebSocketClientFactory {
    type Client = WebSocketSignalingClient;

    fn create(&self, config: &SignalingConfig) -> Result<WebSocketSignalingClient> {
        WebSocketSignalingClient::new(config, self.options, self.signer.as_ref())
    }
}

// ============================================================================
// Tests
// ============================================================================
