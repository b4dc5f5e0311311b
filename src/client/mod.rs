//! Signaling client abstraction.
//!
//! The lifecycle manager never speaks the signaling protocol itself. It
//! drives any type implementing [`SignalingClient`], built by a
//! [`ClientFactory`] from a [`SignalingConfig`].
//!
//! # Client Contract
//!
//! | Method | Behavior |
//! |--------|----------|
//! | `open` | Starts connecting; returns immediately |
//! | `close` | Requests close; idempotent, safe before `open` completes |
//! | `on_error` | Registers an error listener |
//! | `off_error` | Removes an error listener |
//!
//! Failures after `open` are reported only through error listeners.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `listeners` | Error listener registry |
//! | `signer` | Request signing seam |
//! | `websocket` | WebSocket-backed client |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::config::SignalingConfig;
use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;

// ============================================================================
// Submodules
// ============================================================================

/// Error listener registry.
pub mod listeners;

/// Request signing seam.
pub mod signer;

/// WebSocket-backed signaling client.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use listeners::ErrorListeners;
pub use signer::{RequestSigner, UnsignedRequests};
pub use websocket::{
    ConnectionStatus, MessageHandler, WebSocketClientFactory, WebSocketClientOptions,
    WebSocketSignalingClient,
};

// ============================================================================
// Types
// ============================================================================

/// Error listener callback type.
///
/// Called once per asynchronous failure. Errors are shared because one
/// failure fans out to every registered listener.
pub type ErrorListener = Arc<dyn Fn(Arc<Error>) + Send + Sync>;

// ============================================================================
// SignalingClient
// ============================================================================

/// A handle to one signaling connection.
///
/// Implementations must not block in any method: connection work happens
/// on background tasks and failures surface through error listeners.
pub trait SignalingClient: Send + Sync + 'static {
    /// Begins connection establishment.
    fn open(&self);

    /// Requests the connection close.
    ///
    /// Must be idempotent and safe to call before `open` completes.
    fn close(&self);

    /// Registers an error listener.
    fn on_error(&self, listener: ErrorListener) -> SubscriptionId;

    /// Removes a previously registered error listener.
    ///
    /// Unknown IDs are ignored.
    fn off_error(&self, id: SubscriptionId);
}

// ============================================================================
// ClientFactory
// ============================================================================

/// Builds signaling clients from configuration.
pub trait ClientFactory: Send + Sync {
    /// Client type produced by this factory.
    type Client: SignalingClient;

    /// Constructs a client bound to `config`.
    ///
    /// Only called with configurations for which
    /// [`SignalingConfig::is_ready`] holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the client cannot be built.
    fn create(&self, config: &SignalingConfig) -> Result<Self::Client>;
}

impl<C, F> ClientFactory for F
where
    C: SignalingClient,
    F: Fn(&SignalingConfig) -> Result<C> + Send + Sync,
{
    type Client = C;

    #[inline]
    fn create(&self, config: &SignalingConfig) -> Result<C> {
        self(config)
    }
}
