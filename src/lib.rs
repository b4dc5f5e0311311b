//! Signaling Lifecycle - connection lifecycle management for WebRTC
//! signaling clients.
//!
//! This library keeps exactly one signaling client alive for the current
//! configuration: it builds the client once the configuration is ready,
//! opens it, surfaces its asynchronous errors, and closes it when the
//! configuration changes or the manager is dropped.
//!
//! # Architecture
//!
//! ```text
//! SignalingConfig ──configure──► LifecycleManager ──create──► ClientFactory
//!                                   │        ▲                     │
//!                              client()   on_error                 ▼
//!                                   │        └──────────── SignalingClient
//!                                   ▼                       (open / close)
//!                        peer-connection layer
//! ```
//!
//! Key design principles:
//!
//! - The signaling protocol stays behind the [`SignalingClient`] trait
//! - Configuration changes are diffed by a pure function ([`plan()`])
//! - Errors from a released client never reach the error slot
//! - No entry point blocks or returns an error
//!
//! # Quick Start
//!
//! ```no_run
//! use signaling_lifecycle::{LifecycleManager, Role, SignalingConfig, WebSocketClientFactory};
//!
//! #[tokio::main]
//! async fn main() -> signaling_lifecycle::Result<()> {
//!     let config = SignalingConfig::builder()
//!         .channel_arn("arn:aws:kinesisvideo:us-west-2:123456789012:channel/demo/1")
//!         .region("us-west-2")
//!         .role(Role::Publisher)
//!         .endpoint("wss://signal.example.com")
//!         .build()?;
//!
//!     let mut manager = LifecycleManager::new(WebSocketClientFactory::default());
//!     manager.configure(config);
//!
//!     let mut errors = manager.watch_error();
//!     if errors.changed().await.is_ok() {
//!         println!("signaling error: {:?}", errors.borrow().as_deref().map(ToString::to_string));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client traits and the WebSocket client |
//! | [`config`] | Connection configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`lifecycle`] | Lifecycle manager, states and planner |

// ============================================================================
// Modules
// ============================================================================

/// Signaling client traits and implementations.
///
/// - [`SignalingClient`] - handle contract driven by the manager
/// - [`ClientFactory`] - builds handles from configuration
/// - [`WebSocketSignalingClient`] - tokio-tungstenite implementation
pub mod client;

/// Connection configuration.
///
/// Use [`SignalingConfig::builder()`] or [`SignalingConfig::from_json_file`].
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Connection lifecycle management.
pub mod lifecycle;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ClientFactory, ConnectionStatus, ErrorListener, ErrorListeners, MessageHandler,
    RequestSigner, SignalingClient, UnsignedRequests, WebSocketClientFactory,
    WebSocketClientOptions, WebSocketSignalingClient,
};

// Config types
pub use config::{Credentials, Role, SignalingConfig, SignalingConfigBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{Generation, SubscriptionId};

// Lifecycle types
pub use lifecycle::{Action, ConfigureOutcome, ErrorSlot, LifecycleManager, LifecycleState, plan};
