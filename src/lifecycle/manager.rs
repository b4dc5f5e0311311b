//! Connection lifecycle manager.
//!
//! Owns at most one signaling client at a time. Each accepted
//! configuration is diffed against the last one with [`plan()`]; the
//! resulting actions release the old handle before a new one is built
//! and opened.
//!
//! # Error Slot
//!
//! Asynchronous client errors are written into a `watch` channel. A
//! listener only writes while the manager's shared state still names its
//! generation in [`LifecycleState::Constructing`] or
//! [`LifecycleState::Open`]; anything arriving after release has begun
//! is logged and dropped.
//!
//! # Example
//!
//! ```ignore
//! use signaling_lifecycle::{LifecycleManager, WebSocketClientFactory};
//!
//! let mut manager = LifecycleManager::new(WebSocketClientFactory::default());
//! manager.configure(config);
//!
//! if let Some(client) = manager.client() {
//!     client.send_text(offer)?;
//! }
//!
//! let mut errors = manager.watch_error();
//! errors.changed().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::client::{ClientFactory, ErrorListener, SignalingClient};
use crate::config::SignalingConfig;
use crate::error::Error;
use crate::identifiers::{Generation, SubscriptionId};

use super::plan::{Action, plan};
use super::state::LifecycleState;

// ============================================================================
// Types
// ============================================================================

/// Error slot contents.
pub type ErrorSlot = Option<Arc<Error>>;

// ============================================================================
// ConfigureOutcome
// ============================================================================

/// What a call to [`LifecycleManager::configure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureOutcome {
    /// Configuration equal to the applied one; nothing changed.
    Unchanged,
    /// Configuration not ready; no handle exists.
    Idle,
    /// A new handle was built and opened.
    Opened(Generation),
    /// The factory rejected the configuration; the error is in the slot.
    Failed(Generation),
}

// ============================================================================
// Shared
// ============================================================================

/// State read by error listeners.
#[derive(Debug, Default)]
struct Shared {
    /// Current lifecycle state.
    state: LifecycleState,
    /// Generation of the handle the state refers to.
    generation: Generation,
}

impl Shared {
    /// Returns `true` if an error tagged with `generation` should be kept.
    #[inline]
    fn accepts(&self, generation: Generation) -> bool {
        self.generation == generation && self.state.accepts_errors()
    }
}

// ============================================================================
// ActiveHandle
// ============================================================================

/// The live client and the subscription attached to it.
struct ActiveHandle<C> {
    client: Arc<C>,
    subscription: SubscriptionId,
    generation: Generation,
}

// ============================================================================
// LifecycleManager
// ============================================================================

/// Drives one signaling client through configuration changes.
///
/// Public entry points never fail: construction and connection errors
/// are logged and surfaced through [`error`](Self::error) and
/// [`watch_error`](Self::watch_error). There is no automatic retry;
/// supply a different configuration to try again.
///
/// Dropping the manager releases the current handle.
pub struct LifecycleManager<F: ClientFactory> {
    /// Builds clients.
    factory: F,
    /// Last configuration passed to `configure`.
    applied: Option<SignalingConfig>,
    /// Live handle, if any.
    active: Option<ActiveHandle<F::Client>>,
    /// State shared with error listeners.
    shared: Arc<Mutex<Shared>>,
    /// Error slot.
    error_tx: Arc<watch::Sender<ErrorSlot>>,
}

impl<F: ClientFactory> fmt::Debug for LifecycleManager<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("LifecycleManager")
            .field("state", &shared.state)
            .field("generation", &shared.generation)
            .field("has_client", &self.active.is_some())
            .field("error", &self.error_tx.borrow().as_deref().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LifecycleManager - Constructor
// ============================================================================

impl<F: ClientFactory> LifecycleManager<F> {
    /// Creates an idle manager.
    #[must_use]
    pub fn new(factory: F) -> Self {
        let (error_tx, _) = watch::channel(None);

        Self {
            factory,
            applied: None,
            active: None,
            shared: Arc::new(Mutex::new(Shared::default())),
            error_tx: Arc::new(error_tx),
        }
    }
}

// ============================================================================
// LifecycleManager - Public API
// ============================================================================

impl<F: ClientFactory> LifecycleManager<F> {
    /// Applies a configuration.
    ///
    /// Releases the current handle if the configuration changed, then
    /// builds and opens a new one if `config` is ready.
    pub fn configure(&mut self, config: SignalingConfig) -> ConfigureOutcome {
        if self.applied.as_ref() == Some(&config) {
            debug!("Signaling configuration unchanged");
            return ConfigureOutcome::Unchanged;
        }

        let actions = plan(self.applied.as_ref(), self.state(), &config);

        let mut outcome = ConfigureOutcome::Idle;
        for action in actions {
            match action {
                Action::Release => {
                    self.release_active();
                }
                Action::Construct => outcome = self.construct(&config),
            }
        }

        if outcome == ConfigureOutcome::Idle {
            debug!(role = %config.role, "Signaling configuration not ready");
        }

        self.applied = Some(config);
        outcome
    }

    /// Releases the current handle and forgets the applied configuration.
    ///
    /// Idempotent. A later `configure` with the same configuration builds
    /// a fresh handle. Returns `true` if a handle was released.
    pub fn release(&mut self) -> bool {
        self.applied = None;
        self.release_active()
    }

    /// Returns the current handle.
    #[inline]
    #[must_use]
    pub fn client(&self) -> Option<Arc<F::Client>> {
        self.active.as_ref().map(|active| Arc::clone(&active.client))
    }

    /// Returns the last surfaced error.
    #[inline]
    #[must_use]
    pub fn error(&self) -> ErrorSlot {
        self.error_tx.borrow().clone()
    }

    /// Subscribes to error slot changes.
    #[inline]
    #[must_use]
    pub fn watch_error(&self) -> watch::Receiver<ErrorSlot> {
        self.error_tx.subscribe()
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.shared.lock().state
    }

    /// Returns the generation of the most recent construction attempt.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.shared.lock().generation
    }

    /// Returns the last applied configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<&SignalingConfig> {
        self.applied.as_ref()
    }

    /// Returns the client factory.
    #[inline]
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

// ============================================================================
// LifecycleManager - Transitions
// ============================================================================

impl<F: ClientFactory> LifecycleManager<F> {
    /// Idle → Constructing → Open, or back to Idle on factory failure.
    fn construct(&mut self, config: &SignalingConfig) -> ConfigureOutcome {
        let generation = {
            let mut shared = self.shared.lock();
            shared.generation = shared.generation.next();
            shared.state = LifecycleState::Constructing;
            shared.generation
        };

        let client = match self.factory.create(config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(%generation, error = %e, "Failed to construct signaling client");
                self.shared.lock().state = LifecycleState::Idle;
                self.error_tx.send_replace(Some(Arc::new(e)));
                return ConfigureOutcome::Failed(generation);
            }
        };

        let subscription = client.on_error(self.error_listener(generation));
        client.open();

        {
            let mut shared = self.shared.lock();
            if shared.generation == generation && shared.state == LifecycleState::Constructing {
                shared.state = LifecycleState::Open;
            }
        }

        info!(%generation, role = %config.role, "Signaling client opened");

        self.active = Some(ActiveHandle {
            client,
            subscription,
            generation,
        });

        ConfigureOutcome::Opened(generation)
    }

    /// Open → Releasing → Idle.
    fn release_active(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            self.shared.lock().state = LifecycleState::Idle;
            return false;
        };

        self.shared.lock().state = LifecycleState::Releasing;

        active.client.off_error(active.subscription);
        active.client.close();

        self.shared.lock().state = LifecycleState::Idle;
        debug!(generation = %active.generation, "Signaling client released");

        true
    }

    /// Builds the error listener for one generation.
    fn error_listener(&self, generation: Generation) -> ErrorListener {
        let shared = Arc::clone(&self.shared);
        let error_tx = Arc::clone(&self.error_tx);

        Arc::new(move |err: Arc<Error>| {
            error!(%generation, error = %err, "Signaling client error");

            // Lock held across the write so release cannot interleave
            let shared = shared.lock();
            if !shared.accepts(generation) {
                debug!(
                    %generation,
                    current = %shared.generation,
                    state = %shared.state,
                    "Discarding error from released signaling client"
                );
                return;
            }

            error_tx.send_replace(Some(err));
        })
    }
}

impl<F: ClientFactory> Drop for LifecycleManager<F> {
    fn drop(&mut self) {
        self.release_active();
    }
}

// ============================================================================
// Tests
// ============================================================================
