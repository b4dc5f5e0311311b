//! Configuration transition planning.
//!
//! [`plan`] decides what the manager must do when a configuration
//! arrives. It is a pure function of the last applied configuration, the
//! current state and the incoming configuration, so every transition can
//! be tested without a client.

// ============================================================================
// Imports
// ============================================================================

use crate::config::SignalingConfig;

use super::state::LifecycleState;

// ============================================================================
// Action
// ============================================================================

/// One step of a configuration transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Unsubscribe from and close the current handle.
    Release,
    /// Build and open a handle for the incoming configuration.
    Construct,
}

// ============================================================================
// plan
// ============================================================================

/// Returns the ordered actions that move the manager to `incoming`.
///
/// - Identical configuration: nothing, even if the last construction
///   failed.
/// - Otherwise `Release` if a handle may exist, then `Construct` if
///   `incoming` is ready.
///
/// `Release` always precedes `Construct`.
#[must_use]
pub fn plan(
    applied: Option<&SignalingConfig>,
    state: LifecycleState,
    incoming: &SignalingConfig,
) -> Vec<Action> {
    if applied == Some(incoming) {
        return Vec::new();
    }

    let mut actions = Vec::with_capacity(2);

    if state.holds_handle() {
        actions.push(Action::Release);
    }

    if incoming.is_ready() {
        actions.push(Action::Construct);
    }

    actions
}

// ============================================================================
// Tests
// ============================================================================
