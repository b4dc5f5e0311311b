//! Signaling connection lifecycle.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LifecycleManager`] | Owns and replaces the signaling client |
//! | [`LifecycleState`] | `Idle → Constructing → Open → Releasing → Idle` |
//! | [`plan()`] | Pure configuration diff producing [`Action`]s |
//! | [`ConfigureOutcome`] | Result of one `configure` call |

// ============================================================================
// Submodules
// ============================================================================

/// Lifecycle manager.
pub mod manager;

/// Configuration transition planning.
pub mod plan;

/// Lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::{ConfigureOutcome, ErrorSlot, LifecycleManager};
pub use plan::{Action, plan};
pub use state::LifecycleState;
