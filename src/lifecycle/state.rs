//! Lifecycle states.
//!
//! ```text
//! Idle ──configure──► Constructing ──open──► Open
//!  ▲                       │                  │
//!  │                  (factory error)     release
//!  │                       │                  ▼
//!  └───────────────────────┴─────────── Releasing
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// LifecycleState
// ============================================================================

/// Where the lifecycle manager is with its current handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No handle. Initial state, and the state between configurations.
    #[default]
    Idle,
    /// Factory is building a handle.
    Constructing,
    /// Handle built and `open` requested.
    Open,
    /// Listener removal and close in progress.
    Releasing,
}

impl LifecycleState {
    /// Returns `true` if errors from the current generation reach the slot.
    #[inline]
    #[must_use]
    pub const fn accepts_errors(&self) -> bool {
        matches!(self, Self::Constructing | Self::Open)
    }

    /// Returns `true` if a handle may exist in this state.
    #[inline]
    #[must_use]
    pub const fn holds_handle(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Constructing => "constructing",
            Self::Open => "open",
            Self::Releasing => "releasing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
