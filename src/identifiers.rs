//! Type-safe identifiers.
//!
//! Newtype wrappers keep listener subscriptions and handle generations
//! from being mixed up with each other or with plain integers.
//!
//! | Type | Backing | Scope |
//! |------|---------|-------|
//! | [`SubscriptionId`] | UUID v4 | One error listener on one client |
//! | [`Generation`] | `u64` | One client handle within one manager |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SubscriptionId
// ============================================================================

/// Identifies an error listener registered on a signaling client.
///
/// Returned by [`SignalingClient::on_error`](crate::client::SignalingClient::on_error)
/// and passed back to `off_error` to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Creates a new random subscription ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Monotonic counter naming one client handle inside a lifecycle manager.
///
/// Every construction attempt bumps the generation, so a listener tagged
/// with an older generation can tell it no longer belongs to the
/// current handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any handle was constructed.
    pub const INITIAL: Self = Self(0);

    /// Returns the following generation.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
