//! Signaling connection configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SignalingConfig`] | Immutable connection configuration |
//! | [`SignalingConfigBuilder`] | Fluent configuration builder |
//! | [`Credentials`] | Access key pair |
//! | [`Role`] | Publisher or viewer |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for signaling configuration.
pub mod builder;

/// Configuration value types.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SignalingConfigBuilder;
pub use options::{Credentials, Role, SignalingConfig};
