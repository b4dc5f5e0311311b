//! Builder pattern for signaling configuration.
//!
//! Provides a fluent API for creating [`SignalingConfig`] values.
//!
//! # Example
//!
//! ```no_run
//! use signaling_lifecycle::{Role, SignalingConfig};
//!
//! # fn example() -> signaling_lifecycle::Result<()> {
//! let config = SignalingConfig::builder()
//!     .channel_arn("arn:aws:kinesisvideo:us-west-2:123456789012:channel/demo/1")
//!     .region("us-west-2")
//!     .role(Role::Publisher)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;

use super::options::{Credentials, Role, SignalingConfig};

// ============================================================================
// SignalingConfigBuilder
// ============================================================================

/// Builder for a [`SignalingConfig`].
///
/// Use [`SignalingConfig::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SignalingConfigBuilder {
    /// Configuration under construction.
    config: SignalingConfig,
}

// ============================================================================
// SignalingConfigBuilder Implementation
// ============================================================================

impl SignalingConfigBuilder {
    /// Creates a builder with every field empty.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the channel ARN.
    #[inline]
    #[must_use]
    pub fn channel_arn(mut self, arn: impl Into<String>) -> Self {
        self.config.channel_arn = arn.into();
        self
    }

    /// Sets the signaling endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.channel_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the endpoint from an optional value.
    ///
    /// Useful when the endpoint is resolved asynchronously and may not
    /// be known yet.
    #[inline]
    #[must_use]
    pub fn maybe_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.config.channel_endpoint = endpoint;
        self
    }

    /// Sets the client identifier.
    #[inline]
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Sets the access key pair.
    #[inline]
    #[must_use]
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.config.credentials = Credentials::new(access_key_id, secret_access_key);
        self
    }

    /// Sets the service region.
    #[inline]
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    /// Sets the role.
    #[inline]
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Sets the clock offset in milliseconds.
    #[inline]
    #[must_use]
    pub fn system_clock_offset_ms(mut self, offset_ms: i64) -> Self {
        self.config.system_clock_offset_ms = offset_ms;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if channel ARN or region is missing
    /// - [`Error::Config`](crate::Error::Config) or [`Error::Url`](crate::Error::Url)
    ///   if the endpoint is set but malformed
    pub fn build(self) -> Result<SignalingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ============================================================================
// Tests
// ============================================================================
