//! Request signing seam.
//!
//! Signaling services authenticate the WebSocket upgrade with a signed
//! URL. The signing scheme belongs to the service SDK, so this crate only
//! defines where it plugs in: a [`RequestSigner`] receives the unsigned
//! connection URL, the configuration (credentials, region) and the
//! clock-corrected signing time.

// ============================================================================
// Imports
// ============================================================================

use std::time::SystemTime;

use url::Url;

use crate::config::SignalingConfig;
use crate::error::Result;

// ============================================================================
// RequestSigner
// ============================================================================

/// Turns a connection URL into an authenticated one.
pub trait RequestSigner: Send + Sync {
    /// Signs `url` for `config` at `signed_at`.
    ///
    /// `signed_at` already includes the configured clock offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be signed; the client factory
    /// reports it as a construction failure.
    fn sign(&self, url: Url, config: &SignalingConfig, signed_at: SystemTime) -> Result<Url>;
}

// ============================================================================
// UnsignedRequests
// ============================================================================

/// Signer that leaves the URL untouched.
///
/// For local signaling servers and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedRequests;

impl RequestSigner for UnsignedRequests {
    #[inline]
    fn sign(&self, url: Url, _config: &SignalingConfig, _signed_at: SystemTime) -> Result<Url> {
        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
