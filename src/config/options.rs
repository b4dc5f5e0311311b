//! Signaling connection configuration.
//!
//! [`SignalingConfig`] is the value the lifecycle manager observes. It is
//! immutable once built; supplying a different value is how callers ask
//! for a new connection.
//!
//! # Example
//!
//! ```ignore
//! use signaling_lifecycle::{Role, SignalingConfig};
//!
//! let config = SignalingConfig::builder()
//!     .channel_arn("arn:aws:kinesisvideo:us-west-2:123456789012:channel/demo/1")
//!     .region("us-west-2")
//!     .role(Role::Viewer)
//!     .client_id("viewer-1")
//!     .endpoint("wss://v-1234.kinesisvideo.us-west-2.amazonaws.com")
//!     .build()?;
//!
//! assert!(config.is_ready());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

use super::builder::SignalingConfigBuilder;

// ============================================================================
// Constants
// ============================================================================

/// URL schemes accepted for signaling endpoints.
const ENDPOINT_SCHEMES: &[&str] = &["ws", "wss"];

// ============================================================================
// Role
// ============================================================================

/// Which side of the signaling channel this client plays.
///
/// A publisher owns the channel and does not need a client identifier;
/// every viewer must identify itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Channel owner (called `MASTER` by Kinesis Video Streams).
    #[serde(alias = "MASTER")]
    Publisher,
    /// Peer joining a publisher's channel.
    #[default]
    Viewer,
}

impl Role {
    /// Returns the wire name of the role.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Publisher => "PUBLISHER",
            Self::Viewer => "VIEWER",
        }
    }

    /// Returns `true` if this role must present a client identifier.
    #[inline]
    #[must_use]
    pub const fn requires_client_id(&self) -> bool {
        matches!(self, Self::Viewer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Access key pair used to sign signaling requests.
///
/// Both halves default to empty. The secret never appears in `Debug`
/// output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[inline]
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Returns `true` if neither key is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_empty() && self.secret_access_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_access_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };

        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &secret)
            .finish()
    }
}

// ============================================================================
// SignalingConfig
// ============================================================================

/// Everything needed to construct one signaling client.
///
/// Equality covers every field: two configurations that differ in any
/// field produce different connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingConfig {
    /// Channel ARN naming the signaling channel.
    #[serde(rename = "channelARN")]
    pub channel_arn: String,

    /// Signaling endpoint; typically resolved asynchronously.
    #[serde(default)]
    pub channel_endpoint: Option<String>,

    /// Access key pair.
    #[serde(default)]
    pub credentials: Credentials,

    /// Client identifier; required for viewers.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Service region.
    pub region: String,

    /// Publisher or viewer.
    #[serde(default)]
    pub role: Role,

    /// Correction added to the local clock, in milliseconds.
    #[serde(default, rename = "systemClockOffset")]
    pub system_clock_offset_ms: i64,
}

// ============================================================================
// Constructors
// ============================================================================

impl SignalingConfig {
    /// Creates a builder for a signaling configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> SignalingConfigBuilder {
        SignalingConfigBuilder::new()
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if validation fails
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if validation fails
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl SignalingConfig {
    /// Returns the endpoint if it is present and non-empty.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.channel_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
    }

    /// Returns the client identifier if it is present and non-empty.
    #[inline]
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Returns `true` if a client handle can be created from this value.
    ///
    /// Requires an endpoint, and a client identifier unless the role is
    /// [`Role::Publisher`].
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.endpoint().is_some()
            && (self.client_id().is_some() || !self.role.requires_client_id())
    }

    /// Returns the clock offset as a signed duration pair.
    #[inline]
    #[must_use]
    pub fn clock_offset(&self) -> (Duration, bool) {
        let magnitude = Duration::from_millis(self.system_clock_offset_ms.unsigned_abs());
        (magnitude, self.system_clock_offset_ms < 0)
    }

    /// Applies the clock offset to `now`.
    ///
    /// Saturates at the representable range instead of panicking.
    #[must_use]
    pub fn corrected_time(&self, now: SystemTime) -> SystemTime {
        let (magnitude, negative) = self.clock_offset();
        let corrected = if negative {
            now.checked_sub(magnitude)
        } else {
            now.checked_add(magnitude)
        };
        corrected.unwrap_or(now)
    }

    /// Parses the endpoint as a URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no endpoint is set or its scheme is not `ws`/`wss`
    /// - [`Error::Url`] if the endpoint does not parse
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = self
            .endpoint()
            .ok_or_else(|| Error::config("Signaling endpoint is not set"))?;

        let url = Url::parse(endpoint)?;
        if !ENDPOINT_SCHEMES.contains(&url.scheme()) {
            return Err(Error::config(format!(
                "Signaling endpoint must use ws:// or wss://, got {}://",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SignalingConfig {
    /// Validates the configuration.
    ///
    /// An absent endpoint or client identifier is valid: the value is
    /// simply not ready yet.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if channel ARN or region is empty
    /// - [`Error::Config`] or [`Error::Url`] if a present endpoint is malformed
    pub fn validate(&self) -> Result<()> {
        if self.channel_arn.trim().is_empty() {
            return Err(Error::config(
                "Channel ARN is required. Use .channel_arn() to set it.",
            ));
        }

        if self.region.trim().is_empty() {
            return Err(Error::config("Region is required. Use .region() to set it."));
        }

        if self.endpoint().is_some() {
            self.endpoint_url()?;
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const ARN: &str = "arn:aws:kinesisvideo:us-west-2:123456789012:channel/demo/1";

    fn base() -> SignalingConfig {
        SignalingConfig {
            channel_arn: ARN.to_string(),
            region: "us-west-2".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_endpoint_is_not_ready() {
        let config = SignalingConfig {
            role: Role::Publisher,
            ..base()
        };
        assert!(!config.is_ready());
    }

    #[test]
    fn test_empty_endpoint_is_not_ready() {
        let config = SignalingConfig {
            channel_endpoint: Some(String::new()),
            role: Role::Publisher,
            ..base()
        };
        assert!(!config.is_ready());
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn test_viewer_without_client_id_is_not_ready() {
        let config = SignalingConfig {
            channel_endpoint: Some("wss://x".into()),
            client_id: Some(String::new()),
            role: Role::Viewer,
            ..base()
        };
        assert!(!config.is_ready());
    }

    #[test]
    fn test_publisher_without_client_id_is_ready() {
        let config = SignalingConfig {
            channel_endpoint: Some("wss://x".into()),
            role: Role::Publisher,
            ..base()
        };
        assert!(config.is_ready());
    }

    #[test]
    fn test_viewer_with_client_id_is_ready() {
        let config = SignalingConfig {
            channel_endpoint: Some("wss://x".into()),
            client_id: Some("viewer-1".into()),
            ..base()
        };
        assert!(config.is_ready());
    }

    #[test]
    fn test_role_serde_accepts_master_alias() {
        let role: Role = serde_json::from_str("\"MASTER\"").unwrap();
        assert_eq!(role, Role::Publisher);
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"VIEWER\"");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let json = format!(r#"{{"channelARN": "{ARN}", "region": "us-west-2"}}"#);
        let config = SignalingConfig::from_json_str(&json).unwrap();

        assert_eq!(config.channel_endpoint, None);
        assert!(config.credentials.is_empty());
        assert_eq!(config.role, Role::Viewer);
        assert_eq!(config.system_clock_offset_ms, 0);
    }

    #[test]
    fn test_from_json_full_document() {
        let json = format!(
            r#"{{
                "channelARN": "{ARN}",
                "channelEndpoint": "wss://v-1.kinesisvideo.us-west-2.amazonaws.com",
                "credentials": {{ "accessKeyId": "AKID" }},
                "clientId": "viewer-7",
                "region": "us-west-2",
                "role": "VIEWER",
                "systemClockOffset": -1500
            }}"#
        );
        let config = SignalingConfig::from_json_str(&json).unwrap();

        assert_eq!(config.credentials.access_key_id, "AKID");
        assert_eq!(config.credentials.secret_access_key, "");
        assert_eq!(config.client_id(), Some("viewer-7"));
        assert_eq!(config.system_clock_offset_ms, -1500);
        assert!(config.is_ready());
    }

    #[test]
    fn test_from_json_rejects_http_endpoint() {
        let json = format!(
            r#"{{"channelARN": "{ARN}", "region": "r", "channelEndpoint": "http://x"}}"#
        );
        let err = SignalingConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signaling.json");
        fs::write(
            &path,
            format!(r#"{{"channelARN": "{ARN}", "region": "eu-west-1", "role": "MASTER"}}"#),
        )
        .unwrap();

        let config = SignalingConfig::from_json_file(&path).unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.role, Role::Publisher);
    }

    #[test]
    fn test_validate_requires_region() {
        let config = SignalingConfig {
            region: String::new(),
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_corrected_time() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        let ahead = SignalingConfig {
            system_clock_offset_ms: 2_000,
            ..base()
        };
        assert_eq!(ahead.corrected_time(now), now + Duration::from_secs(2));

        let behind = SignalingConfig {
            system_clock_offset_ms: -2_000,
            ..base()
        };
        assert_eq!(behind.corrected_time(now), now - Duration::from_secs(2));
    }

    proptest! {
        #[test]
        fn prop_ready_iff_endpoint_and_identity(
            endpoint in proptest::option::of("[a-z:/]{0,8}"),
            client_id in proptest::option::of("[a-z0-9]{0,4}"),
            publisher in any::<bool>(),
        ) {
            let role = if publisher { Role::Publisher } else { Role::Viewer };
            let config = SignalingConfig {
                channel_endpoint: endpoint.clone(),
                client_id: client_id.clone(),
                role,
                ..base()
            };

            let has_endpoint = endpoint.is_some_and(|e| !e.is_empty());
            let has_client = client_id.is_some_and(|c| !c.is_empty());
            prop_assert_eq!(config.is_ready(), has_endpoint && (has_client || publisher));
        }
    }
}
