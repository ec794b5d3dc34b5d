//! Configuration Types
//!
//! Token service configuration.

use secrecy::SecretString;
use std::time::Duration;

use crate::builders::ServiceConfigBuilder;
use crate::error::{ConfigurationError, OAuth2Error};

/// Default grant endpoint path.
pub const DEFAULT_GRANT_PATH: &str = "/oauth2/token";
/// Default revocation endpoint path.
pub const DEFAULT_REVOKE_PATH: &str = "/oauth2/revoke";
/// Default HTTP timeout for token exchanges.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Token service configuration.
///
/// Instances are only produced by [`ServiceConfigBuilder::build`], so every
/// `ServiceConfig` is validated and normalized.
#[derive(Clone)]
pub struct ServiceConfig {
    pub(crate) base_url: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: Option<SecretString>,
    pub(crate) grant_path: String,
    pub(crate) revoke_path: String,
    pub(crate) timeout: Duration,
}

impl ServiceConfig {
    /// Create a configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Build a configuration from `OAUTH2_*` environment variables.
    ///
    /// `OAUTH2_BASE_URL` and `OAUTH2_CLIENT_ID` are required;
    /// `OAUTH2_CLIENT_SECRET`, `OAUTH2_GRANT_PATH`, `OAUTH2_REVOKE_PATH` and
    /// `OAUTH2_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, OAuth2Error> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| {
                OAuth2Error::Configuration(ConfigurationError::MissingRequired {
                    field: name.to_string(),
                })
            })
        };

        let mut builder = ServiceConfigBuilder::new()
            .base_url(required("OAUTH2_BASE_URL")?)
            .client_id(required("OAUTH2_CLIENT_ID")?);

        if let Ok(secret) = std::env::var("OAUTH2_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Ok(path) = std::env::var("OAUTH2_GRANT_PATH") {
            builder = builder.grant_path(path);
        }
        if let Ok(path) = std::env::var("OAUTH2_REVOKE_PATH") {
            builder = builder.revoke_path(path);
        }
        if let Ok(raw) = std::env::var("OAUTH2_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                OAuth2Error::Configuration(ConfigurationError::InvalidConfig {
                    message: format!("OAUTH2_TIMEOUT_SECS must be an integer, got `{}`", raw),
                })
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret, if the client is confidential.
    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    /// Grant endpoint path, starting with `/`.
    pub fn grant_path(&self) -> &str {
        &self.grant_path
    }

    /// Revocation endpoint path, starting with `/`.
    pub fn revoke_path(&self) -> &str {
        &self.revoke_path
    }

    /// Timeout applied to token exchanges.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full grant endpoint URL.
    pub fn grant_url(&self) -> String {
        format!("{}{}", self.base_url, self.grant_path)
    }

    /// Full revocation endpoint URL.
    pub fn revoke_url(&self) -> String {
        format!("{}{}", self.base_url, self.revoke_path)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("grant_path", &self.grant_path)
            .field("revoke_path", &self.revoke_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Strip trailing `/` from a base URL.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Ensure an endpoint path starts with `/`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
