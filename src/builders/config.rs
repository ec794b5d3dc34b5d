//! Configuration Builder
//!
//! Fluent builder for token service configuration.

use std::time::Duration;

use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{
    normalize_base_url, normalize_path, ServiceConfig, DEFAULT_GRANT_PATH, DEFAULT_REVOKE_PATH,
    DEFAULT_TIMEOUT_SECS,
};
use secrecy::SecretString;

/// Token service configuration builder.
pub struct ServiceConfigBuilder {
    base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    grant_path: String,
    revoke_path: String,
    timeout: Duration,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            client_id: None,
            client_secret: None,
            grant_path: DEFAULT_GRANT_PATH.to_string(),
            revoke_path: DEFAULT_REVOKE_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the authorization server base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set grant endpoint path.
    pub fn grant_path(mut self, path: impl Into<String>) -> Self {
        self.grant_path = path.into();
        self
    }

    /// Set revocation endpoint path.
    pub fn revoke_path(mut self, path: impl Into<String>) -> Self {
        self.revoke_path = path.into();
        self
    }

    /// Set token exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate and normalize the configuration.
    pub fn build(self) -> Result<ServiceConfig, OAuth2Error> {
        let base_url = required("base_url", self.base_url)?;
        let client_id = required("client_id", self.client_id)?;
        let grant_path = required("grant_path", Some(self.grant_path))?;
        let revoke_path = required("revoke_path", Some(self.revoke_path))?;

        let invalid = || {
            OAuth2Error::Configuration(ConfigurationError::InvalidEndpoint {
                url: base_url.clone(),
            })
        };
        let parsed = url::Url::parse(base_url.trim()).map_err(|_| invalid())?;
        if parsed.cannot_be_a_base() || parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid());
        }
        // Canonical form: lowercase scheme and host, default port dropped.
        let base_url = normalize_base_url(parsed.as_str());

        Ok(ServiceConfig {
            base_url,
            client_id,
            client_secret: self.client_secret,
            grant_path: normalize_path(&grant_path),
            revoke_path: normalize_path(&revoke_path),
            timeout: self.timeout,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, OAuth2Error> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(OAuth2Error::Configuration(
            ConfigurationError::MissingRequired {
                field: field.to_string(),
            },
        )),
    }
}

/// Create a new service configuration builder.
pub fn service_config() -> ServiceConfigBuilder {
    ServiceConfigBuilder::new()
}
