//! Request Parameter Types
//!
//! Form fields and per-call options for grant, refresh and revocation calls.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{OAuth2Error, ProtocolError};

/// Grant type sent to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantType {
    Password,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Token type hint for revocation (RFC 7009).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Ordered `application/x-www-form-urlencoded` fields.
///
/// Setting an existing key replaces its value in place, which is how caller
/// fields take precedence over service defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormParams {
    fields: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FormParams::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(field) => field.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Overlay `other` on top of these fields; `other` wins on collision.
    pub fn merge(&mut self, other: FormParams) {
        for (key, value) in other.fields {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode as a form body.
    pub fn encode(&self) -> Result<String, OAuth2Error> {
        serde_urlencoded::to_string(&self.fields).map_err(|e| {
            OAuth2Error::Protocol(ProtocolError::InvalidForm {
                message: e.to_string(),
            })
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = FormParams::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Resource-owner credentials for the `password` grant.
#[derive(Clone)]
pub struct PasswordCredentials {
    /// Resource owner username.
    pub username: String,
    /// Resource owner password.
    pub password: SecretString,
    /// Additional caller fields, sent after `username`/`password`.
    pub extra: FormParams,
}

impl PasswordCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
            extra: FormParams::new(),
        }
    }

    /// Add a caller field such as `scope`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.set(key, value);
        self
    }

    pub(crate) fn into_form(self) -> FormParams {
        let mut form = FormParams::new()
            .with("username", self.username)
            .with("password", self.password.expose_secret().as_str());
        form.merge(self.extra);
        form
    }
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("extra", &self.extra)
            .finish()
    }
}

/// Per-call request options. Values set here override service defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Extra headers; replace default headers with the same name.
    pub headers: HashMap<String, String>,
    /// Timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
