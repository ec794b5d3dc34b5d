//! Token Types
//!
//! The bearer token record issued by the authorization server.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Token issued by the grant endpoint.
///
/// Stored and returned exactly as received; unknown fields are kept in
/// `extra` so the stored record round-trips.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Access token.
    #[serde(default)]
    pub access_token: String,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type, e.g. `bearer`.
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds. Numeric strings and fractional values are
    /// accepted; anything else reads as `None` instead of failing the grant.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_in: Option<u64>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Token {
    /// Create a token without extra fields.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        token_type: impl Into<String>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: token_type.into(),
            expires_in,
            extra: HashMap::new(),
        }
    }

    /// Check if an access token is present.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// The refresh token, ignoring empty values.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Format as `Authorization` header value.
    ///
    /// Only the first character of the token type is upper-cased; the rest is
    /// kept verbatim.
    pub fn authorization_header(&self) -> Option<String> {
        if self.token_type.is_empty() || self.access_token.is_empty() {
            return None;
        }

        let mut chars = self.token_type.chars();
        let scheme: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return None,
        };

        Some(format!("{} {}", scheme, self.access_token))
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => {
            n.as_u64().or_else(|| n.as_f64().and_then(whole_seconds))
        }
        Some(serde_json::Value::String(s)) => {
            s.trim().parse::<f64>().ok().and_then(whole_seconds)
        }
        _ => None,
    };
    Ok(seconds)
}

fn whole_seconds(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
