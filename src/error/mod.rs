//! OAuth2 Error Types
//!
//! Error hierarchy for token lifecycle and interception failures.

use std::time::Duration;
use thiserror::Error;

use crate::core::HttpResponse;

/// Root error type for the token client.
#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The credential store was never wired to a real backend.
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    /// Non-2xx answer from the authorization server.
    #[error("Authorization server responded with HTTP {}", .response.status)]
    Http { response: HttpResponse },

    #[error("Authorization failure: {0}")]
    Authorization(#[from] AuthorizationFailure),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl OAuth2Error {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "OAUTH2_CONFIG",
            Self::NotImplemented { .. } => "OAUTH2_NOT_IMPLEMENTED",
            Self::Http { .. } => "OAUTH2_HTTP",
            Self::Authorization(_) => "OAUTH2_AUTH",
            Self::Network(_) => "OAUTH2_NETWORK",
            Self::Storage(_) => "OAUTH2_STORAGE",
            Self::Protocol(_) => "OAUTH2_PROTOCOL",
        }
    }

    /// Check if the caller has to obtain a new token with credentials.
    ///
    /// A rejected bearer token (`401`) is not included: the stored refresh
    /// token may still be usable.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Authorization(AuthorizationFailure::InvalidGrant { .. })
        )
    }

    /// Check if a refresh may recover from this error.
    pub fn is_refreshable(&self) -> bool {
        matches!(
            self,
            Self::Authorization(AuthorizationFailure::TokenRejected { .. })
        )
    }

    /// The raw HTTP response carried by this error, if any.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Http { response } => Some(response),
            Self::Authorization(failure) => Some(failure.response()),
            _ => None,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing parameter: {field}")]
    MissingRequired { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Authorization failures detected on intercepted responses.
#[derive(Error, Debug)]
pub enum AuthorizationFailure {
    /// `400` with `invalid_grant` / `invalid_request`: the stored token was cleared.
    #[error("Token is no longer usable ({code}), re-authentication required")]
    InvalidGrant { code: String, response: HttpResponse },

    /// `401` with `invalid_token` or a `Bearer` challenge: the stored token was kept.
    #[error("Bearer token rejected by the resource server")]
    TokenRejected { response: HttpResponse },
}

impl AuthorizationFailure {
    /// The original response that triggered the failure.
    pub fn response(&self) -> &HttpResponse {
        match self {
            Self::InvalidGrant { response, .. } | Self::TokenRejected { response } => response,
        }
    }
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Form encoding failed: {message}")]
    InvalidForm { message: String },
}

/// Storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },

    #[error("Corrupted data: {message}")]
    CorruptedData { message: String },
}

/// Result type for token client operations.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;
