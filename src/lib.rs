//! OAuth2 Token Client
//!
//! Client-side OAuth2 token lifecycle with request/response interception.
//!
//! # Features
//!
//! - Resource Owner Password Credentials grant (RFC 6749 Section 4.3)
//! - Token Refresh (RFC 6749 Section 6)
//! - Token Revocation (RFC 7009), clearing the local token whatever the outcome
//! - Pluggable token storage behind a credential vault
//! - Interceptor attaching `Authorization` headers and reacting to
//!   `invalid_grant` / `invalid_token` answers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oauth2_token_client::{
//!     service_config, InterceptingTransport, InterceptorChain, PasswordCredentials,
//!     ReqwestHttpTransport, RequestOptions, TokenService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = service_config()
//!         .base_url("https://api.example.com/")
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .build()?;
//!
//!     let chain = InterceptorChain::new();
//!     let transport = Arc::new(InterceptingTransport::new(
//!         ReqwestHttpTransport::new()?,
//!         chain.clone(),
//!     ));
//!
//!     let service = TokenService::new(config, Arc::new(MyStore::default()), transport);
//!     service.intercept(&chain);
//!     service.on_error(|body| eprintln!("token rejected: {}", body));
//!
//!     service
//!         .get_access_token(PasswordCredentials::new("alice", "secret"), RequestOptions::new())
//!         .await?;
//!     assert!(service.is_authenticated().await?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token record and request parameters
//! - `error`: error hierarchy
//! - `core`: HTTP transport and interceptor middleware
//! - `token`: token store, credential vault and token service
//! - `interceptor`: authorization interceptor
//! - `events`: `oauth:error` / `oauth:exception` notifications
//! - `builders`: fluent configuration builder

pub mod builders;
pub mod core;
pub mod error;
pub mod events;
pub mod interceptor;
pub mod token;
pub mod types;

// Re-export builders
pub use builders::{service_config, ServiceConfigBuilder};

// Re-export errors
pub use error::{
    AuthorizationFailure, ConfigurationError, NetworkError, OAuth2Error, OAuth2Result,
    ProtocolError, StorageError,
};

// Re-export types
pub use types::{
    FormParams, GrantType, PasswordCredentials, RequestOptions, ServiceConfig, Token,
    TokenTypeHint, DEFAULT_GRANT_PATH, DEFAULT_REVOKE_PATH, DEFAULT_TIMEOUT_SECS,
};

// Re-export core components
pub use core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // Middleware
    InterceptingTransport, Interceptor, InterceptorChain, InterceptorHandle,
};

// Re-export token management
pub use token::{
    CredentialVault, MockTokenStore, TokenService, TokenStore, UnimplementedTokenStore, TOKEN_KEY,
};

pub use events::{OAuthEvent, OAuthEvents};
pub use interceptor::{register, AuthInterceptor};
