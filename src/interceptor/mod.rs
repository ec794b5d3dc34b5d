//! Authorization Interceptor
//!
//! Attaches the stored bearer token to requests aimed at the authorization
//! server and classifies its `400`/`401` answers:
//!
//! - `400` with `invalid_grant` or `invalid_request`: the token is removed,
//!   `oauth:error` is emitted and the response is rejected.
//! - `401` with `invalid_token` or a `Bearer` challenge: `oauth:error` is
//!   emitted and the response is rejected. The token is kept.
//!
//! Anything else passes through untouched. Failures inside the interceptor
//! (unreadable store, unparseable body) are reported as `oauth:exception`
//! and never block traffic.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::core::{HttpRequest, HttpResponse, Interceptor, InterceptorChain, InterceptorHandle};
use crate::error::{AuthorizationFailure, OAuth2Error};
use crate::events::OAuthEvents;
use crate::token::{CredentialVault, TokenService};

const AUTHORIZATION: &str = "authorization";
const WWW_AUTHENTICATE: &str = "www-authenticate";

/// Interceptor bound to one authorization server.
///
/// A URL is handled when it has the base URL's scheme, host and port and its
/// path is the base path or lies below it. An unparseable base URL matches
/// nothing.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    base_url: Option<Url>,
    vault: CredentialVault,
    events: OAuthEvents,
}

impl AuthInterceptor {
    pub fn new(base_url: impl AsRef<str>, vault: CredentialVault, events: OAuthEvents) -> Self {
        let base_url = Url::parse(base_url.as_ref()).ok();
        if base_url.is_none() {
            tracing::warn!("interceptor base URL does not parse, no request will be handled");
        }

        Self {
            base_url,
            vault,
            events,
        }
    }

    /// Build an interceptor sharing the service's vault and events.
    pub fn for_service(service: &TokenService) -> Self {
        Self::new(
            service.config().base_url(),
            service.vault().clone(),
            service.events().clone(),
        )
    }

    fn targets(&self, url: &str) -> bool {
        match (&self.base_url, Url::parse(url)) {
            (Some(base), Ok(target)) => is_under(base, &target),
            _ => false,
        }
    }
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    async fn request(&self, mut request: HttpRequest) -> HttpRequest {
        if !self.targets(&request.url)
            || request.suppress_authorization
            || request.has_header(AUTHORIZATION)
        {
            return request;
        }

        match self.vault.authorization_header().await {
            Ok(Some(header)) => {
                tracing::trace!(url = %request.url, "attaching bearer token");
                request.set_header(AUTHORIZATION, header);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(url = %request.url, error = %error, "could not read token");
                self.events.exception(error);
            }
        }

        request
    }

    async fn response(&self, response: HttpResponse) -> Result<HttpResponse, OAuth2Error> {
        if !self.targets(&response.url) || !matches!(response.status, 400 | 401) {
            return Ok(response);
        }

        let bearer_challenge = response.status == 401
            && response
                .header(WWW_AUTHENTICATE)
                .map(has_bearer_challenge)
                .unwrap_or(false);

        let body = match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(body) => body,
            Err(_) if bearer_challenge => serde_json::Value::Null,
            Err(error) => {
                tracing::warn!(
                    url = %response.url,
                    status = response.status,
                    "unparseable error response"
                );
                self.events.exception(error);
                return Ok(response);
            }
        };
        let code = error_code(&body);

        match (response.status, code.as_deref()) {
            (400, Some(code @ ("invalid_grant" | "invalid_request"))) => {
                if let Err(error) = self.vault.remove_token().await {
                    tracing::warn!(error = %error, "could not clear rejected token");
                    self.events.exception(error);
                    return Ok(response);
                }

                tracing::warn!(url = %response.url, code, "token invalidated by server");
                self.events.error(body);
                Err(AuthorizationFailure::InvalidGrant {
                    code: code.to_string(),
                    response,
                }
                .into())
            }
            (401, code) if code == Some("invalid_token") || bearer_challenge => {
                tracing::warn!(url = %response.url, "bearer token rejected");
                self.events.error(body);
                Err(AuthorizationFailure::TokenRejected { response }.into())
            }
            _ => Ok(response),
        }
    }
}

fn is_under(base: &Url, target: &Url) -> bool {
    if target.scheme() != base.scheme()
        || target.host() != base.host()
        || target.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }

    let base_path = base.path().trim_end_matches('/');
    match target.path().strip_prefix(base_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Check a `WWW-Authenticate` value for a `Bearer` challenge. Repeated
/// headers arrive joined with `,`, so every challenge in the list counts.
fn has_bearer_challenge(value: &str) -> bool {
    value.split(',').any(|part| {
        let part = part.trim_start();
        part.get(..6)
            .map(|scheme| scheme.eq_ignore_ascii_case("bearer"))
            .unwrap_or(false)
            && part[6..].chars().next().map_or(true, char::is_whitespace)
    })
}

/// Error code of an error body, in either the `{"error": {"message": ..}}`
/// or the flat `{"error": ".."}` shape.
fn error_code(body: &serde_json::Value) -> Option<String> {
    let error = body.get("error")?;
    error
        .get("message")
        .and_then(|message| message.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Register `service`'s interceptor on `chain`.
pub fn register(chain: &InterceptorChain, service: &TokenService) -> InterceptorHandle {
    chain.register(Arc::new(AuthInterceptor::for_service(service)))
}
