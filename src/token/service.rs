//! Token Service
//!
//! Password grant, refresh and revocation against the authorization server.
//! The service moves the vault between "no token" and "has token"; it never
//! retries and never serializes concurrent calls, so two refreshes racing
//! each other both hit the server and the last one to finish wins.

use std::sync::{Arc, Mutex};

use secrecy::ExposeSecret;

use crate::core::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, InterceptorChain, InterceptorHandle,
};
use crate::error::{OAuth2Error, ProtocolError};
use crate::events::{OAuthEvent, OAuthEvents};
use crate::interceptor;
use crate::token::{CredentialVault, TokenStore};
use crate::types::{
    FormParams, GrantType, PasswordCredentials, RequestOptions, ServiceConfig, Token,
    TokenTypeHint,
};

/// Client for the grant and revocation endpoints of one authorization server.
pub struct TokenService {
    config: ServiceConfig,
    vault: CredentialVault,
    transport: Arc<dyn HttpTransport>,
    events: OAuthEvents,
    registration: Mutex<Option<InterceptorHandle>>,
}

impl TokenService {
    /// Create a service.
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            vault: CredentialVault::new(store),
            transport,
            events: OAuthEvents::new(),
            registration: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    pub fn events(&self) -> &OAuthEvents {
        &self.events
    }

    /// Exchange resource-owner credentials for a token and store it.
    pub async fn get_access_token(
        &self,
        credentials: PasswordCredentials,
        options: RequestOptions,
    ) -> Result<Token, OAuth2Error> {
        let mut form = self.client_form();
        form.set("grant_type", GrantType::Password.as_str());
        form.merge(credentials.into_form());

        tracing::debug!(
            url = %self.config.grant_url(),
            grant_type = GrantType::Password.as_str(),
            "requesting access token"
        );

        let response = self
            .post_form(self.config.grant_url(), form, options, true)
            .await?;
        self.store_token(response).await
    }

    /// Exchange the stored refresh token for a new token.
    ///
    /// Without a stored refresh token the request is still sent, without a
    /// `refresh_token` field, and the server's rejection is returned.
    pub async fn get_refresh_token(
        &self,
        extra: FormParams,
        options: RequestOptions,
    ) -> Result<Token, OAuth2Error> {
        let current = self.vault.get_token().await?;

        let mut form = self.client_form();
        form.set("grant_type", GrantType::RefreshToken.as_str());
        match current.as_ref().and_then(|token| token.refresh_token()) {
            Some(refresh_token) => form.set("refresh_token", refresh_token),
            None => tracing::warn!("refreshing without a stored refresh token"),
        }
        form.merge(extra);

        tracing::debug!(
            url = %self.config.grant_url(),
            grant_type = GrantType::RefreshToken.as_str(),
            "refreshing access token"
        );

        let response = self
            .post_form(self.config.grant_url(), form, options, true)
            .await?;
        self.store_token(response).await
    }

    /// Revoke the stored token and clear it locally.
    ///
    /// The local token is removed whatever the server answers; a failed
    /// revocation call is still returned as `Err` afterwards.
    pub async fn revoke_token(
        &self,
        extra: FormParams,
        options: RequestOptions,
    ) -> Result<(), OAuth2Error> {
        let Some(current) = self.vault.get_token().await? else {
            tracing::debug!("no stored token to revoke");
            return self.vault.remove_token().await;
        };

        let mut form = self.client_form();
        let (token, hint) = match current.refresh_token() {
            Some(refresh_token) => (refresh_token, TokenTypeHint::RefreshToken),
            None => (current.access_token.as_str(), TokenTypeHint::AccessToken),
        };
        form.set("token", token);
        form.set("token_type_hint", hint.as_str());
        form.merge(extra);

        tracing::debug!(
            url = %self.config.revoke_url(),
            token_type_hint = hint.as_str(),
            "revoking token"
        );

        let outcome = self
            .post_form(self.config.revoke_url(), form, options, false)
            .await;
        let cleared = self.vault.remove_token().await;

        match (outcome, cleared) {
            (Ok(_), cleared) => cleared,
            (Err(error), Ok(())) => {
                tracing::warn!(error = %error, "revocation failed, local token cleared");
                Err(error)
            }
            (Err(error), Err(clear_error)) => {
                tracing::warn!(error = %clear_error, "failed to clear token after revocation error");
                Err(error)
            }
        }
    }

    /// Check for a stored token with an access token.
    pub async fn is_authenticated(&self) -> Result<bool, OAuth2Error> {
        self.vault.is_authenticated().await
    }

    /// Register a callback for rejected tokens (`oauth:error`).
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.events.on_error(callback);
    }

    /// Register a callback for swallowed failures (`oauth:exception`).
    pub fn on_exception<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.events.on_exception(callback);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OAuthEvent> {
        self.events.subscribe()
    }

    /// Attach this service's interceptor to `chain`.
    ///
    /// A service holds at most one registration; a previous one is released.
    pub fn intercept(&self, chain: &InterceptorChain) {
        let handle = interceptor::register(chain, self);
        let previous = self.registration().replace(handle);
        if let Some(previous) = previous {
            previous.unregister();
        }
    }

    /// Release the registration made by [`TokenService::intercept`].
    ///
    /// Returns `false` when nothing was registered.
    pub fn stop_intercepting(&self) -> bool {
        self.registration()
            .take()
            .map(InterceptorHandle::unregister)
            .unwrap_or(false)
    }

    fn client_form(&self) -> FormParams {
        let mut form = FormParams::new().with("client_id", self.config.client_id());
        if let Some(secret) = self.config.client_secret() {
            form.set("client_secret", secret.expose_secret().as_str());
        }
        form
    }

    async fn post_form(
        &self,
        url: String,
        form: FormParams,
        options: RequestOptions,
        suppress_authorization: bool,
    ) -> Result<HttpResponse, OAuth2Error> {
        let mut request = HttpRequest::new(HttpMethod::Post, url)
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_header("accept", "application/json");
        for (name, value) in options.headers {
            request.set_header(name, value);
        }
        request.body = Some(form.encode()?);
        request.timeout = Some(options.timeout.unwrap_or(self.config.timeout()));
        request.suppress_authorization = suppress_authorization;

        let response = self.transport.send(request).await?;
        if response.is_redirect() {
            let location = response.header("location").unwrap_or_default().to_string();
            tracing::warn!(
                url = %response.url,
                status = response.status,
                %location,
                "token endpoint redirected"
            );
            return Err(OAuth2Error::Protocol(ProtocolError::UnexpectedRedirect {
                location,
            }));
        }
        if !response.is_success() {
            tracing::warn!(
                url = %response.url,
                status = response.status,
                "authorization server rejected request"
            );
            return Err(OAuth2Error::Http { response });
        }

        Ok(response)
    }

    async fn store_token(&self, response: HttpResponse) -> Result<Token, OAuth2Error> {
        let token: Token = response.json()?;
        self.vault.set_token(token).await
    }

    fn registration(&self) -> std::sync::MutexGuard<'_, Option<InterceptorHandle>> {
        self.registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
