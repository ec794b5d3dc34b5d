//! Credential Vault
//!
//! Owns the token store and is the only writer of the current token.

use std::sync::Arc;

use crate::error::{OAuth2Error, StorageError};
use crate::token::{TokenStore, UnimplementedTokenStore};
use crate::types::Token;

/// Storage key of the current token record.
pub const TOKEN_KEY: &str = "token";

/// Serializes the current [`Token`] into a [`TokenStore`].
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn TokenStore>,
}

impl CredentialVault {
    /// Create a vault over a store.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// A vault with no backend; every operation fails with `NotImplemented`.
    pub fn unimplemented() -> Self {
        Self::new(Arc::new(UnimplementedTokenStore))
    }

    /// Persist `token`, replacing the previous record.
    pub async fn set_token(&self, token: Token) -> Result<Token, OAuth2Error> {
        let serialized = serde_json::to_string(&token).map_err(|e| {
            OAuth2Error::Storage(StorageError::WriteFailed {
                message: e.to_string(),
            })
        })?;

        self.store.set(TOKEN_KEY, serialized).await?;
        tracing::trace!("token stored");
        Ok(token)
    }

    /// Current token, or `None` when nothing is stored.
    pub async fn get_token(&self) -> Result<Option<Token>, OAuth2Error> {
        let Some(raw) = self.store.get(TOKEN_KEY).await? else {
            return Ok(None);
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            OAuth2Error::Storage(StorageError::CorruptedData {
                message: e.to_string(),
            })
        })
    }

    /// Clear the current token. Succeeds when nothing is stored.
    pub async fn remove_token(&self) -> Result<(), OAuth2Error> {
        self.store.remove(TOKEN_KEY).await?;
        tracing::trace!("token removed");
        Ok(())
    }

    /// `Authorization` header value for the current token, if usable.
    pub async fn authorization_header(&self) -> Result<Option<String>, OAuth2Error> {
        Ok(self
            .get_token()
            .await?
            .and_then(|token| token.authorization_header()))
    }

    /// Check for a stored token with a non-empty access token.
    pub async fn is_authenticated(&self) -> Result<bool, OAuth2Error> {
        Ok(self
            .get_token()
            .await?
            .map(|token| token.has_access_token())
            .unwrap_or(false))
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}
