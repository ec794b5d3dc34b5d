//! Token Store
//!
//! Storage capability underneath the credential vault. Concrete backends
//! (cookie jars, platform keychains, key-value stores) implement
//! [`TokenStore`] outside this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{OAuth2Error, StorageError};

/// Key/value storage capability.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), OAuth2Error>;

    /// Retrieve the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, OAuth2Error>;

    /// Remove the value under `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), OAuth2Error>;
}

/// Store used when no backend was wired. Every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedTokenStore;

#[async_trait]
impl TokenStore for UnimplementedTokenStore {
    async fn set(&self, _key: &str, _value: String) -> Result<(), OAuth2Error> {
        Err(OAuth2Error::NotImplemented { operation: "set" })
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, OAuth2Error> {
        Err(OAuth2Error::NotImplemented { operation: "get" })
    }

    async fn remove(&self, _key: &str) -> Result<(), OAuth2Error> {
        Err(OAuth2Error::NotImplemented { operation: "remove" })
    }
}

/// Mock token store for testing.
#[derive(Default)]
pub struct MockTokenStore {
    values: Mutex<HashMap<String, String>>,
    set_history: Mutex<Vec<(String, String)>>,
    get_history: Mutex<Vec<String>>,
    remove_history: Mutex<Vec<String>>,
    next_error: Mutex<Option<OAuth2Error>>,
    should_fail: Mutex<bool>,
}

impl MockTokenStore {
    /// Create new mock token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: OAuth2Error) -> &Self {
        *lock(&self.next_error) = Some(error);
        self
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *lock(&self.should_fail) = should_fail;
        self
    }

    /// Pre-populate a raw value.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) -> &Self {
        lock(&self.values).insert(key.to_string(), value.into());
        self
    }

    /// Read a raw value without recording history.
    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    /// Check whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.values).is_empty()
    }

    /// Get set history.
    pub fn get_set_history(&self) -> Vec<(String, String)> {
        lock(&self.set_history).clone()
    }

    /// Get get history.
    pub fn get_get_history(&self) -> Vec<String> {
        lock(&self.get_history).clone()
    }

    /// Get remove history.
    pub fn get_remove_history(&self) -> Vec<String> {
        lock(&self.remove_history).clone()
    }

    fn check_error(&self, failure: impl FnOnce(String) -> StorageError) -> Result<(), OAuth2Error> {
        if *lock(&self.should_fail) {
            return Err(OAuth2Error::Storage(failure(
                "Mock storage failure".to_string(),
            )));
        }

        if let Some(error) = lock(&self.next_error).take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl TokenStore for MockTokenStore {
    async fn set(&self, key: &str, value: String) -> Result<(), OAuth2Error> {
        self.check_error(|message| StorageError::WriteFailed { message })?;

        lock(&self.set_history).push((key.to_string(), value.clone()));
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, OAuth2Error> {
        self.check_error(|message| StorageError::ReadFailed { message })?;

        lock(&self.get_history).push(key.to_string());
        Ok(lock(&self.values).get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), OAuth2Error> {
        self.check_error(|message| StorageError::DeleteFailed { message })?;

        lock(&self.remove_history).push(key.to_string());
        lock(&self.values).remove(key);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
