//! Transport Middleware
//!
//! Explicit interceptor registration around an [`HttpTransport`].
//!
//! An [`InterceptorChain`] is shared between the code that registers hooks and
//! the [`InterceptingTransport`] that runs them. Registration returns an
//! [`InterceptorHandle`]; the hook stays active until `unregister()` is called.
//! Dropping the handle does not remove the hook.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::OAuth2Error;

/// Request/response hook pair.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Inspect or rewrite an outgoing request. Must not fail.
    async fn request(&self, request: HttpRequest) -> HttpRequest;

    /// Inspect an incoming response; `Err` rejects it.
    async fn response(&self, response: HttpResponse) -> Result<HttpResponse, OAuth2Error>;
}

type Registry = RwLock<Vec<(u64, Arc<dyn Interceptor>)>>;

/// Ordered set of registered interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    entries: Arc<Registry>,
    next_id: Arc<AtomicU64>,
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interceptor.
    pub fn register(&self, interceptor: Arc<dyn Interceptor>) -> InterceptorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.entries).push((id, interceptor));
        tracing::debug!(interceptor_id = id, "interceptor registered");

        InterceptorHandle {
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    /// Number of active registrations.
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    /// Check whether no interceptor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn Interceptor>> {
        read(&self.entries)
            .iter()
            .map(|(_, interceptor)| interceptor.clone())
            .collect()
    }

    /// Run request hooks in registration order.
    pub async fn apply_request(&self, mut request: HttpRequest) -> HttpRequest {
        for interceptor in self.snapshot() {
            request = interceptor.request(request).await;
        }
        request
    }

    /// Run response hooks in reverse registration order, stopping at the first rejection.
    pub async fn apply_response(
        &self,
        mut response: HttpResponse,
    ) -> Result<HttpResponse, OAuth2Error> {
        for interceptor in self.snapshot().into_iter().rev() {
            response = interceptor.response(response).await?;
        }
        Ok(response)
    }
}

/// Disposable registration returned by [`InterceptorChain::register`].
#[derive(Debug)]
pub struct InterceptorHandle {
    id: u64,
    entries: Weak<Registry>,
}

impl InterceptorHandle {
    /// Remove the interceptor from its chain.
    ///
    /// Returns `false` if the chain is gone or the hook was already removed.
    pub fn unregister(self) -> bool {
        let Some(entries) = self.entries.upgrade() else {
            return false;
        };

        let mut entries = write(&entries);
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        let removed = entries.len() != before;
        if removed {
            tracing::debug!(interceptor_id = self.id, "interceptor unregistered");
        }
        removed
    }

    /// Check whether the registration is still active.
    pub fn is_active(&self) -> bool {
        self.entries
            .upgrade()
            .map(|entries| read(&entries).iter().any(|(id, _)| *id == self.id))
            .unwrap_or(false)
    }
}

/// Transport that runs an [`InterceptorChain`] around every request.
pub struct InterceptingTransport<T: HttpTransport> {
    inner: T,
    chain: InterceptorChain,
}

impl<T: HttpTransport> InterceptingTransport<T> {
    /// Wrap a transport.
    pub fn new(inner: T, chain: InterceptorChain) -> Self {
        Self { inner, chain }
    }

    /// The chain used by this transport.
    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for InterceptingTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, OAuth2Error> {
        let request = self.chain.apply_request(request).await;
        let response = self.inner.send(request).await?;
        self.chain.apply_response(response).await
    }
}

fn read(registry: &Registry) -> std::sync::RwLockReadGuard<'_, Vec<(u64, Arc<dyn Interceptor>)>> {
    registry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(registry: &Registry) -> std::sync::RwLockWriteGuard<'_, Vec<(u64, Arc<dyn Interceptor>)>> {
    registry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
