//! Events
//!
//! Typed replacement for the `oauth:error` / `oauth:exception` emitter.
//!
//! Consumers either register callbacks (`on_error`, `on_exception`) which run
//! synchronously on emit, or take a [`broadcast::Receiver`] via `subscribe`.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Event raised by the interceptor.
#[derive(Debug, Clone, PartialEq)]
pub enum OAuthEvent {
    /// `oauth:error`: the server rejected the token. Carries the parsed body.
    Error(serde_json::Value),
    /// `oauth:exception`: a failure was swallowed to keep traffic flowing.
    Exception(String),
}

impl OAuthEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error(_) => "oauth:error",
            Self::Exception(_) => "oauth:exception",
        }
    }
}

type ErrorListener = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;
type ExceptionListener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    error: Vec<ErrorListener>,
    exception: Vec<ExceptionListener>,
}

/// Event emitter shared by a token service and its interceptor.
#[derive(Clone)]
pub struct OAuthEvents {
    listeners: Arc<Mutex<Listeners>>,
    sender: broadcast::Sender<OAuthEvent>,
}

impl Default for OAuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            listeners: Arc::new(Mutex::new(Listeners::default())),
            sender,
        }
    }

    /// Register a callback for `oauth:error`.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.lock().error.push(Arc::new(callback));
    }

    /// Register a callback for `oauth:exception`.
    pub fn on_exception<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.lock().exception.push(Arc::new(callback));
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<OAuthEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to callbacks and subscribers.
    ///
    /// Callbacks run without the listener lock held, so they may register
    /// listeners or emit themselves.
    pub fn emit(&self, event: OAuthEvent) {
        tracing::debug!(event = event.name(), "emitting oauth event");

        match &event {
            OAuthEvent::Error(body) => {
                let callbacks = self.lock().error.clone();
                callbacks.iter().for_each(|cb| cb(body));
            }
            OAuthEvent::Exception(message) => {
                let callbacks = self.lock().exception.clone();
                callbacks.iter().for_each(|cb| cb(message));
            }
        }

        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    pub(crate) fn error(&self, body: serde_json::Value) {
        self.emit(OAuthEvent::Error(body));
    }

    pub(crate) fn exception(&self, error: impl std::fmt::Display) {
        self.emit(OAuthEvent::Exception(error.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Listeners> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for OAuthEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.lock();
        f.debug_struct("OAuthEvents")
            .field("error_listeners", &listeners.error.len())
            .field("exception_listeners", &listeners.exception.len())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}
