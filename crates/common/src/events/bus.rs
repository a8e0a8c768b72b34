//! Event bus with shared listener registry, middleware, and scoped views.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use super::event::SdkEvent;

type Handler = Arc<dyn Fn(&SdkEvent) + Send + Sync>;
type AnyHandler = Arc<dyn Fn(&str, &SdkEvent) + Send + Sync>;
type MiddlewareFn = Arc<dyn Fn(&str, &SdkEvent, &mut dyn FnMut()) + Send + Sync>;

/// Errors produced by bus wait operations.
#[derive(Debug, Error)]
pub enum EventError {
    /// No matching emission arrived before the deadline.
    #[error("timed out after {timeout:?} waiting for `{key}`")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
        /// The (scope-resolved) key that was awaited.
        key: String,
    },
    /// The registry was torn down while waiting.
    #[error("event bus dropped while waiting for `{0}`")]
    Closed(String),
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Vec<(u64, Handler)>>,
    any_listeners: Vec<(u64, AnyHandler)>,
    middleware: Vec<(u64, MiddlewareFn)>,
}

struct Inner {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

impl Inner {
    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn remove_listener(&self, key: &str, id: u64) {
        let mut registry = self.registry.lock();
        if let Some(handlers) = registry.listeners.get_mut(key) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
            if handlers.is_empty() {
                registry.listeners.remove(key);
            }
        }
    }
}

/// What a [`Subscription`] points at inside the registry.
enum SubscriptionKind {
    Listener(String),
    Any,
    Middleware,
}

/// Handle for a single registration on the bus.
///
/// Dropping the handle does *not* remove the registration; call
/// [`Subscription::unsubscribe`] to detach. Removal is idempotent and removes
/// exactly the registration that produced this handle, even when the same
/// closure was registered more than once.
#[must_use = "keep the subscription handle to be able to unsubscribe"]
pub struct Subscription {
    inner: Arc<Inner>,
    kind: SubscriptionKind,
    id: u64,
}

impl Subscription {
    /// Remove this registration from the shared registry.
    pub fn unsubscribe(self) {
        match &self.kind {
            SubscriptionKind::Listener(key) => self.inner.remove_listener(key, self.id),
            SubscriptionKind::Any => {
                let mut registry = self.inner.registry.lock();
                registry.any_listeners.retain(|(id, _)| *id != self.id);
            }
            SubscriptionKind::Middleware => {
                let mut registry = self.inner.registry.lock();
                registry.middleware.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Typed publish/subscribe hub.
///
/// Cloning a bus produces another view over the same registry. Scoped views
/// created with [`EventBus::scoped`] translate event keys by prepending
/// their prefix; they never own the registry, so dropping a scope leaves
/// the parent's listeners untouched.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
    prefix: String,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus with a fresh, empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                next_id: AtomicU64::new(1),
            }),
            prefix: String::new(),
        }
    }

    /// A view over the same registry whose keys are prefixed with `prefix`.
    ///
    /// Scopes nest: `bus.scoped("a:").scoped("b:")` addresses keys under
    /// `a:b:`. Views with different prefixes are fully isolated in key space
    /// even though they share storage.
    pub fn scoped(&self, prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            prefix: format!("{}{}", self.prefix, prefix.into()),
        }
    }

    fn scoped_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    /// Register `handler` for `key`.
    ///
    /// Registration never fails; registering the same closure twice yields
    /// two independent invocations per emission. Handlers for one key run in
    /// registration order.
    pub fn on<F>(&self, key: &str, handler: F) -> Subscription
    where
        F: Fn(&SdkEvent) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        let key = self.scoped_key(key);
        {
            let mut registry = self.inner.registry.lock();
            registry
                .listeners
                .entry(key.clone())
                .or_default()
                .push((id, Arc::new(handler)));
        }
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: SubscriptionKind::Listener(key),
            id,
        }
    }

    /// Register `handler` for `key`, auto-removed after its first invocation.
    ///
    /// Unsubscribing before the first matching emission prevents any
    /// invocation; the claim flag guarantees at-most-once delivery even for
    /// reentrant emissions from inside the handler.
    pub fn once<F>(&self, key: &str, handler: F) -> Subscription
    where
        F: Fn(&SdkEvent) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        let key = self.scoped_key(key);
        let fired = AtomicBool::new(false);
        let inner = Arc::clone(&self.inner);
        let handler_key = key.clone();
        let wrapped: Handler = Arc::new(move |event| {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            // Detach before invoking so a reentrant emit cannot double-fire.
            inner.remove_listener(&handler_key, id);
            handler(event);
        });
        {
            let mut registry = self.inner.registry.lock();
            registry.listeners.entry(key.clone()).or_default().push((id, wrapped));
        }
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: SubscriptionKind::Listener(key),
            id,
        }
    }

    /// Register a handler invoked for every emission on this registry.
    ///
    /// The handler receives the scope-resolved key alongside the event.
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str, &SdkEvent) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        {
            let mut registry = self.inner.registry.lock();
            registry.any_listeners.push((id, Arc::new(handler)));
        }
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: SubscriptionKind::Any,
            id,
        }
    }

    /// Append a middleware to the interception chain.
    ///
    /// Middleware run in registration order, each wrapping a `next()`
    /// continuation. A middleware that never calls `next()` suppresses
    /// delivery to listeners for that emission.
    pub fn with_middleware<F>(&self, middleware: F) -> Subscription
    where
        F: Fn(&str, &SdkEvent, &mut dyn FnMut()) + Send + Sync + 'static,
    {
        let id = self.inner.allocate_id();
        {
            let mut registry = self.inner.registry.lock();
            registry.middleware.push((id, Arc::new(middleware)));
        }
        Subscription {
            inner: Arc::clone(&self.inner),
            kind: SubscriptionKind::Middleware,
            id,
        }
    }

    /// Dispatch `event` synchronously to middleware, keyed listeners, and
    /// any-listeners.
    ///
    /// Emitting with nothing registered is a no-op. Handlers and middleware
    /// are snapshotted before dispatch, so a subscription disposed from
    /// inside a handler or middleware never corrupts the in-flight chain.
    /// Async work started by a handler continues independently; the bus does
    /// not await it.
    pub fn emit(&self, event: &SdkEvent) {
        let key = self.scoped_key(event.key());
        let (middleware, listeners, any_listeners) = {
            let registry = self.inner.registry.lock();
            let middleware: Vec<MiddlewareFn> =
                registry.middleware.iter().map(|(_, m)| Arc::clone(m)).collect();
            let listeners: Vec<Handler> = registry
                .listeners
                .get(&key)
                .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default();
            let any_listeners: Vec<AnyHandler> =
                registry.any_listeners.iter().map(|(_, h)| Arc::clone(h)).collect();
            (middleware, listeners, any_listeners)
        };

        if middleware.is_empty() && listeners.is_empty() && any_listeners.is_empty() {
            return;
        }

        debug!(key = %key, listeners = listeners.len(), "emitting event");

        let mut deliver = || {
            for handler in &listeners {
                (handler.as_ref())(event);
            }
            for handler in &any_listeners {
                (handler.as_ref())(&key, event);
            }
        };
        run_chain(&middleware, &key, event, &mut deliver);
    }

    /// Emit only when `condition` holds; returns whether the event was
    /// emitted.
    pub fn emit_if(&self, condition: bool, event: &SdkEvent) -> bool {
        if condition {
            self.emit(event);
        }
        condition
    }

    /// Wait for the first emission on `key` for which `predicate` holds.
    ///
    /// With `timeout` set, the call fails with [`EventError::Timeout`] once
    /// the deadline elapses. The internal listener is removed on every
    /// settlement path, and a resolved wait leaves no pending timer behind.
    pub async fn wait_for<P>(
        &self,
        key: &str,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<SdkEvent, EventError>
    where
        P: Fn(&SdkEvent) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel::<SdkEvent>();
        let slot = Arc::new(Mutex::new(Some(tx)));
        let sender_slot = Arc::clone(&slot);
        let subscription = self.on(key, move |event| {
            if !predicate(event) {
                return;
            }
            if let Some(tx) = sender_slot.lock().take() {
                let _ = tx.send(event.clone());
            }
        });

        let resolved_key = self.scoped_key(key);
        let outcome = match timeout {
            Some(deadline) => match tokio::time::timeout(deadline, rx).await {
                Ok(Ok(event)) => Ok(event),
                Ok(Err(_)) => Err(EventError::Closed(resolved_key)),
                Err(_) => Err(EventError::Timeout { timeout: deadline, key: resolved_key }),
            },
            None => rx.await.map_err(|_| EventError::Closed(resolved_key)),
        };
        subscription.unsubscribe();
        outcome
    }

    /// Remove every listener, any-listener, and middleware from the shared
    /// registry. Affects all views sharing it, scoped or not.
    pub fn clear(&self) {
        let mut registry = self.inner.registry.lock();
        registry.listeners.clear();
        registry.any_listeners.clear();
        registry.middleware.clear();
    }

    /// Number of handlers currently registered for `key` (scope-resolved).
    pub fn listener_count(&self, key: &str) -> usize {
        let key = self.scoped_key(key);
        let registry = self.inner.registry.lock();
        registry.listeners.get(&key).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry.lock();
        f.debug_struct("EventBus")
            .field("prefix", &self.prefix)
            .field("keys", &registry.listeners.len())
            .field("any_listeners", &registry.any_listeners.len())
            .field("middleware", &registry.middleware.len())
            .finish()
    }
}

/// Run the middleware onion chain, then `deliver` if every layer called
/// `next()`.
fn run_chain(
    chain: &[MiddlewareFn],
    key: &str,
    event: &SdkEvent,
    deliver: &mut dyn FnMut(),
) {
    match chain.split_first() {
        None => deliver(),
        Some((middleware, rest)) => {
            let mut next = || run_chain(rest, key, event, &mut *deliver);
            (middleware.as_ref())(key, event, &mut next);
        }
    }
}
