//! Observable router state.
//!
//! A value cell plus listeners invoked synchronously on every publish.
//! Listeners run outside the value lock, so they may read the store, but
//! publishes are serialized: every listener sees snapshots in commit order.
//! A listener must not publish to the store it is subscribed to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::component::Component;
use crate::routing::Params;

/// The committed route as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_query: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

/// One row of the routes table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteInfo {
    pub name: String,
    pub path: String,
    pub component: Option<Component>,
    pub lazy: bool,
    pub props: Option<serde_json::Value>,
}

/// Everything a subscriber observes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterState {
    pub is_loading: bool,
    pub routes: Vec<RouteInfo>,
    /// `None` until the first successful transition.
    pub location: Option<Location>,
}

impl RouterState {
    pub fn new(routes: Vec<RouteInfo>) -> Self {
        Self {
            is_loading: true,
            routes,
            location: None,
        }
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Publish/subscribe value cell.
pub struct Store<T> {
    value: Mutex<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    /// Held from mutation until the last listener returns.
    publish: Mutex<()>,
    next_id: AtomicU64,
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            listeners: Mutex::new(Vec::new()),
            publish: Mutex::new(()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        lock(&self.value).clone()
    }

    /// Register `listener`. It is called once immediately with the current
    /// value, then on every update.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<T> = Arc::new(listener);
        let _publish = lock(&self.publish);
        lock(&self.listeners).push((id, listener.clone()));
        listener(&self.get());
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    /// Mutate the value and notify every listener with the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let _publish = lock(&self.publish);
        let snapshot = {
            let mut value = lock(&self.value);
            f(&mut value);
            value.clone()
        };
        let listeners: Vec<Listener<T>> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
