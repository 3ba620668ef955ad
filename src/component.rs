//! View references and lazy component loading.
//!
//! # Responsibilities
//! - Opaque handle naming the view a route renders
//! - Loader contract for components fetched on first navigation
//! - Per-route fetch state (idle, in flight, fetched)
//!
//! # Design Decisions
//! - The router never renders; the UI layer maps a [`Component`] id to a view
//! - Fetch state is a single atomic so concurrent navigations start at most
//!   one load per route
//! - A failed load returns to idle and is retried on the next navigation

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cheaply clonable view reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Component(Arc<str>);

impl Component {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by a [`ComponentLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LoadError(pub String);

/// Fetches a route's component on demand.
pub trait ComponentLoader: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Component, LoadError>>;
}

impl<F, Fut> ComponentLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Component, LoadError>> + Send + 'static,
{
    fn load(&self) -> BoxFuture<'static, Result<Component, LoadError>> {
        self().boxed()
    }
}

/// Fetch state of a lazy component.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle = 0,
    InFlight = 1,
    Fetched = 2,
}

impl From<u8> for FetchState {
    fn from(val: u8) -> Self {
        match val {
            1 => FetchState::InFlight,
            2 => FetchState::Fetched,
            _ => FetchState::Idle,
        }
    }
}

/// Lazy-loading descriptor attached to a route.
pub struct LazyComponent {
    loader: Arc<dyn ComponentLoader>,
    /// Shown while the loader runs.
    loading: Option<Component>,
    /// Shown when the loader fails.
    fallback: Option<Component>,
    state: AtomicU8,
}

impl LazyComponent {
    pub fn new(loader: Arc<dyn ComponentLoader>) -> Self {
        Self {
            loader,
            loading: None,
            fallback: None,
            state: AtomicU8::new(FetchState::Idle as u8),
        }
    }

    pub fn with_loading(mut self, component: Option<Component>) -> Self {
        self.loading = component;
        self
    }

    pub fn with_fallback(mut self, component: Option<Component>) -> Self {
        self.fallback = component;
        self
    }

    pub fn loading(&self) -> Option<&Component> {
        self.loading.as_ref()
    }

    pub fn fallback(&self) -> Option<&Component> {
        self.fallback.as_ref()
    }

    pub fn state(&self) -> FetchState {
        FetchState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_fetched(&self) -> bool {
        self.state() == FetchState::Fetched
    }

    /// Claim the fetch. Returns false when already fetched or in flight.
    pub(crate) fn begin_fetch(&self) -> bool {
        self.state
            .compare_exchange(
                FetchState::Idle as u8,
                FetchState::InFlight as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn finish_fetch(&self, fetched: bool) {
        let next = if fetched { FetchState::Fetched } else { FetchState::Idle };
        self.state.store(next as u8, Ordering::Release);
    }

    pub(crate) fn load(&self) -> BoxFuture<'static, Result<Component, LoadError>> {
        self.loader.load()
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyComponent")
            .field("loading", &self.loading)
            .field("fallback", &self.fallback)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
