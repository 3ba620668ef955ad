//! Before-push hook chain.
//!
//! Hooks run sequentially in registration order before a transition
//! commits. Each one decides the outcome explicitly through
//! [`HookOutcome`]; there is no timeout, so a hook that never resolves
//! stalls the transition.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

use crate::navigation::store::Location;
use crate::routing::RouteRequest;

/// Id under which the builder-supplied hook is registered. It always runs
/// first and cannot be removed.
pub const GLOBAL_HOOK_ID: &str = "__global_before_push_hook";

/// What a hook sees.
#[derive(Debug, Clone)]
pub struct HookArgs {
    /// The navigation about to happen.
    pub pending: RouteRequest,
    /// The committed location, if any.
    pub location: Option<Location>,
}

/// A hook's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Continue with the next hook, or commit after the last one.
    Proceed,
    /// Cancel the transition; the current location stays.
    Abort,
    /// Navigate to this route instead. Ends the chain.
    Redirect(RouteRequest),
}

/// Intercepts navigations before they commit.
///
/// A hook must not await `push` on the router that runs it: transitions are
/// serialized, so the nested call would wait on its own caller. Return
/// [`HookOutcome::Redirect`] instead.
pub trait BeforePushHook: Send + Sync {
    fn before_push(&self, args: HookArgs) -> BoxFuture<'static, HookOutcome>;
}

impl<F, Fut> BeforePushHook for F
where
    F: Fn(HookArgs) -> Fut + Send + Sync,
    Fut: Future<Output = HookOutcome> + Send + 'static,
{
    fn before_push(&self, args: HookArgs) -> BoxFuture<'static, HookOutcome> {
        self(args).boxed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("before-push hook id must not be empty")]
    EmptyId,

    #[error("before-push hook {0:?} is already registered")]
    Duplicate(String),

    #[error("before-push hook {0:?} is not registered")]
    NotSubscribed(String),
}

type Entry = (String, Arc<dyn BeforePushHook>);

/// Ordered, id-keyed hook list.
#[derive(Default)]
pub struct HookChain {
    hooks: Mutex<Vec<Entry>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn install_global(&self, hook: Arc<dyn BeforePushHook>) {
        let mut hooks = self.lock();
        hooks.retain(|(id, _)| id != GLOBAL_HOOK_ID);
        hooks.insert(0, (GLOBAL_HOOK_ID.to_string(), hook));
    }

    /// Append a hook. Ids are unique; the global id is taken.
    pub fn add(&self, id: &str, hook: Arc<dyn BeforePushHook>) -> Result<(), HookError> {
        if id.is_empty() {
            return Err(HookError::EmptyId);
        }
        let mut hooks = self.lock();
        if id == GLOBAL_HOOK_ID || hooks.iter().any(|(existing, _)| existing == id) {
            return Err(HookError::Duplicate(id.to_string()));
        }
        hooks.push((id.to_string(), hook));
        Ok(())
    }

    /// Remove a hook by id. The global hook cannot be removed.
    pub fn remove(&self, id: &str) -> Result<(), HookError> {
        if id.is_empty() {
            return Err(HookError::EmptyId);
        }
        let mut hooks = self.lock();
        match hooks
            .iter()
            .position(|(existing, _)| existing == id && id != GLOBAL_HOOK_ID)
        {
            Some(pos) => {
                hooks.remove(pos);
                Ok(())
            }
            None => Err(HookError::NotSubscribed(id.to_string())),
        }
    }

    /// The hooks to run for one transition, in order. Registrations made
    /// while it runs apply from the next transition.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

/// Returned by `add_before_push_hook`; removes that hook on demand.
#[derive(Debug, Clone)]
pub struct HookHandle {
    id: String,
    chain: Weak<HookChain>,
}

impl HookHandle {
    pub(crate) fn new(id: &str, chain: &Arc<HookChain>) -> Self {
        Self {
            id: id.to_string(),
            chain: Arc::downgrade(chain),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unregister the hook. Fails if it is already gone or the router was
    /// dropped.
    pub fn remove(&self) -> Result<(), HookError> {
        match self.chain.upgrade() {
            Some(chain) => chain.remove(&self.id),
            None => Err(HookError::NotSubscribed(self.id.clone())),
        }
    }
}
