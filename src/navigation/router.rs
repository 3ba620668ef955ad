//! The router: transition protocol and public navigation API.
//!
//! # Transition Protocol
//! ```text
//! push / push_path / start / pop-state
//!     → validate (name, params)
//!     → publish is_loading = true
//!     → before-push hooks, in order (Proceed | Abort | Redirect)
//!     → commit Location (is_loading = false)
//!     → spawn lazy component load (fire and forget)
//!     → sync history (replace, or push with scroll snapshot)
//!     → dispatch "route updated"
//! ```
//!
//! # Design Decisions
//! - Transitions are serialized behind an async in-flight guard; a second
//!   navigation waits for the first to finish
//! - Every transition runs in a span carrying a fresh navigation id
//! - `push_path`, initialization and pop-state recover through the
//!   fallback route when one is configured

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::component::ComponentLoader;
use crate::config::loader::ConfigError;
use crate::config::schema::{FallbackConfig, RouterConfig};
use crate::navigation::driver::{self, Teardown};
use crate::navigation::hooks::{
    BeforePushHook, HookArgs, HookChain, HookError, HookHandle, HookOutcome,
};
use crate::navigation::host::{HistoryEntry, Navigator, PopStateEvent, ScrollingElement};
use crate::navigation::store::{Location, RouteInfo, RouterState, Store, SubscriptionId};
use crate::observability::metrics;
use crate::routing::{decode_query, Params, RouteError, RouteId, RouteRecord, RouteRegistry, RouteRequest};

/// Result of a transition: the route that was finally selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRoute {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_query: Option<Params>,
}

impl From<&Location> for ActiveRoute {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            path: location.path.clone(),
            params: location.params.clone(),
            url_query: location.url_query.clone(),
        }
    }
}

/// Assembles a [`Router`] from configuration and host collaborators.
pub struct RouterBuilder {
    config: RouterConfig,
    navigator: Arc<dyn Navigator>,
    scrolling: Option<Arc<dyn ScrollingElement>>,
    before_push: Option<Arc<dyn BeforePushHook>>,
    loaders: HashMap<String, Arc<dyn ComponentLoader>>,
}

impl RouterBuilder {
    pub fn new(config: RouterConfig, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            config,
            navigator,
            scrolling: None,
            before_push: None,
            loaders: HashMap::new(),
        }
    }

    /// The container whose offset is saved and restored across history
    /// navigation.
    pub fn scrolling_element(mut self, element: Arc<dyn ScrollingElement>) -> Self {
        self.scrolling = Some(element);
        self
    }

    /// A hook that always runs first and cannot be removed.
    pub fn before_push(mut self, hook: impl BeforePushHook + 'static) -> Self {
        self.before_push = Some(Arc::new(hook));
        self
    }

    /// Register the loader referenced as `name` by lazy routes.
    pub fn loader(mut self, name: impl Into<String>, loader: impl ComponentLoader + 'static) -> Self {
        self.loaders.insert(name.into(), Arc::new(loader));
        self
    }

    /// Compile the route table. The router does not touch the host until
    /// [`Router::start`].
    pub fn build(self) -> Result<Router, ConfigError> {
        let registry = RouteRegistry::from_config(&self.config, &self.loaders)?;

        let hooks = Arc::new(HookChain::new());
        if let Some(hook) = self.before_push {
            hooks.install_global(hook);
        }

        let routes = route_table(&registry);
        tracing::info!(
            routes = routes.len(),
            base_path = ?self.config.base_path,
            fallback = ?self.config.fallback.as_ref().map(|f| f.name.as_str()),
            "Router built"
        );

        Ok(Router {
            inner: Arc::new(RouterInner {
                registry,
                navigator: self.navigator,
                scrolling: self.scrolling,
                fallback: self.config.fallback,
                restore_scroll: self.config.restore_scroll,
                store: Store::new(RouterState::new(routes)),
                hooks,
                in_flight: tokio::sync::Mutex::new(()),
                teardown: Teardown::new(),
                started: AtomicBool::new(false),
            }),
        })
    }
}

pub(crate) struct RouterInner {
    registry: RouteRegistry,
    navigator: Arc<dyn Navigator>,
    scrolling: Option<Arc<dyn ScrollingElement>>,
    fallback: Option<FallbackConfig>,
    restore_scroll: bool,
    store: Store<RouterState>,
    hooks: Arc<HookChain>,
    in_flight: tokio::sync::Mutex<()>,
    teardown: Teardown,
    started: AtomicBool,
}

/// One run of the transition protocol.
struct Transition {
    /// Physical path, kept when committing the fallback route.
    path: String,
    request: RouteRequest,
    replace: bool,
    keep_history_state: bool,
}

impl Transition {
    fn push(path: impl Into<String>, request: RouteRequest) -> Self {
        Self {
            path: path.into(),
            request,
            replace: false,
            keep_history_state: false,
        }
    }
}

/// History-synchronized router. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub(crate) fn from_inner(inner: Arc<RouterInner>) -> Self {
        Self { inner }
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.inner.registry
    }

    /// Attach to the host and establish the initial location.
    ///
    /// Tries the current history entry, then the physical URL, then the
    /// fallback route. Attaching happens once; later calls only report the
    /// current location. A destroyed router never attaches again.
    pub async fn start(&self) -> Result<ActiveRoute, RouteError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return self
                .location()
                .map(|l| ActiveRoute::from(&l))
                .ok_or(RouteError::NoCurrentLocation);
        }

        // Subscribe before checking the flag so a concurrent destroy is
        // either seen here or delivered to the driver.
        let teardown = self.inner.teardown.subscribe();
        if self.is_destroyed() {
            tracing::debug!("Router already destroyed, not listening to pop-state");
        } else {
            driver::spawn(
                Arc::downgrade(&self.inner),
                self.inner.navigator.listen(),
                teardown,
            );
        }
        self.init_route().await
    }

    async fn init_route(&self) -> Result<ActiveRoute, RouteError> {
        let current = self.inner.navigator.location().href();

        if let Some(entry) = self.inner.navigator.history_state() {
            let transition = Transition {
                keep_history_state: true,
                ..Transition::push(current.clone(), entry.route_request())
            };
            match self.set_current_route(transition).await {
                Ok(active) => return Ok(active),
                Err(e) => {
                    tracing::debug!(error = %e, "History entry does not resolve, trying the URL");
                }
            }
        }

        let err = match self.inner.registry.resolve(&current) {
            Ok(request) => {
                let transition = Transition {
                    replace: true,
                    ..Transition::push(current.clone(), request)
                };
                match self.set_current_route(transition).await {
                    Ok(active) => return Ok(active),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };
        let result = self.enter_fallback(current, "init", err).await;
        if result.is_err() {
            self.inner.store.update(|state| state.is_loading = false);
        }
        result
    }

    /// Navigate to a named route.
    pub async fn push(&self, request: RouteRequest) -> Result<ActiveRoute, RouteError> {
        self.set_current_route(Transition::push(String::new(), request))
            .await
    }

    /// Navigate to a named route with a raw `?k=v` query string. A query
    /// that does not decode is dropped.
    pub async fn push_with_query_str(
        &self,
        name: &str,
        params: Option<Params>,
        query: &str,
    ) -> Result<ActiveRoute, RouteError> {
        self.push(RouteRequest {
            name: name.to_string(),
            params,
            url_query: decode_query(query),
        })
        .await
    }

    /// Navigate to a URL, entering the fallback route when it resolves to
    /// nothing.
    pub async fn push_path(&self, url: &str) -> Result<ActiveRoute, RouteError> {
        match self.inner.registry.resolve(url) {
            Ok(request) => self.set_current_route(Transition::push(url, request)).await,
            Err(err) => match &self.inner.fallback {
                Some(fallback) => {
                    metrics::record_fallback("unresolved_url");
                    tracing::warn!(url = %url, error = %err, "URL does not resolve, entering fallback route");
                    let request = RouteRequest::named(fallback.name.clone());
                    self.set_current_route(Transition::push(url, request)).await
                }
                None => Err(err),
            },
        }
    }

    pub fn back(&self) {
        self.inner.navigator.back();
    }

    pub fn forward(&self) {
        self.inner.navigator.forward();
    }

    /// Append a before-push hook under `id`.
    pub fn add_before_push_hook(
        &self,
        id: &str,
        hook: impl BeforePushHook + 'static,
    ) -> Result<HookHandle, HookError> {
        self.inner.hooks.add(id, Arc::new(hook))?;
        tracing::debug!(hook = %id, "Before-push hook registered");
        Ok(HookHandle::new(id, &self.inner.hooks))
    }

    pub fn remove_before_push(&self, id: &str) -> Result<(), HookError> {
        self.inner.hooks.remove(id)?;
        tracing::debug!(hook = %id, "Before-push hook removed");
        Ok(())
    }

    pub fn name_to_path(
        &self,
        name: &str,
        params: Option<&Params>,
        url_query: Option<&Params>,
    ) -> Result<String, RouteError> {
        self.inner.registry.name_to_path(name, params, url_query)
    }

    pub fn get_route(&self, url: &str) -> Result<RouteRequest, RouteError> {
        self.inner.registry.resolve(url)
    }

    pub fn verify_name_and_params(
        &self,
        name: &str,
        params: Option<&Params>,
    ) -> Result<&RouteRecord, RouteError> {
        self.inner.registry.verify(name, params)
    }

    /// Observe the router state. `listener` runs immediately and then on
    /// every publish.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RouterState) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    pub fn state(&self) -> RouterState {
        self.inner.store.get()
    }

    pub fn location(&self) -> Option<Location> {
        self.inner.store.get().location
    }

    /// Drop every hook and stop listening to the host.
    pub fn destroy(&self) {
        self.inner.hooks.clear();
        if self.inner.teardown.trigger() {
            tracing::info!("Router destroyed");
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.teardown.is_triggered()
    }

    /// React to a back/forward move of the host history.
    pub async fn handle_pop_state(&self, event: PopStateEvent) -> Result<ActiveRoute, RouteError> {
        let current = self.inner.navigator.location().href();

        let err = match event.state {
            Some(entry) => {
                let transition = Transition {
                    replace: true,
                    keep_history_state: true,
                    ..Transition::push(current.clone(), entry.route_request())
                };
                match self.set_current_route(transition).await {
                    Ok(active) => {
                        self.restore_scroll(entry.scroll).await;
                        return Ok(active);
                    }
                    Err(e) => e,
                }
            }
            None => RouteError::UnexpectedHistoryState,
        };

        if self.inner.fallback.is_none() {
            tracing::error!(url = %current, error = %err, "Unexpected history state");
            return Err(RouteError::UnexpectedHistoryState);
        }
        self.enter_fallback(current, "history_state", err).await
    }

    async fn restore_scroll(&self, offset: Option<[f64; 2]>) {
        if !self.inner.restore_scroll {
            return;
        }
        if let (Some(scrolling), Some([left, top])) = (&self.inner.scrolling, offset) {
            // Let subscribers render the restored route first.
            tokio::task::yield_now().await;
            scrolling.scroll_to(left, top);
        }
    }

    /// Transition to the fallback route at `path`, or return `err` when
    /// none is configured. A replacing fallback overwrites the current
    /// history entry; otherwise history is left as is.
    async fn enter_fallback(
        &self,
        path: String,
        reason: &'static str,
        err: RouteError,
    ) -> Result<ActiveRoute, RouteError> {
        let Some(fallback) = &self.inner.fallback else {
            return Err(err);
        };
        metrics::record_fallback(reason);
        tracing::warn!(path = %path, error = %err, reason, "Entering fallback route");

        let transition = Transition {
            path,
            request: RouteRequest::named(fallback.name.clone()),
            replace: fallback.replace,
            keep_history_state: !fallback.replace,
        };
        self.set_current_route(transition).await
    }

    async fn set_current_route(&self, transition: Transition) -> Result<ActiveRoute, RouteError> {
        let span = tracing::info_span!(
            "navigation",
            navigation_id = %Uuid::new_v4(),
            route = %transition.request.name,
        );
        self.run_transition(transition).instrument(span).await
    }

    async fn run_transition(&self, mut transition: Transition) -> Result<ActiveRoute, RouteError> {
        let _in_flight = self.inner.in_flight.lock().await;

        if let Err(e) = self
            .inner
            .registry
            .verify(&transition.request.name, transition.request.params.as_ref())
        {
            metrics::record_navigation("invalid");
            return Err(e);
        }

        self.inner.store.update(|state| state.is_loading = true);

        let result = match self.negotiate(&mut transition).await {
            Ok(Some(unchanged)) => {
                metrics::record_navigation("aborted");
                tracing::info!(route = %unchanged.name, "Navigation aborted by hook");
                return Ok(unchanged);
            }
            Ok(None) => self.commit(transition),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.inner.store.update(|state| state.is_loading = false);
            metrics::record_navigation("error");
            tracing::warn!(error = %e, "Navigation failed");
        }
        result
    }

    /// Run the hook chain. Returns the unchanged location when a hook
    /// aborts; a redirect rewrites `transition` in place.
    async fn negotiate(&self, transition: &mut Transition) -> Result<Option<ActiveRoute>, RouteError> {
        for (id, hook) in self.inner.hooks.snapshot() {
            let args = HookArgs {
                pending: transition.request.clone(),
                location: self.location(),
            };

            match hook.before_push(args).await {
                HookOutcome::Proceed => {
                    metrics::record_hook_outcome("proceed");
                }
                HookOutcome::Abort => {
                    metrics::record_hook_outcome("abort");
                    tracing::debug!(hook = %id, "Hook aborted navigation");
                    return self.abort().map(Some);
                }
                HookOutcome::Redirect(target) => {
                    metrics::record_hook_outcome("redirect");
                    if target.name.is_empty() {
                        return Err(RouteError::InvalidRedirect { hook: id });
                    }
                    self.inner
                        .registry
                        .verify(&target.name, target.params.as_ref())?;
                    tracing::debug!(hook = %id, target = %target.name, "Hook redirected navigation");
                    transition.request = target;
                    transition.path.clear();
                    break;
                }
            }
        }
        Ok(None)
    }

    /// Keep the committed location and clear the loading flag.
    fn abort(&self) -> Result<ActiveRoute, RouteError> {
        let location = self.location().ok_or(RouteError::NoCurrentLocation)?;
        let path = self.inner.registry.name_to_path(
            &location.name,
            location.params.as_ref(),
            location.url_query.as_ref(),
        )?;
        self.inner.store.update(|state| state.is_loading = false);
        Ok(ActiveRoute {
            path,
            ..ActiveRoute::from(&location)
        })
    }

    fn commit(&self, transition: Transition) -> Result<ActiveRoute, RouteError> {
        let inner = &self.inner;
        let Transition {
            path,
            request,
            replace,
            keep_history_state,
        } = transition;

        let record = inner
            .registry
            .verify(&request.name, request.params.as_ref())?;

        let is_fallback = inner
            .fallback
            .as_ref()
            .is_some_and(|f| f.name == record.name());
        let path = if is_fallback && !path.is_empty() {
            path
        } else {
            inner.registry.stringify(
                record.template(),
                request.params.as_ref(),
                request.url_query.as_ref(),
            )?
        };

        let location = Location {
            path: path.clone(),
            name: request.name.clone(),
            params: request.params.clone(),
            url_query: request.url_query.clone(),
            component: record.component(),
            props: record.props().cloned(),
        };
        inner.store.update(|state| {
            state.is_loading = false;
            state.location = Some(location.clone());
        });

        if record.lazy().is_some_and(|lazy| lazy.begin_fetch()) {
            tokio::spawn(resolve_lazy(inner.clone(), record.id()).in_current_span());
        }

        if !keep_history_state {
            self.sync_history(HistoryEntry::from(request), &path, replace);
        }

        inner.navigator.dispatch_route_updated(&location);
        metrics::record_navigation("committed");
        tracing::info!(route = %location.name, path = %location.path, "Navigation committed");

        Ok(ActiveRoute::from(&location))
    }

    fn sync_history(&self, entry: HistoryEntry, path: &str, replace: bool) {
        let navigator = &self.inner.navigator;

        if replace {
            navigator.replace_state(entry, Some(path));
        } else {
            let outgoing = navigator.history_state();
            let moved = match &outgoing {
                Some(current) => current.name != entry.name || navigator.location().href() != path,
                None => true,
            };
            if moved {
                if let (Some(mut outgoing), Some(scrolling)) = (outgoing, &self.inner.scrolling) {
                    if self.inner.restore_scroll {
                        let (left, top) = scrolling.scroll_offset();
                        outgoing.scroll = Some([left, top]);
                        navigator.replace_state(outgoing, None);
                    }
                }
                navigator.push_state(entry, path);
            }
        }

        if let Some(scrolling) = &self.inner.scrolling {
            scrolling.scroll_to(0.0, 0.0);
        }
    }
}

/// Fetch a lazy route's component and patch it into the registry, the
/// routes table and, if still showing that route, the live location.
async fn resolve_lazy(inner: Arc<RouterInner>, id: RouteId) {
    let record = inner.registry.get(id);
    let Some(lazy) = record.lazy() else {
        return;
    };

    match lazy.load().await {
        Ok(component) => {
            record.set_component(component.clone());
            lazy.finish_fetch(true);
            inner.store.update(|state| {
                if let Some(location) = state.location.as_mut().filter(|l| l.name == record.name()) {
                    location.component = Some(component.clone());
                }
                if let Some(row) = state.routes.iter_mut().find(|r| r.name == record.name()) {
                    row.component = Some(component.clone());
                }
            });
            metrics::record_lazy_load("success");
            tracing::debug!(route = %record.name(), component = %component, "Lazy component resolved");
        }
        Err(e) => {
            lazy.finish_fetch(false);
            if let Some(fallback) = lazy.fallback() {
                inner.store.update(|state| {
                    if let Some(location) = state.location.as_mut().filter(|l| l.name == record.name()) {
                        location.component = Some(fallback.clone());
                    }
                });
            }
            metrics::record_lazy_load("failure");
            tracing::error!(route = %record.name(), error = %e, "Failed to lazy load route component");
        }
    }
}

fn route_table(registry: &RouteRegistry) -> Vec<RouteInfo> {
    registry
        .records()
        .map(|record| RouteInfo {
            name: record.name().to_string(),
            path: record.template().to_string(),
            component: record.component(),
            lazy: record.lazy().is_some(),
            props: record.props().cloned(),
        })
        .collect()
}
