//! Shared utilities for router integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use spa_router::config::{FallbackConfig, LazyConfig, RouteConfig, RouterConfig};
use spa_router::navigation::{
    HookArgs, HookOutcome, MemoryNavigator, MemoryScroll, Router, RouterBuilder,
};
use spa_router::{Component, LoadError};

/// Route table shared by most tests.
pub fn app_config() -> RouterConfig {
    RouterConfig::with_routes([
        RouteConfig::new("home", "/").component("Home"),
        RouteConfig::new("users", "/users/:id").component("User"),
        RouteConfig::new("active", "/users/active").component("ActiveUsers"),
        RouteConfig::new("login", "/login").component("Login"),
        RouteConfig::new("admin", "/admin").component("Admin"),
        RouteConfig::new("settings", "/settings").lazy(
            LazyConfig::new("settings")
                .loading("Spinner")
                .fallback("SettingsUnavailable"),
        ),
        RouteConfig::new("not-found", "/404").component("NotFound"),
    ])
}

/// Same table with `not-found` as fallback route.
#[allow(dead_code)]
pub fn app_config_with_fallback() -> RouterConfig {
    let mut config = app_config();
    config.fallback = Some(FallbackConfig::new("not-found"));
    config
}

/// Everything a test needs to drive and observe a router.
#[allow(dead_code)]
pub struct Harness {
    pub router: Router,
    pub navigator: Arc<MemoryNavigator>,
    pub scroll: Arc<MemoryScroll>,
}

/// Build a router over `navigator` whose `settings` loader succeeds or
/// fails on demand.
#[allow(dead_code)]
pub fn harness(config: RouterConfig, navigator: MemoryNavigator, loader_ok: bool) -> Harness {
    let navigator = Arc::new(navigator);
    let scroll = Arc::new(MemoryScroll::default());
    let router = RouterBuilder::new(config, navigator.clone())
        .scrolling_element(scroll.clone())
        .loader("settings", move || async move {
            if loader_ok {
                Ok(Component::new("Settings"))
            } else {
                Err(LoadError("chunk failed to load".into()))
            }
        })
        .build()
        .unwrap();
    Harness {
        router,
        navigator,
        scroll,
    }
}

/// A hook that appends `id` to `log` and returns `outcome`.
#[allow(dead_code)]
pub fn recording_hook(
    log: &Arc<Mutex<Vec<String>>>,
    id: &str,
    outcome: HookOutcome,
) -> impl Fn(HookArgs) -> std::future::Ready<HookOutcome> + Send + Sync + 'static {
    let log = log.clone();
    let id = id.to_string();
    move |_args: HookArgs| {
        log.lock().unwrap().push(id.clone());
        std::future::ready(outcome.clone())
    }
}

/// Yield until `condition` holds, panicking after a second.
#[allow(dead_code)]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
