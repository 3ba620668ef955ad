//! Transition protocol tests against the in-memory host.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use spa_router::component::FetchState;
use spa_router::config::{FallbackConfig, RouterConfig};
use spa_router::navigation::{
    HistoryEntry, HookArgs, HookError, HookOutcome, MemoryNavigator, Navigator, PopStateEvent,
    RouterBuilder, ScrollingElement,
};
use spa_router::{Component, LoadError, Params, RouteError, RouteRequest};

mod common;

use common::{app_config, app_config_with_fallback, harness, recording_hook, wait_until};

fn entry(name: &str) -> HistoryEntry {
    HistoryEntry {
        name: name.to_string(),
        params: None,
        url_query: None,
        scroll: None,
    }
}

fn user(id: &str) -> RouteRequest {
    RouteRequest::named("users").with_params(Params::from([("id", id)]))
}

#[tokio::test]
async fn test_start_from_physical_url() {
    let h = harness(app_config(), MemoryNavigator::with_initial_url("/users/42?tab=info"), true);

    let active = h.router.start().await.unwrap();
    assert_eq!(active.name, "users");
    assert_eq!(active.path, "/users/42?tab=info");
    assert_eq!(active.params, Some(Params::from([("id", "42")])));
    assert_eq!(active.url_query, Some(Params::from([("tab", "info")])));

    let location = h.router.location().unwrap();
    assert_eq!(location.component, Some(Component::new("User")));
    assert!(!h.router.state().is_loading);

    // Initialization replaces the landing entry instead of pushing.
    assert_eq!(h.navigator.history_len(), 1);
    assert_eq!(h.navigator.history_state().unwrap().name, "users");
    assert_eq!(h.navigator.route_updates().len(), 1);
}

#[tokio::test]
async fn test_start_resumes_history_entry() {
    let navigator = MemoryNavigator::with_initial_entry("/stale", Some(entry("login")));
    let h = harness(app_config(), navigator, true);

    let active = h.router.start().await.unwrap();
    assert_eq!(active.name, "login");
    assert_eq!(active.path, "/login");

    // History already holds this entry; it is left alone.
    assert_eq!(h.navigator.entries(), vec![("/stale".to_string(), Some(entry("login")))]);
}

#[tokio::test]
async fn test_start_with_invalid_history_entry_uses_url() {
    let navigator = MemoryNavigator::with_initial_entry("/admin", Some(entry("ghost")));
    let h = harness(app_config(), navigator, true);

    assert_eq!(h.router.start().await.unwrap().name, "admin");
    assert_eq!(h.navigator.history_state().unwrap().name, "admin");
}

#[tokio::test]
async fn test_start_falls_back_on_unknown_url() {
    let h = harness(app_config_with_fallback(), MemoryNavigator::with_initial_url("/nowhere"), true);

    let active = h.router.start().await.unwrap();
    assert_eq!(active.name, "not-found");
    // The physical path is kept for the fallback route.
    assert_eq!(active.path, "/nowhere");
    assert_eq!(h.navigator.history_state().unwrap().name, "not-found");
    assert_eq!(h.navigator.history_len(), 1);
}

fn keep_history_fallback() -> RouterConfig {
    let mut config = app_config();
    config.fallback = Some(FallbackConfig {
        name: "not-found".into(),
        replace: false,
    });
    config
}

#[tokio::test]
async fn test_start_fallback_without_replace_keeps_history() {
    let h = harness(keep_history_fallback(), MemoryNavigator::with_initial_url("/nowhere"), true);

    let active = h.router.start().await.unwrap();
    assert_eq!(active.name, "not-found");
    assert_eq!(active.path, "/nowhere");
    assert_eq!(h.navigator.entries(), vec![("/nowhere".to_string(), None)]);
}

#[tokio::test]
async fn test_pop_state_fallback_without_replace_keeps_history() {
    let h = harness(keep_history_fallback(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();
    let before = h.navigator.entries();

    h.navigator.emit_pop_state(Some(entry("ghost")));
    let router = h.router.clone();
    wait_until(move || router.location().is_some_and(|l| l.name == "not-found")).await;
    assert_eq!(h.navigator.entries(), before);
    assert_eq!(h.navigator.history_state().unwrap().name, "home");
}

#[tokio::test]
async fn test_start_without_fallback_reports_error() {
    let h = harness(app_config(), MemoryNavigator::with_initial_url("/nowhere"), true);

    let err = h.router.start().await.unwrap_err();
    assert_eq!(err, RouteError::NoMatch("/nowhere".into()));
    assert!(h.router.location().is_none());
    assert!(!h.router.state().is_loading);
}

#[tokio::test]
async fn test_push_writes_history_and_dispatches() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let active = h
        .router
        .push(user("42").with_query(Params::from([("tab", "info")])))
        .await
        .unwrap();
    assert_eq!(active.path, "/users/42?tab=info");

    let (url, state) = h.navigator.entries().pop().unwrap();
    assert_eq!(url, "/users/42?tab=info");
    let state = state.unwrap();
    assert_eq!(state.name, "users");
    assert_eq!(state.url_query, Some(Params::from([("tab", "info")])));

    let updates = h.navigator.route_updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].name, "users");
}

#[tokio::test]
async fn test_static_route_wins_over_parameter() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    assert_eq!(h.router.push_path("/users/active").await.unwrap().name, "active");
    let active = h.router.push_path("/users/42").await.unwrap();
    assert_eq!(active.name, "users");
    assert_eq!(active.params, Some(Params::from([("id", "42")])));
}

#[tokio::test]
async fn test_loading_flag_published_before_hooks() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.router.subscribe(move |state| sink.lock().unwrap().push(state.is_loading));

    let observed = Arc::new(Mutex::new(None));
    let during_hook = observed.clone();
    let router = h.router.clone();
    h.router
        .add_before_push_hook("observe-loading", move |_args: HookArgs| {
            *during_hook.lock().unwrap() = Some(router.state().is_loading);
            async { HookOutcome::Proceed }
        })
        .unwrap();

    h.router.push(RouteRequest::named("login")).await.unwrap();
    assert_eq!(*observed.lock().unwrap(), Some(true));
    assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
}

#[tokio::test]
async fn test_abort_keeps_location_and_history() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    h.router
        .add_before_push_hook("deny", recording_hook(&log, "deny", HookOutcome::Abort))
        .unwrap();
    h.router
        .add_before_push_hook("after", recording_hook(&log, "after", HookOutcome::Proceed))
        .unwrap();

    let active = h.router.push(RouteRequest::named("admin")).await.unwrap();
    assert_eq!(active.name, "home");
    assert_eq!(active.path, "/");
    assert_eq!(*log.lock().unwrap(), vec!["deny"]);

    assert_eq!(h.router.location().unwrap().name, "home");
    assert!(!h.router.state().is_loading);
    assert_eq!(h.navigator.history_len(), 1);
    assert_eq!(h.navigator.route_updates().len(), 1);
}

#[tokio::test]
async fn test_redirect_ends_hook_chain() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let redirect = HookOutcome::Redirect(RouteRequest::named("login"));
    h.router
        .add_before_push_hook("first", recording_hook(&log, "first", HookOutcome::Proceed))
        .unwrap();
    h.router
        .add_before_push_hook("auth", recording_hook(&log, "auth", redirect))
        .unwrap();
    h.router
        .add_before_push_hook("last", recording_hook(&log, "last", HookOutcome::Proceed))
        .unwrap();

    let active = h.router.push(RouteRequest::named("admin")).await.unwrap();
    assert_eq!(active.name, "login");
    assert_eq!(active.path, "/login");
    assert_eq!(*log.lock().unwrap(), vec!["first", "auth"]);
    assert_eq!(h.navigator.location().pathname, "/login");
}

#[tokio::test]
async fn test_redirect_target_is_validated() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    h.router
        .add_before_push_hook("bad", |_args: HookArgs| async {
            HookOutcome::Redirect(RouteRequest::named("users"))
        })
        .unwrap();

    let err = h.router.push(RouteRequest::named("admin")).await.unwrap_err();
    assert!(matches!(err, RouteError::MissingParams { .. }));
    assert_eq!(h.router.location().unwrap().name, "home");
    assert!(!h.router.state().is_loading);
}

#[tokio::test]
async fn test_global_hook_runs_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let navigator = Arc::new(MemoryNavigator::default());
    let router = RouterBuilder::new(app_config(), navigator)
        .before_push(recording_hook(&log, "global", HookOutcome::Proceed))
        .loader("settings", || async { Ok::<_, LoadError>(Component::new("Settings")) })
        .build()
        .unwrap();
    router
        .add_before_push_hook("local", recording_hook(&log, "local", HookOutcome::Proceed))
        .unwrap();

    router.start().await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["global", "local"]);
}

#[tokio::test]
async fn test_repeated_push_reruns_hooks_and_dispatch() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    h.router
        .add_before_push_hook("count", recording_hook(&log, "count", HookOutcome::Proceed))
        .unwrap();

    h.router.push(user("1")).await.unwrap();
    h.router.push(user("1")).await.unwrap();

    assert_eq!(log.lock().unwrap().len(), 2);
    assert_eq!(h.navigator.route_updates().len(), 3);
    // The URL already matches, so history is not duplicated.
    assert_eq!(h.navigator.history_len(), 2);
}

#[tokio::test]
async fn test_push_with_query_str() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let active = h
        .router
        .push_with_query_str("users", Some(Params::from([("id", "7")])), "?tab=posts&sort=new")
        .await
        .unwrap();
    assert_eq!(active.path, "/users/7?tab=posts&sort=new");

    // An empty chunk drops the whole query.
    let active = h
        .router
        .push_with_query_str("users", Some(Params::from([("id", "7")])), "?tab=posts&&sort=new")
        .await
        .unwrap();
    assert_eq!(active.url_query, None);
    assert_eq!(active.path, "/users/7");
}

#[tokio::test]
async fn test_push_path_fallback() {
    let h = harness(app_config_with_fallback(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let active = h.router.push_path("/does/not/exist").await.unwrap();
    assert_eq!(active.name, "not-found");
    assert_eq!(active.path, "/does/not/exist");
    assert_eq!(h.navigator.history_len(), 2);
    assert_eq!(h.navigator.location().pathname, "/does/not/exist");

    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();
    assert_eq!(
        h.router.push_path("/does/not/exist").await.unwrap_err(),
        RouteError::NoMatch("/does/not/exist".into())
    );
}

#[tokio::test]
async fn test_scroll_snapshot_and_restore() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    h.scroll.set_offset(0.0, 250.0);
    h.router.push(user("1")).await.unwrap();

    let outgoing = h.navigator.entries()[0].1.clone().unwrap();
    assert_eq!(outgoing.scroll, Some([0.0, 250.0]));
    assert_eq!(h.scroll.scroll_offset(), (0.0, 0.0));

    h.router.back();
    let (router, scroll) = (h.router.clone(), h.scroll.clone());
    wait_until(move || {
        router.location().is_some_and(|l| l.name == "home") && scroll.scroll_offset() == (0.0, 250.0)
    })
    .await;

    // Pop-state never writes history.
    assert_eq!(h.navigator.history_len(), 2);
    assert_eq!(h.navigator.cursor(), 0);
}

#[tokio::test]
async fn test_restore_scroll_disabled() {
    let mut config = app_config();
    config.restore_scroll = false;
    let h = harness(config, MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    h.scroll.set_offset(0.0, 90.0);
    h.router.push(user("1")).await.unwrap();
    assert_eq!(h.navigator.entries()[0].1.clone().unwrap().scroll, None);
}

#[tokio::test]
async fn test_forward_after_back() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();
    h.router.push(user("5")).await.unwrap();

    h.router.back();
    let router = h.router.clone();
    wait_until(move || router.location().is_some_and(|l| l.name == "home")).await;

    h.router.forward();
    let router = h.router.clone();
    wait_until(move || router.location().is_some_and(|l| l.path == "/users/5")).await;
}

#[tokio::test]
async fn test_pop_state_with_unknown_route_enters_fallback() {
    let h = harness(app_config_with_fallback(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    h.navigator.emit_pop_state(Some(entry("ghost")));
    let router = h.router.clone();
    wait_until(move || router.location().is_some_and(|l| l.name == "not-found")).await;
    assert_eq!(h.router.location().unwrap().path, "/");
}

#[tokio::test]
async fn test_pop_state_without_fallback_is_fatal() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let err = h
        .router
        .handle_pop_state(PopStateEvent { state: None })
        .await
        .unwrap_err();
    assert_eq!(err, RouteError::UnexpectedHistoryState);

    let err = h
        .router
        .handle_pop_state(PopStateEvent {
            state: Some(entry("ghost")),
        })
        .await
        .unwrap_err();
    assert_eq!(err, RouteError::UnexpectedHistoryState);
    assert_eq!(h.router.location().unwrap().name, "home");
}

#[tokio::test]
async fn test_lazy_component_resolves_after_commit() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    h.router.push(RouteRequest::named("settings")).await.unwrap();
    // Committed immediately with the loading placeholder.
    assert_eq!(
        h.router.location().unwrap().component,
        Some(Component::new("Spinner"))
    );

    let router = h.router.clone();
    wait_until(move || {
        router
            .location()
            .is_some_and(|l| l.component == Some(Component::new("Settings")))
    })
    .await;

    let record = h.router.registry().by_name("settings").unwrap();
    assert_eq!(record.component(), Some(Component::new("Settings")));
    assert_eq!(record.lazy().unwrap().state(), FetchState::Fetched);

    let row = h
        .router
        .state()
        .routes
        .into_iter()
        .find(|r| r.name == "settings")
        .unwrap();
    assert_eq!(row.component, Some(Component::new("Settings")));

    // Later visits use the resolved component right away.
    h.router.push(RouteRequest::named("home")).await.unwrap();
    h.router.push(RouteRequest::named("settings")).await.unwrap();
    assert_eq!(
        h.router.location().unwrap().component,
        Some(Component::new("Settings"))
    );
}

#[tokio::test]
async fn test_lazy_failure_swaps_fallback_component() {
    let h = harness(app_config(), MemoryNavigator::default(), false);
    h.router.start().await.unwrap();

    let active = h.router.push(RouteRequest::named("settings")).await.unwrap();
    assert_eq!(active.name, "settings");

    let router = h.router.clone();
    wait_until(move || {
        router
            .location()
            .is_some_and(|l| l.component == Some(Component::new("SettingsUnavailable")))
    })
    .await;

    // The failed fetch may be retried on the next navigation.
    let record = h.router.registry().by_name("settings").unwrap();
    let router = h.router.clone();
    wait_until(move || {
        router
            .registry()
            .by_name("settings")
            .is_some_and(|r| r.lazy().is_some_and(|l| l.state() == FetchState::Idle))
    })
    .await;
    assert_eq!(record.component(), Some(Component::new("Spinner")));
}

#[tokio::test]
async fn test_hook_registration_errors() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    let proceed = |_args: HookArgs| async { HookOutcome::Proceed };

    let handle = h.router.add_before_push_hook("auth", proceed).unwrap();
    assert_eq!(handle.id(), "auth");
    assert_eq!(
        h.router.add_before_push_hook("auth", proceed).unwrap_err(),
        HookError::Duplicate("auth".into())
    );
    assert_eq!(
        h.router.add_before_push_hook("", proceed).unwrap_err(),
        HookError::EmptyId
    );
    assert_eq!(
        h.router.remove_before_push("missing").unwrap_err(),
        HookError::NotSubscribed("missing".into())
    );

    handle.remove().unwrap();
    assert_eq!(
        h.router.remove_before_push("auth").unwrap_err(),
        HookError::NotSubscribed("auth".into())
    );
}

#[tokio::test]
async fn test_removed_hook_no_longer_runs() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let handle = h
        .router
        .add_before_push_hook("deny", recording_hook(&log, "deny", HookOutcome::Abort))
        .unwrap();
    assert_eq!(h.router.push(RouteRequest::named("login")).await.unwrap().name, "home");

    handle.remove().unwrap();
    assert_eq!(h.router.push(RouteRequest::named("login")).await.unwrap().name, "login");
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_transitions_are_serialized() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    h.router
        .add_before_push_hook("slow", move |args: HookArgs| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(format!("start {}", args.pending.name));
                tokio::time::sleep(Duration::from_millis(5)).await;
                sink.lock().unwrap().push(format!("end {}", args.pending.name));
                HookOutcome::Proceed
            }
        })
        .unwrap();

    let (a, b) = tokio::join!(
        h.router.push(RouteRequest::named("login")),
        h.router.push(RouteRequest::named("admin")),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["start login", "end login", "start admin", "end admin"]
    );
    assert_eq!(h.router.location().unwrap().name, "admin");
}

#[tokio::test]
async fn test_destroy_detaches_hooks_and_pop_state() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.start().await.unwrap();
    h.router.push(user("3")).await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    h.router
        .add_before_push_hook("deny", recording_hook(&log, "deny", HookOutcome::Abort))
        .unwrap();

    h.router.destroy();
    assert!(h.router.is_destroyed());
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.router.back();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.router.location().unwrap().path, "/users/3");

    // Hooks are gone: pushes go straight through.
    assert_eq!(h.router.push(RouteRequest::named("login")).await.unwrap().name, "login");
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_after_destroy_does_not_listen() {
    let h = harness(app_config(), MemoryNavigator::default(), true);
    h.router.destroy();

    assert_eq!(h.router.start().await.unwrap().path, "/");
    h.router.push(user("1")).await.unwrap();

    h.router.back();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.navigator.location().pathname, "/");
    assert_eq!(h.router.location().unwrap().path, "/users/1");
}

#[tokio::test]
async fn test_base_path() {
    let mut config = app_config();
    config.base_path = Some("/app".into());
    let h = harness(config, MemoryNavigator::with_initial_url("/app/users/3"), true);

    let active = h.router.start().await.unwrap();
    assert_eq!(active.name, "users");
    assert_eq!(active.path, "/app/users/3");

    h.router.push(RouteRequest::named("home")).await.unwrap();
    assert_eq!(h.navigator.location().pathname, "/app");
    assert_eq!(h.router.name_to_path("login", None, None).unwrap(), "/app/login");
}
