//! Configuration schema definitions.
//!
//! This module defines the declarative part of a router: the route table,
//! base path, fallback and observability settings. All types derive Serde
//! traits for deserialization from TOML files. Behavior that cannot be
//! declared in a file (navigator, hooks, loaders) is supplied to
//! [`crate::navigation::RouterBuilder`].

use serde::{Deserialize, Serialize};

/// Root configuration for a router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route declarations, in declaration order.
    pub routes: Vec<RouteConfig>,

    /// Path prefix stripped before matching and prepended when
    /// stringifying (e.g. "/app").
    pub base_path: Option<String>,

    /// Route entered when resolution fails.
    pub fallback: Option<FallbackConfig>,

    /// Record scroll offsets in history entries and restore them on
    /// back/forward navigation.
    pub restore_scroll: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            base_path: None,
            fallback: None,
            restore_scroll: true,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Create a configuration from a route table with defaults elsewhere.
    pub fn with_routes(routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Names of all lazy loaders referenced by the route table.
    pub fn loader_names(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .filter_map(|r| r.lazy.as_ref())
            .map(|lazy| lazy.loader.as_str())
    }
}

/// A single route declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Unique route name (letters, digits, `-`, `.`, `_`; starts with a letter).
    pub name: String,

    /// Path template, e.g. "/users/:id".
    pub path: String,

    /// Component rendered for the route. Exclusive with `lazy`.
    #[serde(default)]
    pub component: Option<String>,

    /// Lazily loaded component. Exclusive with `component`.
    #[serde(default)]
    pub lazy: Option<LazyConfig>,

    /// Opaque properties handed to the component.
    #[serde(default)]
    pub props: Option<serde_json::Value>,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            component: None,
            lazy: None,
            props: None,
        }
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn lazy(mut self, lazy: LazyConfig) -> Self {
        self.lazy = Some(lazy);
        self
    }

    pub fn props(mut self, props: serde_json::Value) -> Self {
        self.props = Some(props);
        self
    }
}

/// Lazy component descriptor.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LazyConfig {
    /// Name of a loader registered on the router builder.
    pub loader: String,

    /// Placeholder shown while loading.
    #[serde(default)]
    pub loading: Option<String>,

    /// Component shown if loading fails.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl LazyConfig {
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            loading: None,
            fallback: None,
        }
    }

    pub fn loading(mut self, component: impl Into<String>) -> Self {
        self.loading = Some(component.into());
        self
    }

    pub fn fallback(mut self, component: impl Into<String>) -> Self {
        self.fallback = Some(component.into());
        self
    }
}

/// Fallback route configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FallbackConfig {
    /// Route entered when resolution fails.
    pub name: String,

    /// Replace the current history entry when falling back (default: true).
    #[serde(default = "default_replace")]
    pub replace: bool,
}

impl FallbackConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replace: default_replace(),
        }
    }
}

fn default_replace() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}
