//! Route registry: compiled route records plus the lookup index.
//!
//! # Responsibilities
//! - Compile a validated [`RouterConfig`] into an arena of route records
//! - Resolve URLs to `{name, params, url_query}` through the trie
//! - Verify `(name, params)` pairs and stringify them back into URLs
//!
//! # Design Decisions
//! - Records live in a `Vec` addressed by [`RouteId`]; the trie stores ids
//! - Immutable after construction except for each record's component slot,
//!   an atomically swapped cell patched by lazy resolution
//! - A configured base path is stripped once, positionally, before lookup

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentLoader, LazyComponent};
use crate::config::loader::ConfigError;
use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

use super::error::RouteError;
use super::index::{RouteId, RouteIndex};
use super::params::Params;
use super::query::encode_query;
use super::template::{parse_url_path, PathTemplate, Token};

/// A navigation target: route name plus parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_query: Option<Params>,
}

impl RouteRequest {
    /// Target a route without parameters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.url_query = Some(query);
        self
    }
}

/// A compiled route.
#[derive(Debug)]
pub struct RouteRecord {
    id: RouteId,
    name: String,
    template: PathTemplate,
    component: ArcSwapOption<Component>,
    lazy: Option<LazyComponent>,
    props: Option<serde_json::Value>,
}

impl RouteRecord {
    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// The component currently in the slot: the direct component, the lazy
    /// placeholder, or the resolved lazy component.
    pub fn component(&self) -> Option<Component> {
        self.component.load_full().map(|c| (*c).clone())
    }

    pub fn lazy(&self) -> Option<&LazyComponent> {
        self.lazy.as_ref()
    }

    pub fn props(&self) -> Option<&serde_json::Value> {
        self.props.as_ref()
    }

    pub(crate) fn set_component(&self, component: Component) {
        self.component.store(Some(Arc::new(component)));
    }
}

/// All routes of a router, indexed by name and by path.
#[derive(Debug)]
pub struct RouteRegistry {
    records: Vec<RouteRecord>,
    by_name: HashMap<String, RouteId>,
    index: RouteIndex,
    base_path: Option<PathTemplate>,
}

impl RouteRegistry {
    /// Validate `config` and compile it.
    ///
    /// `loaders` maps the loader names referenced by lazy routes.
    pub fn from_config(
        config: &RouterConfig,
        loaders: &HashMap<String, Arc<dyn ComponentLoader>>,
    ) -> Result<Self, ConfigError> {
        validate_config(config, |name| loaders.contains_key(name))
            .map_err(ConfigError::Validation)?;

        let base_path = match config.base_path.as_deref() {
            Some(base) => Some(
                PathTemplate::parse(base)
                    .map_err(|e| ConfigError::Validation(vec![ValidationError::InvalidBasePath(e)]))?,
            )
            .filter(|t| !t.is_root()),
            None => None,
        };

        let mut registry = RouteRegistry {
            records: Vec::with_capacity(config.routes.len()),
            by_name: HashMap::with_capacity(config.routes.len()),
            index: RouteIndex::new(),
            base_path,
        };

        for route in &config.routes {
            let template = PathTemplate::parse(&route.path).map_err(|source| {
                ConfigError::Validation(vec![ValidationError::InvalidTemplate {
                    name: route.name.clone(),
                    source,
                }])
            })?;

            let id = RouteId(registry.records.len());
            if let Err(existing) = registry.index.insert(&template, id) {
                return Err(ConfigError::Validation(vec![ValidationError::DuplicatePath {
                    name: route.name.clone(),
                    path: route.path.clone(),
                    other: registry.records[existing.0].name.clone(),
                }]));
            }

            let lazy = match &route.lazy {
                Some(lazy) => {
                    let loader = loaders.get(&lazy.loader).cloned().ok_or_else(|| {
                        ConfigError::Validation(vec![ValidationError::UnknownLoader {
                            name: route.name.clone(),
                            loader: lazy.loader.clone(),
                        }])
                    })?;
                    Some(
                        LazyComponent::new(loader)
                            .with_loading(lazy.loading.as_deref().map(Component::new))
                            .with_fallback(lazy.fallback.as_deref().map(Component::new)),
                    )
                }
                None => None,
            };
            let component = match (&route.component, &lazy) {
                (Some(component), _) => Some(Component::new(component)),
                (None, Some(lazy)) => lazy.loading().cloned(),
                (None, None) => None,
            };

            tracing::debug!(
                route = %route.name,
                path = %template,
                lazy = lazy.is_some(),
                "Route registered"
            );

            registry.by_name.insert(route.name.clone(), id);
            registry.records.push(RouteRecord {
                id,
                name: route.name.clone(),
                template,
                component: ArcSwapOption::new(component.map(Arc::new)),
                lazy,
                props: route.props.clone(),
            });
        }

        Ok(registry)
    }

    pub fn get(&self, id: RouteId) -> &RouteRecord {
        &self.records[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteRecord> {
        self.by_name.get(name).map(|id| self.get(*id))
    }

    /// Records in declaration order.
    pub fn records(&self) -> impl Iterator<Item = &RouteRecord> {
        self.records.iter()
    }

    pub fn base_path(&self) -> Option<&PathTemplate> {
        self.base_path.as_ref()
    }

    /// Return the route named `name` if `params` provides every parameter
    /// its template declares.
    pub fn verify(&self, name: &str, params: Option<&Params>) -> Result<&RouteRecord, RouteError> {
        if name.is_empty() {
            return Err(RouteError::MissingName);
        }
        let record = self
            .by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        let declared = record.template.params();
        if declared.is_empty() {
            return Ok(record);
        }
        let params = params.ok_or_else(|| RouteError::MissingParams {
            route: name.to_string(),
            params: declared.to_vec(),
        })?;
        if let Some(missing) = declared.iter().find(|p| !params.contains_key(p)) {
            return Err(RouteError::MissingParam {
                route: name.to_string(),
                param: missing.clone(),
            });
        }
        Ok(record)
    }

    /// Build the URL for `template`, prefixed by the base path.
    pub fn stringify(
        &self,
        template: &PathTemplate,
        params: Option<&Params>,
        url_query: Option<&Params>,
    ) -> Result<String, RouteError> {
        let mut path = String::new();
        if let Some(base) = &self.base_path {
            push_tokens(&mut path, base.tokens(), None);
        }

        if template.is_root() {
            if path.is_empty() {
                path.push('/');
            }
        } else if let Some(missing) = push_tokens(&mut path, template.tokens(), params) {
            return Err(RouteError::MissingParam {
                route: template.to_string(),
                param: missing.to_string(),
            });
        }

        if let Some(query) = url_query {
            path.push_str(&encode_query(query));
        }
        Ok(path)
    }

    /// Build the URL of the route named `name`.
    pub fn name_to_path(
        &self,
        name: &str,
        params: Option<&Params>,
        url_query: Option<&Params>,
    ) -> Result<String, RouteError> {
        let record = self
            .by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        self.stringify(&record.template, params, url_query)
    }

    /// Resolve a URL to the route it designates.
    pub fn resolve(&self, url: &str) -> Result<RouteRequest, RouteError> {
        let parsed = parse_url_path(url).map_err(|source| RouteError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        // A URL outside the base path is matched as is, so `/` still
        // reaches the root route.
        let mut tokens = parsed.tokens.as_slice();
        if let Some(base) = &self.base_path {
            let prefix_len = base.tokens().len();
            let has_prefix = tokens.len() >= prefix_len
                && base
                    .tokens()
                    .iter()
                    .zip(tokens)
                    .all(|(b, t)| matches!(b, Token::Static(s) if s == t));
            if has_prefix {
                tokens = &tokens[prefix_len..];
            }
        }

        let hit = self
            .index
            .lookup(tokens)
            .ok_or_else(|| RouteError::NoMatch(url.to_string()))?;
        let record = self.get(hit.route);

        // The walk mirrors the terminal template edge for edge, so captured
        // values line up with that template's parameters.
        let params = (!record.template.params().is_empty()).then(|| {
            record
                .template
                .params()
                .iter()
                .zip(hit.captured)
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect::<Params>()
        });

        Ok(RouteRequest {
            name: record.name.clone(),
            params,
            url_query: parsed.query,
        })
    }
}

/// Append `/token` for each token. Returns the first parameter missing
/// from `params`.
fn push_tokens<'t>(path: &mut String, tokens: &'t [Token], params: Option<&Params>) -> Option<&'t str> {
    for token in tokens {
        path.push('/');
        match token {
            Token::Static(text) => path.push_str(text),
            Token::Param(name) => match params.and_then(|p| p.get(name)) {
                Some(value) => path.push_str(value),
                None => return Some(name.as_str()),
            },
        }
    }
    None
}
