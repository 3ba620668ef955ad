//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Route names and path templates follow their grammars
//! - Names are unique and no two templates collapse onto one trie node
//! - Each route declares exactly one of `component` / `lazy`
//! - Base path, fallback and loader references are consistent
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function of the config plus the set of loaders
//! - Runs before any router state exists, so no partial router is built

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::template::{validate_route_name, PathTemplate};
use crate::routing::ParseError;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing routes")]
    NoRoutes,

    #[error("invalid route name \"{name}\": {source}")]
    InvalidRouteName { name: String, source: ParseError },

    #[error("redeclaration of route \"{0}\"")]
    DuplicateRoute(String),

    #[error("route \"{name}\" defines an invalid path template: {source}")]
    InvalidTemplate { name: String, source: ParseError },

    #[error("route \"{name}\" (\"{path}\") duplicates the path of route \"{other}\"")]
    DuplicatePath {
        name: String,
        path: String,
        other: String,
    },

    #[error("missing route component (on route \"{name}\", \"{path}\")")]
    MissingComponent { name: String, path: String },

    #[error("cannot use component and lazy (on route \"{name}\", \"{path}\")")]
    ConflictingComponent { name: String, path: String },

    #[error("route \"{name}\" references unknown lazy loader \"{loader}\"")]
    UnknownLoader { name: String, loader: String },

    #[error("the base path defines an invalid path template: {0}")]
    InvalidBasePath(ParseError),

    #[error("the base path \"{0}\" must not declare parameters")]
    BasePathParams(String),

    #[error("fallback route \"{0}\" is not declared")]
    UnknownFallback(String),

    #[error("fallback route \"{0}\" must not declare parameters")]
    FallbackParams(String),
}

/// Validate a configuration.
///
/// `has_loader` reports whether a lazy loader name is registered.
pub fn validate_config<F>(config: &RouterConfig, has_loader: F) -> Result<(), Vec<ValidationError>>
where
    F: Fn(&str) -> bool,
{
    let mut errors = Vec::new();

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    if let Some(base) = config.base_path.as_deref() {
        match PathTemplate::parse(base) {
            Ok(template) if !template.params().is_empty() => {
                errors.push(ValidationError::BasePathParams(base.to_string()));
            }
            Ok(_) => {}
            Err(err) => errors.push(ValidationError::InvalidBasePath(err)),
        }
    }

    // name -> parsed template, shape -> owning route name
    let mut names: HashSet<&str> = HashSet::new();
    let mut templates: HashMap<&str, PathTemplate> = HashMap::new();
    let mut shapes: HashMap<String, &str> = HashMap::new();

    for route in &config.routes {
        let name = route.name.as_str();

        if let Err(source) = validate_route_name(name) {
            errors.push(ValidationError::InvalidRouteName {
                name: name.to_string(),
                source,
            });
            continue;
        }
        if !names.insert(name) {
            errors.push(ValidationError::DuplicateRoute(name.to_string()));
            continue;
        }

        match PathTemplate::parse(&route.path) {
            Ok(template) => {
                if let Some(other) = shapes.insert(template.shape(), name) {
                    errors.push(ValidationError::DuplicatePath {
                        name: name.to_string(),
                        path: route.path.clone(),
                        other: other.to_string(),
                    });
                }
                templates.insert(name, template);
            }
            Err(source) => errors.push(ValidationError::InvalidTemplate {
                name: name.to_string(),
                source,
            }),
        }

        match (&route.component, &route.lazy) {
            (None, None) => errors.push(ValidationError::MissingComponent {
                name: name.to_string(),
                path: route.path.clone(),
            }),
            (Some(_), Some(_)) => errors.push(ValidationError::ConflictingComponent {
                name: name.to_string(),
                path: route.path.clone(),
            }),
            (None, Some(lazy)) if !has_loader(&lazy.loader) => {
                errors.push(ValidationError::UnknownLoader {
                    name: name.to_string(),
                    loader: lazy.loader.clone(),
                });
            }
            _ => {}
        }
    }

    if let Some(fallback) = &config.fallback {
        match templates.get(fallback.name.as_str()) {
            Some(template) if !template.params().is_empty() => {
                errors.push(ValidationError::FallbackParams(fallback.name.clone()));
            }
            Some(_) => {}
            // Declared with a broken template, already reported.
            None if names.contains(fallback.name.as_str()) => {}
            None => errors.push(ValidationError::UnknownFallback(fallback.name.clone())),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
