//! Routing error definitions.

use thiserror::Error;

/// Grammar errors raised by the token scanners.
///
/// Offsets are byte offsets into the scanned input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid path (empty)")]
    EmptyPath,

    #[error("a path must begin with a slash")]
    MissingLeadingSlash,

    #[error("unexpected '{ch}' at {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("missing parameter name at {offset}")]
    MissingParamName { offset: usize },

    #[error("redeclared parameter '{name}' at {offset}")]
    RedeclaredParam { name: String, offset: usize },

    #[error("invalid route name (empty)")]
    EmptyRouteName,

    #[error("unexpected character '{ch}' in route name \"{name}\"")]
    InvalidRouteName { ch: char, name: String },
}

/// Errors surfaced by route resolution and navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The URL could not be scanned at all.
    #[error("invalid URL \"{url}\": {source}")]
    InvalidUrl { url: String, source: ParseError },

    /// The URL is well formed but no route terminates on it.
    #[error("URL \"{0}\" doesn't resolve any route")]
    NoMatch(String),

    #[error("missing route name")]
    MissingName,

    #[error("route \"{0}\" not found")]
    UnknownRoute(String),

    #[error("missing parameters [{}] for route \"{route}\"", .params.join(", "))]
    MissingParams { route: String, params: Vec<String> },

    #[error("missing parameter \"{param}\" for route \"{route}\"")]
    MissingParam { route: String, param: String },

    /// A before-push hook redirected without naming a route.
    #[error("before-push hook \"{hook}\" must redirect to a named route")]
    InvalidRedirect { hook: String },

    /// A hook aborted the very first navigation.
    #[error("unable to handle before push abort, no current location is set to fall back to")]
    NoCurrentLocation,

    #[error("unexpected history state: no route data to restore")]
    UnexpectedHistoryState,

    #[error("invalid link: {0}")]
    InvalidLink(String),
}
