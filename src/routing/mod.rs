//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at construction):
//!     RouteConfig[]
//!     → template.rs (scan path templates, validate names)
//!     → index.rs (insert token sequences into the trie)
//!     → registry.rs (arena of route records, frozen)
//!
//! Incoming URL ("/users/42?tab=info"):
//!     → template.rs (scan literal tokens)
//!     → query.rs (decode the query component)
//!     → index.rs (walk: literal child first, then parametric child)
//!     → Return: RouteRequest {name, params, url_query} or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable afterwards (component slots aside)
//! - No regex anywhere (hand-written scanners, trie walk)
//! - Deterministic: literal segments always beat parameters
//! - Explicit NoMatch rather than silent default

pub mod error;
pub mod index;
pub mod params;
pub mod query;
pub mod registry;
pub mod template;

pub use error::{ParseError, RouteError};
pub use index::RouteId;
pub use params::Params;
pub use query::{decode_query, encode_query};
pub use registry::{RouteRecord, RouteRegistry, RouteRequest};
pub use template::{parse_url_path, validate_route_name, PathTemplate, Token, UrlPath};
