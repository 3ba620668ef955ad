//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! routes file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated)
//!     → RouterBuilder (adds navigator, hooks, loaders; re-validates loaders)
//!     → RouteRegistry (compiled, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a router is built
//! - All fields except the route table have defaults
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::FallbackConfig;
pub use schema::LazyConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RouteConfig;
pub use schema::RouterConfig;
pub use validation::{validate_config, ValidationError};
