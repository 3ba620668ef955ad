//! History-synchronized client-side route engine.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes.toml / RouterConfig
//!        │
//!        ▼
//!   ┌──────────┐    ┌──────────────────────────────┐
//!   │  config  │───▶│           routing            │
//!   │ validate │    │ template scan → trie → arena │
//!   └──────────┘    └──────────────┬───────────────┘
//!                                  │
//!   push / push_path / link click  ▼
//!   ───────────────────────▶┌──────────────┐   ┌───────────┐
//!                           │  navigation  │──▶│ Navigator │ history, scroll,
//!   host back/forward ─────▶│ hooks, store │   │  (host)   │ "route updated"
//!                           └──────┬───────┘   └───────────┘
//!                                  ▼
//!                         RouterState subscribers
//! ```

pub mod component;
pub mod config;
pub mod navigation;
pub mod observability;
pub mod routing;

pub use component::{Component, ComponentLoader, LoadError};
pub use config::schema::RouterConfig;
pub use navigation::{ActiveRoute, Router, RouterBuilder};
pub use routing::{Params, RouteError, RouteRequest};
