//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! push(name, params, query) / push_path(url) / link click
//!     → router.rs (transition protocol, serialized)
//!     → hooks.rs (before-push chain: Proceed | Abort | Redirect)
//!     → store.rs (publish RouterState to subscribers)
//!     → host.rs (history write, scroll reset, "route updated")
//!
//! Host back/forward:
//!     Navigator::listen()
//!     → driver.rs (pop-state loop until teardown)
//!     → router.rs (handle_pop_state, scroll restore)
//! ```
//!
//! # Design Decisions
//! - The host is reached only through the [`Navigator`] and
//!   [`ScrollingElement`] traits; [`MemoryNavigator`] implements them in
//!   process
//! - Hooks return an explicit [`HookOutcome`] instead of signalling through
//!   errors
//! - Subscribers are notified synchronously on every publish

mod driver;
pub mod hooks;
pub mod host;
pub mod link;
pub mod memory;
pub mod router;
pub mod store;

pub use hooks::{BeforePushHook, HookArgs, HookChain, HookError, HookHandle, HookOutcome, GLOBAL_HOOK_ID};
pub use host::{HistoryEntry, Navigator, PopStateEvent, ScrollingElement, WindowLocation};
pub use link::{AnchorElement, ClickEvent, ClickListener, LinkBinding, ListenerId};
pub use memory::{MemoryNavigator, MemoryScroll};
pub use router::{ActiveRoute, Router, RouterBuilder};
pub use store::{Location, RouteInfo, RouterState, Store, SubscriptionId};
