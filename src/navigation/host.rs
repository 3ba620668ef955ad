//! Host navigation interface.
//!
//! The router never touches a browser directly. Everything it needs from
//! the host (current URL, history stack, pop-state events, scroll
//! container, "route updated" dispatch) goes through the traits below.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::navigation::store::Location;
use crate::routing::{Params, RouteRequest};

/// The physical URL as seen by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowLocation {
    /// Path component, e.g. "/users/42".
    pub pathname: String,
    /// Query component including the leading `?`, or empty.
    pub search: String,
}

impl WindowLocation {
    /// `pathname + search`, the form compared against canonical paths.
    pub fn href(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }
}

/// Route data persisted in a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_query: Option<Params>,
    /// Scroll offset `[left, top]` recorded when navigating away.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<[f64; 2]>,
}

impl HistoryEntry {
    pub fn route_request(&self) -> RouteRequest {
        RouteRequest {
            name: self.name.clone(),
            params: self.params.clone(),
            url_query: self.url_query.clone(),
        }
    }
}

impl From<RouteRequest> for HistoryEntry {
    fn from(request: RouteRequest) -> Self {
        Self {
            name: request.name,
            params: request.params,
            url_query: request.url_query,
            scroll: None,
        }
    }
}

/// Back/forward notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PopStateEvent {
    /// State of the entry the host moved to, if any.
    pub state: Option<HistoryEntry>,
}

/// The host's navigation object (a `window` in browsers).
pub trait Navigator: Send + Sync {
    fn location(&self) -> WindowLocation;

    /// State of the current history entry.
    fn history_state(&self) -> Option<HistoryEntry>;

    fn push_state(&self, entry: HistoryEntry, url: &str);

    /// Replace the current entry; `None` keeps its URL.
    fn replace_state(&self, entry: HistoryEntry, url: Option<&str>);

    fn back(&self);

    fn forward(&self);

    /// Register for pop-state events. Dropping the receiver unregisters.
    fn listen(&self) -> mpsc::UnboundedReceiver<PopStateEvent>;

    /// Dispatch the "route updated" notification.
    fn dispatch_route_updated(&self, location: &Location);
}

/// The scroll container restored across history navigation.
pub trait ScrollingElement: Send + Sync {
    /// Current `(left, top)` offset.
    fn scroll_offset(&self) -> (f64, f64);

    fn scroll_to(&self, left: f64, top: f64);
}
