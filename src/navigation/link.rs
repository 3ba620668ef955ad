//! Link activation: route anchor clicks through the router.
//!
//! The target is resolved when the link is bound, so a broken `href`
//! fails immediately instead of on click.

use std::sync::Arc;

use crate::navigation::router::Router;
use crate::routing::{RouteError, RouteRequest};

/// Id of an installed click listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A click on a bound element.
pub trait ClickEvent {
    /// Suppress the host's default navigation.
    fn prevent_default(&self);
}

pub type ClickListener = Arc<dyn Fn(&dyn ClickEvent) + Send + Sync>;

/// An anchor-like element.
pub trait AnchorElement: Send + Sync {
    fn tag_name(&self) -> String;

    fn href(&self) -> Option<String>;

    fn add_click_listener(&self, listener: ClickListener) -> ListenerId;

    fn remove_click_listener(&self, id: ListenerId);
}

/// An installed click interceptor. Removed on [`unbind`](Self::unbind) or
/// drop.
pub struct LinkBinding {
    element: Arc<dyn AnchorElement>,
    listener: Option<ListenerId>,
    target: RouteRequest,
}

impl LinkBinding {
    /// Intercept clicks on `element` and turn them into `push` calls.
    ///
    /// The element must be an `a` tag with a non-empty `href` that resolves
    /// to a route. Clicks spawn the navigation onto the current tokio
    /// runtime.
    pub fn bind(router: &Router, element: Arc<dyn AnchorElement>) -> Result<Self, RouteError> {
        if !element.tag_name().eq_ignore_ascii_case("a") {
            return Err(RouteError::InvalidLink(format!(
                "link target must be an <a> element, got <{}>",
                element.tag_name()
            )));
        }
        let href = element
            .href()
            .filter(|href| !href.is_empty())
            .ok_or_else(|| RouteError::InvalidLink("link has no href".to_string()))?;
        let target = router.get_route(&href)?;

        let on_click: ClickListener = {
            let router = router.clone();
            let target = target.clone();
            Arc::new(move |event: &dyn ClickEvent| {
                event.prevent_default();
                let router = router.clone();
                let target = target.clone();
                tokio::spawn(async move {
                    if let Err(e) = router.push(target).await {
                        tracing::warn!(error = %e, "Link navigation failed");
                    }
                });
            })
        };
        let listener = element.add_click_listener(on_click);
        tracing::debug!(href = %href, route = %target.name, "Link bound");

        Ok(Self {
            element,
            listener: Some(listener),
            target,
        })
    }

    /// The route a click navigates to.
    pub fn target(&self) -> &RouteRequest {
        &self.target
    }

    pub fn unbind(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.element.remove_click_listener(id);
        }
    }
}

impl Drop for LinkBinding {
    fn drop(&mut self) {
        self.detach();
    }
}
