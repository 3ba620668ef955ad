//! Pop-state driver.
//!
//! # Responsibilities
//! - Forward host pop-state events into the transition protocol
//! - Stop on router teardown or on an unrecoverable history state
//!
//! The driver holds only a weak reference to the router so a dropped
//! router is not kept alive by its own listener task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::navigation::host::PopStateEvent;
use crate::navigation::router::{Router, RouterInner};

/// Teardown signal shared by every task a router spawns.
pub(crate) struct Teardown {
    tx: broadcast::Sender<()>,
    destroyed: AtomicBool,
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Returns false when already triggered.
    pub fn trigger(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

/// Spawn the loop feeding `events` into `handle_pop_state`.
pub(crate) fn spawn(
    router: Weak<RouterInner>,
    mut events: mpsc::UnboundedReceiver<PopStateEvent>,
    mut teardown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Pop-state driver started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("Navigator closed the pop-state channel");
                        break;
                    };
                    let Some(inner) = router.upgrade() else {
                        break;
                    };
                    let current = Router::from_inner(inner);
                    if current.is_destroyed() {
                        break;
                    }
                    if let Err(e) = current.handle_pop_state(event).await {
                        tracing::error!(error = %e, "Router cannot represent history state, pop-state driver stopping");
                        break;
                    }
                }
                _ = teardown.recv() => {
                    tracing::debug!("Pop-state driver received teardown signal, exiting loop");
                    break;
                }
            }
        }
    })
}
