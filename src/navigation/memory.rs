//! In-memory host: a history stack and scroll offset kept in process.
//!
//! Used by the CLI `simulate` command and by tests. Back and forward move
//! a cursor over the stack and emit pop-state events the way a browser
//! does.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::navigation::host::{
    HistoryEntry, Navigator, PopStateEvent, ScrollingElement, WindowLocation,
};
use crate::navigation::store::Location;

struct Entry {
    url: String,
    state: Option<HistoryEntry>,
}

struct MemoryState {
    entries: Vec<Entry>,
    cursor: usize,
    listeners: Vec<mpsc::UnboundedSender<PopStateEvent>>,
    route_updates: Vec<Location>,
}

impl MemoryState {
    fn current(&self) -> &Entry {
        &self.entries[self.cursor]
    }

    fn emit(&mut self) {
        let event = PopStateEvent {
            state: self.current().state.clone(),
        };
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A [`Navigator`] backed by an in-memory history stack.
pub struct MemoryNavigator {
    state: Mutex<MemoryState>,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::with_initial_url("/")
    }
}

impl MemoryNavigator {
    /// Start with a single entry at `url` and no history state.
    pub fn with_initial_url(url: impl Into<String>) -> Self {
        Self::with_initial_entry(url, None)
    }

    /// Start with a single entry at `url` carrying `state`, as after a
    /// page reload.
    pub fn with_initial_entry(url: impl Into<String>, state: Option<HistoryEntry>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                entries: vec![Entry {
                    url: url.into(),
                    state,
                }],
                cursor: 0,
                listeners: Vec::new(),
                route_updates: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of entries in the stack, including forward entries.
    pub fn history_len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Position of the current entry.
    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }

    /// `(url, state)` of every entry, oldest first.
    pub fn entries(&self) -> Vec<(String, Option<HistoryEntry>)> {
        self.lock()
            .entries
            .iter()
            .map(|e| (e.url.clone(), e.state.clone()))
            .collect()
    }

    /// Every location dispatched through "route updated", in order.
    pub fn route_updates(&self) -> Vec<Location> {
        self.lock().route_updates.clone()
    }

    /// Move the cursor by `delta` without emitting an event.
    pub fn go_silently(&self, delta: isize) {
        let mut state = self.lock();
        let target = state.cursor as isize + delta;
        if target >= 0 && (target as usize) < state.entries.len() {
            state.cursor = target as usize;
        }
    }

    /// Emit a pop-state event carrying `state` regardless of the stack.
    pub fn emit_pop_state(&self, state: Option<HistoryEntry>) {
        let event = PopStateEvent { state };
        self.lock()
            .listeners
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> WindowLocation {
        let state = self.lock();
        let url = state.current().url.as_str();
        let url = url.split_once('#').map_or(url, |(before, _)| before);
        match url.split_once('?') {
            Some((pathname, query)) => WindowLocation {
                pathname: pathname.to_string(),
                search: format!("?{query}"),
            },
            None => WindowLocation {
                pathname: url.to_string(),
                search: String::new(),
            },
        }
    }

    fn history_state(&self) -> Option<HistoryEntry> {
        self.lock().current().state.clone()
    }

    fn push_state(&self, entry: HistoryEntry, url: &str) {
        let mut state = self.lock();
        let next = state.cursor + 1;
        state.entries.truncate(next);
        state.entries.push(Entry {
            url: url.to_string(),
            state: Some(entry),
        });
        state.cursor = next;
    }

    fn replace_state(&self, entry: HistoryEntry, url: Option<&str>) {
        let mut state = self.lock();
        let cursor = state.cursor;
        let current = &mut state.entries[cursor];
        current.state = Some(entry);
        if let Some(url) = url {
            current.url = url.to_string();
        }
    }

    fn back(&self) {
        let mut state = self.lock();
        if state.cursor > 0 {
            state.cursor -= 1;
            state.emit();
        }
    }

    fn forward(&self) {
        let mut state = self.lock();
        if state.cursor + 1 < state.entries.len() {
            state.cursor += 1;
            state.emit();
        }
    }

    fn listen(&self) -> mpsc::UnboundedReceiver<PopStateEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().listeners.push(tx);
        rx
    }

    fn dispatch_route_updated(&self, location: &Location) {
        self.lock().route_updates.push(location.clone());
    }
}

/// A [`ScrollingElement`] holding a plain offset.
#[derive(Default)]
pub struct MemoryScroll {
    offset: Mutex<(f64, f64)>,
}

impl MemoryScroll {
    pub fn set_offset(&self, left: f64, top: f64) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) = (left, top);
    }
}

impl ScrollingElement for MemoryScroll {
    fn scroll_offset(&self) -> (f64, f64) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scroll_to(&self, left: f64, top: f64) {
        self.set_offset(left, top);
    }
}
