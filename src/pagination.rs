//! Cursor-paginated list sessions.
//!
//! Every list screen in the app accumulates pages from a cursor-based REST
//! endpoint. `Paginator` owns that state machine once, instead of each screen
//! wiring its own cursor/loading/has-more flags. The engine is pure: fetch
//! operations return a [`FetchTicket`] describing the request the caller must
//! issue, and the completed result comes back through [`Paginator::apply`].
//! The ticket carries the session epoch, so a response that resolves after a
//! reset or disable is recognized and discarded instead of clobbering fresher
//! state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub total_count: u64,
}

/// One fetched batch of items plus pagination metadata.
///
/// Wire shape: `{ "data": [...], "page": { "cursor": "...", "totalCount": n } }`.
/// An empty or absent cursor signals the final page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub page: PageInfo,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(data: Vec<T>, cursor: impl Into<String>, total_count: u64) -> Self {
        Self {
            data,
            page: PageInfo {
                cursor: cursor.into(),
                total_count,
            },
        }
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.page.cursor.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Initial,
    More,
}

/// Describes the fetch an engine operation requested.
///
/// The app layer turns the ticket into an HTTP request and hands it back,
/// unchanged, together with the outcome. The epoch inside is what makes a
/// late response from a superseded session detectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    epoch: u64,
    kind: FetchKind,
    cursor: String,
}

impl FetchTicket {
    #[must_use]
    pub const fn kind(&self) -> FetchKind {
        self.kind
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The continuation token to send, if any. Initial fetches and fetches
    /// from the start of a session carry no cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        if self.cursor.is_empty() {
            None
        } else {
            Some(&self.cursor)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    pub enabled: bool,
    pub auto_load: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_load: true,
        }
    }
}

/// Outcome of merging a completed fetch into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The page was merged.
    Page,
    /// The fetch failed; the session settled into its terminal state for
    /// this attempt.
    Failed,
    /// The response belonged to a superseded session and was discarded.
    Stale,
}

/// State machine for one cursor-paginated list session.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    cursor: String,
    total_count: u64,
    has_more: bool,
    is_loading: bool,
    started: bool,
    epoch: u64,
    deps: Vec<String>,
    config: PaginatorConfig,
}

impl<T> Default for Paginator<T> {
    fn default() -> Self {
        Self::new(PaginatorConfig::default())
    }
}

impl<T> Paginator<T> {
    #[must_use]
    pub fn new(config: PaginatorConfig) -> Self {
        Self {
            items: Vec::new(),
            cursor: String::new(),
            total_count: 0,
            // A load_more before any initial load must be a harmless no-op.
            has_more: false,
            is_loading: false,
            started: false,
            epoch: 0,
            deps: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Mutable access to accumulated items for in-place updates (status
    /// changes after a mutation). A slice, so the accumulation invariant
    /// cannot be broken from outside.
    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// True once a session has begun its first fetch. Stays true across
    /// resets; a new engine or `sync_deps` first bind is the only fresh start.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// True when the screen should render its empty state: nothing loaded
    /// and nothing in flight.
    #[must_use]
    pub fn show_empty_state(&self) -> bool {
        self.items.is_empty() && !self.is_loading
    }

    fn ticket(&self, kind: FetchKind) -> FetchTicket {
        FetchTicket {
            epoch: self.epoch,
            kind,
            cursor: self.cursor.clone(),
        }
    }

    /// Screen mount. Starts the initial load once, if configured to.
    pub fn activate(&mut self) -> Option<FetchTicket> {
        if self.started || !self.config.auto_load {
            return None;
        }
        self.load_initial()
    }

    /// Begin fetching the first page. Always requests from the start of the
    /// result set. No-op while a fetch is in flight, so simultaneous mount
    /// triggers cannot fire duplicate initial loads.
    pub fn load_initial(&mut self) -> Option<FetchTicket> {
        if !self.config.enabled || self.is_loading {
            return None;
        }
        self.cursor.clear();
        self.is_loading = true;
        self.started = true;
        Some(self.ticket(FetchKind::Initial))
    }

    /// Fetch the next page with the current cursor. No-op when exhausted,
    /// already loading, or disabled.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if !self.config.enabled || self.is_loading || !self.has_more {
            return None;
        }
        self.is_loading = true;
        Some(self.ticket(FetchKind::More))
    }

    /// Discard the session and start over. State is cleared synchronously;
    /// any in-flight response is invalidated by the epoch bump. When enabled,
    /// a fresh initial fetch begins immediately.
    pub fn reset(&mut self) -> Option<FetchTicket> {
        self.epoch += 1;
        self.items.clear();
        self.cursor.clear();
        self.total_count = 0;
        self.has_more = true;
        self.is_loading = false;
        if !self.config.enabled {
            return None;
        }
        self.is_loading = true;
        self.started = true;
        Some(self.ticket(FetchKind::Initial))
    }

    /// Bind the session to a sequence of opaque dependency keys (filter
    /// values, selected ids). The first bind behaves like a mount; a changed
    /// key sequence behaves like a reset.
    pub fn sync_deps<S: AsRef<str>>(&mut self, deps: &[S]) -> Option<FetchTicket> {
        let next: Vec<String> = deps.iter().map(|d| d.as_ref().to_owned()).collect();
        if !self.started {
            self.deps = next;
            return self.activate();
        }
        if next == self.deps {
            return None;
        }
        self.deps = next;
        self.reset()
    }

    /// Gate the engine. Disabling invalidates any in-flight fetch; enabling
    /// starts the initial load if the session never began.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<FetchTicket> {
        if self.config.enabled == enabled {
            return None;
        }
        self.config.enabled = enabled;
        if enabled {
            if self.config.auto_load && !self.started {
                return self.load_initial();
            }
        } else {
            self.epoch += 1;
            self.is_loading = false;
        }
        None
    }

    /// Merge a completed fetch. The error payload is already logged by the
    /// caller; the engine only needs to know that the attempt failed.
    pub fn apply<E>(&mut self, ticket: &FetchTicket, outcome: Result<Page<T>, E>) -> Applied {
        if ticket.epoch != self.epoch {
            return Applied::Stale;
        }
        self.is_loading = false;
        match (ticket.kind, outcome) {
            (FetchKind::Initial, Ok(page)) => {
                self.items = page.data;
                self.cursor = page.page.cursor;
                self.total_count = page.page.total_count;
                self.has_more = !self.cursor.is_empty();
                Applied::Page
            }
            (FetchKind::More, Ok(page)) => {
                self.items.extend(page.data);
                self.cursor = page.page.cursor;
                self.total_count = page.page.total_count;
                self.has_more = !self.cursor.is_empty();
                Applied::Page
            }
            (FetchKind::Initial, Err(_)) => {
                self.items.clear();
                self.cursor.clear();
                self.total_count = 0;
                self.has_more = false;
                Applied::Failed
            }
            (FetchKind::More, Err(_)) => {
                // Keep what was accumulated; stop the scroll trigger from
                // retrying in a loop. A reset is the retry path.
                self.has_more = false;
                Applied::Failed
            }
        }
    }
}
