use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{CancelSlot, RemoteClient, SearchResult};

/// Stored for every non-cancelled search failure
pub const SEARCH_FAILED: &str = "Search failed. Please try again";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// `None` until a search has succeeded
    pub results: Option<Vec<SearchResult>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Transient search results; nothing here is persisted
pub struct SearchStore {
    state: watch::Sender<SearchState>,
    client: Arc<dyn RemoteClient>,
    slot: CancelSlot,
    /// Incremented per search; only the latest one may clear `is_loading`
    generation: AtomicU64,
}

impl SearchStore {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            state,
            client,
            slot: CancelSlot::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    fn set(&self, action: &str, update: impl FnOnce(&mut SearchState)) {
        self.state.send_modify(|state| {
            let mut next = state.clone();
            update(&mut next);
            tracing::debug!(action, "search store");
            *state = next;
        });
    }

    /// Search under the caller's token. Starting a search cancels the one
    /// still in flight. A blank query clears the store.
    pub async fn search(&self, query: &str, cancel: &CancellationToken) {
        if query.trim().is_empty() {
            self.clear_search();
            return;
        }

        // Claim the generation before cancelling so the superseded search
        // never sees itself as the latest
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.slot.replace(cancel);
        self.run(query.trim(), generation, &token).await;
    }

    async fn run(&self, query: &str, generation: u64, cancel: &CancellationToken) {
        self.set("searchLoading", |state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = self.client.search(query, cancel).await;
        let latest = self.generation.load(Ordering::SeqCst) == generation;

        match result {
            Ok(results) => self.set("searchSuccess", |state| {
                state.results = Some(results);
                if latest {
                    state.is_loading = false;
                }
            }),
            Err(e) if e.is_cancelled() => {
                tracing::debug!(query, "search cancelled");
                if latest {
                    self.set("searchCancelled", |state| state.is_loading = false);
                }
            }
            Err(e) => {
                tracing::debug!(query, error = %e, "search failed");
                self.set("searchError", |state| {
                    state.error = Some(SEARCH_FAILED.to_string());
                    if latest {
                        state.is_loading = false;
                    }
                });
            }
        }
    }

    /// Full reset: no results, not loading, no error
    pub fn clear_search(&self) {
        self.slot.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set("clearSearch", |state| *state = SearchState::default());
    }
}
