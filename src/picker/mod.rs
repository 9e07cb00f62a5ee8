//! Incremental search & multi-select movie picker
//!
//! Typing schedules a debounced search; each scheduled search carries a generation number and
//! any response whose generation is no longer current is dropped on arrival. Selected ids are
//! owned by a [`SelectionConsumer`]; the picker keeps a cache of resolved [`Movie`] records for
//! them and fills it by fetching unresolved ids concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{
    models::{Movie, MovieId},
    services::{
        movie_search::{filter_candidates, is_searchable},
        providers::MovieLookup,
    },
};

mod consumer;
mod dropdown;

pub use consumer::SelectionConsumer;
pub use dropdown::DropdownState;

/// Tuning knobs for a picker instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    pub max_selections: usize,
    pub max_results: usize,
    pub min_query_chars: usize,
    pub debounce: Duration,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            max_selections: 10,
            max_results: 8,
            min_query_chars: 2,
            debounce: Duration::from_millis(300),
        }
    }
}

impl PickerOptions {
    pub fn with_max_selections(mut self, max_selections: usize) -> Self {
        self.max_selections = max_selections;
        self
    }
}

/// Render snapshot of a picker
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PickerView {
    pub query: String,
    pub dropdown: DropdownState,
    pub results: Vec<Movie>,
    /// Resolved records in selection order; ids still resolving are left out
    pub selected: Vec<Movie>,
    pub selected_ids: Vec<MovieId>,
    pub max_selections: usize,
    /// Search input is disabled once the selection is full
    pub input_disabled: bool,
}

impl PickerView {
    pub fn selection_label(&self) -> String {
        format!("{} of {} selected", self.selected_ids.len(), self.max_selections)
    }
}

struct PickerState {
    query: String,
    open: bool,
    loading: bool,
    results: Vec<Movie>,
    /// A search for the current generation has completed
    settled: bool,
    generation: u64,
    selected_ids: Vec<MovieId>,
    resolved: HashMap<MovieId, Movie>,
    /// Ids with a fetch in flight
    pending: HashSet<MovieId>,
}

struct PickerInner {
    lookup: Arc<dyn MovieLookup>,
    consumer: Arc<dyn SelectionConsumer>,
    options: PickerOptions,
    state: Mutex<PickerState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a mounted picker. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MoviePicker {
    inner: Arc<PickerInner>,
}

impl MoviePicker {
    /// Mounts a picker over an existing selection and starts resolving its records
    pub async fn mount(
        lookup: Arc<dyn MovieLookup>,
        consumer: Arc<dyn SelectionConsumer>,
        selected_ids: Vec<MovieId>,
        options: PickerOptions,
    ) -> Self {
        let selected_ids = normalize_selection(selected_ids, options.max_selections);

        let picker = Self {
            inner: Arc::new(PickerInner {
                lookup,
                consumer,
                options,
                state: Mutex::new(PickerState {
                    query: String::new(),
                    open: false,
                    loading: false,
                    results: Vec::new(),
                    settled: false,
                    generation: 0,
                    selected_ids,
                    resolved: HashMap::new(),
                    pending: HashSet::new(),
                }),
                tasks: Mutex::new(Vec::new()),
            }),
        };

        picker.spawn_resolve_all().await;
        picker
    }

    pub fn options(&self) -> &PickerOptions {
        &self.inner.options
    }

    /// Updates the search text and (re)starts the debounce window
    ///
    /// Short queries clear the results immediately and never reach the provider. Ignored while
    /// the selection is full, since the input is disabled.
    pub async fn set_query(&self, text: impl Into<String>) {
        let query = text.into();
        let min_query_chars = self.inner.options.min_query_chars;

        let generation = {
            let mut state = self.inner.state.lock().await;
            if state.selected_ids.len() >= self.inner.options.max_selections {
                tracing::debug!(query = %query, "Selection full, ignoring query");
                return;
            }

            state.generation += 1;
            state.query = query.clone();
            state.open = true;
            state.settled = false;

            if !is_searchable(&query, min_query_chars) {
                state.results.clear();
                state.loading = false;
                return;
            }

            state.loading = true;
            state.generation
        };

        tracing::debug!(query = %query, generation, "Search scheduled");

        let inner = self.inner.clone();
        self.track(tokio::spawn(async move {
            inner.debounced_search(generation, query).await;
        }))
        .await;
    }

    /// Adds `movie` to the selection. Returns false when the selection is full or already has it.
    pub async fn select(&self, movie: Movie) -> bool {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        if state.selected_ids.len() >= self.inner.options.max_selections {
            tracing::debug!(
                movie_id = movie.id,
                max_selections = self.inner.options.max_selections,
                "Selection full, ignoring select"
            );
            return false;
        }
        if state.selected_ids.contains(&movie.id) {
            return false;
        }

        state.selected_ids.push(movie.id);
        state.resolved.insert(movie.id, movie);

        // Clearing the query supersedes any scheduled or in-flight search
        state.generation += 1;
        state.query.clear();
        state.results.clear();
        state.loading = false;
        state.settled = false;
        state.open = false;

        self.inner.consumer.on_selection_change(&state.selected_ids);
        true
    }

    /// Removes `id` from the selection. Returns false when it was not selected.
    pub async fn remove(&self, id: MovieId) -> bool {
        let mut guard = self.inner.state.lock().await;
        let state = &mut *guard;

        let Some(position) = state.selected_ids.iter().position(|&selected| selected == id) else {
            return false;
        };

        state.selected_ids.remove(position);
        state.resolved.remove(&id);

        self.inner.consumer.on_selection_change(&state.selected_ids);
        true
    }

    /// Replaces the selection wholesale, as when the consumer restores a saved session
    ///
    /// The consumer is not notified; it is the source of the change.
    pub async fn set_selection(&self, ids: Vec<MovieId>) {
        let ids = normalize_selection(ids, self.inner.options.max_selections);
        {
            let mut guard = self.inner.state.lock().await;
            let state = &mut *guard;

            state
                .resolved
                .retain(|id, _| ids.contains(id));
            state.results.retain(|movie| !ids.contains(&movie.id));
            state.selected_ids = ids;
        }

        self.spawn_resolve_all().await;
    }

    /// Focus on the search input opens the dropdown
    pub async fn focus(&self) {
        self.inner.state.lock().await.open = true;
    }

    /// Pointer event outside the picker closes the dropdown
    pub async fn dismiss(&self) {
        self.inner.state.lock().await.open = false;
    }

    pub async fn selected_ids(&self) -> Vec<MovieId> {
        self.inner.state.lock().await.selected_ids.clone()
    }

    pub async fn view(&self) -> PickerView {
        let state = self.inner.state.lock().await;
        let options = &self.inner.options;

        PickerView {
            query: state.query.clone(),
            dropdown: DropdownState::derive(
                state.open,
                is_searchable(&state.query, options.min_query_chars),
                state.loading,
                !state.results.is_empty(),
                state.settled,
            ),
            results: state.results.clone(),
            selected: state
                .selected_ids
                .iter()
                .filter_map(|id| state.resolved.get(id).cloned())
                .collect(),
            selected_ids: state.selected_ids.clone(),
            max_selections: options.max_selections,
            input_disabled: state.selected_ids.len() >= options.max_selections,
        }
    }

    /// Waits until every timer, search and resolution spawned so far has finished
    pub async fn wait_idle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.tasks.lock().await);
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Picker task join error");
                }
            }
        }
    }

    async fn spawn_resolve_all(&self) {
        let inner = self.inner.clone();
        self.track(tokio::spawn(async move {
            inner.resolve_all().await;
        }))
        .await;
    }

    async fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl PickerInner {
    async fn is_current(&self, generation: u64) -> bool {
        self.state.lock().await.generation == generation
    }

    async fn debounced_search(&self, generation: u64, query: String) {
        tokio::time::sleep(self.options.debounce).await;

        if !self.is_current(generation).await {
            tracing::debug!(query = %query, generation, "Search superseded before firing");
            return;
        }

        let outcome = self.lookup.search_by_text(&query).await;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.generation != generation {
            tracing::debug!(
                query = %query,
                generation,
                current = state.generation,
                "Discarding stale search response"
            );
            return;
        }

        state.loading = false;
        state.settled = true;

        match outcome {
            Ok(candidates) => {
                state.results =
                    filter_candidates(candidates, &state.selected_ids, self.options.max_results);
                tracing::debug!(
                    query = %query,
                    generation,
                    results = state.results.len(),
                    "Search results applied"
                );
            }
            Err(e) => {
                if e.is_lookup_failure() {
                    tracing::warn!(
                        error = %e,
                        query = %query,
                        provider = self.lookup.name(),
                        "Search failed, showing no results"
                    );
                } else {
                    tracing::error!(error = %e, query = %query, "Unexpected search error");
                }
                state.results.clear();
            }
        }
    }

    /// Fetches every selected id that is neither resolved nor already being fetched, one
    /// request per id
    async fn resolve_all(&self) {
        let missing: Vec<MovieId> = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let missing: Vec<MovieId> = state
                .selected_ids
                .iter()
                .copied()
                .filter(|id| !state.resolved.contains_key(id) && !state.pending.contains(id))
                .collect();
            state.pending.extend(missing.iter().copied());
            missing
        };

        if missing.is_empty() {
            return;
        }

        tracing::debug!(count = missing.len(), "Resolving selected movies");

        let mut tasks = Vec::new();
        for id in missing {
            let lookup = self.lookup.clone();
            let task = tokio::spawn(async move { lookup.fetch_by_id(id).await });
            tasks.push((id, task));
        }

        let mut fetched = Vec::new();
        let mut finished = Vec::with_capacity(tasks.len());
        for (id, task) in tasks {
            finished.push(id);
            match task.await {
                Ok(Ok(Some(movie))) => fetched.push((id, movie)),
                Ok(Ok(None)) => {
                    tracing::debug!(movie_id = id, "Selected movie unknown to provider");
                }
                Ok(Err(e)) if e.is_lookup_failure() => {
                    tracing::warn!(
                        error = %e,
                        movie_id = id,
                        provider = self.lookup.name(),
                        "Failed to resolve selected movie"
                    );
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, movie_id = id, "Unexpected resolve error");
                }
                Err(e) => {
                    tracing::error!(error = %e, movie_id = id, "Task join error");
                }
            }
        }

        // Reconcile against the selection as it is now, not as it was at dispatch
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut discarded = 0;

        for id in &finished {
            state.pending.remove(id);
        }
        for (id, movie) in fetched {
            if state.selected_ids.contains(&id) {
                state.resolved.entry(id).or_insert(movie);
            } else {
                discarded += 1;
            }
        }
        state
            .resolved
            .retain(|id, _| state.selected_ids.contains(id));

        if discarded > 0 {
            tracing::debug!(discarded, "Dropped resolutions for deselected movies");
        }
    }
}

/// Drops duplicates and anything past `max_selections`, keeping first occurrences
fn normalize_selection(ids: Vec<MovieId>, max_selections: usize) -> Vec<MovieId> {
    let given = ids.len();
    let mut out: Vec<MovieId> = Vec::with_capacity(given.min(max_selections));
    for id in ids {
        if out.len() == max_selections {
            break;
        }
        if !out.contains(&id) {
            out.push(id);
        }
    }

    if out.len() < given {
        tracing::warn!(
            given,
            kept = out.len(),
            max_selections,
            "Selection had duplicates or exceeded the limit"
        );
    }
    out
}
