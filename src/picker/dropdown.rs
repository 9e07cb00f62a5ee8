use serde::Serialize;

/// Visibility state of the search dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropdownState {
    Closed,
    /// Open, but the query is too short to search
    OpenEmpty,
    /// A search is scheduled or in flight
    OpenLoading,
    OpenResults,
    /// The latest search finished with nothing left after filtering
    OpenNoResults,
}

impl DropdownState {
    /// Derives the state from the picker's raw fields
    ///
    /// `searchable` is whether the current query meets the minimum length; `settled` is whether
    /// a search for the current query has completed.
    pub fn derive(
        open: bool,
        searchable: bool,
        loading: bool,
        has_results: bool,
        settled: bool,
    ) -> Self {
        if !open {
            DropdownState::Closed
        } else if !searchable {
            DropdownState::OpenEmpty
        } else if loading {
            DropdownState::OpenLoading
        } else if has_results {
            DropdownState::OpenResults
        } else if settled {
            DropdownState::OpenNoResults
        } else {
            DropdownState::OpenEmpty
        }
    }
}
