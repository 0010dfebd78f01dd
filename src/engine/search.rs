//! Search overlay: filter the library by name and jump to a hit.
//!
//! While open the overlay takes all input. Results keep their store indices
//! so a selection resolves to a focus position without a second lookup.

#![allow(missing_docs)]

use serde::Serialize;

use crate::input::Command;
use crate::store::ItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Printable input edits the query.
    #[default]
    Typing,
    /// Up/Down move through results.
    Navigating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub index: usize,
    pub name: String,
}

/// Result of feeding one command to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction {
    /// Consumed; nothing for the engine to do.
    Consumed,
    /// Jump focus to this store index. The overlay is closed.
    Select(usize),
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOverlay {
    open: bool,
    query: String,
    mode: SearchMode,
    results: Vec<SearchHit>,
    selected: usize,
}

impl SearchOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    #[must_use]
    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    #[must_use]
    pub fn selected(&self) -> Option<&SearchHit> {
        self.results.get(self.selected)
    }

    /// Open with an empty query listing every item.
    pub fn open(&mut self, store: &ItemStore) {
        self.open = true;
        self.query.clear();
        self.mode = SearchMode::Typing;
        self.refilter(store);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.results.clear();
        self.selected = 0;
    }

    /// Re-run the filter, e.g. after the store changed underneath.
    pub fn refilter(&mut self, store: &ItemStore) {
        let needle = self.query.to_lowercase();
        let mut hits: Vec<(String, SearchHit)> = store
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let key = item.name.to_lowercase();
                key.contains(&needle).then(|| {
                    (
                        key,
                        SearchHit {
                            index,
                            name: item.name.clone(),
                        },
                    )
                })
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.index.cmp(&b.1.index)));
        self.results = hits.into_iter().map(|(_, hit)| hit).collect();
        self.selected = 0;
    }

    /// Feed one command. Returns `None` when the overlay is closed.
    pub fn handle(&mut self, command: Command, store: &ItemStore) -> Option<SearchAction> {
        if !self.open {
            return None;
        }
        let action = match command {
            Command::Text(c) => {
                self.mode = SearchMode::Typing;
                self.query.push(c);
                self.refilter(store);
                SearchAction::Consumed
            }
            Command::Backspace => {
                if self.mode == SearchMode::Navigating {
                    self.mode = SearchMode::Typing;
                } else if self.query.pop().is_some() {
                    self.refilter(store);
                }
                SearchAction::Consumed
            }
            Command::SwitchSearchMode => {
                self.mode = match self.mode {
                    SearchMode::Typing => SearchMode::Navigating,
                    SearchMode::Navigating => SearchMode::Typing,
                };
                SearchAction::Consumed
            }
            Command::Up => {
                self.mode = SearchMode::Navigating;
                self.selected = self.selected.saturating_sub(1);
                SearchAction::Consumed
            }
            Command::Down => {
                self.mode = SearchMode::Navigating;
                if self.selected + 1 < self.results.len() {
                    self.selected += 1;
                }
                SearchAction::Consumed
            }
            Command::Confirm => match self.selected().map(|hit| hit.index) {
                Some(index) => {
                    self.close();
                    SearchAction::Select(index)
                }
                None => SearchAction::Consumed,
            },
            Command::Back | Command::ToggleSearch => {
                self.close();
                SearchAction::Closed
            }
            Command::Left
            | Command::Right
            | Command::ConfirmReleased
            | Command::Edit
            | Command::Delete
            | Command::ToggleReorder => SearchAction::Consumed,
        };
        Some(action)
    }
}
