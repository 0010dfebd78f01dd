//! [`ItemStore`]: the ordered item sequence and its on-disk library file.
//!
//! # File format
//!
//! ```text
//! {"apps": [{"name", "path", "icon"}], "background": "", "steamgriddb_api_key": ""}
//! ```
//!
//! A legacy file holding a bare JSON array is read as the item list. `items`
//! is accepted as an alias for `apps`.
//!
//! # Persistence strategy
//!
//! Atomic write: serialize → temp file → fsync → rename over target. Loading
//! never fails; unreadable or corrupt files yield an empty library through
//! [`LoadOutcome`].

#![allow(missing_docs)]

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::item::Item;
use crate::core::errors::{Result, TvdError};

/// Ordered, positionally addressed item sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStore {
    items: Vec<Item>,
    background: String,
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryDocument {
    #[serde(default, alias = "items")]
    apps: Vec<Item>,
    #[serde(default)]
    background: String,
    #[serde(default)]
    steamgriddb_api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLibrary {
    Document(LibraryDocument),
    Legacy(Vec<Item>),
}

/// Load outcome from the persistence layer.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Parsed successfully. `dropped` counts entries that failed validation.
    Loaded { store: ItemStore, dropped: usize },
    /// File not found (normal on first launch).
    Missing,
    /// File exists but is not a library document.
    Corrupt { details: String },
    /// File could not be read.
    IoError { details: String },
}

impl LoadOutcome {
    /// Extract the effective store regardless of load status.
    #[must_use]
    pub fn into_store(self) -> ItemStore {
        match self {
            Self::Loaded { store, .. } => store,
            Self::Missing | Self::Corrupt { .. } | Self::IoError { .. } => ItemStore::default(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Missing)
    }
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-validated items.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        for item in &items {
            item.validate()?;
        }
        Ok(Self {
            items,
            ..Self::default()
        })
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
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background(&mut self, background: impl Into<String>) {
        self.background = background.into();
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Reduce a signed offset from `base` onto the circular index space.
    /// Returns `None` for an empty store.
    #[must_use]
    pub fn wrap(&self, base: usize, offset: isize) -> Option<usize> {
        crate::carousel::wrap_index(base, offset, self.items.len())
    }

    /// Append an item, returning its index.
    pub fn push(&mut self, item: Item) -> Result<usize> {
        item.validate()?;
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, item: Item) -> Result<()> {
        item.validate()?;
        if index > self.items.len() {
            return Err(TvdError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, item);
        Ok(())
    }

    /// Replace the item at `index`, returning the previous record.
    pub fn replace(&mut self, index: usize, item: Item) -> Result<Item> {
        item.validate()?;
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.items[index], item))
    }

    pub fn remove(&mut self, index: usize) -> Result<Item> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Pop the item at `from` and reinsert it at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.items.is_empty() {
            return Err(TvdError::EmptyStore);
        }
        if index >= self.items.len() {
            return Err(TvdError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }

    /// Load the library file. Never panics, never fails.
    pub fn load(path: &Path) -> LoadOutcome {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return LoadOutcome::Corrupt {
                    details: format!("{e}"),
                };
            }
            Err(e) => {
                return LoadOutcome::IoError {
                    details: format!("{e}"),
                };
            }
        };

        let doc = match serde_json::from_str::<RawLibrary>(&content) {
            Ok(RawLibrary::Document(doc)) => doc,
            Ok(RawLibrary::Legacy(apps)) => LibraryDocument {
                apps,
                background: String::new(),
                steamgriddb_api_key: String::new(),
            },
            Err(e) => {
                return LoadOutcome::Corrupt {
                    details: format!("{e}"),
                };
            }
        };

        let total = doc.apps.len();
        let items: Vec<Item> = doc
            .apps
            .into_iter()
            .filter(|item| item.validate().is_ok())
            .collect();
        let dropped = total - items.len();
        if dropped > 0 {
            tracing::warn!(dropped, path = %path.display(), "skipped library entries without name or path");
        }

        LoadOutcome::Loaded {
            store: Self {
                items,
                background: doc.background,
                api_key: doc.steamgriddb_api_key,
            },
            dropped,
        }
    }

    /// Atomic save. Creates parent directories as needed.
    pub fn persist(&self, path: &Path) -> Result<PathBuf> {
        let doc = LibraryDocument {
            apps: self.items.clone(),
            background: self.background.clone(),
            steamgriddb_api_key: self.api_key.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        write_atomic(path, json.as_bytes()).map_err(|e| TvdError::Persist {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        Ok(path.to_path_buf())
    }
}

impl<'a> IntoIterator for &'a ItemStore {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    // Same directory keeps the rename on one filesystem.
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}
