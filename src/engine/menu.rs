//! System menu strip below the carousel.

#![allow(missing_docs)]

use serde::Serialize;

use crate::carousel::{Direction, wrap_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuEntry {
    Restart,
    Shutdown,
    Close,
}

impl MenuEntry {
    pub const ALL: [Self; 3] = [Self::Restart, Self::Shutdown, Self::Close];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Restart => "Restart",
            Self::Shutdown => "Shutdown",
            Self::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMenu {
    open: bool,
    index: usize,
}

impl SystemMenu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Enter the menu on the first entry.
    pub fn open(&mut self) {
        self.open = true;
        self.index = 0;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    #[must_use]
    pub const fn selected(&self) -> Option<MenuEntry> {
        if self.open {
            Some(MenuEntry::ALL[self.index])
        } else {
            None
        }
    }

    /// Cycle the selection with wraparound.
    pub fn step(&mut self, direction: Direction) -> Option<MenuEntry> {
        if !self.open {
            return None;
        }
        self.index = wrap_index(self.index, direction.step(), MenuEntry::ALL.len()).unwrap_or(0);
        self.selected()
    }
}
