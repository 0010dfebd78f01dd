#![forbid(unsafe_code)]

//! tvdeck: the navigation core of a couch-friendly application launcher.
//!
//! A circular carousel over an ordered library of launchable items, driven
//! by keyboard events and a polled game controller:
//! 1. **Slot recycling**: a fixed, odd-sized window of reusable slots stays
//!    centered on the focused item; one slot is rebound per step.
//! 2. **Reorder mode**: pick an item up, move a target marker and commit or
//!    cancel, with cooldowns guarding against accidental re-entry.
//! 3. **Input dispatch**: keyboard and debounced controller commands share
//!    one queue and each reaches exactly one consumer.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use tvdeck::prelude::*;
//!
//! let store = ItemStore::load(std::path::Path::new("launcher_apps.json")).into_store();
//! let mut engine = Engine::new(Config::default(), store, Collaborators::default());
//! engine.on_key_event(KeyEvent::press(Key::Right));
//! engine.on_poll_tick();
//! ```

pub mod prelude;

pub mod artwork;
pub mod carousel;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod engine;
pub mod input;
pub mod logger;
pub mod platform;
pub mod reorder;
pub mod store;
