//! Terminal front end for the launcher engine.
#![allow(missing_docs)]

pub mod session;

pub use session::{Dialog, SessionView, map_key, release_events_supported, render_lines};
