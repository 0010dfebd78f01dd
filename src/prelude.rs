//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use tvdeck::prelude::*;
//! ```

// Core
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, TvdError};

// Store
pub use crate::store::{Item, ItemStore, LoadOutcome};

// Carousel
pub use crate::carousel::{Direction, Easing, Slot, SlotId, SlotRecycler, TransitionController};

// Input
pub use crate::input::{
    Command, ControllerDevice, ControllerSample, InputEvent, Key, KeyEvent, Source,
};

// Reorder
pub use crate::reorder::{ReorderExit, ReorderPhaseKind, ReorderStatus};

// Engine
pub use crate::engine::{
    Collaborators, Engine, EngineEffect, MenuEntry, Notification, Outcome, TickReport,
};

// Platform
pub use crate::platform::{ModalGate, ProcessLauncher, SystemLauncher};
