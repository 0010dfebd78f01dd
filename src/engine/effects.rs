//! What the engine asks of its host.
//!
//! The engine performs no rendering and shows no dialogs. Everything a host
//! must react to is queued as an [`EngineEffect`] and collected with
//! `Engine::take_effects`.

#![allow(missing_docs)]

use serde::Serialize;

use super::menu::MenuEntry;
use crate::carousel::SlotId;
use crate::input::Command;
use crate::reorder::{ReorderExit, ReorderSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// One-shot user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEffect {
    /// Slot bindings changed; redraw the window.
    SlotsChanged,
    /// Reorder badges or selection highlights need a refresh.
    HighlightsChanged,
    ReorderEntered(ReorderSession),
    ReorderExited(ReorderExit),
    Launched { index: usize, name: String },
    /// The launched application exited; inputs are back.
    AppClosed { name: String },
    /// Open the edit dialog for this item.
    RequestEdit(usize),
    /// Ask the user to confirm removing this item.
    RequestDelete(usize),
    MenuAction(MenuEntry),
    ExitRequested,
    /// A blocking surface owns input; hand it this command.
    ForwardToModal(Command),
    /// Search overlay opened, closed or changed its results.
    SearchChanged,
    /// New artwork for these slots.
    ArtworkReady(Vec<SlotId>),
    Notify(Notification),
}

/// What happened to one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A consumer acted on it.
    Applied,
    /// A consumer received it and declined: precondition not met, locked
    /// by an animation, or meaningless in the current mode.
    Ignored,
    /// Handed to a blocking modal surface.
    Forwarded,
    /// Inputs are handed off to a launched application.
    Suppressed,
    /// Never reached a consumer: auto-repeat or an unmapped key.
    Dropped,
}

/// Work done by one `on_poll_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TickReport {
    pub timers_fired: usize,
    pub commands: usize,
    pub artwork: usize,
}

/// Slots to highlight while reorder mode is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlights {
    /// Slots showing the item being moved.
    pub selected: Vec<SlotId>,
    /// Slots showing the landing position.
    pub target: Vec<SlotId>,
}
