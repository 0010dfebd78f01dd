//! Logical commands shared by every input source.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::carousel::Direction;

/// A resolved, source-independent command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Left,
    Right,
    Up,
    Down,
    /// Primary action pressed: launch, confirm, select.
    Confirm,
    /// Primary action released. Only sources that report releases send it.
    ConfirmReleased,
    /// Leave the current surface; cancel in reorder mode.
    Back,
    Edit,
    Delete,
    ToggleReorder,
    ToggleSearch,
    SwitchSearchMode,
    Text(char),
    Backspace,
}

impl Command {
    /// Horizontal direction, if this is a horizontal move.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Keyboard,
    /// Directional pad or analog stick.
    ControllerAxis,
    ControllerButton,
    /// Injected by a host or test.
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub command: Command,
    pub source: Source,
}

impl InputEvent {
    #[must_use]
    pub const fn new(command: Command, source: Source) -> Self {
        Self { command, source }
    }

    #[must_use]
    pub const fn keyboard(command: Command) -> Self {
        Self::new(command, Source::Keyboard)
    }

    #[must_use]
    pub const fn script(command: Command) -> Self {
        Self::new(command, Source::Script)
    }
}

impl From<Command> for InputEvent {
    fn from(command: Command) -> Self {
        Self::script(command)
    }
}
