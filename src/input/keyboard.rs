//! Keyboard translation for the discrete input source.
//!
//! Each physical key-down maps to at most one [`Command`]. Auto-repeat is
//! dropped for every key except text editing inside the search overlay, so a
//! held arrow key cannot queue moves behind a running slide or reorder step.

#![allow(missing_docs)]

use super::command::Command;

/// Physical keys the launcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    Delete,
    Backspace,
    Tab,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyPhase {
    #[default]
    Press,
    /// Synthetic repeat while the key is held.
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub phase: KeyPhase,
}

impl KeyEvent {
    #[must_use]
    pub const fn press(key: Key) -> Self {
        Self {
            key,
            phase: KeyPhase::Press,
        }
    }

    #[must_use]
    pub const fn repeat(key: Key) -> Self {
        Self {
            key,
            phase: KeyPhase::Repeat,
        }
    }

    #[must_use]
    pub const fn release(key: Key) -> Self {
        Self {
            key,
            phase: KeyPhase::Release,
        }
    }
}

/// Surface state that changes what a key means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyContext {
    /// The search overlay is open: letters type instead of triggering.
    pub search_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResolution {
    Command(Command),
    DroppedRepeat,
    Unmapped,
}

/// Translate one key event.
#[must_use]
pub fn resolve_key(event: KeyEvent, context: KeyContext) -> KeyResolution {
    if event.phase == KeyPhase::Release {
        return match event.key {
            Key::Enter => KeyResolution::Command(Command::ConfirmReleased),
            _ => KeyResolution::Unmapped,
        };
    }

    let command = if context.search_open {
        resolve_search_key(event.key)
    } else {
        resolve_global_key(event.key)
    };
    let Some(command) = command else {
        return KeyResolution::Unmapped;
    };

    if event.phase == KeyPhase::Repeat && !repeats(command) {
        return KeyResolution::DroppedRepeat;
    }
    KeyResolution::Command(command)
}

const fn repeats(command: Command) -> bool {
    matches!(command, Command::Text(_) | Command::Backspace)
}

fn resolve_search_key(key: Key) -> Option<Command> {
    match key {
        Key::Char(c) if !c.is_control() => Some(Command::Text(c)),
        Key::Backspace => Some(Command::Backspace),
        Key::Tab => Some(Command::SwitchSearchMode),
        Key::Up => Some(Command::Up),
        Key::Down => Some(Command::Down),
        Key::Left => Some(Command::Left),
        Key::Right => Some(Command::Right),
        Key::Enter => Some(Command::Confirm),
        Key::Escape => Some(Command::Back),
        Key::Delete | Key::Char(_) => None,
    }
}

fn resolve_global_key(key: Key) -> Option<Command> {
    match key {
        Key::Left => Some(Command::Left),
        Key::Right => Some(Command::Right),
        Key::Up => Some(Command::Up),
        Key::Down => Some(Command::Down),
        Key::Enter => Some(Command::Confirm),
        Key::Escape => Some(Command::Back),
        Key::Delete => Some(Command::Delete),
        Key::Char('e' | 'E') => Some(Command::Edit),
        Key::Char('r' | 'R') => Some(Command::ToggleReorder),
        Key::Char('f' | 'F') => Some(Command::ToggleSearch),
        Key::Backspace | Key::Tab | Key::Char(_) => None,
    }
}
