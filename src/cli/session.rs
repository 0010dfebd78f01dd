//! Interactive terminal session: the carousel drawn as a row of slots.
//!
//! Uses `crossterm` for raw mode, the alternate screen and key events. The
//! engine is ticked every poll interval. Edit and delete requests open a small
//! in-terminal dialog while the shared modal gate routes controller input to
//! it.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::engine::{Engine, EngineEffect, MenuEntry, NotificationLevel, SearchMode};
use crate::input::{Command, Key, KeyEvent};
use crate::platform::SharedModalGate;
use crate::reorder::ReorderPhaseKind;
use crate::store::Item;

// ──────────────────── key mapping ────────────────────

/// Translate a terminal key event. Modifier chords other than shift are not
/// forwarded.
#[must_use]
pub fn map_key(event: &event::KeyEvent) -> Option<KeyEvent> {
    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    let key = match event.code {
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::Char(c) => Key::Char(c),
        _ => return None,
    };
    Some(match event.kind {
        KeyEventKind::Press => KeyEvent::press(key),
        KeyEventKind::Repeat => KeyEvent::repeat(key),
        KeyEventKind::Release => KeyEvent::release(key),
    })
}

fn is_quit(event: &event::KeyEvent) -> bool {
    event.kind == KeyEventKind::Press
        && event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c' | 'q'))
}

/// Whether the terminal can report key releases.
pub fn release_events_supported() -> bool {
    terminal::supports_keyboard_enhancement().unwrap_or(false)
}

// ──────────────────── dialogs ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    ConfirmDelete { index: usize, name: String },
    Rename { index: usize, buffer: String },
}

/// Host-side state layered over the engine.
#[derive(Debug, Default)]
pub struct SessionView {
    dialog: Option<Dialog>,
    status: Option<(NotificationLevel, String)>,
    quit: bool,
}

impl SessionView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|(_, message)| message.as_str())
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    fn set_status(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.status = Some((level, message.into()));
    }

    fn open(&mut self, dialog: Dialog, gate: &SharedModalGate) {
        self.dialog = Some(dialog);
        gate.set_blocking(true);
    }

    fn close(&mut self, gate: &SharedModalGate) {
        self.dialog = None;
        gate.set_blocking(false);
    }

    /// React to everything the engine queued since the last call.
    pub fn apply_effects(&mut self, engine: &mut Engine, gate: &SharedModalGate) {
        for effect in engine.take_effects() {
            match effect {
                EngineEffect::Launched { name, .. } => {
                    self.set_status(NotificationLevel::Info, format!("running {name}"));
                }
                EngineEffect::AppClosed { name } => {
                    self.set_status(NotificationLevel::Info, format!("{name} exited"));
                }
                EngineEffect::RequestEdit(index) => {
                    if let Some(item) = engine.store().get(index) {
                        let buffer = item.name.clone();
                        self.open(Dialog::Rename { index, buffer }, gate);
                    }
                }
                EngineEffect::RequestDelete(index) => {
                    if let Some(item) = engine.store().get(index) {
                        let name = item.name.clone();
                        self.open(Dialog::ConfirmDelete { index, name }, gate);
                    }
                }
                EngineEffect::ForwardToModal(command) => match command {
                    Command::Confirm => self.submit(engine, gate),
                    Command::Back => self.close(gate),
                    _ => {}
                },
                EngineEffect::MenuAction(MenuEntry::Close) | EngineEffect::ExitRequested => {
                    self.quit = true;
                }
                EngineEffect::MenuAction(entry) => {
                    self.set_status(
                        NotificationLevel::Warning,
                        format!("{} requested; run it from the host system", entry.label()),
                    );
                }
                EngineEffect::ReorderExited(exit) => {
                    self.set_status(NotificationLevel::Info, format!("reorder: {exit:?}"));
                }
                EngineEffect::Notify(notification) => {
                    self.set_status(notification.level, notification.message);
                }
                EngineEffect::SlotsChanged
                | EngineEffect::HighlightsChanged
                | EngineEffect::ReorderEntered(_)
                | EngineEffect::SearchChanged
                | EngineEffect::ArtworkReady(_) => {}
            }
        }
    }

    /// Keyboard input while a dialog is open. Returns false when no dialog
    /// consumed the key.
    pub fn dialog_key(&mut self, code: KeyCode, engine: &mut Engine, gate: &SharedModalGate) -> bool {
        let Some(dialog) = self.dialog.as_mut() else {
            return false;
        };
        match (dialog, code) {
            (_, KeyCode::Esc) | (Dialog::ConfirmDelete { .. }, KeyCode::Char('n' | 'N')) => {
                self.close(gate);
            }
            (_, KeyCode::Enter) | (Dialog::ConfirmDelete { .. }, KeyCode::Char('y' | 'Y')) => {
                self.submit(engine, gate);
            }
            (Dialog::Rename { buffer, .. }, KeyCode::Char(c)) => buffer.push(c),
            (Dialog::Rename { buffer, .. }, KeyCode::Backspace) => {
                buffer.pop();
            }
            _ => {}
        }
        true
    }

    fn submit(&mut self, engine: &mut Engine, gate: &SharedModalGate) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        gate.set_blocking(false);
        let result = match dialog {
            Dialog::ConfirmDelete { index, .. } => engine.remove_item(index).map(|removed| {
                format!("removed {}", removed.name)
            }),
            Dialog::Rename { index, buffer } => {
                let Some(current) = engine.store().get(index) else {
                    return;
                };
                let renamed = Item {
                    name: buffer.trim().to_string(),
                    ..current.clone()
                };
                engine
                    .replace_item(index, renamed)
                    .map(|previous| format!("renamed {}", previous.name))
            }
        };
        match result {
            Ok(message) => self.set_status(NotificationLevel::Info, message),
            Err(e) => self.set_status(NotificationLevel::Error, e.to_string()),
        }
    }
}

// ──────────────────── frame layout ────────────────────

fn cell(name: &str, width: usize) -> String {
    let mut label: String = name.chars().take(width).collect();
    let len = label.chars().count();
    label.extend(std::iter::repeat_n(' ', width - len));
    label
}

/// Text lines for one frame, independent of the terminal.
#[must_use]
pub fn render_lines(engine: &Engine, view: &SessionView, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let store = engine.store();
    let status = engine.reorder_status();
    let mode = if !engine.inputs_enabled() {
        "RUNNING"
    } else if engine.search().is_open() {
        "SEARCH"
    } else if engine.menu().is_open() {
        "MENU"
    } else if status.phase == ReorderPhaseKind::Active {
        "REORDER"
    } else {
        "BROWSE"
    };
    lines.push(format!(
        " tvdeck v{}  [{mode}]  {} items",
        env!("CARGO_PKG_VERSION"),
        store.len()
    ));
    lines.push(String::new());

    if store.is_empty() {
        lines.push("  (library is empty; add items with `tvdeck add`)".to_string());
    } else {
        let slots = engine.slots();
        let cell_width = (width / slots.len().max(1)).clamp(4, 14) - 2;
        let highlights = engine.highlights();
        let badges = engine.position_badges();
        let mut row = String::new();
        let mut marks = String::new();
        for slot in slots {
            let name = store.get(slot.bound_index).map_or("", |i| i.name.as_str());
            let (open, close) = if slot.focused { ('[', ']') } else { (' ', ' ') };
            row.push(open);
            row.push_str(&cell(name, cell_width));
            row.push(close);

            let mark = if highlights.target.contains(&slot.id) {
                "^".to_string()
            } else if highlights.selected.contains(&slot.id) {
                "*".to_string()
            } else if let Some((_, position)) = badges.iter().find(|(id, _)| *id == slot.id) {
                position.to_string()
            } else if engine.artwork_for(slot.bound_index).is_some() {
                "~".to_string()
            } else {
                String::new()
            };
            marks.push(' ');
            marks.push_str(&cell(&mark, cell_width));
            marks.push(' ');
        }
        lines.push(row);
        lines.push(marks);
    }
    lines.push(String::new());

    if engine.menu().is_open() {
        let entries: Vec<String> = MenuEntry::ALL
            .iter()
            .map(|entry| {
                if engine.menu().selected() == Some(*entry) {
                    format!("[{}]", entry.label())
                } else {
                    format!(" {} ", entry.label())
                }
            })
            .collect();
        lines.push(format!(" menu: {}", entries.join(" ")));
    }

    let search = engine.search();
    if search.is_open() {
        let cursor = if search.mode() == SearchMode::Typing { "_" } else { "" };
        lines.push(format!(" search: {}{cursor}", search.query()));
        let selected = search.selected().map(|hit| hit.index);
        for hit in search.results().iter().take(8) {
            let marker = if search.mode() == SearchMode::Navigating && selected == Some(hit.index) {
                '>'
            } else {
                ' '
            };
            lines.push(format!("  {marker} {}", hit.name));
        }
    }

    match view.dialog() {
        Some(Dialog::ConfirmDelete { name, .. }) => {
            lines.push(format!(" remove {name}? [y/n]"));
        }
        Some(Dialog::Rename { buffer, .. }) => {
            lines.push(format!(" rename to: {buffer}_  (Enter to save, Esc to cancel)"));
        }
        None => {}
    }
    lines
}

// ──────────────────── main loop ────────────────────

/// Run the session until the user quits (Ctrl-C, Ctrl-Q, Back in browse or
/// the menu's Close entry).
pub fn run(engine: &mut Engine, gate: &SharedModalGate) -> io::Result<()> {
    let mut stdout = io::stdout();
    let enhanced = engine.config().input.keyboard_release_events;

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = run_inner(&mut stdout, engine, gate);

    if enhanced {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    let _ = execute!(stdout, Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run_inner(stdout: &mut io::Stdout, engine: &mut Engine, gate: &SharedModalGate) -> io::Result<()> {
    let mut view = SessionView::new();
    let tick = engine.config().input.poll_interval().max(Duration::from_millis(1));
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        let wait = tick.saturating_sub(last_tick.elapsed());
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if is_quit(&key) => return Ok(()),
                Event::Key(key) => {
                    let consumed = key.kind == KeyEventKind::Press
                        && view.dialog_key(key.code, engine, gate);
                    if !consumed
                        && view.dialog().is_none()
                        && let Some(mapped) = map_key(&key)
                    {
                        engine.on_key_event(mapped);
                    }
                    dirty = true;
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            let report = engine.on_poll_tick();
            if report.timers_fired + report.commands + report.artwork > 0 || engine.is_animating() {
                dirty = true;
            }
        }

        view.apply_effects(engine, gate);
        if view.should_quit() {
            return Ok(());
        }
        if dirty {
            render_frame(stdout, engine, &view)?;
            dirty = false;
        }
    }
}

fn render_frame(stdout: &mut io::Stdout, engine: &Engine, view: &SessionView) -> io::Result<()> {
    let (cols, _rows) = terminal::size()?;
    let width = usize::from(cols);

    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    let lines = render_lines(engine, view, width);
    let mut row = 0u16;
    for (i, line) in lines.iter().enumerate() {
        queue!(stdout, MoveTo(0, row))?;
        if i == 0 {
            queue!(stdout, SetForegroundColor(Color::Cyan), SetAttribute(Attribute::Bold))?;
            write!(stdout, "{line}")?;
            queue!(stdout, SetAttribute(Attribute::Reset))?;
        } else {
            write!(stdout, "{line}")?;
        }
        row = row.saturating_add(1);
    }

    if let Some((level, message)) = &view.status {
        let color = match level {
            NotificationLevel::Info => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        };
        queue!(stdout, MoveTo(0, row.saturating_add(1)), SetForegroundColor(color))?;
        write!(stdout, " {message}")?;
        queue!(stdout, SetAttribute(Attribute::Reset))?;
    }

    let footer = " arrows move  Enter launch  r reorder  f search  e edit  Del remove  Ctrl-Q quit ";
    queue!(stdout, MoveTo(0, row.saturating_add(3)), SetForegroundColor(Color::DarkGrey))?;
    write!(stdout, "{footer}")?;
    queue!(stdout, SetAttribute(Attribute::Reset))?;

    stdout.flush()
}

// ──────────────────── tests ────────────────────
