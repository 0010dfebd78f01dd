//! The carousel engine: single owner of all navigation state.
//!
//! Hosts feed it key events, resolved commands and a steady poll tick. All
//! mutation happens on the calling thread. Keyboard and controller input
//! share one queue, and each queued command is routed to exactly one
//! consumer. Timers fire at the start of each tick. Results are published as
//! [`EngineEffect`]s.

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::effects::{EngineEffect, Highlights, Notification, Outcome, TickReport};
use super::menu::SystemMenu;
use super::search::{SearchAction, SearchOverlay};
use super::state::{EngineState, RunningProcess};
use super::timers::{Scheduler, TimerHandle, TimerTask};
use crate::artwork::ArtworkWorker;
use crate::carousel::{Direction, Slot, SlotId};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::Config;
use crate::core::errors::{Result, TvdError};
use crate::input::{
    Command, ControllerDevice, InputDispatcher, InputEvent, KeyContext, KeyEvent, KeyResolution,
    NoController, PollContext, Route, RouteContext, Source, route,
};
use crate::logger::{ActivityEvent, JsonlWriter, LogEntry};
use crate::platform::{ModalGate, NoModal, ProcessHandle, ProcessLauncher, SystemLauncher};
use crate::reorder::{
    ActivationGate, MoveOutcome, ReorderContext, ReorderExit, ReorderPolicy, ReorderStateMachine,
    ReorderStatus, ToggleOutcome,
};
use crate::store::{Item, ItemStore};

/// External collaborators the engine talks to.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub launcher: Box<dyn ProcessLauncher>,
    pub modal: Box<dyn ModalGate>,
    pub controller: Box<dyn ControllerDevice>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock::new()),
            launcher: Box::new(SystemLauncher::new()),
            modal: Box::new(NoModal),
            controller: Box::new(NoController),
        }
    }
}

pub struct Engine {
    config: Config,
    store: ItemStore,
    library_path: Option<PathBuf>,
    state: EngineState,
    scheduler: Scheduler,
    reorder: ReorderStateMachine,
    dispatcher: InputDispatcher,
    menu: SystemMenu,
    search: SearchOverlay,
    clock: Box<dyn Clock>,
    launcher: Box<dyn ProcessLauncher>,
    modal: Box<dyn ModalGate>,
    activity: JsonlWriter,
    artwork: Option<ArtworkWorker>,
    artwork_paths: HashMap<String, PathBuf>,
    artwork_requested: HashSet<String>,
    /// A keyboard confirm press is held in browse and launches on release.
    confirm_held: bool,
    effects: Vec<EngineEffect>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("items", &self.store.len())
            .field("focus", &self.state.focus())
            .field("reorder", &self.reorder.status())
            .field("menu", &self.menu.is_open())
            .field("search", &self.search.is_open())
            .field("inputs_enabled", &self.state.inputs_enabled())
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: Config, store: ItemStore, collaborators: Collaborators) -> Self {
        let mut state = EngineState::new(
            config.carousel.visible_slots,
            config.carousel.transition(),
            config.carousel.easing,
        );
        state.rebuild(store.len());
        let dispatcher = InputDispatcher::new(&config.input, collaborators.controller);
        let reorder = ReorderStateMachine::new(ReorderPolicy::from(&config.reorder));
        Self {
            config,
            store,
            library_path: None,
            state,
            scheduler: Scheduler::new(),
            reorder,
            dispatcher,
            menu: SystemMenu::new(),
            search: SearchOverlay::new(),
            clock: collaborators.clock,
            launcher: collaborators.launcher,
            modal: collaborators.modal,
            activity: JsonlWriter::disabled(),
            artwork: None,
            artwork_paths: HashMap::new(),
            artwork_requested: HashSet::new(),
            confirm_held: false,
            effects: Vec::new(),
        }
    }

    /// Persist the library to `path` after every committed mutation.
    #[must_use]
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Record activity to `writer`. Logs the session start.
    #[must_use]
    pub fn with_activity_log(mut self, writer: JsonlWriter) -> Self {
        self.activity = writer;
        let entry = LogEntry::info(ActivityEvent::SessionStart).details(format!("{} items", self.store.len()));
        self.activity.write_entry(&entry);
        self
    }

    /// Resolve artwork for visible items on `worker`.
    #[must_use]
    pub fn with_artwork(mut self, worker: ArtworkWorker) -> Self {
        self.artwork = Some(worker);
        self.request_visible_artwork();
        self
    }

    /// Stop background work and log the session end.
    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.artwork.take() {
            worker.shutdown();
        }
        self.activity.write_entry(&LogEntry::info(ActivityEvent::SessionStop));
        self.activity.flush();
    }

    // ──────────────────── queries ────────────────────

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &ItemStore {
        &self.store
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub const fn current_focus_index(&self) -> usize {
        self.state.focus()
    }

    #[must_use]
    pub const fn reorder_status(&self) -> ReorderStatus {
        self.reorder.status()
    }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.state.is_animating()
    }

    #[must_use]
    pub const fn inputs_enabled(&self) -> bool {
        self.state.inputs_enabled()
    }

    #[must_use]
    pub const fn is_exit_cooldown(&self) -> bool {
        self.state.is_exit_cooldown()
    }

    #[must_use]
    pub const fn menu(&self) -> &SystemMenu {
        &self.menu
    }

    #[must_use]
    pub const fn search(&self) -> &SearchOverlay {
        &self.search
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        self.state.slots().slots()
    }

    /// Slot ids whose content must be redrawn. Clears the dirty flags.
    pub fn take_dirty_slots(&mut self) -> Vec<SlotId> {
        self.state.slots_mut().take_dirty()
    }

    /// Horizontal slide offset of the window, in slot strides.
    #[must_use]
    pub fn slide_offset(&self) -> f32 {
        self.state.transition().slot_offset(self.clock.now())
    }

    /// 1-based item number per slot while reorder mode is active.
    #[must_use]
    pub fn position_badges(&self) -> Vec<(SlotId, usize)> {
        if self.reorder.is_active() {
            self.state.slots().position_badges()
        } else {
            Vec::new()
        }
    }

    #[must_use]
    pub fn highlights(&self) -> Highlights {
        let Some(session) = self.reorder.session() else {
            return Highlights::default();
        };
        let slots = self.state.slots();
        Highlights {
            selected: slots.slots_bound_to(session.selected_index),
            target: slots.slots_bound_to(session.target_index),
        }
    }

    #[must_use]
    pub fn artwork_for(&self, index: usize) -> Option<&Path> {
        let item = self.store.get(index)?;
        self.artwork_paths.get(&item.name).map(PathBuf::as_path)
    }

    /// Earliest pending timer, for hosts that sleep between ticks.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn take_effects(&mut self) -> Vec<EngineEffect> {
        std::mem::take(&mut self.effects)
    }

    // ──────────────────── input entry points ────────────────────

    /// Feed a keyboard event and run a dispatch cycle.
    pub fn on_key_event(&mut self, event: KeyEvent) -> Outcome {
        let context = KeyContext {
            search_open: self.search.is_open(),
        };
        match self.dispatcher.submit_key(event, context) {
            KeyResolution::Command(_) => self.pump().pop().unwrap_or(Outcome::Dropped),
            KeyResolution::DroppedRepeat | KeyResolution::Unmapped => Outcome::Dropped,
        }
    }

    /// Feed one resolved command and run a dispatch cycle.
    pub fn on_discrete_command(&mut self, event: impl Into<InputEvent>) -> Outcome {
        self.dispatcher.submit(event.into());
        self.pump().pop().unwrap_or(Outcome::Dropped)
    }

    /// Fire due timers, sample the controller, dispatch queued commands and
    /// collect finished artwork.
    pub fn on_poll_tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::default();

        for (handle, task) in self.scheduler.pop_due(now) {
            report.timers_fired += 1;
            self.fire(handle, task, now);
        }

        let poll = PollContext {
            inputs_enabled: self.state.inputs_enabled(),
            in_menu: self.menu.is_open(),
            exit_cooldown: self.state.is_exit_cooldown(),
        };
        self.dispatcher.poll_device(now, poll);
        report.commands = self.pump().len();
        report.artwork = self.drain_artwork();
        report
    }

    /// Rebind every slot around the current focus, e.g. after the host
    /// changed the store through another path.
    pub fn request_rebuild(&mut self) {
        self.state.rebuild(self.store.len());
        self.effects.push(EngineEffect::SlotsChanged);
        self.request_visible_artwork();
    }

    // ──────────────────── item management ────────────────────

    /// Append an item, persist and rebuild. Returns its index.
    pub fn add_item(&mut self, item: Item) -> Result<usize> {
        self.ensure_idle()?;
        let index = self.store.push(item)?;
        let name = self.store.get(index).map(|i| i.name.clone()).unwrap_or_default();
        tracing::info!(index, %name, "item added");
        self.log(LogEntry::info(ActivityEvent::ItemAdded).item(name).index(index));
        self.after_store_change();
        self.persist()?;
        Ok(index)
    }

    /// Replace the item at `index`, persist and rebuild. Returns the old
    /// record.
    pub fn replace_item(&mut self, index: usize, item: Item) -> Result<Item> {
        self.ensure_idle()?;
        let name = item.name.clone();
        let previous = self.store.replace(index, item)?;
        self.artwork_paths.remove(&previous.name);
        self.artwork_requested.remove(&previous.name);
        self.artwork_requested.remove(&name);
        tracing::info!(index, old = %previous.name, new = %name, "item edited");
        self.log(LogEntry::info(ActivityEvent::ItemEdited).item(name).index(index));
        self.after_store_change();
        self.persist()?;
        Ok(previous)
    }

    /// Remove the item at `index`, clamp the focus, persist and rebuild.
    pub fn remove_item(&mut self, index: usize) -> Result<Item> {
        self.ensure_idle()?;
        let removed = self.store.remove(index)?;
        self.state.clamp_focus(self.store.len());
        tracing::info!(index, name = %removed.name, "item removed");
        self.log(LogEntry::info(ActivityEvent::ItemRemoved).item(removed.name.clone()).index(index));
        self.after_store_change();
        self.persist()?;
        Ok(removed)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.reorder.is_engaged() {
            return Err(TvdError::ReorderBusy);
        }
        Ok(())
    }

    fn after_store_change(&mut self) {
        if self.search.is_open() {
            self.search.refilter(&self.store);
            self.effects.push(EngineEffect::SearchChanged);
        }
        self.request_rebuild();
    }

    fn persist(&mut self) -> Result<()> {
        let Some(path) = self.library_path.clone() else {
            return Ok(());
        };
        match self.store.persist(&path) {
            Ok(_) => Ok(()),
            Err(error) => {
                tracing::warn!(%error, "library not saved; in-memory changes kept");
                self.log(
                    LogEntry::info(ActivityEvent::PersistFailed)
                        .path(path.display().to_string())
                        .error(&error),
                );
                self.notify(format!("Could not save library: {error}"));
                Err(error)
            }
        }
    }

    // ──────────────────── dispatch ────────────────────

    fn pump(&mut self) -> Vec<Outcome> {
        let events = self.dispatcher.drain();
        events.into_iter().map(|event| self.dispatch(event)).collect()
    }

    fn route_context(&self) -> RouteContext {
        RouteContext {
            inputs_enabled: self.state.inputs_enabled(),
            modal_blocking: self.modal.is_blocking(),
            search_open: self.search.is_open(),
            reorder_active: self.reorder.is_active(),
            in_menu: self.menu.is_open(),
        }
    }

    fn dispatch(&mut self, event: InputEvent) -> Outcome {
        let target = route(self.route_context());
        tracing::trace!(?event, ?target, "dispatch");
        match target {
            Route::Suppressed => Outcome::Suppressed,
            Route::Modal => {
                self.effects.push(EngineEffect::ForwardToModal(event.command));
                Outcome::Forwarded
            }
            Route::Search => self.on_search(event.command),
            Route::Reorder => self.on_reorder(event),
            Route::Menu => self.on_menu(event.command),
            Route::Browse => self.on_browse(event),
        }
    }

    fn activation_gate(&self) -> ActivationGate {
        ActivationGate {
            item_count: self.store.len(),
            blocking_surface: self.modal.is_blocking() || self.search.is_open(),
            in_menu: self.menu.is_open(),
            exit_cooldown: self.state.is_exit_cooldown(),
        }
    }

    fn on_browse(&mut self, event: InputEvent) -> Outcome {
        let now = self.clock.now();
        match event.command {
            Command::Left | Command::Right => {
                let direction = if event.command == Command::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                self.cancel_hold();
                let len = self.store.len();
                if self.state.begin_slide(direction, len, &mut self.scheduler, now) {
                    Outcome::Applied
                } else {
                    Outcome::Ignored
                }
            }
            Command::Down => {
                self.cancel_hold();
                self.menu.open();
                Outcome::Applied
            }
            Command::Confirm if event.source == Source::Keyboard && self.dispatcher.release_events() => {
                self.confirm_held = true;
                let gate = self.activation_gate();
                let mut cx = ReorderContext {
                    store: &mut self.store,
                    state: &mut self.state,
                    scheduler: &mut self.scheduler,
                    now,
                };
                self.reorder.arm_long_press(&gate, &mut cx);
                Outcome::Applied
            }
            Command::Confirm => self.launch_focused(now),
            Command::ConfirmReleased => {
                if std::mem::take(&mut self.confirm_held) {
                    self.launch_focused(now)
                } else {
                    Outcome::Ignored
                }
            }
            Command::Back => {
                self.cancel_hold();
                self.effects.push(EngineEffect::ExitRequested);
                Outcome::Applied
            }
            Command::Edit | Command::Delete => {
                if self.store.is_empty() {
                    return Outcome::Ignored;
                }
                self.cancel_hold();
                let index = self.state.focus();
                self.effects.push(if event.command == Command::Edit {
                    EngineEffect::RequestEdit(index)
                } else {
                    EngineEffect::RequestDelete(index)
                });
                Outcome::Applied
            }
            Command::ToggleReorder => {
                self.confirm_held = false;
                self.toggle_reorder(now)
            }
            Command::ToggleSearch => {
                self.cancel_hold();
                self.search.open(&self.store);
                self.effects.push(EngineEffect::SearchChanged);
                Outcome::Applied
            }
            Command::Up | Command::SwitchSearchMode | Command::Text(_) | Command::Backspace => Outcome::Ignored,
        }
    }

    /// Drop a held confirm and any pending long press.
    fn cancel_hold(&mut self) {
        self.confirm_held = false;
        self.reorder.release_long_press(&mut self.scheduler);
    }

    fn toggle_reorder(&mut self, now: Duration) -> Outcome {
        let gate = self.activation_gate();
        let mut cx = ReorderContext {
            store: &mut self.store,
            state: &mut self.state,
            scheduler: &mut self.scheduler,
            now,
        };
        match self.reorder.toggle(&gate, &mut cx) {
            ToggleOutcome::Activated(session) => {
                self.effects.push(EngineEffect::ReorderEntered(session));
                self.effects.push(EngineEffect::HighlightsChanged);
                Outcome::Applied
            }
            ToggleOutcome::Exited(exit) => {
                self.finish_reorder(exit);
                Outcome::Applied
            }
            ToggleOutcome::Refused(_) => Outcome::Ignored,
        }
    }

    fn on_reorder(&mut self, event: InputEvent) -> Outcome {
        let now = self.clock.now();
        match event.command {
            Command::Left | Command::Right => {
                let direction = if event.command == Command::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                let mut cx = ReorderContext {
                    store: &mut self.store,
                    state: &mut self.state,
                    scheduler: &mut self.scheduler,
                    now,
                };
                match self.reorder.move_target(direction, &mut cx) {
                    MoveOutcome::Highlighted { .. } => {
                        self.effects.push(EngineEffect::HighlightsChanged);
                        Outcome::Applied
                    }
                    MoveOutcome::Scrolled { .. } => Outcome::Applied,
                    MoveOutcome::Refused(_) => Outcome::Ignored,
                }
            }
            Command::Confirm => {
                self.confirm_held = false;
                let mut cx = ReorderContext {
                    store: &mut self.store,
                    state: &mut self.state,
                    scheduler: &mut self.scheduler,
                    now,
                };
                match self.reorder.confirm(&mut cx) {
                    Some(exit) => {
                        self.finish_reorder(exit);
                        Outcome::Applied
                    }
                    None => Outcome::Ignored,
                }
            }
            Command::Back | Command::ToggleReorder => {
                let mut cx = ReorderContext {
                    store: &mut self.store,
                    state: &mut self.state,
                    scheduler: &mut self.scheduler,
                    now,
                };
                match self.reorder.cancel(&mut cx) {
                    Some(exit) => {
                        self.finish_reorder(exit);
                        Outcome::Applied
                    }
                    None => Outcome::Ignored,
                }
            }
            Command::Up
            | Command::Down
            | Command::ConfirmReleased
            | Command::Edit
            | Command::Delete
            | Command::ToggleSearch
            | Command::SwitchSearchMode
            | Command::Text(_)
            | Command::Backspace => Outcome::Ignored,
        }
    }

    fn finish_reorder(&mut self, exit: ReorderExit) {
        match exit {
            ReorderExit::Committed { from, to } => {
                let name = self.store.get(to).map(|i| i.name.clone()).unwrap_or_default();
                self.log(LogEntry::info(ActivityEvent::ReorderCommit).item(name).moved(from, to));
                // A failed save is already reported; the new order stays.
                let _ = self.persist();
            }
            ReorderExit::Unchanged { .. } => {}
            ReorderExit::Cancelled { restored } => {
                self.log(LogEntry::info(ActivityEvent::ReorderCancel).index(restored));
            }
        }
        self.effects.push(EngineEffect::ReorderExited(exit));
        self.effects.push(EngineEffect::HighlightsChanged);
        self.effects.push(EngineEffect::SlotsChanged);
        self.request_visible_artwork();
    }

    fn on_menu(&mut self, command: Command) -> Outcome {
        match command {
            Command::Left => {
                self.menu.step(Direction::Left);
                Outcome::Applied
            }
            Command::Right => {
                self.menu.step(Direction::Right);
                Outcome::Applied
            }
            Command::Confirm => match self.menu.selected() {
                Some(entry) => {
                    tracing::info!(?entry, "menu action");
                    self.log(LogEntry::info(ActivityEvent::MenuAction).details(entry.label()));
                    self.effects.push(EngineEffect::MenuAction(entry));
                    Outcome::Applied
                }
                None => Outcome::Ignored,
            },
            Command::Up | Command::Back => {
                self.menu.close();
                Outcome::Applied
            }
            Command::Down
            | Command::ConfirmReleased
            | Command::Edit
            | Command::Delete
            | Command::ToggleReorder
            | Command::ToggleSearch
            | Command::SwitchSearchMode
            | Command::Text(_)
            | Command::Backspace => Outcome::Ignored,
        }
    }

    fn on_search(&mut self, command: Command) -> Outcome {
        match self.search.handle(command, &self.store) {
            Some(SearchAction::Select(index)) => {
                let len = self.store.len();
                self.state.set_focus(index, len);
                self.effects.push(EngineEffect::SearchChanged);
                self.request_rebuild();
                Outcome::Applied
            }
            Some(SearchAction::Closed | SearchAction::Consumed) => {
                self.effects.push(EngineEffect::SearchChanged);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    // ──────────────────── launching ────────────────────

    fn launch_focused(&mut self, now: Duration) -> Outcome {
        self.cancel_hold();
        let index = self.state.focus();
        let Some(item) = self.store.get(index).cloned() else {
            return Outcome::Ignored;
        };
        self.state.clear_exit_cooldown(&mut self.scheduler);

        match self.launcher.launch(&item.path) {
            Ok(process) => {
                let check_timer = self.scheduler.schedule(
                    now,
                    self.config.launcher.process_check(),
                    TimerTask::ProcessCheck { process },
                );
                self.state.hand_off(RunningProcess {
                    handle: process,
                    name: item.name.clone(),
                    check_timer,
                });
                self.dispatcher.clear();
                tracing::info!(index, name = %item.name, "launched; inputs handed off");
                self.log(
                    LogEntry::info(ActivityEvent::Launch)
                        .item(item.name.clone())
                        .index(index)
                        .path(item.path),
                );
                self.effects.push(EngineEffect::Launched {
                    index,
                    name: item.name,
                });
            }
            Err(error) => {
                tracing::warn!(%error, name = %item.name, "launch failed");
                self.log(
                    LogEntry::info(ActivityEvent::LaunchFailed)
                        .item(item.name.clone())
                        .path(item.path)
                        .error(&error),
                );
                self.notify(format!("Could not launch {}: {error}", item.name));
            }
        }
        Outcome::Applied
    }

    fn check_process(&mut self, handle: TimerHandle, process: ProcessHandle, now: Duration) {
        let Some(running) = self.state.running() else {
            return;
        };
        if running.handle != process || running.check_timer != handle {
            return;
        }
        if self.launcher.is_running(process) {
            let timer = self.scheduler.schedule(
                now,
                self.config.launcher.process_check(),
                TimerTask::ProcessCheck { process },
            );
            self.state.reschedule_check(timer);
            return;
        }
        if let Some(closed) = self.state.reclaim() {
            tracing::info!(name = %closed.name, "application closed; inputs restored");
            self.log(LogEntry::info(ActivityEvent::AppClosed).item(closed.name.clone()));
            self.effects.push(EngineEffect::AppClosed { name: closed.name });
        }
    }

    // ──────────────────── timers ────────────────────

    fn fire(&mut self, handle: TimerHandle, task: TimerTask, now: Duration) {
        match task {
            TimerTask::LongPress { focus_at_arm } => {
                let gate = self.activation_gate();
                let cx = ReorderContext {
                    store: &mut self.store,
                    state: &mut self.state,
                    scheduler: &mut self.scheduler,
                    now,
                };
                match self.reorder.long_press_matured(handle, focus_at_arm, &gate, &cx) {
                    Ok(session) => {
                        self.confirm_held = false;
                        self.effects.push(EngineEffect::ReorderEntered(session));
                        self.effects.push(EngineEffect::HighlightsChanged);
                    }
                    Err(refusal) => tracing::debug!(?refusal, "long press did not activate reorder"),
                }
            }
            TimerTask::TransitionComplete { .. } => {
                if self.state.finish_slide(handle, self.store.len()).is_some() {
                    self.effects.push(EngineEffect::SlotsChanged);
                    self.request_visible_artwork();
                }
            }
            TimerTask::ReorderHighlight { target_index } => {
                if self.reorder.take_highlight(handle) {
                    tracing::trace!(target_index, "reorder highlight refresh");
                    self.effects.push(EngineEffect::HighlightsChanged);
                }
            }
            TimerTask::ExitCooldownEnd => {
                self.state.exit_cooldown_elapsed(handle);
            }
            TimerTask::ProcessCheck { process } => self.check_process(handle, process, now),
        }
    }

    // ──────────────────── artwork ────────────────────

    fn request_visible_artwork(&mut self) {
        let Some(worker) = self.artwork.as_ref() else {
            return;
        };
        let mut indices = self.state.slots().bound_indices();
        indices.sort_unstable();
        indices.dedup();
        for index in indices {
            let Some(item) = self.store.get(index) else {
                continue;
            };
            if self.artwork_requested.contains(&item.name) {
                continue;
            }
            if worker.request(index, item) {
                self.artwork_requested.insert(item.name.clone());
            }
        }
    }

    fn drain_artwork(&mut self) -> usize {
        let Some(worker) = self.artwork.as_ref() else {
            return 0;
        };
        let resolved = worker.drain();
        let count = resolved.len();
        for result in resolved {
            let Some(path) = result.artwork else {
                continue;
            };
            self.artwork_paths.insert(result.name.clone(), path);
            let indices: Vec<usize> = self
                .store
                .iter()
                .enumerate()
                .filter(|(_, item)| item.name == result.name)
                .map(|(index, _)| index)
                .collect();
            let mut slots = Vec::new();
            for index in indices {
                self.state.slots_mut().invalidate_item(index);
                slots.extend(self.state.slots().slots_bound_to(index));
            }
            if !slots.is_empty() {
                self.effects.push(EngineEffect::ArtworkReady(slots));
            }
        }
        count
    }

    // ──────────────────── helpers ────────────────────

    fn log(&mut self, entry: LogEntry) {
        self.activity.write_entry(&entry);
    }

    fn notify(&mut self, message: String) {
        self.effects.push(EngineEffect::Notify(Notification::error(message)));
    }
}
