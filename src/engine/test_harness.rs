//! Headless engine harness for scripted interaction tests.
//!
//! Drives [`Engine`] with a manual clock, a scripted controller, a scripted
//! launcher and a toggleable modal gate. Every step captures a snapshot, so
//! a test can replay a keyflow and assert on the trail without a terminal or
//! real timing.
//!
//! ```rust,ignore
//! let mut h = EngineHarness::new(&["A", "B", "C"]);
//! h.run_script(&[HarnessStep::Key(Key::Right), HarnessStep::Advance(250)]);
//! assert_eq!(h.focus(), 1);
//! ```

#![allow(dead_code)]

use super::effects::{EngineEffect, Outcome};
use super::runtime::{Collaborators, Engine};
use crate::core::clock::ManualClock;
use crate::core::config::Config;
use crate::input::{Command, ControllerSample, Key, KeyEvent, ScriptedController};
use crate::platform::{ScriptedLauncher, SharedModalGate};
use crate::reorder::{ReorderPhaseKind, ReorderStatus};
use crate::store::{Item, ItemStore};

/// State captured after one step.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub focus: usize,
    pub reorder: ReorderStatus,
    pub animating: bool,
    pub inputs_enabled: bool,
    /// Item names bound to the window, left to right.
    pub window: Vec<String>,
    pub outcome: Option<Outcome>,
    pub effects: Vec<EngineEffect>,
}

/// Scriptable input step.
#[derive(Debug, Clone)]
pub enum HarnessStep {
    /// Poll tick without moving time.
    Tick,
    /// Move time forward in poll-interval ticks, then tick once more.
    Advance(u64),
    Key(Key),
    Repeat(Key),
    Release(Key),
    Command(Command),
    Pad(ControllerSample),
    Modal(bool),
    /// Every launched application exits.
    ExitApps,
}

pub struct EngineHarness {
    engine: Engine,
    clock: ManualClock,
    launcher: ScriptedLauncher,
    modal: SharedModalGate,
    pad: ScriptedController,
    frames: Vec<Snapshot>,
}

impl EngineHarness {
    pub fn new(names: &[&str]) -> Self {
        Self::with_config(names, Config::default())
    }

    pub fn with_config(names: &[&str], config: Config) -> Self {
        let items = names
            .iter()
            .map(|n| Item::new(*n, format!("/apps/{n}")).expect("valid item"))
            .collect();
        let store = ItemStore::from_items(items).expect("store");
        let clock = ManualClock::new();
        let launcher = ScriptedLauncher::new();
        let modal = SharedModalGate::new();
        let pad = ScriptedController::new();
        let engine = Engine::new(
            config,
            store,
            Collaborators {
                clock: Box::new(clock.clone()),
                launcher: Box::new(launcher.clone()),
                modal: Box::new(modal.clone()),
                controller: Box::new(pad.clone()),
            },
        );
        Self {
            engine,
            clock,
            launcher,
            modal,
            pad,
            frames: Vec::new(),
        }
    }

    // ── injection ──

    pub fn key(&mut self, key: Key) -> &Snapshot {
        let outcome = self.engine.on_key_event(KeyEvent::press(key));
        self.capture(Some(outcome))
    }

    pub fn command(&mut self, command: Command) -> &Snapshot {
        let outcome = self.engine.on_discrete_command(command);
        self.capture(Some(outcome))
    }

    pub fn tick(&mut self) -> &Snapshot {
        self.engine.on_poll_tick();
        self.capture(None)
    }

    /// Advance `ms` in poll-interval steps, ticking after each.
    pub fn advance(&mut self, ms: u64) -> &Snapshot {
        let step = self.engine.config().input.poll_interval_ms.max(1);
        let mut remaining = ms;
        while remaining > 0 {
            let delta = remaining.min(step);
            self.clock.advance_ms(delta);
            self.engine.on_poll_tick();
            remaining -= delta;
        }
        self.tick()
    }

    pub fn run_script(&mut self, steps: &[HarnessStep]) {
        for step in steps {
            match step {
                HarnessStep::Tick => {
                    self.tick();
                }
                HarnessStep::Advance(ms) => {
                    self.advance(*ms);
                }
                HarnessStep::Key(key) => {
                    self.key(*key);
                }
                HarnessStep::Repeat(key) => {
                    let outcome = self.engine.on_key_event(KeyEvent::repeat(*key));
                    self.capture(Some(outcome));
                }
                HarnessStep::Release(key) => {
                    let outcome = self.engine.on_key_event(KeyEvent::release(*key));
                    self.capture(Some(outcome));
                }
                HarnessStep::Command(command) => {
                    self.command(*command);
                }
                HarnessStep::Pad(sample) => {
                    self.pad.push(sample.clone());
                    self.clock.advance_ms(self.engine.config().input.poll_interval_ms);
                    self.tick();
                }
                HarnessStep::Modal(blocking) => self.modal.set_blocking(*blocking),
                HarnessStep::ExitApps => self.launcher.exit_all(),
            }
        }
    }

    // ── queries ──

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn launcher(&self) -> &ScriptedLauncher {
        &self.launcher
    }

    pub fn focus(&self) -> usize {
        self.engine.current_focus_index()
    }

    pub fn phase(&self) -> ReorderPhaseKind {
        self.engine.reorder_status().phase
    }

    pub fn names(&self) -> Vec<String> {
        self.engine.store().iter().map(|i| i.name.clone()).collect()
    }

    pub fn frames(&self) -> &[Snapshot] {
        &self.frames
    }

    pub fn last(&self) -> &Snapshot {
        self.frames.last().expect("no steps recorded")
    }

    /// Every effect seen so far, in order.
    pub fn all_effects(&self) -> Vec<EngineEffect> {
        self.frames.iter().flat_map(|f| f.effects.clone()).collect()
    }

    fn capture(&mut self, outcome: Option<Outcome>) -> &Snapshot {
        let store = self.engine.store();
        let window = self
            .engine
            .slots()
            .iter()
            .map(|s| store.get(s.bound_index).map(|i| i.name.clone()).unwrap_or_default())
            .collect();
        let snapshot = Snapshot {
            focus: self.engine.current_focus_index(),
            reorder: self.engine.reorder_status(),
            animating: self.engine.is_animating(),
            inputs_enabled: self.engine.inputs_enabled(),
            window,
            outcome,
            effects: self.engine.take_effects(),
        };
        self.frames.push(snapshot);
        self.frames.last().expect("just pushed")
    }
}

// ──────────────────── scripted flows ────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::menu::MenuEntry;
    use crate::reorder::ReorderExit;

    const SEVEN: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

    #[test]
    fn window_centers_on_focus_after_slides() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[
            HarnessStep::Key(Key::Right),
            HarnessStep::Advance(250),
            HarnessStep::Key(Key::Right),
            HarnessStep::Advance(250),
        ]);
        assert_eq!(h.focus(), 2);
        assert_eq!(h.last().window, ["F", "G", "A", "B", "C", "D", "E", "F", "G"]);
    }

    #[test]
    fn held_arrow_repeats_are_dropped() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[
            HarnessStep::Key(Key::Left),
            HarnessStep::Repeat(Key::Left),
            HarnessStep::Repeat(Key::Left),
            HarnessStep::Advance(300),
        ]);
        assert_eq!(h.focus(), 6);
        let outcomes: Vec<Option<Outcome>> = h.frames().iter().take(3).map(|f| f.outcome).collect();
        assert_eq!(
            outcomes,
            [Some(Outcome::Applied), Some(Outcome::Dropped), Some(Outcome::Dropped)]
        );
    }

    #[test]
    fn reorder_flow_on_long_list_scrolls_and_commits() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[
            HarnessStep::Key(Key::Char('r')),
            HarnessStep::Key(Key::Left),
            HarnessStep::Advance(300),
            HarnessStep::Key(Key::Left),
            HarnessStep::Advance(300),
        ]);
        assert_eq!(h.engine().reorder_status().target, Some(5));
        assert_eq!(h.focus(), 5);
        assert!(h.all_effects().contains(&EngineEffect::HighlightsChanged));

        h.key(Key::Enter);
        assert_eq!(h.names(), ["B", "C", "D", "E", "F", "A", "G"]);
        assert_eq!(h.focus(), 5);
        assert!(
            h.last()
                .effects
                .contains(&EngineEffect::ReorderExited(ReorderExit::Committed { from: 0, to: 5 }))
        );
        assert!(h.launcher().launched().is_empty());
    }

    #[test]
    fn reorder_refused_after_confirm_until_cooldown() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[HarnessStep::Key(Key::Char('r')), HarnessStep::Key(Key::Enter)]);
        h.key(Key::Char('r'));
        assert_eq!(h.phase(), ReorderPhaseKind::Inactive);
        h.advance(1_000);
        h.key(Key::Char('r'));
        assert_eq!(h.phase(), ReorderPhaseKind::Active);
    }

    #[test]
    fn launch_hands_off_until_app_exits() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[
            HarnessStep::Key(Key::Enter),
            HarnessStep::Key(Key::Right),
            HarnessStep::Pad(ControllerSample::hat(1, 0)),
        ]);
        assert!(!h.last().inputs_enabled);
        assert_eq!(h.focus(), 0);

        h.run_script(&[HarnessStep::ExitApps, HarnessStep::Advance(1_000)]);
        assert!(h.last().inputs_enabled);
        assert!(
            h.all_effects()
                .contains(&EngineEffect::AppClosed { name: "A".into() })
        );
        h.key(Key::Right);
        assert_eq!(h.focus(), 1);
    }

    #[test]
    fn modal_forwarding_then_release() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[HarnessStep::Modal(true), HarnessStep::Key(Key::Right)]);
        assert_eq!(h.last().outcome, Some(Outcome::Forwarded));
        h.run_script(&[HarnessStep::Modal(false), HarnessStep::Key(Key::Right)]);
        assert_eq!(h.last().outcome, Some(Outcome::Applied));
    }

    #[test]
    fn controller_menu_button_enters_and_leaves_menu() {
        let mut h = EngineHarness::new(&SEVEN);
        h.run_script(&[HarnessStep::Pad(ControllerSample::pressed(&[9]))]);
        assert!(h.engine().menu().is_open());
        h.run_script(&[
            HarnessStep::Pad(ControllerSample::hat(1, 0)),
            HarnessStep::Pad(ControllerSample::neutral()),
            HarnessStep::Pad(ControllerSample::pressed(&[0])),
        ]);
        assert!(
            h.all_effects()
                .contains(&EngineEffect::MenuAction(MenuEntry::Shutdown))
        );
        h.advance(300);
        h.run_script(&[HarnessStep::Pad(ControllerSample::pressed(&[9]))]);
        assert!(!h.engine().menu().is_open());
    }
}
