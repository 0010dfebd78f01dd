//! Reorder mode: `Inactive → PendingActivation → Active → Inactive`.
//!
//! Entry comes from a matured long press or the dedicated toggle; both honor
//! the same preconditions ([`ActivationGate`]). While `Active`, navigation
//! moves the target index. Short lists (at most `linear_max_items`) move
//! linearly without wrapping and only refresh highlights. Longer lists wrap
//! and scroll the carousel along with the target, refreshing highlights once
//! the slide has settled. Confirm moves the selected item to the target and
//! cancel restores the original focus. Both arm the exit cooldown.
//!
//! Refused transitions return a refusal value and log at debug level. They
//! are never errors.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;

use crate::carousel::Direction;
use crate::core::config::ReorderConfig;
use crate::engine::state::EngineState;
use crate::engine::timers::{Scheduler, TimerHandle, TimerTask};
use crate::store::ItemStore;

/// Timing and movement policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPolicy {
    pub long_press: Duration,
    pub linear_max_items: usize,
    pub highlight_delay: Duration,
    pub confirm_cooldown: Duration,
    pub cancel_cooldown: Duration,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(800),
            linear_max_items: 5,
            highlight_delay: Duration::from_millis(260),
            confirm_cooldown: Duration::from_millis(1_000),
            cancel_cooldown: Duration::from_millis(500),
        }
    }
}

impl From<&ReorderConfig> for ReorderPolicy {
    fn from(config: &ReorderConfig) -> Self {
        Self {
            long_press: config.long_press(),
            linear_max_items: config.linear_max_items,
            highlight_delay: config.highlight_delay(),
            confirm_cooldown: config.confirm_cooldown(),
            cancel_cooldown: config.cancel_cooldown(),
        }
    }
}

/// Transient move-in-progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderSession {
    /// Item being moved. Fixed for the session.
    pub selected_index: usize,
    /// Where it will land.
    pub target_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderPhase {
    Inactive,
    PendingActivation {
        timer: TimerHandle,
        focus_at_arm: usize,
    },
    Active(ReorderSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderPhaseKind {
    Inactive,
    Pending,
    Active,
}

/// Snapshot for external observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderStatus {
    pub phase: ReorderPhaseKind,
    pub selected: Option<usize>,
    pub target: Option<usize>,
}

/// Facts the preconditions are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationGate {
    pub item_count: usize,
    /// A dialog or overlay owns input.
    pub blocking_surface: bool,
    pub in_menu: bool,
    pub exit_cooldown: bool,
}

/// Why an activation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    EmptyStore,
    BlockingSurface,
    InMenu,
    ExitCooldown,
    WrongPhase,
    FocusMoved,
    Animating,
    AtBoundary,
}

impl ActivationGate {
    /// First failing precondition, if any.
    #[must_use]
    pub const fn refusal(&self) -> Option<Refusal> {
        if self.item_count == 0 {
            Some(Refusal::EmptyStore)
        } else if self.blocking_surface {
            Some(Refusal::BlockingSurface)
        } else if self.in_menu {
            Some(Refusal::InMenu)
        } else if self.exit_cooldown {
            Some(Refusal::ExitCooldown)
        } else {
            None
        }
    }
}

/// Everything a transition may touch.
pub struct ReorderContext<'a> {
    pub store: &'a mut ItemStore,
    pub state: &'a mut EngineState,
    pub scheduler: &'a mut Scheduler,
    pub now: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Short list: target moved, highlights can refresh now.
    Highlighted { target: usize },
    /// Long list: the carousel slides with the target; highlights refresh
    /// when the scheduled timer fires.
    Scrolled {
        target: usize,
        direction: Direction,
        highlight_timer: TimerHandle,
    },
    Refused(Refusal),
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderExit {
    /// Item moved from `from` to `to`; the store changed.
    Committed { from: usize, to: usize },
    /// Confirmed at its own position; the store is untouched.
    Unchanged { index: usize },
    /// Aborted; focus restored to `restored`.
    Cancelled { restored: usize },
}

impl ReorderExit {
    #[must_use]
    pub const fn changed_store(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Activated(ReorderSession),
    Exited(ReorderExit),
    Refused(Refusal),
}

#[derive(Debug, Clone)]
pub struct ReorderStateMachine {
    policy: ReorderPolicy,
    phase: ReorderPhase,
    highlight_timer: Option<TimerHandle>,
}

impl ReorderStateMachine {
    #[must_use]
    pub const fn new(policy: ReorderPolicy) -> Self {
        Self {
            policy,
            phase: ReorderPhase::Inactive,
            highlight_timer: None,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &ReorderPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn phase(&self) -> ReorderPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, ReorderPhase::Active(_))
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.phase, ReorderPhase::PendingActivation { .. })
    }

    /// Pending or active.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        !matches!(self.phase, ReorderPhase::Inactive)
    }

    #[must_use]
    pub const fn session(&self) -> Option<ReorderSession> {
        match self.phase {
            ReorderPhase::Active(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> ReorderStatus {
        match self.phase {
            ReorderPhase::Inactive => ReorderStatus {
                phase: ReorderPhaseKind::Inactive,
                selected: None,
                target: None,
            },
            ReorderPhase::PendingActivation { .. } => ReorderStatus {
                phase: ReorderPhaseKind::Pending,
                selected: None,
                target: None,
            },
            ReorderPhase::Active(session) => ReorderStatus {
                phase: ReorderPhaseKind::Active,
                selected: Some(session.selected_index),
                target: Some(session.target_index),
            },
        }
    }

    /// Whether `handle` is the highlight refresh currently owed.
    pub fn take_highlight(&mut self, handle: TimerHandle) -> bool {
        if self.highlight_timer == Some(handle) && self.is_active() {
            self.highlight_timer = None;
            true
        } else {
            false
        }
    }

    // ──────────────────── entry ────────────────────

    /// Start the long-press timer on the focused item.
    pub fn arm_long_press(&mut self, gate: &ActivationGate, cx: &mut ReorderContext<'_>) -> bool {
        if self.is_engaged() {
            tracing::debug!(phase = ?self.phase, "long press ignored: reorder already engaged");
            return false;
        }
        if let Some(refusal) = gate.refusal() {
            tracing::debug!(?refusal, "long press refused");
            return false;
        }
        let focus_at_arm = cx.state.focus();
        let timer = cx.scheduler.schedule(
            cx.now,
            self.policy.long_press,
            TimerTask::LongPress { focus_at_arm },
        );
        self.phase = ReorderPhase::PendingActivation {
            timer,
            focus_at_arm,
        };
        true
    }

    /// Drop a pending long press without side effects. Returns true if one
    /// was pending.
    pub fn release_long_press(&mut self, scheduler: &mut Scheduler) -> bool {
        if let ReorderPhase::PendingActivation { timer, .. } = self.phase {
            scheduler.cancel(timer);
            self.phase = ReorderPhase::Inactive;
            true
        } else {
            false
        }
    }

    /// The long-press timer fired. Activates if it is the current timer,
    /// preconditions still hold, and the focus has not moved since arming.
    pub fn long_press_matured(
        &mut self,
        handle: TimerHandle,
        focus_at_arm: usize,
        gate: &ActivationGate,
        cx: &ReorderContext<'_>,
    ) -> Result<ReorderSession, Refusal> {
        match self.phase {
            ReorderPhase::PendingActivation { timer, .. } if timer == handle => {}
            _ => return Err(Refusal::WrongPhase),
        }
        self.phase = ReorderPhase::Inactive;
        if let Some(refusal) = gate.refusal() {
            tracing::debug!(?refusal, "long press matured but activation refused");
            return Err(refusal);
        }
        if cx.state.focus() != focus_at_arm {
            tracing::debug!(focus_at_arm, focus = cx.state.focus(), "long press target scrolled away");
            return Err(Refusal::FocusMoved);
        }
        Ok(self.activate(focus_at_arm))
    }

    /// Dedicated toggle: activate at once when idle, cancel when active.
    pub fn toggle(&mut self, gate: &ActivationGate, cx: &mut ReorderContext<'_>) -> ToggleOutcome {
        match self.phase {
            ReorderPhase::Active(_) => match self.cancel(cx) {
                Some(exit) => ToggleOutcome::Exited(exit),
                None => ToggleOutcome::Refused(Refusal::WrongPhase),
            },
            ReorderPhase::PendingActivation { .. } | ReorderPhase::Inactive => {
                if let Some(refusal) = gate.refusal() {
                    tracing::debug!(?refusal, "reorder toggle refused");
                    return ToggleOutcome::Refused(refusal);
                }
                self.release_long_press(cx.scheduler);
                ToggleOutcome::Activated(self.activate(cx.state.focus()))
            }
        }
    }

    fn activate(&mut self, focus: usize) -> ReorderSession {
        let session = ReorderSession {
            selected_index: focus,
            target_index: focus,
        };
        self.phase = ReorderPhase::Active(session);
        tracing::info!(index = focus, "reorder mode entered");
        session
    }

    // ──────────────────── active ────────────────────

    /// Move the target one step.
    pub fn move_target(&mut self, direction: Direction, cx: &mut ReorderContext<'_>) -> MoveOutcome {
        let ReorderPhase::Active(mut session) = self.phase else {
            return MoveOutcome::Refused(Refusal::WrongPhase);
        };
        let len = cx.store.len();
        if len == 0 {
            return MoveOutcome::Refused(Refusal::EmptyStore);
        }

        if len <= self.policy.linear_max_items {
            let next = match direction {
                Direction::Left => session.target_index.checked_sub(1),
                Direction::Right => Some(session.target_index + 1).filter(|&t| t < len),
            };
            let Some(target) = next else {
                return MoveOutcome::Refused(Refusal::AtBoundary);
            };
            session.target_index = target;
            self.phase = ReorderPhase::Active(session);
            return MoveOutcome::Highlighted { target };
        }

        // The carousel follows the target, so the focus must start there.
        if cx.state.is_animating() {
            tracing::debug!(?direction, "reorder move dropped while animating");
            return MoveOutcome::Refused(Refusal::Animating);
        }
        cx.state.set_focus(session.target_index, len);
        if !cx.state.begin_slide(direction, len, cx.scheduler, cx.now) {
            return MoveOutcome::Refused(Refusal::Animating);
        }
        session.target_index = cx.state.focus();
        self.phase = ReorderPhase::Active(session);

        if let Some(previous) = self.highlight_timer.take() {
            cx.scheduler.cancel(previous);
        }
        let highlight_timer = cx.scheduler.schedule(
            cx.now,
            self.policy.highlight_delay,
            TimerTask::ReorderHighlight {
                target_index: session.target_index,
            },
        );
        self.highlight_timer = Some(highlight_timer);
        MoveOutcome::Scrolled {
            target: session.target_index,
            direction,
            highlight_timer,
        }
    }

    /// Commit the move. The exit cooldown is armed before the store changes.
    pub fn confirm(&mut self, cx: &mut ReorderContext<'_>) -> Option<ReorderExit> {
        let ReorderPhase::Active(session) = self.phase else {
            return None;
        };
        cx.state
            .arm_exit_cooldown(cx.scheduler, cx.now, self.policy.confirm_cooldown);
        self.end_session(cx.scheduler);

        let ReorderSession {
            selected_index: from,
            target_index: to,
        } = session;
        let len = cx.store.len();
        let exit = if from == to {
            ReorderExit::Unchanged { index: from }
        } else {
            match cx.store.move_item(from, to) {
                Ok(()) => {
                    cx.state.set_focus(to, len);
                    ReorderExit::Committed { from, to }
                }
                Err(error) => {
                    tracing::warn!(%error, from, to, "reorder commit rejected by store");
                    ReorderExit::Unchanged { index: from }
                }
            }
        };
        cx.state.rebuild(cx.store.len());
        tracing::info!(?exit, "reorder mode confirmed");
        Some(exit)
    }

    /// Abort the session and restore the original focus.
    pub fn cancel(&mut self, cx: &mut ReorderContext<'_>) -> Option<ReorderExit> {
        let ReorderPhase::Active(session) = self.phase else {
            return None;
        };
        self.end_session(cx.scheduler);
        let len = cx.store.len();
        cx.state.set_focus(session.selected_index, len);
        cx.state.rebuild(len);
        cx.state
            .arm_exit_cooldown(cx.scheduler, cx.now, self.policy.cancel_cooldown);
        tracing::info!(restored = session.selected_index, "reorder mode cancelled");
        Some(ReorderExit::Cancelled {
            restored: session.selected_index,
        })
    }

    fn end_session(&mut self, scheduler: &mut Scheduler) {
        if let Some(timer) = self.highlight_timer.take() {
            scheduler.cancel(timer);
        }
        self.phase = ReorderPhase::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::Easing;
    use crate::store::Item;

    struct Rig {
        store: ItemStore,
        state: EngineState,
        scheduler: Scheduler,
        now: Duration,
        machine: ReorderStateMachine,
    }

    impl Rig {
        fn new(names: &[&str]) -> Self {
            let items = names
                .iter()
                .map(|n| Item::new(*n, format!("/apps/{n}")).expect("valid"))
                .collect();
            let store = ItemStore::from_items(items).expect("store");
            let mut state = EngineState::new(9, Duration::from_millis(250), Easing::OutCubic);
            state.rebuild(store.len());
            Self {
                store,
                state,
                scheduler: Scheduler::new(),
                now: Duration::ZERO,
                machine: ReorderStateMachine::new(ReorderPolicy::default()),
            }
        }

        fn gate(&self) -> ActivationGate {
            ActivationGate {
                item_count: self.store.len(),
                exit_cooldown: self.state.is_exit_cooldown(),
                ..ActivationGate::default()
            }
        }

        fn with<R>(&mut self, f: impl FnOnce(&mut ReorderStateMachine, &mut ReorderContext<'_>) -> R) -> R {
            let mut cx = ReorderContext {
                store: &mut self.store,
                state: &mut self.state,
                scheduler: &mut self.scheduler,
                now: self.now,
            };
            f(&mut self.machine, &mut cx)
        }

        fn toggle(&mut self) -> ToggleOutcome {
            let gate = self.gate();
            self.with(|m, cx| m.toggle(&gate, cx))
        }

        fn step(&mut self, direction: Direction) -> MoveOutcome {
            self.with(|m, cx| m.move_target(direction, cx))
        }

        /// Advance time and complete any due slide.
        fn settle(&mut self, ms: u64) {
            self.now += Duration::from_millis(ms);
            for (handle, task) in self.scheduler.pop_due(self.now) {
                match task {
                    TimerTask::TransitionComplete { .. } => {
                        self.state.finish_slide(handle, self.store.len());
                    }
                    TimerTask::ExitCooldownEnd => {
                        self.state.exit_cooldown_elapsed(handle);
                    }
                    _ => {}
                }
            }
        }

        fn names(&self) -> Vec<String> {
            self.store.iter().map(|i| i.name.clone()).collect()
        }
    }

    #[test]
    fn policy_follows_config() {
        let mut config = ReorderConfig::default();
        config.long_press_ms = 650;
        config.linear_max_items = 3;
        let policy = ReorderPolicy::from(&config);
        assert_eq!(policy.long_press, Duration::from_millis(650));
        assert_eq!(policy.linear_max_items, 3);
        assert_eq!(ReorderPolicy::from(&ReorderConfig::default()), ReorderPolicy::default());
    }

    #[test]
    fn toggle_activates_on_focus() {
        let mut rig = Rig::new(&["A", "B", "C"]);
        rig.state.set_focus(2, 3);
        let outcome = rig.toggle();
        assert_eq!(
            outcome,
            ToggleOutcome::Activated(ReorderSession {
                selected_index: 2,
                target_index: 2
            })
        );
        assert_eq!(rig.machine.status().phase, ReorderPhaseKind::Active);
    }

    #[test]
    fn empty_store_refuses_activation() {
        let mut rig = Rig::new(&[]);
        assert_eq!(rig.toggle(), ToggleOutcome::Refused(Refusal::EmptyStore));
        let gate = rig.gate();
        assert!(!rig.with(|m, cx| m.arm_long_press(&gate, cx)));
    }

    #[test]
    fn menu_and_blocking_surface_refuse() {
        let gate = ActivationGate {
            item_count: 3,
            in_menu: true,
            ..ActivationGate::default()
        };
        assert_eq!(gate.refusal(), Some(Refusal::InMenu));
        let gate = ActivationGate {
            item_count: 3,
            blocking_surface: true,
            in_menu: true,
            ..ActivationGate::default()
        };
        assert_eq!(gate.refusal(), Some(Refusal::BlockingSurface));
    }

    #[test]
    fn long_press_matures_into_active() {
        let mut rig = Rig::new(&["A", "B", "C"]);
        rig.state.set_focus(1, 3);
        let gate = rig.gate();
        assert!(rig.with(|m, cx| m.arm_long_press(&gate, cx)));
        assert!(rig.machine.is_pending());

        rig.now += Duration::from_millis(800);
        let fired = rig.scheduler.pop_due(rig.now);
        let (handle, task) = fired[0].clone();
        let TimerTask::LongPress { focus_at_arm } = task else {
            panic!("unexpected task {task:?}");
        };
        let gate = rig.gate();
        let session = rig
            .with(|m, cx| m.long_press_matured(handle, focus_at_arm, &gate, cx))
            .expect("activation");
        assert_eq!(session.selected_index, 1);
    }

    #[test]
    fn released_long_press_never_activates() {
        let mut rig = Rig::new(&["A", "B"]);
        let gate = rig.gate();
        rig.with(|m, cx| m.arm_long_press(&gate, cx));
        assert!(rig.machine.release_long_press(&mut rig.scheduler));
        assert!(rig.scheduler.is_empty());
        assert_eq!(rig.machine.phase(), ReorderPhase::Inactive);
    }

    #[test]
    fn long_press_refused_when_focus_moved() {
        let mut rig = Rig::new(&["A", "B", "C"]);
        let gate = rig.gate();
        rig.with(|m, cx| m.arm_long_press(&gate, cx));
        rig.state.set_focus(2, 3);
        rig.now += Duration::from_millis(800);
        let (handle, _) = rig.scheduler.pop_due(rig.now)[0].clone();
        let result = rig.with(|m, cx| m.long_press_matured(handle, 0, &gate, cx));
        assert_eq!(result, Err(Refusal::FocusMoved));
        assert!(!rig.machine.is_engaged());
    }

    #[test]
    fn small_list_moves_linearly() {
        let mut rig = Rig::new(&["A", "B", "C"]);
        rig.toggle();
        assert_eq!(
            rig.step(Direction::Left),
            MoveOutcome::Refused(Refusal::AtBoundary)
        );
        assert_eq!(rig.step(Direction::Right), MoveOutcome::Highlighted { target: 1 });
        assert_eq!(rig.step(Direction::Right), MoveOutcome::Highlighted { target: 2 });
        assert_eq!(
            rig.step(Direction::Right),
            MoveOutcome::Refused(Refusal::AtBoundary)
        );
        assert_eq!(rig.state.focus(), 0, "short lists never scroll");
        assert!(!rig.state.is_animating());
    }

    #[test]
    fn long_list_wraps_and_scrolls() {
        let mut rig = Rig::new(&["A", "B", "C", "D", "E", "F"]);
        rig.toggle();
        let outcome = rig.step(Direction::Left);
        assert!(matches!(outcome, MoveOutcome::Scrolled { target: 5, .. }));
        assert_eq!(rig.state.focus(), 5);
        assert!(rig.state.is_animating());

        // Dropped while the slide runs.
        assert_eq!(
            rig.step(Direction::Left),
            MoveOutcome::Refused(Refusal::Animating)
        );
        rig.settle(250);
        assert!(rig.state.slots().matches_window(5, 6));
        assert!(matches!(rig.step(Direction::Left), MoveOutcome::Scrolled { target: 4, .. }));
    }

    #[test]
    fn confirm_moves_item_and_arms_long_cooldown() {
        let mut rig = Rig::new(&["A", "B", "C", "D", "E"]);
        rig.state.set_focus(1, 5);
        rig.toggle();
        rig.step(Direction::Right);
        rig.step(Direction::Right);
        let exit = rig.with(|m, cx| m.confirm(cx));
        assert_eq!(exit, Some(ReorderExit::Committed { from: 1, to: 3 }));
        assert_eq!(rig.names(), ["A", "C", "D", "B", "E"]);
        assert_eq!(rig.state.focus(), 3);
        assert!(rig.state.slots().matches_window(3, 5));

        assert!(rig.state.is_exit_cooldown());
        rig.settle(999);
        assert_eq!(rig.toggle(), ToggleOutcome::Refused(Refusal::ExitCooldown));
        rig.settle(1);
        assert!(matches!(rig.toggle(), ToggleOutcome::Activated(_)));
    }

    #[test]
    fn confirm_in_place_leaves_store() {
        let mut rig = Rig::new(&["A", "B"]);
        rig.toggle();
        let exit = rig.with(|m, cx| m.confirm(cx));
        assert_eq!(exit, Some(ReorderExit::Unchanged { index: 0 }));
        assert_eq!(rig.names(), ["A", "B"]);
        assert!(!exit.expect("exit").changed_store());
    }

    #[test]
    fn cancel_restores_focus_and_arms_short_cooldown() {
        let mut rig = Rig::new(&["A", "B", "C", "D", "E", "F", "G"]);
        rig.state.set_focus(2, 7);
        rig.toggle();
        rig.step(Direction::Right);
        rig.settle(250);
        rig.step(Direction::Right);

        let exit = rig.toggle();
        assert_eq!(exit, ToggleOutcome::Exited(ReorderExit::Cancelled { restored: 2 }));
        assert_eq!(rig.state.focus(), 2);
        assert_eq!(rig.names(), ["A", "B", "C", "D", "E", "F", "G"]);

        rig.settle(250);
        assert!(rig.state.slots().matches_window(2, 7), "late slide must not skew the window");
        rig.settle(249);
        assert!(rig.state.is_exit_cooldown());
        rig.settle(1);
        assert!(!rig.state.is_exit_cooldown());
    }

    #[test]
    fn highlight_timer_is_cancelled_on_exit() {
        let mut rig = Rig::new(&["A", "B", "C", "D", "E", "F"]);
        rig.toggle();
        let MoveOutcome::Scrolled { highlight_timer, .. } = rig.step(Direction::Right) else {
            panic!("expected scroll");
        };
        rig.with(|m, cx| m.cancel(cx));
        assert!(!rig.scheduler.is_pending(highlight_timer));
        assert!(!rig.machine.take_highlight(highlight_timer));
    }
}
