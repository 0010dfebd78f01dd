//! [`EngineState`]: focus, slot window, animation lock and the global
//! input flags, owned in one place.
//!
//! Input handlers never write these fields. They call the accessors below,
//! which keep the focus inside the store bounds, tie the animation lock to
//! the slide-completion timer, and make cooldown and process timers
//! replaceable without leaking stale handles.

#![allow(missing_docs)]

use std::time::Duration;

use super::timers::{Scheduler, TimerHandle, TimerTask};
use crate::carousel::{Direction, Easing, SlotRecycler, TransitionController};
use crate::platform::ProcessHandle;

/// A launched application while inputs are handed off to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningProcess {
    pub handle: ProcessHandle,
    pub name: String,
    pub check_timer: TimerHandle,
}

#[derive(Debug)]
pub struct EngineState {
    focus: usize,
    slots: SlotRecycler,
    transition: TransitionController,
    slide_timer: Option<TimerHandle>,
    exit_cooldown: Option<TimerHandle>,
    inputs_enabled: bool,
    running: Option<RunningProcess>,
}

impl EngineState {
    #[must_use]
    pub fn new(visible_slots: usize, transition: Duration, easing: Easing) -> Self {
        Self {
            focus: 0,
            slots: SlotRecycler::new(visible_slots),
            transition: TransitionController::new(transition, easing),
            slide_timer: None,
            exit_cooldown: None,
            inputs_enabled: true,
            running: None,
        }
    }

    // ──────────────────── focus & slots ────────────────────

    #[must_use]
    pub const fn focus(&self) -> usize {
        self.focus
    }

    /// Set the focus, reduced onto `[0, len)`. An empty store pins it to 0.
    pub fn set_focus(&mut self, index: usize, len: usize) {
        self.focus = if len == 0 { 0 } else { index % len };
    }

    /// Clamp the focus after the store shrank: past-the-end moves to the
    /// last item.
    pub fn clamp_focus(&mut self, len: usize) {
        if len == 0 {
            self.focus = 0;
        } else if self.focus >= len {
            self.focus = len - 1;
        }
    }

    #[must_use]
    pub const fn slots(&self) -> &SlotRecycler {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotRecycler {
        &mut self.slots
    }

    /// Full rebind of the window around the focus. A focus left out of range
    /// by an external mutation resets to 0.
    pub fn rebuild(&mut self, len: usize) {
        if self.focus >= len {
            self.focus = 0;
        }
        self.slots.rebuild(self.focus, len);
    }

    // ──────────────────── animation lock ────────────────────

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.transition.is_animating()
    }

    #[must_use]
    pub const fn transition(&self) -> &TransitionController {
        &self.transition
    }

    /// Begin a one-step slide and schedule its completion. Returns false,
    /// changing nothing, while locked or when the store is empty.
    pub fn begin_slide(
        &mut self,
        direction: Direction,
        len: usize,
        scheduler: &mut Scheduler,
        now: Duration,
    ) -> bool {
        if !self
            .transition
            .begin(direction, &mut self.focus, len, &self.slots, now)
        {
            return false;
        }
        let handle = scheduler.schedule(
            now,
            self.transition.duration(),
            TimerTask::TransitionComplete { direction },
        );
        self.slide_timer = Some(handle);
        true
    }

    /// Complete the slide owned by `handle`. Stale handles are ignored.
    pub fn finish_slide(&mut self, handle: TimerHandle, len: usize) -> Option<Direction> {
        if self.slide_timer != Some(handle) {
            return None;
        }
        self.slide_timer = None;
        self.transition.finish(&mut self.slots, self.focus, len)
    }

    // ──────────────────── exit cooldown ────────────────────

    #[must_use]
    pub const fn is_exit_cooldown(&self) -> bool {
        self.exit_cooldown.is_some()
    }

    /// Block reorder re-entry for `window`, replacing any running cooldown.
    pub fn arm_exit_cooldown(&mut self, scheduler: &mut Scheduler, now: Duration, window: Duration) {
        if let Some(previous) = self.exit_cooldown.take() {
            scheduler.cancel(previous);
        }
        self.exit_cooldown = Some(scheduler.schedule(now, window, TimerTask::ExitCooldownEnd));
    }

    pub fn clear_exit_cooldown(&mut self, scheduler: &mut Scheduler) {
        if let Some(previous) = self.exit_cooldown.take() {
            scheduler.cancel(previous);
        }
    }

    /// The cooldown timer fired. Returns true if it was the current one.
    pub fn exit_cooldown_elapsed(&mut self, handle: TimerHandle) -> bool {
        if self.exit_cooldown == Some(handle) {
            self.exit_cooldown = None;
            true
        } else {
            false
        }
    }

    // ──────────────────── input hand-off ────────────────────

    #[must_use]
    pub const fn inputs_enabled(&self) -> bool {
        self.inputs_enabled
    }

    #[must_use]
    pub const fn running(&self) -> Option<&RunningProcess> {
        self.running.as_ref()
    }

    /// Hand input focus to a launched process.
    pub fn hand_off(&mut self, process: RunningProcess) {
        self.inputs_enabled = false;
        self.running = Some(process);
    }

    /// Replace the pending process-check timer.
    pub fn reschedule_check(&mut self, timer: TimerHandle) {
        if let Some(running) = self.running.as_mut() {
            running.check_timer = timer;
        }
    }

    /// Take input focus back. Returns the process that was running.
    pub fn reclaim(&mut self) -> Option<RunningProcess> {
        self.inputs_enabled = true;
        self.running.take()
    }
}
