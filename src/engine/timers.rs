//! Cooperative one-shot timers.
//!
//! Every wait in the engine (long press, slide completion, highlight delay,
//! exit cooldown, process checks) is a [`TimerTask`] scheduled here and fired
//! from the engine's own tick. Tasks carry the data they need as a snapshot;
//! nothing closes over engine state. Handles allow cancellation, and a fired
//! task whose handle no longer matches its owner's record is stale and
//! ignored by the owner.

#![allow(missing_docs)]

use std::time::Duration;

use crate::carousel::Direction;
use crate::platform::ProcessHandle;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Work to run when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Long press on the activation button matured.
    LongPress { focus_at_arm: usize },
    /// The slide animation ran its full duration.
    TransitionComplete { direction: Direction },
    /// Refresh reorder highlights after a scrolling move settled.
    ReorderHighlight { target_index: usize },
    /// Reorder may be re-entered again.
    ExitCooldownEnd,
    /// Poll a launched process.
    ProcessCheck { process: ProcessHandle },
}

#[derive(Debug, Clone)]
struct Scheduled {
    handle: TimerHandle,
    due: Duration,
    task: TimerTask,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire `after` from `now`.
    pub fn schedule(&mut self, now: Duration, after: Duration, task: TimerTask) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(Scheduled {
            handle,
            due: now.saturating_add(after),
            task,
        });
        handle
    }

    /// Cancel a pending task. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, if anything is pending.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|s| s.due).min()
    }

    /// Remove and return every task due at `now`, ordered by due time then
    /// scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Vec<(TimerHandle, TimerTask)> {
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = rest;
        due.sort_by_key(|s| (s.due, s.handle));
        due.into_iter().map(|s| (s.handle, s.task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn tasks_fire_in_due_order() {
        let mut s = Scheduler::new();
        let late = s.schedule(ms(0), ms(500), TimerTask::ExitCooldownEnd);
        let early = s.schedule(ms(0), ms(100), TimerTask::LongPress { focus_at_arm: 3 });
        assert_eq!(s.next_due(), Some(ms(100)));

        assert!(s.pop_due(ms(99)).is_empty());
        let fired = s.pop_due(ms(600));
        let handles: Vec<TimerHandle> = fired.iter().map(|(h, _)| *h).collect();
        assert_eq!(handles, vec![early, late]);
        assert!(s.is_empty());
    }

    #[test]
    fn equal_due_times_keep_schedule_order() {
        let mut s = Scheduler::new();
        let a = s.schedule(ms(0), ms(10), TimerTask::ExitCooldownEnd);
        let b = s.schedule(ms(0), ms(10), TimerTask::ExitCooldownEnd);
        let fired: Vec<TimerHandle> = s.pop_due(ms(10)).into_iter().map(|(h, _)| h).collect();
        assert_eq!(fired, vec![a, b]);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut s = Scheduler::new();
        let h = s.schedule(ms(0), ms(800), TimerTask::LongPress { focus_at_arm: 0 });
        assert!(s.is_pending(h));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(s.pop_due(ms(10_000)).is_empty());
    }

    #[test]
    fn task_payload_is_preserved() {
        let mut s = Scheduler::new();
        s.schedule(ms(5), ms(260), TimerTask::ReorderHighlight { target_index: 7 });
        let fired = s.pop_due(ms(265));
        assert_eq!(fired[0].1, TimerTask::ReorderHighlight { target_index: 7 });
    }
}
