//! Single-flight slide transition.
//!
//! `begin` advances the focus index immediately and takes the animation
//! lock; `finish` recycles one slot and releases it. While locked every
//! further `begin` is refused, so rapid input can never rebind slots twice
//! for one visual step.

#![allow(missing_docs)]

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::slots::SlotRecycler;
use super::{Direction, wrap_index};

/// Easing curve for the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Quadratic.
    EaseIn,
    /// Quadratic.
    EaseOut,
    /// Quadratic.
    EaseInOut,
    #[default]
    OutCubic,
}

impl Easing {
    /// Map linear progress `t` in `[0,1]` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
            Self::OutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
        }
    }
}

/// The running slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTransition {
    pub direction: Direction,
    pub started_at: Duration,
    pub from_index: usize,
    pub to_index: usize,
    /// Slot window generation at `begin`.
    pub window_generation: u64,
}

#[derive(Debug, Clone)]
pub struct TransitionController {
    duration: Duration,
    easing: Easing,
    active: Option<ActiveTransition>,
}

impl TransitionController {
    #[must_use]
    pub const fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            active: None,
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub const fn active(&self) -> Option<&ActiveTransition> {
        self.active.as_ref()
    }

    /// Start a one-step slide. Returns false, changing nothing, while another
    /// slide runs or the store is empty.
    pub fn begin(
        &mut self,
        direction: Direction,
        focus: &mut usize,
        len: usize,
        slots: &SlotRecycler,
        now: Duration,
    ) -> bool {
        if self.active.is_some() {
            tracing::debug!(?direction, "transition refused: already animating");
            return false;
        }
        let Some(next) = wrap_index(*focus, direction.step(), len) else {
            tracing::debug!(?direction, "transition refused: empty store");
            return false;
        };

        self.active = Some(ActiveTransition {
            direction,
            started_at: now,
            from_index: *focus,
            to_index: next,
            window_generation: slots.generation(),
        });
        *focus = next;
        true
    }

    /// Eased progress in `[0,1]` of the running slide.
    #[must_use]
    pub fn progress(&self, now: Duration) -> Option<f32> {
        let active = self.active.as_ref()?;
        let elapsed = now.saturating_sub(active.started_at);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        Some(self.easing.apply(t))
    }

    /// Horizontal offset of every slot in units of one slot stride. The
    /// window slides opposite to the scroll direction.
    #[must_use]
    pub fn slot_offset(&self, now: Duration) -> f32 {
        match (self.active.as_ref(), self.progress(now)) {
            (Some(active), Some(p)) => match active.direction {
                Direction::Right => -p,
                Direction::Left => p,
            },
            _ => 0.0,
        }
    }

    /// Complete the running slide: recycle one slot for its direction and
    /// release the lock. If the window was rebuilt since `begin`, the window
    /// is rebuilt around `focus` instead. Returns the finished direction.
    pub fn finish(
        &mut self,
        slots: &mut SlotRecycler,
        focus: usize,
        len: usize,
    ) -> Option<Direction> {
        let active = self.active.take()?;
        if slots.generation() == active.window_generation && slots.is_bound() {
            slots.recycle(active.direction, focus, len);
        } else {
            slots.rebuild(focus, len);
        }
        Some(active.direction)
    }
}
