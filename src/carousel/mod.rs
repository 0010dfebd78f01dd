//! Circular carousel: index arithmetic, the recycled slot window and the
//! single-flight slide transition.

pub mod slots;
pub mod transition;

use serde::{Deserialize, Serialize};

pub use slots::{Slot, SlotId, SlotRecycler};
pub use transition::{Easing, TransitionController};

/// Scroll direction. `Right` advances to the next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Signed index delta for one step.
    #[must_use]
    pub const fn step(self) -> isize {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }

    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Reduce `base + offset` onto `[0, len)`. Returns `None` when `len == 0`.
#[must_use]
pub fn wrap_index(base: usize, offset: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len_i = isize::try_from(len).ok()?;
    let base_i = isize::try_from(base % len).ok()?;
    let wrapped = (base_i + offset.rem_euclid(len_i)).rem_euclid(len_i);
    usize::try_from(wrapped).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_handles_both_directions() {
        assert_eq!(wrap_index(0, -1, 5), Some(4));
        assert_eq!(wrap_index(4, 1, 5), Some(0));
        assert_eq!(wrap_index(2, -4, 3), Some(1));
        assert_eq!(wrap_index(1, 0, 1), Some(0));
    }

    #[test]
    fn wrap_reduces_out_of_range_base() {
        assert_eq!(wrap_index(12, 0, 5), Some(2));
    }

    #[test]
    fn wrap_on_empty_is_none() {
        assert_eq!(wrap_index(0, 1, 0), None);
    }

    #[test]
    fn wrap_survives_extreme_offsets() {
        assert_eq!(wrap_index(0, isize::MIN, 7), wrap_index(0, isize::MIN % 7, 7));
        assert!(wrap_index(3, isize::MAX, 7).is_some());
    }

    #[test]
    fn direction_step_and_reverse() {
        assert_eq!(Direction::Left.step(), -1);
        assert_eq!(Direction::Right.step(), 1);
        assert_eq!(Direction::Left.reverse(), Direction::Right);
    }
}
