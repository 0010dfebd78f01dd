//! Fixed window of reusable view slots over the circular item space.
//!
//! The window holds `W` slots (odd), the center one focused. Scrolling never
//! creates or destroys slots: the slot that falls off the trailing edge is
//! rebound to the new leading-edge item and moved to the other end.
//!
//! After any rebuild or completed recycle the bound indices are exactly
//! `{(focus + k) mod N : k in [-W/2, W/2]}`. When `N < W` the same item can
//! occupy several slots.

#![allow(missing_docs)]

use super::{Direction, wrap_index};

/// Stable slot identity. Survives recycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u16);

/// One view binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    /// Position in the window, `0..W`.
    pub position: usize,
    pub bound_index: usize,
    pub focused: bool,
    /// Rendered content is stale.
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct SlotRecycler {
    slots: Vec<Slot>,
    bound: bool,
    /// Bumped on every full rebuild so in-flight work can detect it.
    generation: u64,
}

impl SlotRecycler {
    /// Create `width` unbound slots. `width` is forced odd and at least 1.
    #[must_use]
    pub fn new(width: usize) -> Self {
        let width = if width % 2 == 0 { width + 1 } else { width };
        let slots = (0..width)
            .map(|position| Slot {
                id: SlotId(u16::try_from(position).unwrap_or(u16::MAX)),
                position,
                bound_index: 0,
                focused: false,
                dirty: true,
            })
            .collect();
        Self {
            slots,
            bound: false,
            generation: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn center(&self) -> usize {
        self.slots.len() / 2
    }

    #[must_use]
    pub fn half_span(&self) -> isize {
        isize::try_from(self.center()).unwrap_or(isize::MAX)
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether slots are bound to items. False while the store is empty.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Bound slots in window order; empty while unbound.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        if self.bound { &self.slots } else { &[] }
    }

    /// Rebind every slot around `focus`. An empty store unbinds the window.
    pub fn rebuild(&mut self, focus: usize, len: usize) {
        self.generation = self.generation.wrapping_add(1);
        if len == 0 {
            self.bound = false;
            for slot in &mut self.slots {
                slot.focused = false;
                slot.dirty = true;
            }
            return;
        }

        let center = self.center();
        let half = self.half_span();
        for (position, slot) in self.slots.iter_mut().enumerate() {
            let offset = isize::try_from(position).unwrap_or(isize::MAX) - half;
            slot.position = position;
            slot.bound_index = wrap_index(focus, offset, len).unwrap_or(0);
            slot.focused = position == center;
            slot.dirty = true;
        }
        self.bound = true;
    }

    /// Recycle one slot after the carousel moved a step in `direction`, with
    /// `focus` already advanced. Returns the rebound slot, or `None` when the
    /// window is unbound or the store is empty.
    pub fn recycle(&mut self, direction: Direction, focus: usize, len: usize) -> Option<SlotId> {
        if !self.bound || len == 0 {
            tracing::debug!(?direction, len, "recycle skipped on unbound window");
            return None;
        }

        let half = self.half_span();
        let (edge, offset) = match direction {
            Direction::Right => {
                self.slots.rotate_left(1);
                (self.slots.len() - 1, half)
            }
            Direction::Left => {
                self.slots.rotate_right(1);
                (0, -half)
            }
        };

        let slot = &mut self.slots[edge];
        slot.bound_index = wrap_index(focus, offset, len).unwrap_or(0);
        slot.dirty = true;
        let rebound = slot.id;

        let center = self.center();
        for (position, slot) in self.slots.iter_mut().enumerate() {
            let focused = position == center;
            if slot.focused != focused {
                slot.dirty = true;
            }
            slot.position = position;
            slot.focused = focused;
        }
        Some(rebound)
    }

    #[must_use]
    pub fn bound_indices(&self) -> Vec<usize> {
        self.slots().iter().map(|s| s.bound_index).collect()
    }

    #[must_use]
    pub fn focused_slot(&self) -> Option<&Slot> {
        self.slots().iter().find(|s| s.focused)
    }

    /// Slots currently showing `index` (several when the list is short).
    #[must_use]
    pub fn slots_bound_to(&self, index: usize) -> Vec<SlotId> {
        self.slots()
            .iter()
            .filter(|s| s.bound_index == index)
            .map(|s| s.id)
            .collect()
    }

    /// Mark every slot bound to `index` stale, e.g. after new artwork.
    pub fn invalidate_item(&mut self, index: usize) -> usize {
        if !self.bound {
            return 0;
        }
        let mut count = 0;
        for slot in self.slots.iter_mut().filter(|s| s.bound_index == index) {
            slot.dirty = true;
            count += 1;
        }
        count
    }

    /// Drain stale slot ids for the renderer.
    pub fn take_dirty(&mut self) -> Vec<SlotId> {
        if !self.bound {
            return Vec::new();
        }
        self.slots
            .iter_mut()
            .filter(|s| s.dirty)
            .map(|s| {
                s.dirty = false;
                s.id
            })
            .collect()
    }

    /// 1-based item number per slot, in window order.
    #[must_use]
    pub fn position_badges(&self) -> Vec<(SlotId, usize)> {
        self.slots()
            .iter()
            .map(|s| (s.id, s.bound_index + 1))
            .collect()
    }

    /// Whether the window is exactly the centered window around `focus`
    /// with a single focused center slot.
    #[must_use]
    pub fn matches_window(&self, focus: usize, len: usize) -> bool {
        if len == 0 {
            return !self.bound;
        }
        if !self.bound {
            return false;
        }
        let center = self.center();
        let half = self.half_span();
        let focused = self.slots.iter().filter(|s| s.focused).count();
        focused == 1
            && self.slots.iter().enumerate().all(|(position, slot)| {
                let offset = isize::try_from(position).unwrap_or(isize::MAX) - half;
                slot.position == position
                    && slot.focused == (position == center)
                    && Some(slot.bound_index) == wrap_index(focus, offset, len)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_centers_window_on_focus() {
        let mut r = SlotRecycler::new(9);
        r.rebuild(0, 20);
        assert_eq!(r.bound_indices(), vec![16, 17, 18, 19, 0, 1, 2, 3, 4]);
        assert_eq!(r.focused_slot().map(|s| s.position), Some(4));
        assert!(r.matches_window(0, 20));
    }

    #[test]
    fn short_list_repeats_items() {
        let mut r = SlotRecycler::new(9);
        r.rebuild(1, 3);
        assert_eq!(r.bound_indices(), vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);
        assert_eq!(r.slots_bound_to(1).len(), 3);
    }

    #[test]
    fn recycle_right_rebinds_trailing_slot_to_leading_edge() {
        let mut r = SlotRecycler::new(9);
        r.rebuild(0, 20);
        r.take_dirty();
        let first = r.slots()[0].id;

        let rebound = r.recycle(Direction::Right, 1, 20).expect("bound window");
        assert_eq!(rebound, first);
        assert_eq!(r.slots()[8].id, first);
        assert_eq!(r.slots()[8].bound_index, 5);
        assert!(r.matches_window(1, 20));

        let dirty = r.take_dirty();
        assert!(dirty.contains(&first));
        // old and new center changed focus styling
        assert_eq!(dirty.len(), 3);
    }

    #[test]
    fn recycle_left_rebinds_leading_slot_to_trailing_edge() {
        let mut r = SlotRecycler::new(9);
        r.rebuild(0, 20);
        let last = r.slots()[8].id;
        let rebound = r.recycle(Direction::Left, 19, 20).expect("bound window");
        assert_eq!(rebound, last);
        assert_eq!(r.slots()[0].bound_index, 15);
        assert!(r.matches_window(19, 20));
    }

    #[test]
    fn slots_are_reused_not_recreated() {
        let mut r = SlotRecycler::new(5);
        r.rebuild(0, 7);
        let mut ids: Vec<SlotId> = r.slots().iter().map(|s| s.id).collect();
        ids.sort();
        for step in 1..=10 {
            r.recycle(Direction::Right, step % 7, 7);
        }
        let mut after: Vec<SlotId> = r.slots().iter().map(|s| s.id).collect();
        after.sort();
        assert_eq!(ids, after);
    }

    #[test]
    fn empty_store_unbinds() {
        let mut r = SlotRecycler::new(9);
        r.rebuild(0, 4);
        r.rebuild(0, 0);
        assert!(!r.is_bound());
        assert!(r.slots().is_empty());
        assert_eq!(r.recycle(Direction::Right, 0, 0), None);
        assert!(r.matches_window(0, 0));
    }

    #[test]
    fn rebuild_bumps_generation() {
        let mut r = SlotRecycler::new(3);
        let before = r.generation();
        r.rebuild(0, 2);
        assert_eq!(r.generation(), before + 1);
        r.recycle(Direction::Right, 1, 2);
        assert_eq!(r.generation(), before + 1);
    }

    #[test]
    fn even_width_is_rounded_up() {
        let r = SlotRecycler::new(4);
        assert_eq!(r.width(), 5);
        assert_eq!(r.center(), 2);
    }

    #[test]
    fn badges_are_one_based() {
        let mut r = SlotRecycler::new(3);
        r.rebuild(0, 4);
        let badges: Vec<usize> = r.position_badges().into_iter().map(|(_, n)| n).collect();
        assert_eq!(badges, vec![4, 1, 2]);
    }

    #[test]
    fn invalidate_item_marks_every_copy() {
        let mut r = SlotRecycler::new(5);
        r.rebuild(0, 2);
        r.take_dirty();
        assert_eq!(r.invalidate_item(1), 2);
        assert_eq!(r.take_dirty().len(), 2);
    }
}
