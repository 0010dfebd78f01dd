//! Property-based tests for carousel and reorder invariants.
//!
//! Arbitrary scroll sequences, reorder sessions and mixed command streams
//! must keep the focus in range, the slot window centered, the slide lock
//! exclusive and cancelled sessions side-effect free.

use std::time::Duration;

use proptest::prelude::*;

use super::state::EngineState;
use super::test_harness::EngineHarness;
use super::timers::{Scheduler, TimerTask};
use crate::carousel::{Direction, Easing};
use crate::input::Command;
use crate::reorder::{ActivationGate, ReorderContext, ReorderPolicy, ReorderStateMachine};
use crate::store::{Item, ItemStore};

const SLIDE: Duration = Duration::from_millis(250);

// ──────────────────── strategies ────────────────────

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Left), Just(Direction::Right)]
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Left),
        Just(Command::Right),
        Just(Command::Up),
        Just(Command::Down),
        Just(Command::Confirm),
        Just(Command::Back),
        Just(Command::ToggleReorder),
        Just(Command::ToggleSearch),
        Just(Command::SwitchSearchMode),
        Just(Command::Backspace),
        Just(Command::Text('a')),
        Just(Command::Edit),
    ]
}

fn store_of(len: usize) -> ItemStore {
    let items = (0..len)
        .map(|i| Item::new(format!("item-{i}"), format!("/apps/{i}")).expect("item"))
        .collect();
    ItemStore::from_items(items).expect("store")
}

fn names(store: &ItemStore) -> Vec<String> {
    store.iter().map(|i| i.name.clone()).collect()
}

/// Run every due timer that the state owns.
fn settle(state: &mut EngineState, scheduler: &mut Scheduler, now: Duration, len: usize) {
    for (handle, task) in scheduler.pop_due(now) {
        match task {
            TimerTask::TransitionComplete { .. } => {
                state.finish_slide(handle, len);
            }
            TimerTask::ExitCooldownEnd => {
                state.exit_cooldown_elapsed(handle);
            }
            _ => {}
        }
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Completed scrolls land on `(initial + net) mod N` and leave the
    /// window centered with exactly one focused slot.
    #[test]
    fn scroll_is_circular_and_window_stays_centered(
        len in 1usize..24,
        initial in 0usize..64,
        width in prop_oneof![Just(3usize), Just(5), Just(9)],
        moves in prop::collection::vec(arb_direction(), 0..40),
    ) {
        let mut state = EngineState::new(width, SLIDE, Easing::OutCubic);
        let mut scheduler = Scheduler::new();
        let mut now = Duration::ZERO;
        state.set_focus(initial, len);
        state.rebuild(len);

        let mut net: isize = 0;
        for direction in &moves {
            prop_assert!(state.begin_slide(*direction, len, &mut scheduler, now));
            net += direction.step();
            now += SLIDE;
            settle(&mut state, &mut scheduler, now, len);
            prop_assert!(state.slots().matches_window(state.focus(), len));
            prop_assert_eq!(state.slots().slots().iter().filter(|s| s.focused).count(), 1);
        }

        let len_i = isize::try_from(len).unwrap();
        let start = isize::try_from(initial % len).unwrap();
        let expected = usize::try_from((start + net).rem_euclid(len_i)).unwrap();
        prop_assert_eq!(state.focus(), expected);
    }

    /// A second slide while one is running changes nothing.
    #[test]
    fn slide_lock_is_exclusive(
        len in 1usize..16,
        first in arb_direction(),
        second in arb_direction(),
        elapsed_ms in 0u64..250,
    ) {
        let mut state = EngineState::new(9, SLIDE, Easing::OutCubic);
        let mut scheduler = Scheduler::new();
        state.rebuild(len);
        prop_assert!(state.begin_slide(first, len, &mut scheduler, Duration::ZERO));
        let focus = state.focus();

        let now = Duration::from_millis(elapsed_ms);
        settle(&mut state, &mut scheduler, now, len);
        prop_assert!(!state.begin_slide(second, len, &mut scheduler, now));
        prop_assert_eq!(state.focus(), focus);
        prop_assert_eq!(scheduler.len(), 1);
    }

    /// Any number of reorder moves followed by cancel leaves the store and
    /// the focus as they were.
    #[test]
    fn reorder_cancel_is_idempotent(
        len in 1usize..12,
        start in 0usize..12,
        moves in prop::collection::vec(arb_direction(), 0..20),
    ) {
        let mut store = store_of(len);
        let before = names(&store);
        let mut state = EngineState::new(9, SLIDE, Easing::OutCubic);
        let mut scheduler = Scheduler::new();
        let mut machine = ReorderStateMachine::new(ReorderPolicy::default());
        let mut now = Duration::ZERO;
        let start = start % len;
        state.set_focus(start, len);
        state.rebuild(len);

        let gate = ActivationGate { item_count: len, ..ActivationGate::default() };
        {
            let mut cx = ReorderContext { store: &mut store, state: &mut state, scheduler: &mut scheduler, now };
            machine.toggle(&gate, &mut cx);
        }
        for direction in moves {
            let mut cx = ReorderContext { store: &mut store, state: &mut state, scheduler: &mut scheduler, now };
            machine.move_target(direction, &mut cx);
            let session = machine.session().unwrap();
            prop_assert!(session.target_index < len);
            prop_assert_eq!(session.selected_index, start);
            now += Duration::from_millis(300);
            settle(&mut state, &mut scheduler, now, len);
        }

        let mut cx = ReorderContext { store: &mut store, state: &mut state, scheduler: &mut scheduler, now };
        prop_assert!(machine.cancel(&mut cx).is_some());
        prop_assert_eq!(names(&store), before);
        prop_assert_eq!(state.focus(), start);
        prop_assert!(state.slots().matches_window(start, len));
    }

    /// Short lists never wrap the reorder target.
    #[test]
    fn short_list_target_stays_in_bounds(
        len in 1usize..=5,
        moves in prop::collection::vec(arb_direction(), 0..30),
    ) {
        let mut store = store_of(len);
        let mut state = EngineState::new(9, SLIDE, Easing::OutCubic);
        let mut scheduler = Scheduler::new();
        let mut machine = ReorderStateMachine::new(ReorderPolicy::default());
        state.rebuild(len);
        let gate = ActivationGate { item_count: len, ..ActivationGate::default() };

        let mut expected: isize = 0;
        let mut cx = ReorderContext { store: &mut store, state: &mut state, scheduler: &mut scheduler, now: Duration::ZERO };
        machine.toggle(&gate, &mut cx);
        for direction in moves {
            machine.move_target(direction, &mut cx);
            expected = (expected + direction.step()).clamp(0, isize::try_from(len).unwrap() - 1);
            prop_assert_eq!(machine.session().unwrap().target_index, usize::try_from(expected).unwrap());
        }
        prop_assert!(!cx.state.is_animating());
    }

    /// Arbitrary command streams keep the engine consistent.
    #[test]
    fn command_streams_preserve_engine_invariants(
        len in 0usize..10,
        steps in prop::collection::vec((arb_command(), 0u64..400), 1..60),
    ) {
        let names: Vec<String> = (0..len).map(|i| format!("item-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut h = EngineHarness::new(&refs);

        for (command, wait) in steps {
            h.command(command);
            h.advance(wait);
            let engine = h.engine();
            let store_len = engine.store().len();
            prop_assert_eq!(store_len, len);
            if store_len == 0 {
                prop_assert_eq!(engine.current_focus_index(), 0);
                prop_assert!(engine.slots().is_empty());
            } else {
                prop_assert!(engine.current_focus_index() < store_len);
                if !engine.is_animating() {
                    let focused = engine.slots().iter().filter(|s| s.focused).count();
                    prop_assert_eq!(focused, 1);
                }
            }
            if let Some(session) = h.engine().reorder_status().target {
                prop_assert!(session < store_len);
            }
        }
    }
}
