//! One ordered command queue fed by both sources, plus the mode router.
//!
//! Keyboard events are translated on arrival. The controller is sampled
//! once per poll tick. Both push into the same queue, and the engine drains
//! it once per dispatch cycle. Each drained command goes to exactly one
//! consumer, picked by [`route`].

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::Duration;

use super::command::{InputEvent, Source};
use super::controller::{ControllerDebouncer, ControllerDevice};
use super::keyboard::{KeyContext, KeyEvent, KeyResolution, resolve_key};
use crate::core::config::InputConfig;

/// Consumer for a command, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Inputs are handed off to a launched application.
    Suppressed,
    /// An external dialog owns input.
    Modal,
    /// The search overlay owns input.
    Search,
    Reorder,
    Menu,
    Browse,
}

/// Facts the router decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteContext {
    pub inputs_enabled: bool,
    pub modal_blocking: bool,
    pub search_open: bool,
    pub reorder_active: bool,
    pub in_menu: bool,
}

/// Pick the single consumer for the next command.
#[must_use]
pub const fn route(cx: RouteContext) -> Route {
    if !cx.inputs_enabled {
        Route::Suppressed
    } else if cx.modal_blocking {
        Route::Modal
    } else if cx.search_open {
        Route::Search
    } else if cx.reorder_active {
        Route::Reorder
    } else if cx.in_menu {
        Route::Menu
    } else {
        Route::Browse
    }
}

/// State the controller poll depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollContext {
    pub inputs_enabled: bool,
    pub in_menu: bool,
    /// Buttons are ignored right after leaving reorder mode.
    pub exit_cooldown: bool,
}

pub struct InputDispatcher {
    queue: VecDeque<InputEvent>,
    debouncer: ControllerDebouncer,
    device: Box<dyn ControllerDevice>,
    connected: bool,
    release_events: bool,
}

impl std::fmt::Debug for InputDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDispatcher")
            .field("queued", &self.queue.len())
            .field("connected", &self.connected)
            .field("release_events", &self.release_events)
            .finish_non_exhaustive()
    }
}

impl InputDispatcher {
    #[must_use]
    pub fn new(config: &InputConfig, device: Box<dyn ControllerDevice>) -> Self {
        Self {
            queue: VecDeque::new(),
            debouncer: ControllerDebouncer::new(config),
            device,
            connected: false,
            release_events: config.keyboard_release_events,
        }
    }

    /// Whether the keyboard source reports key releases.
    #[must_use]
    pub const fn release_events(&self) -> bool {
        self.release_events
    }

    #[must_use]
    pub const fn controller_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Translate and enqueue a key event.
    pub fn submit_key(&mut self, event: KeyEvent, context: KeyContext) -> KeyResolution {
        let resolution = resolve_key(event, context);
        match resolution {
            KeyResolution::Command(command) => self.queue.push_back(InputEvent::keyboard(command)),
            KeyResolution::DroppedRepeat => {
                tracing::trace!(key = ?event.key, "auto-repeat dropped");
            }
            KeyResolution::Unmapped => {}
        }
        resolution
    }

    /// Enqueue an already-resolved command.
    pub fn submit(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    /// Sample the controller once. Returns how many commands were queued.
    /// While inputs are handed off the sample is read and discarded.
    pub fn poll_device(&mut self, now: Duration, cx: PollContext) -> usize {
        let sample = self.device.poll();
        match (&sample, self.connected) {
            (Some(_), false) => {
                tracing::info!("controller connected");
                self.connected = true;
                self.debouncer.reset();
            }
            (None, true) => {
                tracing::info!("controller disconnected");
                self.connected = false;
            }
            _ => {}
        }
        let Some(sample) = sample else {
            return 0;
        };
        if !cx.inputs_enabled {
            self.debouncer.reset();
            return 0;
        }

        let mut queued = 0;
        for event in self.debouncer.process(&sample, now, cx.in_menu) {
            if cx.exit_cooldown && event.source == Source::ControllerButton {
                tracing::debug!(command = ?event.command, "button ignored during exit cooldown");
                continue;
            }
            self.queue.push_back(event);
            queued += 1;
        }
        queued
    }

    /// Take every queued command in arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.queue.drain(..).collect()
    }

    /// Drop queued commands without dispatching them.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::command::Command;
    use crate::input::controller::{ControllerSample, NoController, ScriptedController};
    use crate::input::keyboard::Key;

    fn enabled() -> PollContext {
        PollContext {
            inputs_enabled: true,
            ..PollContext::default()
        }
    }

    #[test]
    fn route_priority_order() {
        let all = RouteContext {
            inputs_enabled: true,
            modal_blocking: true,
            search_open: true,
            reorder_active: true,
            in_menu: true,
        };
        assert_eq!(route(RouteContext { inputs_enabled: false, ..all }), Route::Suppressed);
        assert_eq!(route(all), Route::Modal);
        assert_eq!(route(RouteContext { modal_blocking: false, ..all }), Route::Search);
        assert_eq!(
            route(RouteContext {
                modal_blocking: false,
                search_open: false,
                ..all
            }),
            Route::Reorder
        );
        assert_eq!(
            route(RouteContext {
                inputs_enabled: true,
                in_menu: true,
                ..RouteContext::default()
            }),
            Route::Menu
        );
        assert_eq!(
            route(RouteContext {
                inputs_enabled: true,
                ..RouteContext::default()
            }),
            Route::Browse
        );
    }

    #[test]
    fn keyboard_and_controller_share_one_queue() {
        let pad = ScriptedController::new();
        let mut d = InputDispatcher::new(&InputConfig::default(), Box::new(pad.clone()));
        d.submit_key(KeyEvent::press(Key::Left), KeyContext::default());
        pad.push(ControllerSample::pressed(&[0]));
        d.poll_device(Duration::ZERO, enabled());
        d.submit(InputEvent::script(Command::Back));

        let drained: Vec<Command> = d.drain().into_iter().map(|e| e.command).collect();
        assert_eq!(drained, [Command::Left, Command::Confirm, Command::Back]);
        assert_eq!(d.queued(), 0);
    }

    #[test]
    fn repeats_never_reach_the_queue() {
        let mut d = InputDispatcher::new(&InputConfig::default(), Box::new(NoController));
        let resolution = d.submit_key(KeyEvent::repeat(Key::Right), KeyContext::default());
        assert_eq!(resolution, KeyResolution::DroppedRepeat);
        assert_eq!(d.queued(), 0);
    }

    #[test]
    fn disabled_inputs_discard_samples() {
        let pad = ScriptedController::new();
        let mut d = InputDispatcher::new(&InputConfig::default(), Box::new(pad.clone()));
        pad.push(ControllerSample::pressed(&[0]));
        let queued = d.poll_device(Duration::ZERO, PollContext::default());
        assert_eq!(queued, 0);
        assert_eq!(pad.pending(), 0);
    }

    #[test]
    fn exit_cooldown_drops_buttons_but_not_directions() {
        let pad = ScriptedController::new();
        let mut d = InputDispatcher::new(&InputConfig::default(), Box::new(pad.clone()));
        pad.push(ControllerSample {
            hat: (1, 0),
            buttons: vec![5],
            ..ControllerSample::default()
        });
        let cx = PollContext {
            exit_cooldown: true,
            ..enabled()
        };
        assert_eq!(d.poll_device(Duration::ZERO, cx), 1);
        assert_eq!(d.drain()[0].command, Command::Right);
    }

    #[test]
    fn connection_changes_are_tracked() {
        let pad = ScriptedController::new();
        let mut d = InputDispatcher::new(&InputConfig::default(), Box::new(pad.clone()));
        assert!(!d.controller_connected());
        d.poll_device(Duration::ZERO, enabled());
        assert!(d.controller_connected());
        pad.set_connected(false);
        d.poll_device(Duration::from_millis(12), enabled());
        assert!(!d.controller_connected());
    }
}
