//! Polled controller source and its debouncer.
//!
//! A [`ControllerDevice`] is sampled once per poll tick. The
//! [`ControllerDebouncer`] turns raw samples into commands:
//! - the hat fires on a change of its 2-axis state,
//! - the stick fires on a sign change past the dead zone,
//! - the hat runs first; either source firing arms one shared cooldown
//!   that swallows a few ticks of directional chatter from both,
//! - buttons are level-triggered and gated by a per-button cooldown.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::command::{Command, InputEvent, Source};
use crate::core::config::{ButtonMap, InputConfig};

/// One reading of the device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerSample {
    /// Analog stick, each axis normalized to `[-1, 1]`. Positive y is down.
    pub stick: (f32, f32),
    /// Directional pad, each axis in `{-1, 0, 1}`. Positive y is up.
    pub hat: (i8, i8),
    /// Indices of buttons currently held.
    pub buttons: Vec<u8>,
}

impl ControllerSample {
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hat(x: i8, y: i8) -> Self {
        Self {
            hat: (x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stick(x: f32, y: f32) -> Self {
        Self {
            stick: (x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn pressed(buttons: &[u8]) -> Self {
        Self {
            buttons: buttons.to_vec(),
            ..Self::default()
        }
    }
}

/// A pollable controller. `None` means no device is attached.
pub trait ControllerDevice: Send {
    fn poll(&mut self) -> Option<ControllerSample>;
}

/// Host without a controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoController;

impl ControllerDevice for NoController {
    fn poll(&mut self) -> Option<ControllerSample> {
        None
    }
}

#[derive(Debug, Default)]
struct ScriptedQueue {
    samples: VecDeque<ControllerSample>,
    connected: bool,
}

/// Replays queued samples, then reads neutral. Clones share the queue.
#[derive(Debug, Clone)]
pub struct ScriptedController {
    queue: Arc<Mutex<ScriptedQueue>>,
}

impl Default for ScriptedController {
    fn default() -> Self {
        Self {
            queue: Arc::new(Mutex::new(ScriptedQueue {
                samples: VecDeque::new(),
                connected: true,
            })),
        }
    }
}

impl ScriptedController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: ControllerSample) {
        self.queue.lock().samples.push_back(sample);
    }

    pub fn set_connected(&self, connected: bool) {
        self.queue.lock().connected = connected;
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().samples.len()
    }
}

impl ControllerDevice for ScriptedController {
    fn poll(&mut self) -> Option<ControllerSample> {
        let mut queue = self.queue.lock();
        if !queue.connected {
            return None;
        }
        Some(queue.samples.pop_front().unwrap_or_default())
    }
}

/// Edge detection and cooldowns for the polled source.
#[derive(Debug, Clone)]
pub struct ControllerDebouncer {
    dead_zone: f32,
    cooldown_ticks: u32,
    button_cooldown: Duration,
    buttons: ButtonMap,
    last_hat: (i8, i8),
    last_axis: (f32, f32),
    /// Ticks left before the hat or the stick may fire again. Shared by both.
    directional_cooldown: u32,
    last_fired: HashMap<u8, Duration>,
}

impl ControllerDebouncer {
    #[must_use]
    pub fn new(config: &InputConfig) -> Self {
        Self {
            dead_zone: config.dead_zone,
            cooldown_ticks: config.directional_cooldown_ticks,
            button_cooldown: config.button_cooldown(),
            buttons: config.buttons.clone(),
            last_hat: (0, 0),
            last_axis: (0.0, 0.0),
            directional_cooldown: 0,
            last_fired: HashMap::new(),
        }
    }

    /// Forget edge and cooldown history, e.g. after the device reconnects or
    /// input returns from a launched application.
    pub fn reset(&mut self) {
        self.last_hat = (0, 0);
        self.last_axis = (0.0, 0.0);
        self.directional_cooldown = 0;
        self.last_fired.clear();
    }

    /// Resolve one sample taken at `now`. `in_menu` flips the meaning of
    /// the menu button.
    pub fn process(&mut self, sample: &ControllerSample, now: Duration, in_menu: bool) -> Vec<InputEvent> {
        let mut out = Vec::new();
        self.process_hat(sample.hat, &mut out);
        self.process_stick(sample.stick, &mut out);
        self.process_buttons(&sample.buttons, now, in_menu, &mut out);
        out
    }

    fn process_hat(&mut self, hat: (i8, i8), out: &mut Vec<InputEvent>) {
        if hat == (0, 0) {
            self.last_hat = (0, 0);
            self.directional_cooldown = 0;
            return;
        }
        if self.directional_cooldown > 0 {
            self.directional_cooldown -= 1;
            return;
        }
        if hat == self.last_hat {
            return;
        }
        let (x, y) = hat;
        match x {
            1 => out.push(axis(Command::Right)),
            -1 => out.push(axis(Command::Left)),
            _ => {}
        }
        match y {
            1 => out.push(axis(Command::Up)),
            -1 => out.push(axis(Command::Down)),
            _ => {}
        }
        self.directional_cooldown = self.cooldown_ticks;
        self.last_hat = hat;
    }

    fn process_stick(&mut self, (x, y): (f32, f32), out: &mut Vec<InputEvent>) {
        let dz = self.dead_zone;
        if x.abs() <= dz && y.abs() <= dz {
            self.last_axis = (0.0, 0.0);
            return;
        }
        if self.directional_cooldown > 0 {
            self.directional_cooldown -= 1;
            // A push swallowed here must not fire once the cooldown ends.
            if x.abs() > dz {
                self.last_axis.0 = x;
            }
            if y.abs() > dz {
                self.last_axis.1 = y;
            }
            return;
        }
        if x.abs() > dz {
            let (last_x, _) = self.last_axis;
            if x > 0.0 && last_x <= 0.0 {
                out.push(axis(Command::Right));
                self.directional_cooldown = self.cooldown_ticks;
            } else if x < 0.0 && last_x >= 0.0 {
                out.push(axis(Command::Left));
                self.directional_cooldown = self.cooldown_ticks;
            }
            self.last_axis.0 = x;
        }
        if y.abs() > dz {
            let (_, last_y) = self.last_axis;
            if y > 0.0 && last_y <= 0.0 {
                out.push(axis(Command::Down));
                self.directional_cooldown = self.cooldown_ticks;
            } else if y < 0.0 && last_y >= 0.0 {
                out.push(axis(Command::Up));
                self.directional_cooldown = self.cooldown_ticks;
            }
            self.last_axis.1 = y;
        }
    }

    fn process_buttons(&mut self, held: &[u8], now: Duration, in_menu: bool, out: &mut Vec<InputEvent>) {
        let mut seen: Vec<u8> = Vec::with_capacity(held.len());
        for &button in held {
            if seen.contains(&button) {
                continue;
            }
            seen.push(button);
            let Some(command) = self.map_button(button, in_menu) else {
                continue;
            };
            if let Some(&last) = self.last_fired.get(&button) {
                if now.saturating_sub(last) < self.button_cooldown {
                    continue;
                }
            }
            self.last_fired.insert(button, now);
            out.push(InputEvent::new(command, Source::ControllerButton));
        }
    }

    fn map_button(&self, button: u8, in_menu: bool) -> Option<Command> {
        let map = &self.buttons;
        if button == map.confirm {
            Some(Command::Confirm)
        } else if button == map.back {
            Some(Command::Back)
        } else if button == map.edit {
            Some(Command::Edit)
        } else if button == map.delete {
            Some(Command::Delete)
        } else if button == map.search {
            Some(Command::ToggleSearch)
        } else if map.reorder.contains(&button) {
            Some(Command::ToggleReorder)
        } else if button == map.menu {
            Some(if in_menu { Command::Up } else { Command::Down })
        } else {
            None
        }
    }
}

const fn axis(command: Command) -> InputEvent {
    InputEvent::new(command, Source::ControllerAxis)
}
