//! Unified input: keyboard translation, controller debounce and mode routing.

pub mod command;
pub mod controller;
pub mod dispatch;
pub mod keyboard;

pub use command::{Command, InputEvent, Source};
pub use controller::{
    ControllerDebouncer, ControllerDevice, ControllerSample, NoController, ScriptedController,
};
pub use dispatch::{InputDispatcher, PollContext, Route, RouteContext, route};
pub use keyboard::{Key, KeyContext, KeyEvent, KeyPhase, KeyResolution, resolve_key};
