//! Engine: owns navigation state, routes input and runs timers.

pub mod effects;
pub mod menu;
pub mod runtime;
pub mod search;
pub mod state;
pub mod timers;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod test_properties;

pub use effects::{EngineEffect, Highlights, Notification, NotificationLevel, Outcome, TickReport};
pub use menu::{MenuEntry, SystemMenu};
pub use runtime::{Collaborators, Engine};
pub use search::{SearchAction, SearchHit, SearchMode, SearchOverlay};
pub use state::{EngineState, RunningProcess};
pub use timers::{Scheduler, TimerHandle, TimerTask};
