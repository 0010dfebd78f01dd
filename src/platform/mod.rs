//! Platform abstraction: launching applications and detecting modal surfaces.

pub mod pal;

pub use pal::{
    ModalGate, NoModal, ProcessHandle, ProcessLauncher, ScriptedLauncher, SharedModalGate,
    SystemLauncher,
};
