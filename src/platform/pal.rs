//! Platform seams: process launching and modal-surface detection.
//!
//! The engine only talks to these traits. [`SystemLauncher`] is the real
//! implementation; [`ScriptedLauncher`] and [`SharedModalGate`] are
//! in-memory doubles for deterministic tests and headless hosts.

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TvdError};

/// Opaque handle to a launched process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle(pub u64);

/// Starts external applications and reports whether they still run.
pub trait ProcessLauncher: Send {
    fn launch(&mut self, path: &str) -> Result<ProcessHandle>;
    fn is_running(&mut self, handle: ProcessHandle) -> bool;
}

/// Reports whether an external dialog or overlay currently owns input.
pub trait ModalGate: Send {
    fn is_blocking(&self) -> bool;
}

/// Gate for hosts without external dialogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModal;

impl ModalGate for NoModal {
    fn is_blocking(&self) -> bool {
        false
    }
}

/// Gate toggled by the host; clones share the flag.
#[derive(Debug, Default, Clone)]
pub struct SharedModalGate {
    blocking: Arc<AtomicBool>,
}

impl SharedModalGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_blocking(&self, blocking: bool) {
        self.blocking.store(blocking, Ordering::SeqCst);
    }
}

impl ModalGate for SharedModalGate {
    fn is_blocking(&self) -> bool {
        self.blocking.load(Ordering::SeqCst)
    }
}

/// Launcher backed by `std::process`.
#[derive(Debug, Default)]
pub struct SystemLauncher {
    children: HashMap<u64, Child>,
    next_id: u64,
}

impl SystemLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessLauncher for SystemLauncher {
    fn launch(&mut self, path: &str) -> Result<ProcessHandle> {
        let child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TvdError::Launch {
                target: path.to_string(),
                details: e.to_string(),
            })?;
        self.next_id += 1;
        tracing::info!(path, pid = child.id(), "launched process");
        self.children.insert(self.next_id, child);
        Ok(ProcessHandle(self.next_id))
    }

    fn is_running(&mut self, handle: ProcessHandle) -> bool {
        let Some(child) = self.children.get_mut(&handle.0) else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!(?status, "launched process exited");
                self.children.remove(&handle.0);
                false
            }
            Err(error) => {
                tracing::warn!(%error, "cannot query launched process; treating as exited");
                self.children.remove(&handle.0);
                false
            }
        }
    }
}

#[derive(Debug, Default)]
struct ScriptedState {
    launched: Vec<String>,
    running: HashSet<u64>,
    fail_next: Option<String>,
    next_id: u64,
}

/// In-memory launcher for tests. Clones share state so a test can keep a
/// handle after moving one into the engine.
#[derive(Debug, Default, Clone)]
pub struct ScriptedLauncher {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next launch fail with `details`.
    pub fn fail_next(&self, details: impl Into<String>) {
        self.state.lock().fail_next = Some(details.into());
    }

    /// Mark every running process as exited.
    pub fn exit_all(&self) {
        self.state.lock().running.clear();
    }

    #[must_use]
    pub fn launched(&self) -> Vec<String> {
        self.state.lock().launched.clone()
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.state.lock().running.len()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&mut self, path: &str) -> Result<ProcessHandle> {
        let mut state = self.state.lock();
        if let Some(details) = state.fail_next.take() {
            return Err(TvdError::Launch {
                target: path.to_string(),
                details,
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        state.launched.push(path.to_string());
        state.running.insert(id);
        Ok(ProcessHandle(id))
    }

    fn is_running(&mut self, handle: ProcessHandle) -> bool {
        self.state.lock().running.contains(&handle.0)
    }
}
