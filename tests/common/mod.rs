#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use tvdeck::core::clock::ManualClock;
use tvdeck::core::config::Config;
use tvdeck::engine::{Collaborators, Engine};
use tvdeck::input::ScriptedController;
use tvdeck::platform::{ScriptedLauncher, SharedModalGate};
use tvdeck::store::{Item, ItemStore};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_tvdeck") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "tvdeck.exe" } else { "tvdeck" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve tvdeck binary path for integration test"),
    }
}

/// Run the binary with `home` as `$HOME` so default paths stay inside it.
pub fn run_cli_case(case_name: &str, home: &Path, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("tvdeck-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("HOME", home)
        .env("TVD_OUTPUT_FORMAT", "human")
        .env("RUST_BACKTRACE", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("execute tvdeck command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Engine over `names` with deterministic collaborators.
pub struct Rig {
    pub engine: Engine,
    pub clock: ManualClock,
    pub launcher: ScriptedLauncher,
    pub modal: SharedModalGate,
    pub pad: ScriptedController,
}

pub fn store_of(names: &[&str]) -> ItemStore {
    let items = names
        .iter()
        .map(|n| Item::new(*n, format!("/apps/{n}")).expect("item"))
        .collect();
    ItemStore::from_items(items).expect("store")
}

pub fn rig_with(store: ItemStore, config: Config) -> Rig {
    let clock = ManualClock::new();
    let launcher = ScriptedLauncher::new();
    let modal = SharedModalGate::new();
    let pad = ScriptedController::new();
    let engine = Engine::new(
        config,
        store,
        Collaborators {
            clock: Box::new(clock.clone()),
            launcher: Box::new(launcher.clone()),
            modal: Box::new(modal.clone()),
            controller: Box::new(pad.clone()),
        },
    );
    Rig {
        engine,
        clock,
        launcher,
        modal,
        pad,
    }
}

pub fn rig(names: &[&str]) -> Rig {
    rig_with(store_of(names), Config::default())
}

impl Rig {
    /// Advance the clock in 12 ms poll steps, ticking after each.
    pub fn advance(&mut self, ms: u64) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(12);
            self.clock.advance_ms(step);
            self.engine.on_poll_tick();
            remaining -= step;
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.engine.store().iter().map(|i| i.name.clone()).collect()
    }

    pub fn window(&self) -> Vec<usize> {
        self.engine.slots().iter().map(|s| s.bound_index).collect()
    }
}
