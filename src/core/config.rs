//! Configuration system: TOML file + env var overrides + compiled defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::carousel::transition::Easing;
use crate::core::errors::{Result, TvdError};

/// Full tvdeck configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub carousel: CarouselConfig,
    pub reorder: ReorderConfig,
    pub input: InputConfig,
    pub launcher: LauncherConfig,
    pub paths: PathsConfig,
}

/// Slot window and slide animation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CarouselConfig {
    /// Number of reusable slots. Must be odd so a single center exists.
    pub visible_slots: usize,
    pub transition_ms: u64,
    pub easing: Easing,
}

/// Reorder mode timing and movement policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReorderConfig {
    pub long_press_ms: u64,
    /// Lists at or below this size move the target linearly without wrapping.
    pub linear_max_items: usize,
    /// Delay before selection highlights refresh after a scrolling move.
    pub highlight_delay_ms: u64,
    pub confirm_cooldown_ms: u64,
    pub cancel_cooldown_ms: u64,
}

/// Controller polling and debounce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub poll_interval_ms: u64,
    /// Analog magnitude below which stick input is ignored.
    pub dead_zone: f32,
    /// Poll ticks swallowed after a directional command fires.
    pub directional_cooldown_ticks: u32,
    pub button_cooldown_ms: u64,
    /// Whether the keyboard source delivers key-release events. Long-press
    /// activation from the keyboard needs them.
    pub keyboard_release_events: bool,
    pub buttons: ButtonMap,
}

/// Controller button indices for each command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonMap {
    pub confirm: u8,
    pub back: u8,
    pub edit: u8,
    pub delete: u8,
    pub search: u8,
    pub reorder: Vec<u8>,
    pub menu: u8,
}

/// Launched-process supervision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    pub process_check_ms: u64,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub library_file: PathBuf,
    pub assets_dir: PathBuf,
    pub activity_log: PathBuf,
    /// Second file tried when `activity_log` cannot be opened or written.
    pub activity_log_fallback: Option<PathBuf>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            visible_slots: 9,
            transition_ms: 250,
            easing: Easing::OutCubic,
        }
    }
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 800,
            linear_max_items: 5,
            highlight_delay_ms: 260,
            confirm_cooldown_ms: 1_000,
            cancel_cooldown_ms: 500,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 12,
            dead_zone: 0.2,
            directional_cooldown_ticks: 2,
            button_cooldown_ms: 300,
            keyboard_release_events: false,
            buttons: ButtonMap::default(),
        }
    }
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            confirm: 0,
            back: 1,
            edit: 2,
            delete: 3,
            search: 4,
            reorder: vec![5, 10],
            menu: 9,
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            process_check_ms: 1_000,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[TVD-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("tvdeck");
        let data = home_dir.join(".local").join("share").join("tvdeck");
        Self {
            config_file: cfg.join("config.toml"),
            library_file: cfg.join("launcher_apps.json"),
            assets_dir: data.join("assets"),
            activity_log: data.join("activity.jsonl"),
            activity_log_fallback: Some(env::temp_dir().join("tvdeck-activity.jsonl")),
        }
    }
}

impl CarouselConfig {
    #[must_use]
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

impl ReorderConfig {
    #[must_use]
    pub const fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    #[must_use]
    pub const fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }

    #[must_use]
    pub const fn confirm_cooldown(&self) -> Duration {
        Duration::from_millis(self.confirm_cooldown_ms)
    }

    #[must_use]
    pub const fn cancel_cooldown(&self) -> Duration {
        Duration::from_millis(self.cancel_cooldown_ms)
    }
}

impl InputConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn button_cooldown(&self) -> Duration {
        Duration::from_millis(self.button_cooldown_ms)
    }
}

impl LauncherConfig {
    #[must_use]
    pub const fn process_check(&self) -> Duration {
        Duration::from_millis(self.process_check_ms)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TvdError::io(&path_buf, source))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(TvdError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // carousel
        set_usize(&mut lookup, "TVD_CAROUSEL_VISIBLE_SLOTS", &mut self.carousel.visible_slots)?;
        set_u64(&mut lookup, "TVD_CAROUSEL_TRANSITION_MS", &mut self.carousel.transition_ms)?;

        // reorder
        set_u64(&mut lookup, "TVD_REORDER_LONG_PRESS_MS", &mut self.reorder.long_press_ms)?;
        set_usize(
            &mut lookup,
            "TVD_REORDER_LINEAR_MAX_ITEMS",
            &mut self.reorder.linear_max_items,
        )?;
        set_u64(
            &mut lookup,
            "TVD_REORDER_HIGHLIGHT_DELAY_MS",
            &mut self.reorder.highlight_delay_ms,
        )?;
        set_u64(
            &mut lookup,
            "TVD_REORDER_CONFIRM_COOLDOWN_MS",
            &mut self.reorder.confirm_cooldown_ms,
        )?;
        set_u64(
            &mut lookup,
            "TVD_REORDER_CANCEL_COOLDOWN_MS",
            &mut self.reorder.cancel_cooldown_ms,
        )?;

        // input
        set_u64(&mut lookup, "TVD_INPUT_POLL_INTERVAL_MS", &mut self.input.poll_interval_ms)?;
        set_f32(&mut lookup, "TVD_INPUT_DEAD_ZONE", &mut self.input.dead_zone)?;
        set_u32(
            &mut lookup,
            "TVD_INPUT_DIRECTIONAL_COOLDOWN_TICKS",
            &mut self.input.directional_cooldown_ticks,
        )?;
        set_u64(
            &mut lookup,
            "TVD_INPUT_BUTTON_COOLDOWN_MS",
            &mut self.input.button_cooldown_ms,
        )?;
        set_bool(
            &mut lookup,
            "TVD_INPUT_KEYBOARD_RELEASE_EVENTS",
            &mut self.input.keyboard_release_events,
        )?;

        // launcher
        set_u64(
            &mut lookup,
            "TVD_LAUNCHER_PROCESS_CHECK_MS",
            &mut self.launcher.process_check_ms,
        )?;

        // paths
        if let Some(raw) = lookup("TVD_LIBRARY_FILE") {
            self.paths.library_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TVD_ASSETS_DIR") {
            self.paths.assets_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TVD_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TVD_ACTIVITY_LOG_FALLBACK") {
            self.paths.activity_log_fallback = Some(PathBuf::from(raw));
        }

        Ok(())
    }

    fn normalize(&mut self) {
        self.input.buttons.reorder.sort_unstable();
        self.input.buttons.reorder.dedup();
    }

    fn validate(&self) -> Result<()> {
        let slots = self.carousel.visible_slots;
        if slots == 0 || slots % 2 == 0 {
            return Err(TvdError::InvalidConfig {
                details: format!("carousel.visible_slots must be odd and positive, got {slots}"),
            });
        }

        require_positive("carousel.transition_ms", self.carousel.transition_ms)?;
        require_positive("reorder.long_press_ms", self.reorder.long_press_ms)?;
        require_positive("input.poll_interval_ms", self.input.poll_interval_ms)?;
        require_positive("launcher.process_check_ms", self.launcher.process_check_ms)?;

        // Highlights must refresh after slots are rebound, not before.
        if self.reorder.highlight_delay_ms < self.carousel.transition_ms {
            return Err(TvdError::InvalidConfig {
                details: format!(
                    "reorder.highlight_delay_ms ({}) must not be shorter than carousel.transition_ms ({})",
                    self.reorder.highlight_delay_ms, self.carousel.transition_ms
                ),
            });
        }

        let dz = self.input.dead_zone;
        if !(dz > 0.0 && dz < 1.0) {
            return Err(TvdError::InvalidConfig {
                details: format!("input.dead_zone must be in (0,1), got {dz}"),
            });
        }

        let buttons = &self.input.buttons;
        if buttons.reorder.is_empty() {
            return Err(TvdError::InvalidConfig {
                details: "input.buttons.reorder must name at least one button".to_string(),
            });
        }
        let mut seen: Vec<u8> = vec![
            buttons.confirm,
            buttons.back,
            buttons.edit,
            buttons.delete,
            buttons.search,
            buttons.menu,
        ];
        seen.extend(&buttons.reorder);
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != total {
            return Err(TvdError::InvalidConfig {
                details: "input.buttons assigns one button to several commands".to_string(),
            });
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(TvdError::InvalidConfig {
            details: format!("{name} must be greater than zero"),
        });
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| TvdError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn set_u64<F: FnMut(&str) -> Option<String>>(lookup: &mut F, name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_u32<F: FnMut(&str) -> Option<String>>(lookup: &mut F, name: &str, slot: &mut u32) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_usize<F: FnMut(&str) -> Option<String>>(
    lookup: &mut F,
    name: &str,
    slot: &mut usize,
) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_f32<F: FnMut(&str) -> Option<String>>(lookup: &mut F, name: &str, slot: &mut f32) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}

fn set_bool<F: FnMut(&str) -> Option<String>>(lookup: &mut F, name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *slot = parse_env(name, &raw)?;
    }
    Ok(())
}
