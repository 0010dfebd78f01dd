//! Activity log: append-only JSON lines describing user-visible events.
//!
//! Each entry is serialized to one line in memory and written with a single
//! `write_all`, so a tailing reader never sees a torn line.
//!
//! When a write fails the writer degrades one level and retries:
//! 1. primary file
//! 2. optional fallback file
//! 3. stderr, prefixed `[TVD-JSONL]`
//! 4. discard
//!
//! Logging failures never reach the engine.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::PathsConfig;
use crate::core::errors::{Result, TvdError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    SessionStart,
    SessionStop,
    Launch,
    LaunchFailed,
    AppClosed,
    ReorderCommit,
    ReorderCancel,
    ItemAdded,
    ItemEdited,
    ItemRemoved,
    PersistFailed,
    MenuAction,
}

/// One log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC, millisecond precision.
    pub ts: String,
    pub event: ActivityEvent,
    pub severity: Severity,
    /// Item name involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<usize>,
    /// Executable or file path involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(event: ActivityEvent, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            item: None,
            index: None,
            from: None,
            to: None,
            path: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn info(event: ActivityEvent) -> Self {
        Self::new(event, Severity::Info)
    }

    #[must_use]
    pub fn item(mut self, name: impl Into<String>) -> Self {
        self.item = Some(name.into());
        self
    }

    #[must_use]
    pub const fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub const fn moved(mut self, from: usize, to: usize) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach an error's code and message and raise severity.
    #[must_use]
    pub fn error(mut self, error: &TvdError) -> Self {
        self.severity = Severity::Error;
        self.error_code = Some(error.code().to_string());
        self.error_message = Some(error.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate the current file once it would exceed this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1 .. <path>.N`.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Defaults for `path`: 8 MiB per file, three generations.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback_path: None,
            max_size_bytes: 8 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }

    /// Primary and fallback files from the configured paths.
    #[must_use]
    pub fn for_paths(paths: &PathsConfig) -> Self {
        Self {
            fallback_path: paths.activity_log_fallback.clone(),
            ..Self::at(&paths.activity_log)
        }
    }
}

pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl std::fmt::Debug for JsonlWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlWriter")
            .field("path", &self.config.path)
            .field("state", &self.state)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl JsonlWriter {
    /// Open the primary file, degrading as far as needed.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&writer.config.path) {
            Ok((file, size)) => writer.attach(file, size, WriterState::Normal),
            Err(error) => {
                tracing::warn!(%error, "activity log unavailable, degrading");
                writer.open_fallback();
            }
        }
        writer
    }

    /// Writer that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            config: JsonlConfig::at(PathBuf::new()),
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> WriterState {
        self.state
    }

    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append one entry and flush it.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        if self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(error) => {
                let _ = writeln!(io::stderr(), "[TVD-JSONL] serialize error: {error}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    fn attach(&mut self, file: File, size: u64, state: WriterState) {
        self.writer = Some(BufWriter::new(file));
        self.bytes_written = size;
        self.state = state;
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.writer.is_some() && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }

        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                let written = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).and_then(|()| w.flush()).is_ok());
                if written {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[TVD-JSONL] {line}").is_err() {
                    self.state = WriterState::Discard;
                }
            }
            WriterState::Discard => {}
        }
    }

    fn open_fallback(&mut self) {
        self.writer = None;
        let opened = self
            .config
            .fallback_path
            .as_deref()
            .map(open_append)
            .and_then(std::result::Result::ok);
        if let Some((file, size)) = opened {
            self.attach(file, size, WriterState::Fallback);
        } else {
            self.state = WriterState::Stderr;
        }
    }

    fn degrade(&mut self) {
        match self.state {
            WriterState::Normal => self.open_fallback(),
            WriterState::Fallback => {
                self.writer = None;
                self.state = WriterState::Stderr;
            }
            WriterState::Stderr | WriterState::Discard => {
                self.writer = None;
                self.state = WriterState::Discard;
            }
        }
    }

    fn rotate(&mut self) {
        self.flush();
        self.writer = None;
        let base = match self.state {
            WriterState::Normal => self.config.path.clone(),
            WriterState::Fallback => match self.config.fallback_path.clone() {
                Some(path) => path,
                None => return,
            },
            WriterState::Stderr | WriterState::Discard => return,
        };

        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&base, keep));
        for generation in (1..keep).rev() {
            let _ = fs::rename(rotated_name(&base, generation), rotated_name(&base, generation + 1));
        }
        if keep > 0 {
            let _ = fs::rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, size)) => {
                let state = self.state;
                self.attach(file, size, state);
            }
            Err(_) => self.degrade(),
        }
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| TvdError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TvdError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

fn rotated_name(base: &Path, generation: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
