//! TVD-prefixed error types with structured error codes.
//!
//! Engine precondition failures are not represented here: they are reported
//! through status enums (see [`crate::engine::Outcome`]). This type covers
//! caller errors at public entry points and external I/O failures.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TvdError>;

/// Top-level error type for tvdeck.
#[derive(Debug, Error)]
pub enum TvdError {
    #[error("[TVD-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TVD-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[TVD-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TVD-2001] library is empty")]
    EmptyStore,

    #[error("[TVD-2002] item index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("[TVD-2003] invalid item: {details}")]
    InvalidItem { details: String },

    #[error("[TVD-2004] library cannot change while a reorder session is open")]
    ReorderBusy,

    #[error("[TVD-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[TVD-2102] failed to persist library to {path}: {details}")]
    Persist { path: PathBuf, details: String },

    #[error("[TVD-3001] failed to launch {target}: {details}")]
    Launch { target: String, details: String },

    #[error("[TVD-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TVD-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[TVD-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl TvdError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "TVD-1001",
            Self::MissingConfig { .. } => "TVD-1002",
            Self::ConfigParse { .. } => "TVD-1003",
            Self::EmptyStore => "TVD-2001",
            Self::IndexOutOfRange { .. } => "TVD-2002",
            Self::InvalidItem { .. } => "TVD-2003",
            Self::ReorderBusy => "TVD-2004",
            Self::Serialization { .. } => "TVD-2101",
            Self::Persist { .. } => "TVD-2102",
            Self::Launch { .. } => "TVD-3001",
            Self::Io { .. } => "TVD-3002",
            Self::ChannelClosed { .. } => "TVD-3003",
            Self::Runtime { .. } => "TVD-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::Persist { .. }
                | Self::Launch { .. }
                | Self::ChannelClosed { .. }
                | Self::ReorderBusy
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for TvdError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TvdError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
