//! Append-only JSONL activity log with graceful degradation.

pub mod jsonl;

pub use jsonl::{ActivityEvent, JsonlConfig, JsonlWriter, LogEntry, Severity, WriterState};
