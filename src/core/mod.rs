//! Core types: errors, configuration, time source.

pub mod clock;
pub mod config;
pub mod errors;
