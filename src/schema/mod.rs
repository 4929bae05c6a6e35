//! Schema module - Playback configuration.

mod config;

pub use config::*;
