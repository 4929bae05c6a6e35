//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

use crate::present::{CodecError, DisplayError};
use crate::schema::ConfigError;

/// Error type for load and playback operations.
///
/// Load-phase errors are fatal to the load and reach the caller. Play-phase
/// errors are reported per frame and never stop the sequence.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Cannot open {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No valid frames in manifest {}", .0.display())]
    NoValidFrames(PathBuf),

    #[error("Out of memory: {requested} bytes from the {pool} pool")]
    OutOfMemory { pool: String, requested: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Frame decode failed: {0}")]
    DecodeFailed(#[from] CodecError),

    #[error("Canvas too small: need {required} pixels, have {actual}")]
    Undersized { required: usize, actual: usize },

    #[error("Display transfer failed: {0}")]
    DisplayFailed(#[from] DisplayError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PlaybackError {
    /// Build a `NotFound` error for a path.
    pub fn not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::NotFound {
            path: path.into(),
            source,
        }
    }

    /// Build an `OutOfMemory` error for a named pool.
    pub fn out_of_memory(pool: impl Into<String>, requested: usize) -> Self {
        Self::OutOfMemory {
            pool: pool.into(),
            requested,
        }
    }
}

/// Result type for flipbook operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
