//! Flipbook - Looping playback of a preloaded image sequence.
//!
//! This crate plays an ordered list of compressed frames on a small
//! fixed-resolution display, with the playback speed adjusted live from a
//! rotary encoder.
//!
//! # Architecture
//!
//! - `schema`: Playback configuration
//! - `catalog`: Manifest parsing, memory pools, the frame arena and loading
//! - `present`: Codecs, scaling and the display blit
//! - `input`: Quadrature encoder decoding
//! - `playback`: Clock, pacing and the load-then-play state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use flipbook::{
//!     input::SimulatedCounter,
//!     playback::{PlaybackController, SystemClock},
//!     present::{AutoCodec, FramebufferDisplay},
//!     schema::PlayerConfig,
//! };
//!
//! let config = PlayerConfig::default();
//! let codec = AutoCodec::from_config(&config);
//! let display = FramebufferDisplay::new(config.logical_width, config.logical_height);
//!
//! let mut controller = PlaybackController::new(
//!     config,
//!     "frames/manifest.txt",
//!     codec,
//!     display,
//!     SimulatedCounter::new(),
//!     SystemClock::new(),
//! )?;
//!
//! let stats = controller.play(300)?;
//! println!("Presented {} frames, skipped {}", stats.presented, stats.skipped);
//! # Ok::<(), flipbook::PlaybackError>(())
//! ```

pub mod catalog;
pub mod error;
pub mod input;
pub mod playback;
pub mod present;
pub mod schema;

// Re-export commonly used types
pub use error::{PlaybackError, Result};
pub use playback::{PlaybackController, PlaybackSession, PlaybackStats};
pub use schema::PlayerConfig;
