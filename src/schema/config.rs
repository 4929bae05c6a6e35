//! Configuration types for flipbook playback parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

/// How raw pulse counts are turned into reported steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Report the full raw count difference.
    #[default]
    Continuous,
    /// Report whole detents only; partial detents stay pending.
    Detent,
}

/// Top-level playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Logical canvas width in pixels (after panel rotation).
    pub logical_width: usize,
    /// Logical canvas height in pixels.
    pub logical_height: usize,
    /// Bytes per output pixel. Only packed 16-bit color is supported.
    pub bytes_per_pixel: usize,
    /// Frame interval used when playback starts.
    pub initial_interval_ms: u32,
    /// Fastest allowed frame interval.
    pub min_interval_ms: u32,
    /// Slowest allowed frame interval.
    pub max_interval_ms: u32,
    /// Interval change per encoder step.
    pub interval_step_ms: u32,
    /// Sleep applied when a frame overran its interval.
    pub anti_tear_delay_ms: u32,
    /// Minimum time between two reported encoder events.
    pub debounce_ms: u32,
    /// Absolute raw count above which the pulse counter is cleared.
    pub drift_threshold: i16,
    /// Encoder reporting mode.
    pub encoder_mode: EncoderMode,
    /// Raw counts per mechanical detent (used in detent mode).
    pub counts_per_detent: i16,
    /// Codec scratch buffer size in bytes.
    pub work_buffer_size: usize,
    /// Longest accepted frame file name.
    pub max_filename_len: usize,
    /// Longest accepted resolved frame path.
    pub max_path_len: usize,
    /// Cooperative yield cadence (manifest lines / frames).
    pub yield_every: usize,
    /// Directory frame names are resolved against.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Budget of the large, slow memory pool.
    pub slow_pool_bytes: usize,
    /// Budget of the small, fast memory pool.
    pub fast_pool_bytes: usize,
    /// Emit RGB565 pixels high byte first.
    pub swap_color_bytes: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            logical_width: 320,
            logical_height: 240,
            bytes_per_pixel: 2,
            initial_interval_ms: 100,
            min_interval_ms: 20,
            max_interval_ms: 500,
            interval_step_ms: 10,
            anti_tear_delay_ms: 1,
            debounce_ms: 50,
            drift_threshold: 16_000,
            encoder_mode: EncoderMode::Continuous,
            counts_per_detent: 4,
            work_buffer_size: 3100,
            max_filename_len: 64,
            max_path_len: 256,
            yield_every: 10,
            base_dir: default_base_dir(),
            slow_pool_bytes: 4 * 1024 * 1024,
            fast_pool_bytes: 160 * 1024,
            swap_color_bytes: true,
        }
    }
}

impl PlayerConfig {
    /// Number of pixels on the logical canvas.
    #[inline]
    pub fn canvas_pixels(&self) -> usize {
        self.logical_width * self.logical_height
    }

    /// Clamp an interval into the configured pacing bounds.
    #[inline]
    pub fn clamp_interval(&self, interval_ms: i64) -> u32 {
        interval_ms.clamp(self.min_interval_ms as i64, self.max_interval_ms as i64) as u32
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logical_width == 0 || self.logical_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.bytes_per_pixel != 2 {
            return Err(ConfigError::UnsupportedPixelSize(self.bytes_per_pixel));
        }
        if self.min_interval_ms > self.max_interval_ms {
            return Err(ConfigError::InvalidIntervalBounds {
                min: self.min_interval_ms,
                max: self.max_interval_ms,
            });
        }
        if self.initial_interval_ms < self.min_interval_ms
            || self.initial_interval_ms > self.max_interval_ms
        {
            return Err(ConfigError::InitialIntervalOutOfBounds(
                self.initial_interval_ms,
            ));
        }
        if self.interval_step_ms == 0 {
            return Err(ConfigError::InvalidIntervalStep);
        }
        if self.yield_every == 0 {
            return Err(ConfigError::InvalidYieldCadence);
        }
        if self.counts_per_detent <= 0 {
            return Err(ConfigError::InvalidCountsPerDetent(self.counts_per_detent));
        }
        if self.drift_threshold <= 0 {
            return Err(ConfigError::InvalidDriftThreshold(self.drift_threshold));
        }
        if self.max_filename_len == 0 || self.max_path_len == 0 {
            return Err(ConfigError::InvalidNameLimits);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Canvas dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Unsupported bytes per pixel {0}, only 2 (RGB565) is supported")]
    UnsupportedPixelSize(usize),
    #[error("Interval bounds are inverted: min {min} ms > max {max} ms")]
    InvalidIntervalBounds { min: u32, max: u32 },
    #[error("Initial interval {0} ms lies outside the interval bounds")]
    InitialIntervalOutOfBounds(u32),
    #[error("Interval step must be non-zero")]
    InvalidIntervalStep,
    #[error("Yield cadence must be non-zero")]
    InvalidYieldCadence,
    #[error("Counts per detent must be positive, got {0}")]
    InvalidCountsPerDetent(i16),
    #[error("Drift threshold must be positive, got {0}")]
    InvalidDriftThreshold(i16),
    #[error("File name and path limits must be non-zero")]
    InvalidNameLimits,
}
