//! The playback state machine: load once, then present frames forever.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::clock::Clock;
use super::pacing::{FrameWait, adjust_interval, frame_wait};
use super::session::PlaybackSession;
use crate::catalog::{LoadSummary, MemoryPools};
use crate::error::{PlaybackError, Result};
use crate::input::{PulseCounter, QuadratureDecoder};
use crate::present::{DisplayDriver, ImageCodec, ImageInfo, Presented, present_frame};
use crate::schema::PlayerConfig;

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Playing,
}

/// Running counters for a playback session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Completed play cycles.
    pub cycles: u64,
    /// Frames shown on the display.
    pub presented: u64,
    /// Frames skipped after a decode or display failure.
    pub skipped: u64,
    /// Cycles whose decode and present time met or exceeded the interval.
    pub overruns: u64,
    /// Passes over the full catalog.
    pub loops: u64,
}

/// What happened during one play cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Catalog index of the frame.
    pub index: usize,
    /// Placement of the frame, or `None` if it was skipped.
    pub presented: Option<Presented>,
    /// Decode plus present time.
    pub elapsed_ms: u64,
    /// Encoder steps observed this cycle.
    pub steps: i32,
    /// Interval in force after applying `steps`.
    pub target_interval_ms: u32,
    pub wait: FrameWait,
}

/// Drives loading and paced presentation.
///
/// `C` decodes frames, `D` shows them, `P` is the encoder's pulse counter
/// and `K` supplies time and suspension points.
pub struct PlaybackController<C, D, P, K> {
    config: PlayerConfig,
    manifest_path: PathBuf,
    pools: MemoryPools,
    session: PlaybackSession,
    codec: C,
    display: D,
    encoder: QuadratureDecoder<P>,
    clock: K,
    phase: Phase,
    index: usize,
    stats: PlaybackStats,
}

impl<C, D, P, K> PlaybackController<C, D, P, K>
where
    C: ImageCodec,
    D: DisplayDriver,
    P: PulseCounter,
    K: Clock,
{
    /// Create a controller in the loading phase.
    pub fn new<Q: AsRef<Path>>(
        config: PlayerConfig,
        manifest_path: Q,
        codec: C,
        display: D,
        counter: P,
        clock: K,
    ) -> Result<Self> {
        config.validate()?;
        let pools = MemoryPools::from_config(&config);
        let session = PlaybackSession::new(&config);
        let encoder = QuadratureDecoder::new(counter, &config);
        Ok(Self {
            config,
            manifest_path: manifest_path.as_ref().to_path_buf(),
            pools,
            session,
            codec,
            display,
            encoder,
            clock,
            phase: Phase::Loading,
            index: 0,
            stats: PlaybackStats::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn encoder(&self) -> &QuadratureDecoder<P> {
        &self.encoder
    }

    pub fn pools(&self) -> &MemoryPools {
        &self.pools
    }

    /// Index of the frame the next cycle presents.
    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Run the loading phase. A second call returns the first summary.
    ///
    /// Errors leave the controller in the loading phase.
    pub fn load(&mut self) -> Result<LoadSummary> {
        let summary = self.session.load(
            &self.manifest_path,
            &self.config,
            &self.pools,
            &self.clock,
        )?;
        if self.phase == Phase::Loading {
            info!(
                "playing {} frames at {} ms",
                summary.frames,
                self.session.target_interval_ms()
            );
            self.phase = Phase::Playing;
        }
        Ok(summary)
    }

    /// Run one play cycle, loading first if needed.
    ///
    /// Only load failures are returned. Frame failures are logged, counted
    /// and skipped.
    pub fn tick(&mut self) -> Result<CycleReport> {
        if self.phase == Phase::Loading {
            self.load()?;
        }

        let index = self.index;
        let logical = ImageInfo::new(self.config.logical_width, self.config.logical_height);
        let start = self.clock.now_ms();

        let outcome = match self
            .session
            .arena_mut()
            .and_then(|arena| arena.frame_parts(index))
        {
            Some((data, canvas, work)) => present_frame(
                data,
                &mut self.codec,
                &mut self.display,
                canvas,
                work,
                logical,
            ),
            None => Err(PlaybackError::InvalidArgument(format!(
                "no frame at index {}",
                index
            ))),
        };
        let presented = match outcome {
            Ok(presented) => {
                self.stats.presented += 1;
                Some(presented)
            }
            Err(e) => {
                let name = self
                    .session
                    .arena()
                    .and_then(|arena| arena.catalog().get(index))
                    .map_or("?", |frame| frame.name.as_str());
                warn!("frame {} ({}) skipped: {}", index, name, e);
                self.stats.skipped += 1;
                None
            }
        };

        let now = self.clock.now_ms();
        let elapsed_ms = now.saturating_sub(start);

        let steps = self.encoder.get_delta(now);
        if steps != 0 {
            let interval = adjust_interval(self.session.target_interval_ms(), steps, &self.config);
            debug!("encoder {:+} -> interval {} ms", steps, interval);
            self.session.set_target_interval_ms(interval);
        }
        let target_interval_ms = self.session.target_interval_ms();

        let wait = frame_wait(target_interval_ms, elapsed_ms, self.config.anti_tear_delay_ms);
        if wait.is_overrun() {
            self.stats.overruns += 1;
            debug!(
                "frame {} took {} ms against {} ms",
                index, elapsed_ms, target_interval_ms
            );
        }
        self.clock.sleep_ms(wait.ms());

        self.index += 1;
        if self.index >= self.session.frame_count() {
            self.index = 0;
            self.stats.loops += 1;
        }
        self.stats.cycles += 1;
        if self.stats.cycles % self.config.yield_every as u64 == 0 {
            self.clock.yield_now();
        }

        Ok(CycleReport {
            index,
            presented,
            elapsed_ms,
            steps,
            target_interval_ms,
            wait,
        })
    }

    /// Play `cycles` frames, loading first if needed.
    pub fn play(&mut self, cycles: u64) -> Result<PlaybackStats> {
        for _ in 0..cycles {
            self.tick()?;
        }
        Ok(self.stats)
    }

    /// Load, then play forever. Returns only if loading fails.
    pub fn run(&mut self) -> Result<Infallible> {
        self.load()?;
        loop {
            self.tick()?;
        }
    }
}
