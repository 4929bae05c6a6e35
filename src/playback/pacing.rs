//! Frame interval arithmetic.

use crate::schema::PlayerConfig;

/// How long to wait after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameWait {
    /// The frame finished early; sleep the rest of the interval.
    Remaining(u64),
    /// The frame met or overran its interval; sleep the anti-tear delay.
    Overrun(u64),
}

impl FrameWait {
    /// Milliseconds to sleep.
    #[inline]
    pub fn ms(self) -> u64 {
        match self {
            FrameWait::Remaining(ms) | FrameWait::Overrun(ms) => ms,
        }
    }

    #[inline]
    pub fn is_overrun(self) -> bool {
        matches!(self, FrameWait::Overrun(_))
    }
}

/// Apply `steps` encoder steps to `current`, saturating at the configured
/// bounds.
pub fn adjust_interval(current: u32, steps: i32, config: &PlayerConfig) -> u32 {
    let change = i64::from(steps) * i64::from(config.interval_step_ms);
    config.clamp_interval(i64::from(current) + change)
}

/// Wait owed after a frame that took `elapsed_ms` against `target_ms`.
pub fn frame_wait(target_ms: u32, elapsed_ms: u64, anti_tear_ms: u32) -> FrameWait {
    let target = u64::from(target_ms);
    if elapsed_ms >= target {
        FrameWait::Overrun(u64::from(anti_tear_ms))
    } else {
        FrameWait::Remaining(target - elapsed_ms)
    }
}
