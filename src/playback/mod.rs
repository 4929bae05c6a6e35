//! Playback module - Timing, session state and the pacing state machine.

mod clock;
mod controller;
pub mod pacing;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{CycleReport, Phase, PlaybackController, PlaybackStats};
pub use pacing::{FrameWait, adjust_interval, frame_wait};
pub use session::PlaybackSession;
