//! Present module - Codecs, display contract, scaling and the per-frame pipeline.

pub mod codec;
mod display;
mod pipeline;
pub mod scale;

pub use codec::{AutoCodec, CodecError, ImageCodec, ImageInfo, JpegCodec, Rgb565Codec, pack_rgb565};
pub use display::{DisplayDriver, DisplayError, FramebufferDisplay};
pub use pipeline::{Presented, present_frame};
pub use scale::{Placement, ScaleFactor, upscale_nearest};
