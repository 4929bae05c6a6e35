//! Decode, scale and blit a single frame.

use super::codec::{CodecError, ImageCodec, ImageInfo};
use super::display::DisplayDriver;
use super::scale::{Placement, ScaleFactor, upscale_nearest};
use crate::error::{PlaybackError, Result};

/// What was shown for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presented {
    /// Dimensions reported by the codec.
    pub decoded: ImageInfo,
    /// Scaled size and position on the canvas.
    pub placement: Placement,
}

/// Decode `data`, upscale and center it on the `logical` canvas, and blit the
/// result.
///
/// A frame already at canvas size is decoded straight into `canvas`. Smaller
/// frames are decoded into a temporary buffer of their own size and, when
/// scaled, expanded into `canvas` before the blit.
pub fn present_frame<C, D>(
    data: &[u8],
    codec: &mut C,
    display: &mut D,
    canvas: &mut [u16],
    scratch: &mut [u8],
    logical: ImageInfo,
) -> Result<Presented>
where
    C: ImageCodec + ?Sized,
    D: DisplayDriver + ?Sized,
{
    if data.is_empty() {
        return Err(PlaybackError::InvalidArgument(
            "empty frame data".to_string(),
        ));
    }
    if canvas.len() < logical.pixels() {
        return Err(PlaybackError::Undersized {
            required: logical.pixels(),
            actual: canvas.len(),
        });
    }

    let decoded = codec.info(data)?;
    if decoded.pixels() == 0 {
        return Err(CodecError::Header(format!(
            "degenerate dimensions {}x{}",
            decoded.width, decoded.height
        ))
        .into());
    }
    let placement = Placement::compute(decoded, logical.width, logical.height).ok_or(
        PlaybackError::Undersized {
            required: decoded.pixels(),
            actual: logical.pixels(),
        },
    )?;

    if decoded == logical {
        codec.decode(data, canvas, scratch)?;
        display.draw_bitmap(0, 0, logical.width, logical.height, &canvas[..logical.pixels()])?;
        return Ok(Presented { decoded, placement });
    }

    let mut temp = Vec::new();
    temp.try_reserve_exact(decoded.pixels())
        .map_err(|_| PlaybackError::out_of_memory("heap", decoded.pixels() * 2))?;
    temp.resize(decoded.pixels(), 0u16);
    codec.decode(data, &mut temp, scratch)?;

    let (x1, y1) = placement.end();
    let pixels: &[u16] = if placement.scale == ScaleFactor::One {
        &temp
    } else {
        let scaled = &mut canvas[..placement.pixels()];
        upscale_nearest(
            &temp,
            decoded.width,
            decoded.height,
            placement.scale.factor(),
            scaled,
        );
        scaled
    };
    display.draw_bitmap(placement.x, placement.y, x1, y1, pixels)?;

    Ok(Presented { decoded, placement })
}
