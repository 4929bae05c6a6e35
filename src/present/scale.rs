//! Integer upscaling and centering on the logical canvas.

use super::codec::ImageInfo;

/// Integer scale factor applied to a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleFactor {
    One,
    Two,
    Three,
}

impl ScaleFactor {
    /// Pick the scale factor for a decoded frame.
    ///
    /// Double only when the frame is exactly half the canvas; otherwise
    /// triple whenever the tripled frame still fits.
    pub fn select(decoded: ImageInfo, logical_width: usize, logical_height: usize) -> Self {
        if decoded.width * 2 == logical_width && decoded.height * 2 == logical_height {
            ScaleFactor::Two
        } else if decoded.width * 3 <= logical_width && decoded.height * 3 <= logical_height {
            ScaleFactor::Three
        } else {
            ScaleFactor::One
        }
    }

    #[inline]
    pub fn factor(self) -> usize {
        match self {
            ScaleFactor::One => 1,
            ScaleFactor::Two => 2,
            ScaleFactor::Three => 3,
        }
    }
}

/// Where a frame lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub scale: ScaleFactor,
    /// Width after scaling.
    pub width: usize,
    /// Height after scaling.
    pub height: usize,
    /// Left edge on the canvas.
    pub x: usize,
    /// Top edge on the canvas.
    pub y: usize,
}

impl Placement {
    /// Scale and center `decoded` on the canvas.
    ///
    /// Returns `None` when the frame is larger than the canvas.
    pub fn compute(decoded: ImageInfo, logical_width: usize, logical_height: usize) -> Option<Self> {
        let scale = ScaleFactor::select(decoded, logical_width, logical_height);
        let width = decoded.width * scale.factor();
        let height = decoded.height * scale.factor();
        if width > logical_width || height > logical_height {
            return None;
        }
        Some(Self {
            scale,
            width,
            height,
            x: (logical_width - width) / 2,
            y: (logical_height - height) / 2,
        })
    }

    /// Scaled pixel count.
    #[inline]
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    /// Exclusive end coordinates `(x1, y1)`.
    #[inline]
    pub fn end(&self) -> (usize, usize) {
        (self.x + self.width, self.y + self.height)
    }
}

/// Nearest-neighbor upscale of a packed `src_width` x `src_height` image by
/// `factor`, written packed into `dst`.
///
/// # Panics
/// Panics if `src` or `dst` is smaller than the image they must hold.
pub fn upscale_nearest(
    src: &[u16],
    src_width: usize,
    src_height: usize,
    factor: usize,
    dst: &mut [u16],
) {
    let dst_width = src_width * factor;
    let dst_row_block = dst_width * factor;
    assert!(src.len() >= src_width * src_height, "source too small");
    assert!(dst.len() >= dst_row_block * src_height, "destination too small");
    if src_width == 0 || src_height == 0 {
        return;
    }

    if factor == 1 {
        dst[..src_width * src_height].copy_from_slice(&src[..src_width * src_height]);
        return;
    }

    for (src_row, block) in src
        .chunks_exact(src_width)
        .take(src_height)
        .zip(dst.chunks_exact_mut(dst_row_block))
    {
        let (first, rest) = block.split_at_mut(dst_width);
        for (&px, out) in src_row.iter().zip(first.chunks_exact_mut(factor)) {
            out.fill(px);
        }
        for row in rest.chunks_exact_mut(dst_width) {
            row.copy_from_slice(first);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_double_only_on_exact_half() {
        assert_eq!(
            ScaleFactor::select(ImageInfo::new(160, 120), 320, 240),
            ScaleFactor::Two
        );
        assert_eq!(
            ScaleFactor::select(ImageInfo::new(150, 120), 320, 240),
            ScaleFactor::One
        );
    }

    #[test]
    fn test_select_triple_when_it_fits() {
        assert_eq!(
            ScaleFactor::select(ImageInfo::new(80, 60), 320, 240),
            ScaleFactor::Three
        );
        assert_eq!(
            ScaleFactor::select(ImageInfo::new(120, 90), 320, 240),
            ScaleFactor::One
        );
        assert_eq!(
            ScaleFactor::select(ImageInfo::new(320, 240), 320, 240),
            ScaleFactor::One
        );
    }

    #[test]
    fn test_eighty_by_sixty_lands_centered() {
        let placement = Placement::compute(ImageInfo::new(80, 60), 320, 240).unwrap();
        assert_eq!(placement.scale, ScaleFactor::Three);
        assert_eq!((placement.width, placement.height), (240, 180));
        assert_eq!((placement.x, placement.y), (40, 30));
        assert_eq!(placement.end(), (280, 210));
    }

    #[test]
    fn test_oversized_frame_has_no_placement() {
        assert!(Placement::compute(ImageInfo::new(400, 200), 320, 240).is_none());
    }

    #[test]
    fn test_odd_margin_truncates() {
        let placement = Placement::compute(ImageInfo::new(101, 77), 320, 240).unwrap();
        assert_eq!(placement.scale, ScaleFactor::Three);
        assert_eq!((placement.x, placement.y), (8, 4));
    }

    #[test]
    fn test_upscale_triple() {
        let src = [1u16, 2, 3, 4];
        let mut dst = [0u16; 36];
        upscale_nearest(&src, 2, 2, 3, &mut dst);
        assert_eq!(&dst[0..6], &[1, 1, 1, 2, 2, 2]);
        assert_eq!(&dst[12..18], &[1, 1, 1, 2, 2, 2]);
        assert_eq!(&dst[18..24], &[3, 3, 3, 4, 4, 4]);
        assert_eq!(&dst[30..36], &[3, 3, 3, 4, 4, 4]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn double_is_exact_replication(
                w in 1usize..24,
                h in 1usize..24,
                seed in any::<u16>(),
            ) {
                let src: Vec<u16> = (0..w * h).map(|i| (i as u16).wrapping_mul(31) ^ seed).collect();
                let mut dst = vec![0u16; w * h * 4];
                upscale_nearest(&src, w, h, 2, &mut dst);
                let dw = w * 2;
                for y in 0..h {
                    for x in 0..w {
                        let s = src[y * w + x];
                        prop_assert_eq!(dst[2 * y * dw + 2 * x], s);
                        prop_assert_eq!(dst[2 * y * dw + 2 * x + 1], s);
                        prop_assert_eq!(dst[(2 * y + 1) * dw + 2 * x], s);
                        prop_assert_eq!(dst[(2 * y + 1) * dw + 2 * x + 1], s);
                    }
                }
            }

            #[test]
            fn placement_stays_on_canvas(
                w in 1usize..400,
                h in 1usize..300,
                lw in 1usize..400,
                lh in 1usize..300,
            ) {
                if let Some(p) = Placement::compute(ImageInfo::new(w, h), lw, lh) {
                    prop_assert!(p.x + p.width <= lw);
                    prop_assert!(p.y + p.height <= lh);
                    prop_assert_eq!(p.width, w * p.scale.factor());
                    prop_assert_eq!(p.height, h * p.scale.factor());
                } else {
                    prop_assert!(w > lw || h > lh);
                }
            }
        }
    }
}
