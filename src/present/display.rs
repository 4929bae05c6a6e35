//! Display driver contract and an in-memory panel.

use std::fs;
use std::io;
use std::path::Path;

/// Error type for display transfers.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("rectangle ({x0},{y0})-({x1},{y1}) outside {width}x{height} panel")]
    OutOfBounds {
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        width: usize,
        height: usize,
    },

    #[error("rectangle needs {required} pixels, got {actual}")]
    ShortPixelData { required: usize, actual: usize },

    #[error("panel transfer failed: {0}")]
    Transfer(String),
}

/// A panel accepting rectangular RGB565 blits.
pub trait DisplayDriver {
    /// Copy `pixels` (row-major, `x1 - x0` wide) to the rectangle
    /// `[x0, x1) x [y0, y1)`. Returns once the transfer is queued.
    fn draw_bitmap(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        pixels: &[u16],
    ) -> Result<(), DisplayError>;
}

/// Headless panel that keeps its contents in memory.
#[derive(Debug, Clone)]
pub struct FramebufferDisplay {
    width: usize,
    height: usize,
    pixels: Vec<u16>,
    blits: u64,
}

impl FramebufferDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            blits: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Panel contents, row-major.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.pixels[y * self.width + x]
    }

    /// Number of successful blits.
    pub fn blits(&self) -> u64 {
        self.blits
    }

    /// Write the panel contents as raw RGB565 bytes.
    pub fn save_raw<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, bytemuck::cast_slice::<u16, u8>(&self.pixels))
    }
}

impl DisplayDriver for FramebufferDisplay {
    fn draw_bitmap(
        &mut self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        pixels: &[u16],
    ) -> Result<(), DisplayError> {
        if x0 > x1 || y0 > y1 || x1 > self.width || y1 > self.height {
            return Err(DisplayError::OutOfBounds {
                x0,
                y0,
                x1,
                y1,
                width: self.width,
                height: self.height,
            });
        }
        let rect_width = x1 - x0;
        let required = rect_width * (y1 - y0);
        if pixels.len() < required {
            return Err(DisplayError::ShortPixelData {
                required,
                actual: pixels.len(),
            });
        }
        if rect_width > 0 {
            for (row, src) in (y0..y1).zip(pixels.chunks_exact(rect_width)) {
                let start = row * self.width + x0;
                self.pixels[start..start + rect_width].copy_from_slice(src);
            }
        }
        self.blits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_blit_rectangle() {
        let mut display = FramebufferDisplay::new(4, 3);
        display.draw_bitmap(1, 1, 3, 3, &[1, 2, 3, 4]).unwrap();
        assert_eq!(display.pixel(1, 1), 1);
        assert_eq!(display.pixel(2, 1), 2);
        assert_eq!(display.pixel(1, 2), 3);
        assert_eq!(display.pixel(2, 2), 4);
        assert_eq!(display.pixel(0, 0), 0);
        assert_eq!(display.blits(), 1);
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let mut display = FramebufferDisplay::new(4, 3);
        let err = display.draw_bitmap(2, 0, 5, 1, &[0; 3]).unwrap_err();
        assert!(matches!(err, DisplayError::OutOfBounds { x1: 5, .. }));
        assert_eq!(display.blits(), 0);
    }

    #[test]
    fn test_rejects_short_pixel_data() {
        let mut display = FramebufferDisplay::new(4, 3);
        assert!(matches!(
            display.draw_bitmap(0, 0, 2, 2, &[0; 3]),
            Err(DisplayError::ShortPixelData { required: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_save_raw() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.rgb565");
        let mut display = FramebufferDisplay::new(2, 1);
        display.draw_bitmap(0, 0, 2, 1, &[0x0102, 0x0304]).unwrap();
        display.save_raw(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 4);
    }
}
