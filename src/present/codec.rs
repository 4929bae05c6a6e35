//! Image codecs producing packed RGB565 pixels.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
}

impl ImageInfo {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }
}

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot parse image header: {0}")]
    Header(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("output holds {actual} pixels, image needs {required}")]
    OutputTooSmall { required: usize, actual: usize },
}

/// A decoder for compressed frames.
pub trait ImageCodec {
    /// Read the image dimensions without decoding pixel data.
    fn info(&mut self, data: &[u8]) -> Result<ImageInfo, CodecError>;

    /// Decode into `out` as row-major RGB565, tightly packed.
    ///
    /// `scratch` is fixed-size working memory for codecs that need it.
    fn decode(
        &mut self,
        data: &[u8],
        out: &mut [u16],
        scratch: &mut [u8],
    ) -> Result<ImageInfo, CodecError>;
}

/// Pack 8-bit RGB into RGB565, optionally byte-swapped for big-endian
/// panel transfers.
#[inline]
pub fn pack_rgb565(r: u8, g: u8, b: u8, swap_bytes: bool) -> u16 {
    let value = ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3);
    if swap_bytes { value.swap_bytes() } else { value }
}

fn check_output(info: ImageInfo, out: &[u16]) -> Result<(), CodecError> {
    if out.len() < info.pixels() {
        return Err(CodecError::OutputTooSmall {
            required: info.pixels(),
            actual: out.len(),
        });
    }
    Ok(())
}

/// Baseline/progressive JPEG decoder.
#[derive(Debug, Default)]
pub struct JpegCodec {
    swap_bytes: bool,
    /// Interleaved 8-bit samples from the decoder, reused across frames.
    staging: Vec<u8>,
}

impl JpegCodec {
    pub fn new(swap_bytes: bool) -> Self {
        Self {
            swap_bytes,
            staging: Vec::new(),
        }
    }

    fn open(data: &[u8]) -> Result<JpegDecoder<Cursor<&[u8]>>, CodecError> {
        JpegDecoder::new(Cursor::new(data)).map_err(|e| CodecError::Header(e.to_string()))
    }
}

impl ImageCodec for JpegCodec {
    fn info(&mut self, data: &[u8]) -> Result<ImageInfo, CodecError> {
        let (width, height) = Self::open(data)?.dimensions();
        Ok(ImageInfo::new(width as usize, height as usize))
    }

    fn decode(
        &mut self,
        data: &[u8],
        out: &mut [u16],
        _scratch: &mut [u8],
    ) -> Result<ImageInfo, CodecError> {
        let decoder = Self::open(data)?;
        let (width, height) = decoder.dimensions();
        let info = ImageInfo::new(width as usize, height as usize);
        check_output(info, out)?;

        let color = decoder.color_type();
        let total = usize::try_from(decoder.total_bytes())
            .map_err(|_| CodecError::Decode("image too large".to_string()))?;
        self.staging.resize(total, 0);
        decoder
            .read_image(&mut self.staging)
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let swap = self.swap_bytes;
        let out = &mut out[..info.pixels()];
        match color {
            ColorType::L8 => {
                for (px, &l) in out.iter_mut().zip(&self.staging) {
                    *px = pack_rgb565(l, l, l, swap);
                }
            }
            ColorType::Rgb8 => {
                for (px, rgb) in out.iter_mut().zip(self.staging.chunks_exact(3)) {
                    *px = pack_rgb565(rgb[0], rgb[1], rgb[2], swap);
                }
            }
            other => {
                return Err(CodecError::Decode(format!(
                    "unsupported color type {:?}",
                    other
                )));
            }
        }
        Ok(info)
    }
}

/// Raw RGB565 frames already in panel byte order, sized to the canvas.
#[derive(Debug, Clone, Copy)]
pub struct Rgb565Codec {
    width: usize,
    height: usize,
}

impl Rgb565Codec {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl ImageCodec for Rgb565Codec {
    fn info(&mut self, data: &[u8]) -> Result<ImageInfo, CodecError> {
        let info = ImageInfo::new(self.width, self.height);
        if data.len() != info.pixels() * 2 {
            return Err(CodecError::Header(format!(
                "raw frame is {} bytes, expected {} for {}x{}",
                data.len(),
                info.pixels() * 2,
                self.width,
                self.height
            )));
        }
        Ok(info)
    }

    fn decode(
        &mut self,
        data: &[u8],
        out: &mut [u16],
        _scratch: &mut [u8],
    ) -> Result<ImageInfo, CodecError> {
        let info = self.info(data)?;
        check_output(info, out)?;
        bytemuck::cast_slice_mut::<u16, u8>(&mut out[..info.pixels()]).copy_from_slice(data);
        Ok(info)
    }
}

/// Dispatches to the JPEG codec on a JPEG marker, to raw RGB565 otherwise.
#[derive(Debug)]
pub struct AutoCodec {
    jpeg: JpegCodec,
    raw: Rgb565Codec,
}

impl AutoCodec {
    pub fn new(width: usize, height: usize, swap_bytes: bool) -> Self {
        Self {
            jpeg: JpegCodec::new(swap_bytes),
            raw: Rgb565Codec::new(width, height),
        }
    }

    /// Codec matching the configured canvas and color order.
    pub fn from_config(config: &crate::schema::PlayerConfig) -> Self {
        Self::new(
            config.logical_width,
            config.logical_height,
            config.swap_color_bytes,
        )
    }

    fn select(&mut self, data: &[u8]) -> &mut dyn ImageCodec {
        if data.starts_with(&JPEG_SOI) {
            &mut self.jpeg
        } else {
            &mut self.raw
        }
    }
}

impl ImageCodec for AutoCodec {
    fn info(&mut self, data: &[u8]) -> Result<ImageInfo, CodecError> {
        self.select(data).info(data)
    }

    fn decode(
        &mut self,
        data: &[u8],
        out: &mut [u16],
        scratch: &mut [u8],
    ) -> Result<ImageInfo, CodecError> {
        self.select(data).decode(data, out, scratch)
    }
}

/// Encode a solid-color JPEG for tests.
#[cfg(test)]
pub(crate) fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    use image::ExtendedColorType;
    use image::codecs::jpeg::JpegEncoder;

    let pixels: Vec<u8> = (0..width * height).flat_map(|_| rgb).collect();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 95)
        .encode(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(px: u16) -> (u16, u16, u16) {
        (px >> 11, (px >> 5) & 0x3F, px & 0x1F)
    }

    #[test]
    fn test_pack_rgb565() {
        assert_eq!(pack_rgb565(0xFF, 0, 0, false), 0xF800);
        assert_eq!(pack_rgb565(0, 0xFF, 0, false), 0x07E0);
        assert_eq!(pack_rgb565(0, 0, 0xFF, false), 0x001F);
        assert_eq!(pack_rgb565(0xFF, 0, 0, true), 0x00F8);
    }

    #[test]
    fn test_jpeg_info_and_decode() {
        let data = solid_jpeg(16, 8, [255, 0, 0]);
        let mut codec = JpegCodec::new(false);
        assert_eq!(codec.info(&data).unwrap(), ImageInfo::new(16, 8));

        let mut out = vec![0u16; 16 * 8];
        let info = codec.decode(&data, &mut out, &mut []).unwrap();
        assert_eq!(info.pixels(), 128);
        for &px in &out {
            let (r, g, b) = channels(px);
            assert!(r >= 28, "red channel too low: {}", r);
            assert!(g <= 4 && b <= 2, "unexpected green/blue: {} {}", g, b);
        }
    }

    #[test]
    fn test_jpeg_garbage_is_header_error() {
        let mut codec = JpegCodec::new(false);
        let err = codec.info(&[0xFF, 0xD8, 0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, CodecError::Header(_)));
    }

    #[test]
    fn test_jpeg_output_too_small() {
        let data = solid_jpeg(8, 8, [0, 0, 255]);
        let mut codec = JpegCodec::new(false);
        let mut out = vec![0u16; 10];
        assert!(matches!(
            codec.decode(&data, &mut out, &mut []),
            Err(CodecError::OutputTooSmall { required: 64, actual: 10 })
        ));
    }

    #[test]
    fn test_raw_frames_copy_verbatim() {
        let mut codec = Rgb565Codec::new(2, 1);
        let data = [0x12, 0x34, 0xAB, 0xCD];
        let mut out = [0u16; 2];
        codec.decode(&data, &mut out, &mut []).unwrap();
        assert_eq!(bytemuck::cast_slice::<u16, u8>(&out), &data);
        assert!(matches!(codec.info(&data[..3]), Err(CodecError::Header(_))));
    }

    #[test]
    fn test_auto_codec_dispatch() {
        let mut codec = AutoCodec::new(4, 4, false);
        let jpeg = solid_jpeg(8, 6, [0, 255, 0]);
        assert_eq!(codec.info(&jpeg).unwrap(), ImageInfo::new(8, 6));
        assert_eq!(codec.info(&[0u8; 32]).unwrap(), ImageInfo::new(4, 4));
    }
}
