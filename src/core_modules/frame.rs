// THEORY:
// A `Frame` is the read-only image handed to the descriptor extractor. Decoding is
// somebody else's job: whatever loaded the image (the `image` crate, a camera, a
// test) hands over width, height and a flat buffer, and the `Frame` checks that the
// three agree before anything reads a single pixel.
//
// Like `Pixel`, a `Frame` is a "dumb" container. It does not know about bins or
// histograms; it only guarantees that `pixels()` yields exactly width × height RGB
// samples in row-major order.

use crate::core_modules::pixel::pixel::{self, Byte, Pixel, RGB_CHANNELS, RGBA_CHANNELS};
use crate::error::{InvalidInput, RetrievalResult};

/// A rectangular grid of RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The width of the frame in pixels.
    width: u32,
    /// The height of the frame in pixels.
    height: u32,
    /// Row-major pixel data, exactly `width * height` entries.
    pixels: Vec<Pixel>,
}

impl Frame {
    /// Builds a frame from already separated pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> RetrievalResult<Self> {
        let expected = Self::expected_len(width, height, 1)?;
        if pixels.len() != expected {
            return Err(InvalidInput::BufferSizeMismatch { expected, actual: pixels.len() }.into());
        }
        Ok(Self { width, height, pixels })
    }

    /// Builds a frame from a packed RGB buffer (3 bytes per pixel).
    pub fn from_rgb_bytes(width: u32, height: u32, buffer: &[Byte]) -> RetrievalResult<Self> {
        Self::from_packed(width, height, buffer, RGB_CHANNELS)
    }

    /// Builds a frame from a packed RGBA buffer (4 bytes per pixel). Alpha is discarded.
    pub fn from_rgba_bytes(width: u32, height: u32, buffer: &[Byte]) -> RetrievalResult<Self> {
        Self::from_packed(width, height, buffer, RGBA_CHANNELS)
    }

    fn from_packed(width: u32, height: u32, buffer: &[Byte], channels: usize) -> RetrievalResult<Self> {
        let expected = Self::expected_len(width, height, channels)?;
        if buffer.len() != expected {
            return Err(InvalidInput::BufferSizeMismatch { expected, actual: buffer.len() }.into());
        }
        let pixels = buffer
            .chunks_exact(channels)
            .filter_map(pixel::from_bytes)
            .collect();
        Ok(Self { width, height, pixels })
    }

    /// `width * height * channels`, rejecting products that overflow `usize`.
    fn expected_len(width: u32, height: u32, channels: usize) -> RetrievalResult<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| InvalidInput::DimensionsTooLarge { width, height }.into())
    }

    /// A frame where every pixel has the same color.
    pub fn solid(width: u32, height: u32, color: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}

impl From<&image::RgbImage> for Frame {
    fn from(image: &image::RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.pixels().map(|rgb| Pixel::from(*rgb)).collect(),
        }
    }
}

impl From<&image::DynamicImage> for Frame {
    /// Converts any decoded image to 8-bit RGB first; grayscale is replicated across
    /// channels and alpha is dropped.
    fn from(image: &image::DynamicImage) -> Self {
        Frame::from(&image.to_rgb8())
    }
}
