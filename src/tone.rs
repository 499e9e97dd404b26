//! Per-pixel tone and color adjustments.
//!
//! Every pixel is transformed independently in the fixed order
//! invert, brightness, contrast, saturation, greyscale.
//! Intermediate values are kept as `f32` and only clamped to `0..=255` at the end,
//! so, for example, a brightness boost followed by a contrast cut does not lose the highlights.

use crate::{types::clamp_u8, PixelBuffer};
#[cfg(feature = "threads")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The tone parameters of a [`ProcessingConfig`](crate::ProcessingConfig).
///
/// The default options leave every pixel unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ToneOptions {
    /// Whether to replace each channel `c` with `255 - c`.
    pub invert: bool,
    /// Added to each channel after scaling by `255`, roughly in `-0.5..=0.5`.
    pub brightness: f32,
    /// The scale applied around the midpoint `128`, roughly in `0.5..=2.0`.
    pub contrast: f32,
    /// The scale applied to each channel's distance from the luminance, in `0.0..=2.0`.
    pub saturation: f32,
    /// Whether to replace each channel with the luminance.
    pub greyscale: bool,
}

impl ToneOptions {
    /// Creates a new [`ToneOptions`] that leaves every pixel unchanged.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            invert: false,
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            greyscale: false,
        }
    }

    /// Whether these options leave every pixel unchanged.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        *self == Self::new()
    }

    /// Applies the adjustment chain to a single RGB triple.
    #[inline]
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn apply(&self, rgb: [u8; 3]) -> [u8; 3] {
        let Self {
            invert,
            brightness,
            contrast,
            saturation,
            greyscale,
        } = *self;

        let mut rgb = rgb.map(f32::from);

        if invert {
            rgb = rgb.map(|c| 255.0 - c);
        }

        let offset = brightness * 255.0;
        rgb = rgb.map(|c| (c + offset - 128.0) * contrast + 128.0);

        if saturation != 1.0 {
            let l = luminance(rgb);
            rgb = rgb.map(|c| l + (c - l) * saturation);
        }

        if greyscale {
            rgb = [luminance(rgb); 3];
        }

        rgb.map(clamp_u8)
    }
}

impl Default for ToneOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The Rec. 601 luma of the given (possibly out of range) RGB values.
#[inline]
fn luminance([r, g, b]: [f32; 3]) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Applies the options to one RGBA pixel, leaving alpha untouched.
#[inline]
fn adjust_pixel(options: &ToneOptions, pixel: &mut [u8]) {
    let [r, g, b] = options.apply([pixel[0], pixel[1], pixel[2]]);
    pixel[0] = r;
    pixel[1] = g;
    pixel[2] = b;
}

/// Returns a copy of `buffer` with the tone adjustments applied to every pixel.
///
/// # Examples
/// ```
/// # use ditherlab::{tone, PixelBuffer, ToneOptions};
/// let buffer = PixelBuffer::filled(1, 1, [96, 96, 96, 255]);
/// let options = ToneOptions { contrast: 2.0, ..ToneOptions::new() };
/// assert_eq!(tone::adjust(&buffer, &options).as_raw(), &[64, 64, 64, 255]);
/// ```
#[must_use]
pub fn adjust(buffer: &PixelBuffer, options: &ToneOptions) -> PixelBuffer {
    let mut data = buffer.as_raw().to_vec();
    if !options.is_identity() {
        for pixel in data.chunks_exact_mut(4) {
            adjust_pixel(options, pixel);
        }
    }
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}

/// Returns a copy of `buffer` with the tone adjustments applied to every pixel in parallel.
#[cfg(feature = "threads")]
#[must_use]
pub fn adjust_par(buffer: &PixelBuffer, options: &ToneOptions) -> PixelBuffer {
    let mut data = buffer.as_raw().to_vec();
    if !options.is_identity() {
        data.par_chunks_exact_mut(4)
            .for_each(|pixel| adjust_pixel(options, pixel));
    }
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}
