//! Square-kernel spatial filtering (box blur and sharpen).
//!
//! Samples outside of the image are taken from the nearest edge pixel,
//! so filtered images have no dark or wrapped borders.

use crate::{types::clamp_u8, PixelBuffer};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// A square convolution kernel with an odd side length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// The side length of the kernel.
    size: usize,
    /// The row-major weights.
    weights: Vec<f32>,
    /// The weighted sum is divided by this value.
    divisor: f32,
}

impl Kernel {
    /// Creates a new [`Kernel`] from row-major weights.
    ///
    /// Returns `None` if the number of weights is not the square of an odd number
    /// or if `divisor` is zero or not finite.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn new(weights: Vec<f32>, divisor: f32) -> Option<Self> {
        let size = (1usize..).find(|s| s * s >= weights.len()).unwrap_or(0);
        if size * size == weights.len() && size % 2 == 1 && divisor.is_finite() && divisor != 0.0 {
            Some(Self { size, weights, divisor })
        } else {
            None
        }
    }

    /// The 3x3 box blur kernel: all ones with a divisor of `9`.
    #[must_use]
    pub fn box_blur() -> Self {
        Self { size: 3, weights: vec![1.0; 9], divisor: 9.0 }
    }

    /// The 3x3 sharpen kernel for the given strength (`0.0..=10.0`).
    ///
    /// With `s = strength / 2` the kernel is `[0, -s, 0; -s, 4s + 1, -s; 0, -s, 0]`.
    #[must_use]
    pub fn sharpen(strength: f32) -> Self {
        let s = strength * 0.5;
        #[rustfmt::skip]
        let weights = vec![
            0.0, -s, 0.0,
            -s, 4.0 * s + 1.0, -s,
            0.0, -s, 0.0,
        ];
        Self { size: 3, weights, divisor: 1.0 }
    }

    /// The side length of the kernel.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Computes the filtered RGB values of one output row.
    fn filter_row(&self, input: &PixelBuffer, y: usize, row: &mut [u8]) {
        let width = input.width() as usize;
        let height = input.height() as usize;
        let data = input.as_raw();
        let half = self.size / 2;

        for x in 0..width {
            let mut sum = [0.0f32; 3];
            for ky in 0..self.size {
                let py = (y + ky).saturating_sub(half).min(height - 1);
                for kx in 0..self.size {
                    let px = (x + kx).saturating_sub(half).min(width - 1);
                    let weight = self.weights[ky * self.size + kx];
                    let i = (py * width + px) * 4;
                    for (s, &v) in sum.iter_mut().zip(&data[i..(i + 3)]) {
                        *s += f32::from(v) * weight;
                    }
                }
            }

            let out = &mut row[(x * 4)..(x * 4 + 4)];
            for (o, s) in out.iter_mut().zip(sum) {
                *o = clamp_u8(s / self.divisor);
            }
            // alpha keeps the value copied from the input
        }
    }
}

/// Applies the kernel to every pixel of `buffer`. Alpha passes through unchanged.
///
/// # Examples
/// ```
/// # use ditherlab::{convolution::{self, Kernel}, PixelBuffer};
/// let buffer = PixelBuffer::filled(3, 3, [40, 80, 120, 255]);
/// // a flat image is a fixed point of the box blur
/// assert_eq!(convolution::convolve(&buffer, &Kernel::box_blur()), buffer);
/// ```
#[must_use]
pub fn convolve(buffer: &PixelBuffer, kernel: &Kernel) -> PixelBuffer {
    let mut data = buffer.as_raw().to_vec();
    if !buffer.is_empty() {
        let row_len = buffer.width() as usize * 4;
        for (y, row) in data.chunks_exact_mut(row_len).enumerate() {
            kernel.filter_row(buffer, y, row);
        }
    }
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}

/// Applies the kernel to every pixel of `buffer` in parallel. Alpha passes through unchanged.
#[cfg(feature = "threads")]
#[must_use]
pub fn convolve_par(buffer: &PixelBuffer, kernel: &Kernel) -> PixelBuffer {
    let mut data = buffer.as_raw().to_vec();
    if !buffer.is_empty() {
        let row_len = buffer.width() as usize * 4;
        data.par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| kernel.filter_row(buffer, y, row));
    }
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}

/// The number of box blur passes for the given strength: `ceil(strength / 2)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn blur_passes(strength: f32) -> usize {
    if strength > 0.0 {
        (strength / 2.0).ceil() as usize
    } else {
        0
    }
}

/// Sharpens `buffer` with a single pass of [`Kernel::sharpen`].
/// A strength of `0` returns an unchanged copy.
#[must_use]
pub fn sharpen(buffer: &PixelBuffer, strength: f32) -> PixelBuffer {
    if strength > 0.0 {
        convolve(buffer, &Kernel::sharpen(strength))
    } else {
        buffer.clone()
    }
}

/// Blurs `buffer` with [`blur_passes`] consecutive passes of [`Kernel::box_blur`].
#[must_use]
pub fn blur(buffer: &PixelBuffer, strength: f32) -> PixelBuffer {
    let kernel = Kernel::box_blur();
    (0..blur_passes(strength)).fold(buffer.clone(), |image, _| convolve(&image, &kernel))
}

/// The parallel version of [`sharpen`].
#[cfg(feature = "threads")]
#[must_use]
pub fn sharpen_par(buffer: &PixelBuffer, strength: f32) -> PixelBuffer {
    if strength > 0.0 {
        convolve_par(buffer, &Kernel::sharpen(strength))
    } else {
        buffer.clone()
    }
}

/// The parallel version of [`blur`].
#[cfg(feature = "threads")]
#[must_use]
pub fn blur_par(buffer: &PixelBuffer, strength: f32) -> PixelBuffer {
    let kernel = Kernel::box_blur();
    (0..blur_passes(strength)).fold(buffer.clone(), |image, _| convolve_par(&image, &kernel))
}
