//! Contains the dithering methods.
//!
//! There are four families of methods:
//! - [`DitherMethod::Threshold`] maps each pixel straight to its nearest palette color.
//! - [`DitherMethod::RandomNoise`] adds seeded random noise to each pixel before matching.
//! - The ordered methods (Bayer and cluster dot) add a position dependent offset
//!   taken from a repeating [`ThresholdMatrix`] before matching.
//! - The error diffusion methods match each pixel and then spread the difference between the pixel
//!   and its match onto the unvisited neighbors according to a [`DiffusionKernel`].
//!
//! Only error diffusion depends on the order in which pixels are visited,
//! so only error diffusion honors serpentine scanning.

use crate::{ColorMatcher, ConfigError, FloatBuffer, PixelBuffer};
use palette::cast;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
#[cfg(feature = "threads")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{array, fmt::Display, str::FromStr};

/// A square matrix of thresholds for ordered dithering, tiled across the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdMatrix {
    /// The side length of the matrix.
    size: usize,
    /// The row-major thresholds, each in `0..size * size`.
    values: &'static [u8],
}

impl ThresholdMatrix {
    /// The side length of the matrix.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The row-major threshold values.
    #[must_use]
    pub const fn values(&self) -> &'static [u8] {
        self.values
    }

    /// The number of threshold levels, which the raw values are divided by.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn divisor(&self) -> f32 {
        (self.size * self.size) as f32
    }

    /// Returns the normalized threshold for the pixel at `(x, y)`, in `-0.5..0.5`.
    #[inline]
    #[must_use]
    pub fn threshold(&self, x: usize, y: usize) -> f32 {
        let value = self.values[(y % self.size) * self.size + x % self.size];
        f32::from(value) / self.divisor() - 0.5
    }
}

/// Bayer 2x2 ordered dither matrix.
#[rustfmt::skip]
pub const BAYER_2X2: ThresholdMatrix = ThresholdMatrix {
    size: 2,
    values: &[
        0, 2,
        3, 1,
    ],
};

/// Bayer 4x4 ordered dither matrix.
#[rustfmt::skip]
pub const BAYER_4X4: ThresholdMatrix = ThresholdMatrix {
    size: 4,
    values: &[
        0, 8, 2, 10,
        12, 4, 14, 6,
        3, 11, 1, 9,
        15, 7, 13, 5,
    ],
};

/// Bayer 8x8 ordered dither matrix.
#[rustfmt::skip]
pub const BAYER_8X8: ThresholdMatrix = ThresholdMatrix {
    size: 8,
    values: &[
        0, 32, 8, 40, 2, 34, 10, 42,
        48, 16, 56, 24, 50, 18, 58, 26,
        12, 44, 4, 36, 14, 46, 6, 38,
        60, 28, 52, 20, 62, 30, 54, 22,
        3, 35, 11, 43, 1, 33, 9, 41,
        51, 19, 59, 27, 49, 17, 57, 25,
        15, 47, 7, 39, 13, 45, 5, 37,
        63, 31, 55, 23, 61, 29, 53, 21,
    ],
};

/// Clustered dot 4x4 halftone matrix.
#[rustfmt::skip]
pub const CLUSTER_DOT_4X4: ThresholdMatrix = ThresholdMatrix {
    size: 4,
    values: &[
        12, 5, 6, 13,
        4, 0, 1, 7,
        11, 3, 2, 8,
        15, 10, 9, 14,
    ],
};

/// Clustered dot 8x8 halftone matrix.
///
/// This is two offset dot screens, so a few levels repeat and others are skipped.
#[rustfmt::skip]
pub const CLUSTER_DOT_8X8: ThresholdMatrix = ThresholdMatrix {
    size: 8,
    values: &[
        24, 10, 12, 26, 35, 47, 49, 37,
        8, 0, 2, 14, 45, 59, 61, 49,
        22, 6, 4, 16, 43, 63, 62, 51,
        30, 20, 18, 28, 33, 55, 57, 39,
        34, 46, 48, 36, 25, 11, 13, 27,
        44, 58, 60, 48, 9, 1, 3, 15,
        42, 62, 63, 50, 23, 7, 5, 17,
        32, 54, 56, 38, 31, 21, 19, 29,
    ],
};

/// The neighbor offsets and weights used to spread the error of a pixel.
///
/// Each entry is `(dx, dy, weight)`, relative to a left to right scan.
/// The share a neighbor receives is `weight / divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionKernel {
    /// The `(dx, dy, weight)` entries.
    offsets: &'static [(i8, i8, u8)],
    /// The weights are divided by this value.
    divisor: u8,
}

impl DiffusionKernel {
    /// The raw `(dx, dy, weight)` entries.
    #[must_use]
    pub const fn offsets(&self) -> &'static [(i8, i8, u8)] {
        self.offsets
    }

    /// The value the weights are divided by.
    #[must_use]
    pub const fn divisor(&self) -> u8 {
        self.divisor
    }

    /// Returns the `(dx, dy, share)` of every neighbor.
    pub fn shares(&self) -> impl Iterator<Item = (i64, i64, f32)> + '_ {
        let divisor = f32::from(self.divisor);
        self.offsets
            .iter()
            .map(move |&(dx, dy, w)| (i64::from(dx), i64::from(dy), f32::from(w) / divisor))
    }
}

/// Floyd–Steinberg error diffusion.
pub const FLOYD_STEINBERG: DiffusionKernel = DiffusionKernel {
    offsets: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// Atkinson error diffusion. Only 6/8 of the error is passed on.
pub const ATKINSON: DiffusionKernel = DiffusionKernel {
    offsets: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 8,
};

/// Jarvis, Judice, and Ninke error diffusion.
pub const JARVIS_JUDICE_NINKE: DiffusionKernel = DiffusionKernel {
    offsets: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
};

/// Stucki error diffusion.
pub const STUCKI: DiffusionKernel = DiffusionKernel {
    offsets: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
    divisor: 42,
};

/// Burkes error diffusion.
pub const BURKES: DiffusionKernel = DiffusionKernel {
    offsets: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ],
    divisor: 32,
};

/// Sierra (three row) error diffusion.
pub const SIERRA: DiffusionKernel = DiffusionKernel {
    offsets: &[
        (1, 0, 5),
        (2, 0, 3),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 5),
        (1, 1, 4),
        (2, 1, 2),
        (-1, 2, 2),
        (0, 2, 3),
        (1, 2, 2),
    ],
    divisor: 32,
};

/// Two-row Sierra error diffusion.
pub const TWO_ROW_SIERRA: DiffusionKernel = DiffusionKernel {
    offsets: &[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ],
    divisor: 16,
};

/// Sierra Lite error diffusion.
pub const SIERRA_LITE: DiffusionKernel = DiffusionKernel {
    offsets: &[(1, 0, 2), (-1, 1, 1), (0, 1, 1)],
    divisor: 4,
};

/// The seed of the noise stream for row `y`.
fn row_seed(seed: u64, y: usize) -> u64 {
    seed ^ (y as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// The peak-to-peak amplitude of the noise added by [`DitherMethod::RandomNoise`] at full strength.
pub const NOISE_AMPLITUDE: f32 = 50.0;

/// The dithering method to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DitherMethod {
    /// Nearest color only.
    Threshold,
    /// Seeded random noise before matching.
    RandomNoise,
    /// Ordered dithering with [`BAYER_2X2`].
    #[cfg_attr(feature = "serde", serde(rename = "bayer-2x2"))]
    Bayer2x2,
    /// Ordered dithering with [`BAYER_4X4`].
    #[cfg_attr(feature = "serde", serde(rename = "bayer-4x4"))]
    Bayer4x4,
    /// Ordered dithering with [`BAYER_8X8`].
    #[cfg_attr(feature = "serde", serde(rename = "bayer-8x8"))]
    Bayer8x8,
    /// Halftoning with [`CLUSTER_DOT_4X4`].
    #[cfg_attr(feature = "serde", serde(rename = "cluster-dot-4x4"))]
    ClusterDot4x4,
    /// Halftoning with [`CLUSTER_DOT_8X8`].
    #[cfg_attr(feature = "serde", serde(rename = "cluster-dot-8x8"))]
    ClusterDot8x8,
    /// Error diffusion with [`FLOYD_STEINBERG`].
    #[default]
    FloydSteinberg,
    /// Error diffusion with [`ATKINSON`].
    Atkinson,
    /// Error diffusion with [`JARVIS_JUDICE_NINKE`].
    JarvisJudiceNinke,
    /// Error diffusion with [`STUCKI`].
    Stucki,
    /// Error diffusion with [`BURKES`].
    Burkes,
    /// Error diffusion with [`SIERRA`].
    Sierra,
    /// Error diffusion with [`TWO_ROW_SIERRA`].
    TwoRowSierra,
    /// Error diffusion with [`SIERRA_LITE`].
    SierraLite,
}

/// How a [`DitherMethod`] perturbs or propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DitherKind {
    Threshold,
    Noise,
    Ordered(&'static ThresholdMatrix),
    Diffusion(&'static DiffusionKernel),
}

impl DitherMethod {
    /// Every dithering method, in the order they are usually presented.
    pub const ALL: [Self; 15] = [
        Self::Threshold,
        Self::RandomNoise,
        Self::Bayer2x2,
        Self::Bayer4x4,
        Self::Bayer8x8,
        Self::ClusterDot4x4,
        Self::ClusterDot8x8,
        Self::FloydSteinberg,
        Self::Atkinson,
        Self::JarvisJudiceNinke,
        Self::Stucki,
        Self::Burkes,
        Self::Sierra,
        Self::TwoRowSierra,
        Self::SierraLite,
    ];

    /// The human readable name of this method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Threshold => "Threshold",
            Self::RandomNoise => "Random Noise",
            Self::Bayer2x2 => "Bayer 2x2 (Ordered)",
            Self::Bayer4x4 => "Bayer 4x4 (Ordered)",
            Self::Bayer8x8 => "Bayer 8x8 (Ordered)",
            Self::ClusterDot4x4 => "Cluster Dot 4x4 (Halftone)",
            Self::ClusterDot8x8 => "Cluster Dot 8x8 (Halftone)",
            Self::FloydSteinberg => "Floyd-Steinberg",
            Self::Atkinson => "Atkinson",
            Self::JarvisJudiceNinke => "Jarvis, Judice, and Ninke",
            Self::Stucki => "Stucki",
            Self::Burkes => "Burkes",
            Self::Sierra => "Sierra",
            Self::TwoRowSierra => "Two-Row Sierra",
            Self::SierraLite => "Sierra Lite",
        }
    }

    /// The short kebab-case identifier of this method.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::RandomNoise => "random-noise",
            Self::Bayer2x2 => "bayer-2x2",
            Self::Bayer4x4 => "bayer-4x4",
            Self::Bayer8x8 => "bayer-8x8",
            Self::ClusterDot4x4 => "cluster-dot-4x4",
            Self::ClusterDot8x8 => "cluster-dot-8x8",
            Self::FloydSteinberg => "floyd-steinberg",
            Self::Atkinson => "atkinson",
            Self::JarvisJudiceNinke => "jarvis-judice-ninke",
            Self::Stucki => "stucki",
            Self::Burkes => "burkes",
            Self::Sierra => "sierra",
            Self::TwoRowSierra => "two-row-sierra",
            Self::SierraLite => "sierra-lite",
        }
    }

    fn kind(self) -> DitherKind {
        match self {
            Self::Threshold => DitherKind::Threshold,
            Self::RandomNoise => DitherKind::Noise,
            Self::Bayer2x2 => DitherKind::Ordered(&BAYER_2X2),
            Self::Bayer4x4 => DitherKind::Ordered(&BAYER_4X4),
            Self::Bayer8x8 => DitherKind::Ordered(&BAYER_8X8),
            Self::ClusterDot4x4 => DitherKind::Ordered(&CLUSTER_DOT_4X4),
            Self::ClusterDot8x8 => DitherKind::Ordered(&CLUSTER_DOT_8X8),
            Self::FloydSteinberg => DitherKind::Diffusion(&FLOYD_STEINBERG),
            Self::Atkinson => DitherKind::Diffusion(&ATKINSON),
            Self::JarvisJudiceNinke => DitherKind::Diffusion(&JARVIS_JUDICE_NINKE),
            Self::Stucki => DitherKind::Diffusion(&STUCKI),
            Self::Burkes => DitherKind::Diffusion(&BURKES),
            Self::Sierra => DitherKind::Diffusion(&SIERRA),
            Self::TwoRowSierra => DitherKind::Diffusion(&TWO_ROW_SIERRA),
            Self::SierraLite => DitherKind::Diffusion(&SIERRA_LITE),
        }
    }

    /// The threshold matrix of an ordered method.
    #[must_use]
    pub fn matrix(self) -> Option<&'static ThresholdMatrix> {
        match self.kind() {
            DitherKind::Ordered(matrix) => Some(matrix),
            _ => None,
        }
    }

    /// The kernel of an error diffusion method.
    #[must_use]
    pub fn kernel(self) -> Option<&'static DiffusionKernel> {
        match self.kind() {
            DitherKind::Diffusion(kernel) => Some(kernel),
            _ => None,
        }
    }

    /// Whether this method propagates error to neighboring pixels.
    #[must_use]
    pub fn is_error_diffusion(self) -> bool {
        self.kernel().is_some()
    }
}

impl Display for DitherMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DitherMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|method| {
                method.name().eq_ignore_ascii_case(name) || method.id().eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| ConfigError::UnknownMethod(s.to_owned()))
    }
}

/// Applies a [`DitherMethod`] against the palette of a [`ColorMatcher`].
///
/// # Examples
/// ```
/// # use ditherlab::{ColorMatcher, ColorMetric, DitherMethod, Ditherer, Palette, PixelBuffer};
/// # use palette::Srgb;
/// let buffer = PixelBuffer::from_colors(
///     2,
///     1,
///     &[Srgb::new(10, 10, 10), Srgb::new(250, 250, 250)],
/// ).unwrap();
/// let matcher = ColorMatcher::new(Palette::black_and_white(), ColorMetric::Euclidean);
/// let output = Ditherer::new(DitherMethod::Threshold).dither(&buffer, &matcher);
/// assert_eq!(output.as_raw(), &[0, 0, 0, 255, 255, 255, 255, 255]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ditherer {
    /// The method to apply.
    method: DitherMethod,
    /// Scales the ordered and noise offsets and the propagated error, in `0.0..=1.0`.
    strength: f32,
    /// Whether odd rows are scanned right to left (error diffusion only).
    serpentine: bool,
    /// The seed of the random noise.
    seed: u64,
}

impl Ditherer {
    /// The default dither strength.
    pub const DEFAULT_STRENGTH: f32 = 1.0;

    /// Creates a new [`Ditherer`] with full strength, no serpentine scanning, and a seed of `0`.
    #[must_use]
    pub const fn new(method: DitherMethod) -> Self {
        Self {
            method,
            strength: Self::DEFAULT_STRENGTH,
            serpentine: false,
            seed: 0,
        }
    }

    /// Sets the dither strength.
    ///
    /// This will return `None` if `strength` is not in the range `0.0..=1.0`.
    #[must_use]
    pub fn with_strength(self, strength: f32) -> Option<Self> {
        if (0.0..=1.0).contains(&strength) {
            Some(Self { strength, ..self })
        } else {
            None
        }
    }

    /// Sets whether odd rows are scanned right to left.
    /// This only affects error diffusion methods.
    #[must_use]
    pub const fn serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Sets the seed used by [`DitherMethod::RandomNoise`].
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The method being applied.
    #[must_use]
    pub const fn method(&self) -> DitherMethod {
        self.method
    }

    /// The dither strength.
    #[must_use]
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    /// Dithers one row in place, for the methods that do not propagate error.
    fn dither_row(&self, matcher: &ColorMatcher, y: usize, row: &mut [u8]) {
        let kind = self.method.kind();
        let amplitude = 255.0 * self.strength;
        // one stream per row keeps rows independent of each other
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(row_seed(self.seed, y));

        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let offset = match kind {
                DitherKind::Threshold | DitherKind::Diffusion(_) => 0.0,
                DitherKind::Noise => (rng.gen::<f32>() - 0.5) * NOISE_AMPLITUDE * self.strength,
                DitherKind::Ordered(matrix) => matrix.threshold(x, y) * amplitude,
            };

            let rgb = array::from_fn(|c| f32::from(pixel[c]) + offset);
            let matched = cast::into_array(matcher.nearest(rgb));
            pixel[..3].copy_from_slice(&matched);
        }
    }

    /// Runs error diffusion over the whole image.
    fn diffuse(&self, buffer: &PixelBuffer, matcher: &ColorMatcher, kernel: &DiffusionKernel) -> PixelBuffer {
        let mut image = FloatBuffer::from(buffer);
        let width = i64::from(buffer.width());

        for y in 0..buffer.height() {
            let reverse = self.serpentine && y % 2 == 1;
            let y = i64::from(y);
            for i in 0..width {
                let x = if reverse { width - 1 - i } else { i };

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let old = image.rgb(x as u32, y as u32);
                let new = cast::into_array(matcher.nearest(old)).map(f32::from);
                image.set_rgb(x, y, new);

                let error = array::from_fn(|c| old[c] - new[c]);
                for (dx, dy, share) in kernel.shares() {
                    let dx = if reverse { -dx } else { dx };
                    image.add_rgb(x + dx, y + dy, error, share * self.strength);
                }
            }
        }

        image.to_pixel_buffer()
    }

    /// Returns a copy of `buffer` where every color is replaced by a color of the matcher's palette.
    /// Alpha is copied from the input.
    #[must_use]
    pub fn dither(&self, buffer: &PixelBuffer, matcher: &ColorMatcher) -> PixelBuffer {
        tracing::debug!(method = self.method.id(), strength = self.strength, "dither");

        if buffer.is_empty() {
            return buffer.clone();
        }

        if let Some(kernel) = self.method.kernel() {
            return self.diffuse(buffer, matcher, kernel);
        }

        let mut data = buffer.as_raw().to_vec();
        let row_len = buffer.width() as usize * 4;
        for (y, row) in data.chunks_exact_mut(row_len).enumerate() {
            self.dither_row(matcher, y, row);
        }
        PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
    }

    /// The parallel version of [`Ditherer::dither`].
    ///
    /// Error diffusion is inherently sequential and runs on the calling thread.
    /// The other methods process rows in parallel and give the same output as [`Ditherer::dither`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn dither_par(&self, buffer: &PixelBuffer, matcher: &ColorMatcher) -> PixelBuffer {
        if buffer.is_empty() || self.method.is_error_diffusion() {
            return self.dither(buffer, matcher);
        }

        tracing::debug!(method = self.method.id(), strength = self.strength, "dither");

        let mut data = buffer.as_raw().to_vec();
        let row_len = buffer.width() as usize * 4;
        data.par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| self.dither_row(matcher, y, row));
        PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{tests::*, ColorMetric, Palette};
    use palette::Srgb;

    fn bw() -> ColorMatcher {
        ColorMatcher::new(Palette::black_and_white(), ColorMetric::Euclidean)
    }

    /// A horizontal gradient with some vertical variation.
    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let colors = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    #[allow(clippy::cast_possible_truncation)]
                    let v = ((x * 255) / width.max(1)) as u8;
                    #[allow(clippy::cast_possible_truncation)]
                    let w = ((y * 97) % 256) as u8;
                    Srgb::new(v, v / 2 + w / 2, 255 - v)
                })
            })
            .collect::<Vec<_>>();
        PixelBuffer::from_colors(width, height, &colors).unwrap()
    }

    #[test]
    fn threshold_two_pixels() {
        let buffer =
            PixelBuffer::from_colors(2, 1, &[Srgb::new(10, 10, 10), Srgb::new(250, 250, 250)])
                .unwrap();
        let output = Ditherer::new(DitherMethod::Threshold).dither(&buffer, &bw());
        assert_eq!(
            output.colors().collect::<Vec<_>>(),
            vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]
        );
    }

    #[test]
    fn floyd_steinberg_mid_grey_is_half_white() {
        let buffer = PixelBuffer::filled(64, 64, [128, 128, 128, 255]);
        let output = Ditherer::new(DitherMethod::FloydSteinberg).dither(&buffer, &bw());

        let white = output.colors().filter(|&c| c == Srgb::new(255, 255, 255)).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = white as f32 / (64.0 * 64.0);
        assert!((ratio - 0.5).abs() < 0.02, "white ratio {ratio}");
    }

    #[test]
    fn kernel_weights_sum_to_one() {
        for method in DitherMethod::ALL {
            if let Some(kernel) = method.kernel() {
                let sum = kernel.shares().map(|(_, _, share)| share).sum::<f32>();
                let expected = if method == DitherMethod::Atkinson { 0.75 } else { 1.0 };
                assert!((sum - expected).abs() < 1e-6, "{method}: {sum}");
            }
        }
    }

    #[test]
    fn kernels_only_push_forward() {
        for method in DitherMethod::ALL {
            if let Some(kernel) = method.kernel() {
                for (dx, dy, _) in kernel.shares() {
                    assert!(dy > 0 || (dy == 0 && dx > 0), "{method}: ({dx}, {dy})");
                }
            }
        }
    }

    #[test]
    fn matrix_values_are_below_divisor() {
        for method in DitherMethod::ALL {
            if let Some(matrix) = method.matrix() {
                assert_eq!(matrix.values().len(), matrix.size() * matrix.size());
                for &v in matrix.values() {
                    assert!(f32::from(v) < matrix.divisor());
                }
            }
        }

        for matrix in [BAYER_2X2, BAYER_4X4, BAYER_8X8, CLUSTER_DOT_4X4] {
            let mut values = matrix.values().to_vec();
            values.sort_unstable();
            assert!(values.iter().enumerate().all(|(i, &v)| usize::from(v) == i));
        }
    }

    #[test]
    fn method_classes() {
        let ordered = DitherMethod::ALL.iter().filter(|m| m.matrix().is_some()).count();
        let diffusion = DitherMethod::ALL.iter().filter(|m| m.is_error_diffusion()).count();
        assert_eq!(ordered, 5);
        assert_eq!(diffusion, 8);
    }

    #[test]
    fn output_stays_within_palette() {
        let buffer = test_buffer(23, 17);
        let palette = Palette::new(test_colors(11)).unwrap();
        for metric in [ColorMetric::Euclidean, ColorMetric::Redmean] {
            let matcher = ColorMatcher::new(palette.clone(), metric);
            for method in DitherMethod::ALL {
                for serpentine in [false, true] {
                    let output = Ditherer::new(method).serpentine(serpentine).dither(&buffer, &matcher);
                    assert_eq!(output.dimensions(), buffer.dimensions());
                    assert!(output.colors().all(|c| palette.contains(&c)), "{method}");
                }
            }
        }
    }

    #[test]
    fn alpha_is_copied() {
        let buffer = test_buffer(9, 9);
        for method in DitherMethod::ALL {
            let output = Ditherer::new(method).dither(&buffer, &bw());
            for (a, b) in buffer.pixels().iter().zip(output.pixels()) {
                assert_eq!(a.alpha, b.alpha);
            }
        }
    }

    #[test]
    fn serpentine_changes_error_diffusion() {
        let buffer = gradient(31, 12);
        let matcher = bw();
        for method in DitherMethod::ALL.into_iter().filter(|m| m.is_error_diffusion()) {
            let forward = Ditherer::new(method).dither(&buffer, &matcher);
            let serpentine = Ditherer::new(method).serpentine(true).dither(&buffer, &matcher);
            assert_ne!(forward, serpentine, "{method}");

            // the first row is scanned left to right either way
            assert_eq!(forward.as_raw()[..31 * 4], serpentine.as_raw()[..31 * 4]);
        }
    }

    #[test]
    fn serpentine_is_ignored_without_error_diffusion() {
        let buffer = gradient(31, 12);
        let matcher = bw();
        for method in DitherMethod::ALL.into_iter().filter(|m| !m.is_error_diffusion()) {
            let ditherer = Ditherer::new(method).seed(7);
            assert_eq!(
                ditherer.dither(&buffer, &matcher),
                ditherer.serpentine(true).dither(&buffer, &matcher),
                "{method}"
            );
        }
    }

    #[test]
    fn ordered_pixels_are_independent() {
        let buffer = test_buffer(19, 13);
        let matcher = ColorMatcher::new(Palette::new(test_colors(6)).unwrap(), ColorMetric::Euclidean);

        for method in DitherMethod::ALL {
            let (matrix, amplitude) = match method.kind() {
                DitherKind::Threshold => (None, 0.0),
                DitherKind::Ordered(matrix) => (Some(matrix), 255.0 * 0.6),
                _ => continue,
            };

            let output = Ditherer::new(method).with_strength(0.6).unwrap().dither(&buffer, &matcher);
            for y in 0..13 {
                for x in 0..19 {
                    let rgb = cast::into_array(buffer.pixel(x, y).unwrap().color).map(f32::from);
                    let offset = matrix.map_or(0.0, |m| m.threshold(x as usize, y as usize) * amplitude);
                    let expected = matcher.nearest(rgb.map(|c| c + offset));
                    assert_eq!(output.pixel(x, y).unwrap().color, expected, "{method}");
                }
            }
        }
    }

    #[test]
    fn random_noise_is_seeded() {
        let buffer = PixelBuffer::filled(32, 32, [128, 128, 128, 255]);
        let matcher = bw();
        let ditherer = Ditherer::new(DitherMethod::RandomNoise);
        assert_eq!(ditherer.dither(&buffer, &matcher), ditherer.dither(&buffer, &matcher));
        assert_ne!(
            ditherer.seed(1).dither(&buffer, &matcher),
            ditherer.seed(2).dither(&buffer, &matcher)
        );
    }

    #[test]
    fn adjacent_seeds_do_not_shift_rows() {
        let buffer = PixelBuffer::filled(64, 4, [128, 128, 128, 255]);
        let matcher = bw();
        let ditherer = Ditherer::new(DitherMethod::RandomNoise);
        let a = ditherer.seed(1).dither(&buffer, &matcher);
        let b = ditherer.seed(2).dither(&buffer, &matcher);

        let row = |image: &PixelBuffer, y: usize| image.as_raw()[y * 64 * 4..(y + 1) * 64 * 4].to_vec();
        for y in 0..3 {
            assert_ne!(row(&a, y + 1), row(&b, y));
            assert_ne!(row(&b, y + 1), row(&a, y));
        }
        assert_ne!(row_seed(1, 1), row_seed(2, 0));
    }

    #[test]
    fn random_noise_keeps_greys_grey() {
        let buffer = PixelBuffer::filled(16, 16, [120, 120, 120, 255]);
        let palette = Palette::new(vec![
            Srgb::new(0, 0, 0),
            Srgb::new(128, 128, 128),
            Srgb::new(255, 255, 255),
            Srgb::new(120, 160, 120),
        ])
        .unwrap();
        let matcher = ColorMatcher::new(palette, ColorMetric::Euclidean);
        let output = Ditherer::new(DitherMethod::RandomNoise).dither(&buffer, &matcher);
        assert!(output.colors().all(|c| c.red == c.green && c.green == c.blue));
    }

    #[test]
    fn zero_strength_is_threshold() {
        let buffer = test_buffer(17, 11);
        let matcher = ColorMatcher::new(Palette::new(test_colors(5)).unwrap(), ColorMetric::Redmean);
        let expected = Ditherer::new(DitherMethod::Threshold).dither(&buffer, &matcher);
        for method in DitherMethod::ALL {
            let ditherer = Ditherer::new(method).with_strength(0.0).unwrap().serpentine(true);
            assert_eq!(ditherer.dither(&buffer, &matcher), expected, "{method}");
        }
    }

    #[test]
    fn strength_is_validated() {
        let ditherer = Ditherer::new(DitherMethod::Atkinson);
        assert!(ditherer.with_strength(1.5).is_none());
        assert!(ditherer.with_strength(-0.1).is_none());
        assert!(ditherer.with_strength(f32::NAN).is_none());
        assert_eq!(ditherer.with_strength(0.25).unwrap().strength(), 0.25);
    }

    #[test]
    fn exact_match_image_unaffected() {
        let palette = Palette::new(test_colors(16)).unwrap();
        let colors = palette.iter().copied().cycle().take(12 * 8).collect::<Vec<_>>();
        let buffer = PixelBuffer::from_colors(12, 8, &colors).unwrap();
        let matcher = ColorMatcher::new(palette, ColorMetric::Euclidean);
        for method in DitherMethod::ALL.into_iter().filter(|m| m.is_error_diffusion()) {
            assert_eq!(Ditherer::new(method).dither(&buffer, &matcher), buffer, "{method}");
        }
    }

    #[test]
    fn empty_inputs() {
        let buffer = PixelBuffer::new(0, 0, Vec::new()).unwrap();
        for method in DitherMethod::ALL {
            assert_eq!(Ditherer::new(method).dither(&buffer, &bw()), buffer);
            #[cfg(feature = "threads")]
            assert_eq!(Ditherer::new(method).dither_par(&buffer, &bw()), buffer);
        }
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let buffer = test_buffer(40, 37);
        let matcher = ColorMatcher::new(Palette::new(test_colors(9)).unwrap(), ColorMetric::Euclidean);
        for method in DitherMethod::ALL {
            let ditherer = Ditherer::new(method).seed(3).serpentine(true);
            assert_eq!(
                ditherer.dither(&buffer, &matcher),
                ditherer.dither_par(&buffer, &matcher),
                "{method}"
            );
        }
    }

    #[test]
    fn parse_method() {
        for method in DitherMethod::ALL {
            assert_eq!(method.name().parse(), Ok(method));
            assert_eq!(method.id().parse(), Ok(method));
            assert_eq!(method.to_string().parse(), Ok(method));
        }
        assert_eq!("jarvis, judice, and ninke".parse(), Ok(DitherMethod::JarvisJudiceNinke));
        assert_eq!(" Bayer-8x8 ".parse(), Ok(DitherMethod::Bayer8x8));
        assert_eq!(
            "Riemersma".parse::<DitherMethod>(),
            Err(ConfigError::UnknownMethod("Riemersma".to_owned()))
        );
    }
}
