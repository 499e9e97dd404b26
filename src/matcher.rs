//! Nearest palette color search.

use crate::{ConfigError, Palette};
use ordered_float::OrderedFloat;
use palette::{cast, Srgb};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{array, fmt::Display, str::FromStr};
use wide::{f32x8, u32x8, CmpLt};

/// The distance used to decide which palette color is nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorMetric {
    /// Squared euclidean distance in RGB.
    #[default]
    Euclidean,
    /// The "redmean" approximation of perceptual distance,
    /// which weights red and blue by the average red of the two colors.
    Redmean,
}

impl ColorMetric {
    /// Returns the distance between `color` and the palette entry `entry` under this metric.
    #[inline]
    #[must_use]
    pub fn distance(self, color: [f32; 3], entry: [f32; 3]) -> f32 {
        let dr = color[0] - entry[0];
        let dg = color[1] - entry[1];
        let db = color[2] - entry[2];
        match self {
            ColorMetric::Euclidean => dr * dr + dg * dg + db * db,
            ColorMetric::Redmean => {
                let r_bar = (color[0] + entry[0]) * 0.5;
                (2.0 + r_bar / 256.0) * (dr * dr)
                    + 4.0 * (dg * dg)
                    + (2.0 + (255.0 - r_bar) / 256.0) * (db * db)
            }
        }
    }

    /// The lanewise version of [`ColorMetric::distance`].
    #[inline]
    fn distance_x8(self, color: [f32x8; 3], entry: [f32x8; 3]) -> f32x8 {
        let dr = color[0] - entry[0];
        let dg = color[1] - entry[1];
        let db = color[2] - entry[2];
        match self {
            ColorMetric::Euclidean => dr * dr + dg * dg + db * db,
            ColorMetric::Redmean => {
                let r_bar = (color[0] + entry[0]) * f32x8::splat(0.5);
                let two = f32x8::splat(2.0);
                let scale = f32x8::splat(256.0);
                (two + r_bar / scale) * (dr * dr)
                    + f32x8::splat(4.0) * (dg * dg)
                    + (two + (f32x8::splat(255.0) - r_bar) / scale) * (db * db)
            }
        }
    }
}

impl Display for ColorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ColorMetric::Euclidean => "euclidean",
            ColorMetric::Redmean => "redmean",
        })
    }
}

impl FromStr for ColorMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" => Ok(ColorMetric::Euclidean),
            "redmean" => Ok(ColorMetric::Redmean),
            _ => Err(ConfigError::UnknownMetric(s.to_owned())),
        }
    }
}

/// Returns the index of the palette entry nearest to `color`, by a plain linear scan.
///
/// Ties go to the earliest entry.
///
/// # Examples
/// ```
/// # use ditherlab::{nearest_index, ColorMetric, Palette};
/// # use palette::Srgb;
/// let palette = Palette::black_and_white();
/// assert_eq!(nearest_index([10.0, 10.0, 10.0], &palette, ColorMetric::Euclidean), 0);
/// assert_eq!(nearest_index([250.0, 250.0, 250.0], &palette, ColorMetric::Redmean), 1);
/// ```
#[must_use]
pub fn nearest_index(color: [f32; 3], palette: &Palette, metric: ColorMetric) -> usize {
    palette
        .iter()
        .map(|&entry| OrderedFloat(metric.distance(color, cast::into_array(entry).map(f32::from))))
        .enumerate()
        .min_by_key(|&(_, d)| d)
        .map_or(0, |(i, _)| i)
}

/// Provides fast nearest palette color lookups.
///
/// The palette is stored as chunks of eight colors laid out by component,
/// so that eight distances are computed at once.
/// Chunks are padded with copies of the first palette color,
/// which can never beat that color due to the tie-break.
#[derive(Debug, Clone)]
pub struct ColorMatcher {
    /// The palette being matched against.
    palette: Palette,
    /// The metric used to compare colors.
    metric: ColorMetric,
    /// The palette indices and components of each chunk of eight colors.
    chunks: Vec<(u32x8, [f32x8; 3])>,
}

impl ColorMatcher {
    /// Builds a lookup table for the given palette and metric.
    #[must_use]
    pub fn new(palette: Palette, metric: ColorMetric) -> Self {
        let colors = palette
            .iter()
            .map(|&color| cast::into_array(color).map(f32::from))
            .collect::<Vec<_>>();

        #[allow(clippy::cast_possible_truncation)]
        let chunks = colors
            .chunks(8)
            .enumerate()
            .map(|(c, chunk)| {
                let index = |i: usize| if i < chunk.len() { (c * 8 + i) as u32 } else { 0 };
                let component = |i: usize, n: usize| chunk.get(i).unwrap_or(&colors[0])[n];
                (
                    u32x8::new(array::from_fn(index)),
                    array::from_fn(|n| f32x8::new(array::from_fn(|i| component(i, n)))),
                )
            })
            .collect();

        Self { palette, metric, chunks }
    }

    /// The palette being matched against.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The metric used to compare colors.
    #[must_use]
    pub const fn metric(&self) -> ColorMetric {
        self.metric
    }

    /// Returns the index of the palette entry nearest to `color`.
    ///
    /// Ties go to the earliest entry, just like [`nearest_index`].
    #[inline]
    #[must_use]
    pub fn nearest_index(&self, color: [f32; 3]) -> usize {
        let point = color.map(f32x8::splat);

        let (mut min_index, components) = self.chunks[0];
        let mut min_distance = self.metric.distance_x8(point, components);

        for &(index, components) in &self.chunks[1..] {
            let distance = self.metric.distance_x8(point, components);
            // strictly less, so each lane keeps the earliest of equal entries
            let less = distance.cmp_lt(min_distance);
            let mask = u32x8::new(less.to_array().map(f32::to_bits));
            min_index = mask.blend(index, min_index);
            min_distance = less.blend(distance, min_distance);
        }

        let mut best = (f32::INFINITY, u32::MAX);
        for (&d, &i) in min_distance.as_array_ref().iter().zip(min_index.as_array_ref()) {
            if d < best.0 || (d == best.0 && i < best.1) {
                best = (d, i);
            }
        }

        if best.1 == u32::MAX {
            // only reachable when every distance is NaN
            0
        } else {
            best.1 as usize
        }
    }

    /// Returns the palette color nearest to `color`.
    #[inline]
    #[must_use]
    pub fn nearest(&self, color: [f32; 3]) -> Srgb<u8> {
        self.palette[self.nearest_index(color)]
    }
}
