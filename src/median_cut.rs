//! Median cut color quantization.
//!
//! All sampled pixels start out in a single box. The box whose colors span the widest range
//! along any one channel is then repeatedly sorted along that channel and cut in half at the
//! median, until the requested number of boxes exist or no box can be cut any further.
//! A cut never separates pixels with the same value in the sorted channel: if the median
//! lands inside such a run, the cut moves to the nearest end of the run.
//! Each final box contributes the (rounded) mean of its pixels to the palette.
//!
//! Boxes holding a single pixel, or only copies of one color, are never cut,
//! so an image with no more distinct colors than requested yields exactly those colors.

// Reference: Paul Heckbert, Color image quantization for frame buffer display,
// ACM SIGGRAPH Computer Graphics, vol. 16, no. 3, 297–307, 1982.
// https://doi.org/10.1145/965145.801294

use crate::{Palette, PaletteSize, PixelBuffer, QuantizeOutput};
use palette::{cast, Srgb};
use std::ops::Range;

/// Only every `STRIDE`-th pixel is sampled.
pub const STRIDE: usize = 2;

/// Returns the channel with the widest range among `colors` and the size of that range.
///
/// On ties red is preferred over green, and green over blue.
fn widest_channel(colors: &[[u8; 3]]) -> (usize, u8) {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for color in colors {
        for c in 0..3 {
            min[c] = min[c].min(color[c]);
            max[c] = max[c].max(color[c]);
        }
    }

    let spread: [u8; 3] = std::array::from_fn(|c| max[c].saturating_sub(min[c]));
    let widest = spread[0].max(spread[1]).max(spread[2]);
    let channel = spread.iter().position(|&s| s == widest).unwrap_or(0);
    (channel, widest)
}

/// Returns the rounded mean of the given colors.
#[allow(clippy::cast_possible_truncation)]
fn mean(colors: &[[u8; 3]]) -> Srgb<u8> {
    let n = colors.len() as u64;
    let mut sum = [0u64; 3];
    for color in colors {
        for c in 0..3 {
            sum[c] += u64::from(color[c]);
        }
    }
    cast::from_array(sum.map(|s| ((s + n / 2) / n) as u8))
}

/// Splits the sampled colors into at most `k` boxes, each given by a range of `samples`.
fn cut_boxes(samples: &mut [[u8; 3]], k: usize) -> Vec<Range<usize>> {
    let mut boxes = vec![0..samples.len()];

    while boxes.len() < k {
        let mut best = None::<(usize, usize, u8)>;
        for (i, range) in boxes.iter().enumerate() {
            if range.len() <= 1 {
                continue;
            }
            let (channel, spread) = widest_channel(&samples[range.clone()]);
            if spread > 0 && best.map_or(true, |(_, _, widest)| spread > widest) {
                best = Some((i, channel, spread));
            }
        }

        let Some((i, channel, _)) = best else {
            break;
        };

        let range = boxes[i].clone();
        // stable, so equal keys keep their sampling order across the cut
        samples[range.clone()].sort_by_key(|color| color[channel]);

        let mid = split_index(&samples[range.clone()], channel) + range.start;
        boxes.splice(i..=i, [range.start..mid, mid..range.end]);
    }

    boxes
}

/// Returns where to cut `colors`, which are sorted along `channel` and span a non-zero range.
///
/// This is the median index, unless the median falls inside a run of equal channel values.
/// Then the run boundary closest to the median is used (the lower one on ties),
/// so copies of one color always end up in the same box.
fn split_index(colors: &[[u8; 3]], channel: usize) -> usize {
    let mid = colors.len() / 2;
    let value = colors[mid][channel];
    if colors[mid - 1][channel] != value {
        return mid;
    }

    let lower = colors.partition_point(|color| color[channel] < value);
    let upper = colors.partition_point(|color| color[channel] <= value);
    match (lower > 0, upper < colors.len()) {
        (true, true) if mid - lower <= upper - mid => lower,
        (true, true) | (false, true) => upper,
        (true, false) => lower,
        // a non-zero range means the run cannot cover every color
        (false, false) => mid,
    }
}

/// Computes a palette with at most `palette_size` colors by median cut on the sampled pixels.
///
/// If there are no pixels, a black and white palette is returned.
///
/// # Examples
/// ```
/// # use ditherlab::{median_cut, PaletteSize, PixelBuffer};
/// # use palette::Srgb;
/// let buffer = PixelBuffer::filled(4, 4, [128, 128, 128, 255]);
/// let output = median_cut::palette(&buffer, PaletteSize::try_from(4u8).unwrap());
/// assert_eq!(&*output.palette, &[Srgb::new(128, 128, 128)]);
/// ```
#[must_use]
pub fn palette(buffer: &PixelBuffer, palette_size: PaletteSize) -> QuantizeOutput {
    let mut samples = buffer
        .pixels()
        .iter()
        .step_by(STRIDE)
        .map(|pixel| cast::into_array(pixel.color))
        .collect::<Vec<_>>();

    if samples.is_empty() {
        return QuantizeOutput::fallback();
    }

    let boxes = cut_boxes(&mut samples, palette_size.into());

    tracing::debug!(
        samples = samples.len(),
        boxes = boxes.len(),
        palette_size = palette_size.into_inner(),
        "median cut"
    );

    #[allow(clippy::cast_possible_truncation)]
    let (colors, counts) = boxes
        .into_iter()
        .map(|range| (mean(&samples[range.clone()]), range.len() as u32))
        .unzip();

    #[allow(clippy::expect_used)]
    let palette = Palette::new(colors).expect("at least one box");

    QuantizeOutput { palette, counts }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn sorted(colors: &[Srgb<u8>]) -> Vec<Srgb<u8>> {
        let mut colors = colors.to_vec();
        colors.sort_by_key(|&c| c.into_components());
        colors
    }

    #[test]
    fn empty_input() {
        let buffer = PixelBuffer::new(0, 0, Vec::new()).unwrap();
        assert_eq!(palette(&buffer, PaletteSize::MAX), QuantizeOutput::fallback());
    }

    #[test]
    fn uniform_image_is_not_split() {
        let buffer = PixelBuffer::filled(4, 4, [128, 128, 128, 255]);
        let output = palette(&buffer, PaletteSize::try_from(4u8).unwrap());
        assert_eq!(&*output.palette, &[Srgb::new(128, 128, 128)]);
        assert_eq!(output.counts, vec![8]);
    }

    #[test]
    fn exact_colors_are_recovered() {
        let colors = test_colors(8);
        // each color repeated STRIDE * 4 times, so every color is sampled 4 times
        let pixels = colors
            .iter()
            .flat_map(|&c| [c; STRIDE * 4])
            .collect::<Vec<_>>();
        let buffer = PixelBuffer::from_colors(8, 8, &pixels).unwrap();

        for k in [8u8, 16, 128] {
            let output = palette(&buffer, PaletteSize::try_from(k).unwrap());
            assert_eq!(sorted(&output.palette), sorted(&colors));
            assert_eq!(output.counts, vec![4; 8]);
        }
    }

    #[test]
    fn unbalanced_colors_are_recovered() {
        let dark = Srgb::new(10, 10, 10);
        let light = Srgb::new(200, 200, 200);
        // samples: dark, dark, dark, light
        let pixels = [vec![dark; 6], vec![light; 2]].concat();
        let buffer = PixelBuffer::from_colors(8, 1, &pixels).unwrap();

        let output = palette(&buffer, PaletteSize::MIN);
        assert_eq!(&*output.palette, &[dark, light]);
        assert_eq!(output.counts, vec![3, 1]);
    }

    #[test]
    fn skewed_counts_are_recovered() {
        let colors = test_colors(6);
        let pixels = colors
            .iter()
            .enumerate()
            .flat_map(|(i, &c)| vec![c; STRIDE * (1 + i * i)])
            .collect::<Vec<_>>();
        let buffer = PixelBuffer::from_colors(pixels.len() as u32, 1, &pixels).unwrap();

        for k in [6u8, 7, 64] {
            let output = palette(&buffer, PaletteSize::try_from(k).unwrap());
            assert_eq!(sorted(&output.palette), sorted(&colors));
        }
    }

    #[test]
    fn cut_moves_to_nearest_run_boundary() {
        let a = [1, 0, 0];
        let b = [2, 0, 0];
        let c = [3, 0, 0];
        assert_eq!(split_index(&[a, b, b, b, b, c], 0), 1);
        assert_eq!(split_index(&[a, a, a, b], 0), 3);
        assert_eq!(split_index(&[a, b, b, b], 0), 1);
        assert_eq!(split_index(&[a, a, b, b], 0), 2);
        assert_eq!(split_index(&[a, a, b, b, b, b, b, c], 0), 2);
    }

    #[test]
    fn palette_size_is_respected() {
        let buffer = test_buffer(64, 64);
        for k in [2u8, 3, 7, 32, 128] {
            let output = palette(&buffer, PaletteSize::try_from(k).unwrap());
            assert_eq!(output.palette.len(), usize::from(k));
            let total = output.counts.iter().sum::<u32>() as usize;
            assert_eq!(total, (64 * 64) / STRIDE);
        }
    }

    #[test]
    fn widest_channel_tie_break() {
        assert_eq!(widest_channel(&[[0, 0, 0], [10, 10, 10]]), (0, 10));
        assert_eq!(widest_channel(&[[0, 0, 0], [5, 10, 10]]), (1, 10));
        assert_eq!(widest_channel(&[[0, 0, 0], [5, 5, 10]]), (2, 10));
        assert_eq!(widest_channel(&[[7, 7, 7]]), (0, 0));
    }

    #[test]
    fn two_clusters() {
        let dark = [Srgb::new(10, 20, 30), Srgb::new(12, 22, 32)];
        let light = [Srgb::new(240, 230, 220), Srgb::new(242, 232, 222)];
        let pixels = [dark, light].concat().repeat(8);
        let buffer = PixelBuffer::from_colors(8, 4, &pixels).unwrap();

        // stride 2 samples only the first of each pair
        let output = palette(&buffer, PaletteSize::MIN);
        assert_eq!(
            sorted(&output.palette),
            vec![Srgb::new(10, 20, 30), Srgb::new(240, 230, 220)]
        );
    }

    #[test]
    fn rounded_mean() {
        assert_eq!(mean(&[[0, 0, 0], [1, 2, 3]]), Srgb::new(1, 1, 2));
        assert_eq!(mean(&[[0, 0, 0], [0, 0, 1], [0, 0, 1]]), Srgb::new(0, 0, 1));
    }
}
