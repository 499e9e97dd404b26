//! Popularity color quantization.
//!
//! This method simply counts how often each exact RGB color occurs among a regular sample of
//! the pixels and keeps the most frequent ones. It is very fast and preserves the exact colors of
//! flat artwork (pixel art, screenshots, logos), but it ignores rare colors entirely,
//! so photographs with smooth gradients tend to lose their highlights and accents.

use crate::{Palette, PaletteSize, PixelBuffer, QuantizeOutput};
use palette::{cast, Srgb};
use std::{cmp::Reverse, collections::HashMap};

/// Only every `STRIDE`-th pixel is sampled.
pub const STRIDE: usize = 4;

/// Computes a palette of the (at most) `palette_size` most frequent colors among the sampled pixels.
///
/// Colors with equal counts keep the order in which they were first sampled.
/// If there are no pixels, a black and white palette is returned.
#[must_use]
pub fn palette(buffer: &PixelBuffer, palette_size: PaletteSize) -> QuantizeOutput {
    let mut slots = HashMap::new();
    let mut counts = Vec::<([u8; 3], u32)>::new();

    for pixel in buffer.pixels().iter().step_by(STRIDE) {
        let color = cast::into_array(pixel.color);
        let slot = *slots.entry(color).or_insert_with(|| {
            counts.push((color, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    if counts.is_empty() {
        return QuantizeOutput::fallback();
    }

    tracing::debug!(
        unique = counts.len(),
        palette_size = palette_size.into_inner(),
        "popularity counts"
    );

    // stable, so ties keep their first-seen order
    counts.sort_by_key(|&(_, n)| Reverse(n));
    counts.truncate(palette_size.into());

    let (colors, counts): (Vec<Srgb<u8>>, Vec<u32>) = counts
        .into_iter()
        .map(|(color, n)| (cast::from_array::<Srgb<u8>>(color), n))
        .unzip();

    #[allow(clippy::expect_used)]
    let palette = Palette::new(colors).expect("at least one sampled color");

    QuantizeOutput { palette, counts }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn empty_input() {
        let buffer = PixelBuffer::new(0, 0, Vec::new()).unwrap();
        let output = palette(&buffer, PaletteSize::MAX);
        assert_eq!(output, QuantizeOutput::fallback());
        assert_eq!(output.palette.len(), 2);
    }

    #[test]
    fn exact_colors_are_kept() {
        let colors = test_colors(16);
        // each color repeated STRIDE times in a row, so every color is sampled exactly once
        let pixels = colors
            .iter()
            .flat_map(|&c| [c; STRIDE])
            .collect::<Vec<_>>();
        let buffer = PixelBuffer::from_colors(8, 8, &pixels).unwrap();

        let output = palette(&buffer, PaletteSize::try_from(16u8).unwrap());
        assert_eq!(&*output.palette, colors.as_slice());
        assert_eq!(output.counts, vec![1; 16]);

        let output = palette(&buffer, PaletteSize::MAX);
        assert_eq!(&*output.palette, colors.as_slice());
    }

    #[test]
    fn most_frequent_first() {
        let a = Srgb::new(1, 2, 3);
        let b = Srgb::new(200, 100, 0);
        let c = Srgb::new(9, 9, 9);
        let mut pixels = vec![a; 3 * STRIDE];
        pixels.extend([b; 5 * STRIDE]);
        pixels.extend([c; STRIDE]);
        let buffer = PixelBuffer::from_colors(pixels.len() as u32, 1, &pixels).unwrap();

        let output = palette(&buffer, PaletteSize::MIN);
        assert_eq!(&*output.palette, &[b, a]);
        assert_eq!(output.counts, vec![5, 3]);
    }

    #[test]
    fn uniform_image() {
        let buffer = PixelBuffer::filled(4, 4, [128, 128, 128, 255]);
        let output = palette(&buffer, PaletteSize::try_from(4u8).unwrap());
        assert_eq!(&*output.palette, &[Srgb::new(128, 128, 128)]);
        assert_eq!(output.counts, vec![4]);
    }
}
