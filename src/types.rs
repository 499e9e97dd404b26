//! Contains various types needed across the crate.

use crate::{ConfigError, Error, MAX_COLORS, MIN_COLORS};
use palette::{
    cast::{self, ComponentsAs},
    Srgb, Srgba,
};
use std::{fmt::Display, ops::Deref};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "image")]
use image::RgbaImage;

/// Converts a floating point channel value to 8 bits, clamping it to `0..=255` and rounding.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn clamp_u8(value: f32) -> u8 {
    num_traits::clamp(value, 0.0, 255.0).round() as u8
}

/// A decoded image as a dense, row-major sequence of 8-bit RGBA samples.
///
/// The number of samples is always `width * height * 4`.
///
/// # Examples
/// ```
/// # use ditherlab::PixelBuffer;
/// # fn main() -> Result<(), ditherlab::Error> {
/// let buffer = PixelBuffer::new(2, 1, vec![10, 10, 10, 255, 250, 250, 250, 255])?;
/// assert_eq!(buffer.dimensions(), (2, 1));
/// assert!(PixelBuffer::new(2, 2, vec![0; 4]).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
    /// The RGBA samples.
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Returns the number of samples a buffer of the given dimensions holds.
    pub(crate) fn sample_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    /// Creates a new [`PixelBuffer`] from raw RGBA samples.
    ///
    /// # Errors
    /// Returns [`Error::BufferSize`] if `data.len() != width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let expected = Self::sample_len(width, height);
        if data.len() == expected {
            Ok(Self { width, height, data })
        } else {
            Err(Error::BufferSize { expected, actual: data.len() })
        }
    }

    /// Creates a [`PixelBuffer`] where every pixel has the given RGBA value.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(width as usize * height as usize);
        Self { width, height, data }
    }

    /// Creates an opaque [`PixelBuffer`] from a row-major slice of colors.
    ///
    /// # Errors
    /// Returns [`Error::BufferSize`] if `colors.len() != width * height`.
    pub fn from_colors(width: u32, height: u32, colors: &[Srgb<u8>]) -> Result<Self, Error> {
        let data = colors
            .iter()
            .flat_map(|&color| {
                let [r, g, b] = cast::into_array(color);
                [r, g, b, u8::MAX]
            })
            .collect();

        Self::new(width, height, data)
    }

    /// Creates a buffer with the given dimensions without checking the sample count.
    pub(crate) fn new_unchecked(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), Self::sample_len(width, height));
        Self { width, height, data }
    }

    /// The width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The `(width, height)` of the image.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether or not the image has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw RGBA samples.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning the raw RGBA samples.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// The samples viewed as RGBA pixels.
    #[must_use]
    pub fn pixels(&self) -> &[Srgba<u8>] {
        self.data.components_as()
    }

    /// The color of each pixel with alpha dropped.
    pub fn colors(&self) -> impl Iterator<Item = Srgb<u8>> + '_ {
        self.pixels().iter().map(|pixel| pixel.color)
    }

    /// Returns the pixel at `(x, y)`, or `None` if it is out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Srgba<u8>> {
        if x < self.width && y < self.height {
            Some(self.pixels()[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Shrinks the image by replacing each `factor` by `factor` block of pixels with its rounded mean
    /// (alpha included).
    ///
    /// The result is `ceil(width / factor)` by `ceil(height / factor)` pixels.
    /// Blocks at the right and bottom edges only average the pixels they actually cover.
    /// A `factor` of `0` or `1` returns an unchanged copy.
    ///
    /// # Examples
    /// ```
    /// # use ditherlab::PixelBuffer;
    /// # fn main() -> Result<(), ditherlab::Error> {
    /// let buffer = PixelBuffer::new(3, 1, vec![0, 0, 0, 255, 100, 50, 2, 255, 7, 7, 7, 7])?;
    /// let small = buffer.downsample(2);
    /// assert_eq!(small.as_raw(), &[50, 25, 1, 255, 7, 7, 7, 7]);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn downsample(&self, factor: u32) -> Self {
        if factor <= 1 || self.is_empty() {
            return self.clone();
        }

        let width = self.width.div_ceil(factor);
        let height = self.height.div_ceil(factor);
        let (src_width, src_height) = (self.width as usize, self.height as usize);
        let factor = factor as usize;

        let mut data = Vec::with_capacity(Self::sample_len(width, height));
        for y0 in (0..src_height).step_by(factor) {
            let y1 = (y0 + factor).min(src_height);
            for x0 in (0..src_width).step_by(factor) {
                let x1 = (x0 + factor).min(src_width);

                let mut sum = [0u32; 4];
                for y in y0..y1 {
                    let row = &self.data[((y * src_width + x0) * 4)..((y * src_width + x1) * 4)];
                    for pixel in row.chunks_exact(4) {
                        for (s, &v) in sum.iter_mut().zip(pixel) {
                            *s += u32::from(v);
                        }
                    }
                }

                let n = ((y1 - y0) * (x1 - x0)) as u32;
                data.extend(sum.map(|s| ((s + n / 2) / n) as u8));
            }
        }

        Self::new_unchecked(width, height, data)
    }
}

#[cfg(feature = "image")]
impl From<&RgbaImage> for PixelBuffer {
    fn from(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new_unchecked(width, height, image.as_raw().clone())
    }
}

#[cfg(feature = "image")]
impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        let PixelBuffer { width, height, data } = buffer;
        #[allow(clippy::expect_used)]
        {
            // the buffer invariant guarantees the length matches the dimensions
            RgbaImage::from_raw(width, height, data).expect("large enough buffer")
        }
    }
}

/// The floating point form of a [`PixelBuffer`] used to accumulate dither error.
///
/// Values may leave `0.0..=255.0` while processing; they are only clamped
/// when converted back with [`FloatBuffer::to_pixel_buffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct FloatBuffer {
    /// The width of the image in pixels.
    width: u32,
    /// The height of the image in pixels.
    height: u32,
    /// The RGBA samples.
    data: Vec<f32>,
}

impl FloatBuffer {
    /// The width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA samples.
    #[must_use]
    pub fn as_raw(&self) -> &[f32] {
        &self.data
    }

    /// Returns the sample offset of the pixel at `(x, y)`,
    /// or `None` if the coordinates are out of bounds.
    #[inline]
    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some((y as usize * self.width as usize + x as usize) * 4)
        } else {
            None
        }
    }

    /// Returns the RGB values of the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Overwrites the RGB values of the pixel at `(x, y)`.
    /// Out of bounds writes are dropped.
    #[inline]
    pub fn set_rgb(&mut self, x: i64, y: i64, rgb: [f32; 3]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..(i + 3)].copy_from_slice(&rgb);
        }
    }

    /// Adds `factor * error` to the RGB values of the pixel at `(x, y)`.
    /// Out of bounds writes are dropped.
    #[inline]
    pub fn add_rgb(&mut self, x: i64, y: i64, error: [f32; 3], factor: f32) {
        if let Some(i) = self.offset(x, y) {
            for (value, e) in self.data[i..(i + 3)].iter_mut().zip(error) {
                *value += e * factor;
            }
        }
    }

    /// Converts back to 8 bits, clamping every sample to `0..=255`.
    #[must_use]
    pub fn to_pixel_buffer(&self) -> PixelBuffer {
        let data = self.data.iter().copied().map(clamp_u8).collect();
        PixelBuffer::new_unchecked(self.width, self.height, data)
    }
}

impl From<&PixelBuffer> for FloatBuffer {
    fn from(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            data: buffer.data.iter().copied().map(f32::from).collect(),
        }
    }
}

/// An ordered, non-empty list of colors that a dithered image is restricted to.
///
/// The order does not affect which color is the nearest match,
/// except that ties go to the earliest entry.
///
/// # Examples
/// ```
/// # use ditherlab::{Palette, ConfigError};
/// # use palette::Srgb;
/// # fn main() -> Result<(), ConfigError> {
/// let palette = Palette::new(vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])?;
/// assert_eq!(palette.len(), 2);
/// assert!(Palette::new(Vec::new()).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Srgb<u8>>", into = "Vec<Srgb<u8>>"))]
pub struct Palette(Vec<Srgb<u8>>);

impl Palette {
    /// Creates a new [`Palette`] from the given colors.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyPalette`] if `colors` is empty.
    pub fn new(colors: Vec<Srgb<u8>>) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            Err(ConfigError::EmptyPalette)
        } else {
            Ok(Self(colors))
        }
    }

    /// Creates a [`Palette`] containing only black and white.
    #[must_use]
    pub fn black_and_white() -> Self {
        Self(vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)])
    }

    /// Gets the inner colors.
    #[must_use]
    pub fn into_inner(self) -> Vec<Srgb<u8>> {
        self.0
    }
}

impl Deref for Palette {
    type Target = [Srgb<u8>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[Srgb<u8>]> for Palette {
    fn as_ref(&self) -> &[Srgb<u8>] {
        self
    }
}

impl TryFrom<Vec<Srgb<u8>>> for Palette {
    type Error = ConfigError;

    fn try_from(colors: Vec<Srgb<u8>>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<Srgb<u8>> {
    fn from(palette: Palette) -> Self {
        palette.0
    }
}

/// This type is used to specify the maximum number of colors a quantizer may produce.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `MIN_COLORS..=MAX_COLORS`.
///
/// # Examples
/// Use `try_into` or [`PaletteSize::from_clamped`] to create [`PaletteSize`]s.
/// ```
/// # use ditherlab::{PaletteSize, ConfigError};
/// # fn main() -> Result<(), ConfigError> {
/// let size = PaletteSize::try_from(16u8)?;
/// let size: PaletteSize = 128u16.try_into()?;
/// let size = PaletteSize::from_clamped(1024);
/// assert_eq!(size, PaletteSize::MAX);
/// assert!(PaletteSize::try_from(1u8).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u16", into = "u16"))]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The smallest supported palette size (given by [`MIN_COLORS`]).
    pub const MIN: Self = Self(MIN_COLORS);

    /// The largest supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The default palette size of `8` colors.
    pub const DEFAULT: Self = Self(8);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates a [`PaletteSize`] by clamping the given `u16` to `MIN_COLORS..=MAX_COLORS`.
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value < MIN_COLORS {
            Self::MIN
        } else if value > MAX_COLORS {
            Self::MAX
        } else {
            Self(value)
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl From<PaletteSize> for usize {
    fn from(val: PaletteSize) -> Self {
        val.into_inner().into()
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if (MIN_COLORS..=MAX_COLORS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::PaletteSize(value))
        }
    }
}

impl TryFrom<u8> for PaletteSize {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        u16::from(value).try_into()
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The output struct returned by quantization functions.
///
/// It contains the color `palette` for the image, alongside `counts` which has
/// the number of sampled pixels assigned to each palette color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutput {
    /// The computed color palette that is representative of the colors in the image.
    pub palette: Palette,
    /// The number of sampled pixels that were assigned to each color in `palette`.
    ///
    /// This is empty if no pixels were sampled and the fallback palette was returned.
    pub counts: Vec<u32>,
}

impl QuantizeOutput {
    /// The output used when there is nothing to sample.
    pub(crate) fn fallback() -> Self {
        Self {
            palette: Palette::black_and_white(),
            counts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_length_is_checked() {
        assert_eq!(
            PixelBuffer::new(3, 2, vec![0; 23]),
            Err(Error::BufferSize { expected: 24, actual: 23 })
        );
        assert!(PixelBuffer::new(3, 2, vec![0; 24]).is_ok());
        assert!(PixelBuffer::new(0, 0, Vec::new()).is_ok());
    }

    #[test]
    fn downsample_averages_blocks() {
        #[rustfmt::skip]
        let buffer = PixelBuffer::new(3, 3, vec![
            0, 0, 0, 255,    10, 10, 10, 255,  90, 0, 0, 0,
            20, 20, 20, 255, 30, 30, 30, 251,  0, 90, 0, 0,
            1, 2, 3, 4,      5, 6, 7, 8,       9, 9, 9, 9,
        ]).unwrap();

        let small = buffer.downsample(2);
        assert_eq!(small.dimensions(), (2, 2));
        assert_eq!(
            small.as_raw(),
            &[15, 15, 15, 254, 45, 45, 0, 0, 3, 4, 5, 6, 9, 9, 9, 9]
        );

        assert_eq!(buffer.downsample(1), buffer);
        assert_eq!(buffer.downsample(0), buffer);
        assert_eq!(buffer.downsample(8).dimensions(), (1, 1));
    }

    #[test]
    fn downsample_dimensions_round_up() {
        let buffer = PixelBuffer::filled(33, 17, [1, 2, 3, 4]);
        for (factor, dimensions) in [(2, (17, 9)), (4, (9, 5)), (8, (5, 3)), (32, (2, 1))] {
            let small = buffer.downsample(factor);
            assert_eq!(small.dimensions(), dimensions);
            assert!(small.pixels().iter().all(|p| p.into_components() == (1, 2, 3, 4)));
        }
    }

    #[test]
    fn float_buffer_drops_out_of_bounds_writes() {
        let buffer = PixelBuffer::filled(2, 2, [100, 100, 100, 7]);
        let mut float = FloatBuffer::from(&buffer);

        float.add_rgb(-1, 0, [50.0; 3], 1.0);
        float.add_rgb(2, 0, [50.0; 3], 1.0);
        float.add_rgb(0, 2, [50.0; 3], 1.0);
        float.set_rgb(5, 5, [0.0; 3]);
        assert_eq!(float.to_pixel_buffer(), buffer);

        float.add_rgb(1, 1, [400.0, -400.0, 10.0], 0.5);
        assert_eq!(float.rgb(1, 1), [300.0, -100.0, 105.0]);
        let clamped = float.to_pixel_buffer();
        assert_eq!(clamped.pixel(1, 1).map(|p| p.into_components()), Some((255, 0, 105, 7)));
    }

    #[test]
    fn palette_size_bounds() {
        assert_eq!(PaletteSize::try_from(1u16), Err(ConfigError::PaletteSize(1)));
        assert_eq!(PaletteSize::try_from(129u16), Err(ConfigError::PaletteSize(129)));
        assert_eq!(PaletteSize::from_clamped(0), PaletteSize::MIN);
        assert_eq!(PaletteSize::from_clamped(64).into_inner(), 64);
    }
}
