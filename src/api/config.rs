//! Contains [`ProcessingConfig`], the description of one processing request.

use super::presets;
use crate::{ColorMetric, ConfigError, DitherMethod, Palette, QuantizeOptions, ToneOptions, MAX_PIXEL_SIZE};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Where the fixed palette of a [`ProcessingConfig`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PaletteSource {
    /// A built-in palette, by id (see [`presets`](crate::presets)).
    Preset(String),
    /// A caller supplied palette.
    Custom(Palette),
}

impl PaletteSource {
    /// Resolves this source to its colors.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownPreset`] if the preset id does not exist.
    pub fn resolve(&self) -> Result<Palette, ConfigError> {
        match self {
            Self::Preset(id) => presets::find(id).map(presets::Preset::palette),
            Self::Custom(palette) => Ok(palette.clone()),
        }
    }
}

impl Default for PaletteSource {
    fn default() -> Self {
        Self::Preset(presets::DEFAULT_ID.to_owned())
    }
}

impl From<Palette> for PaletteSource {
    fn from(palette: Palette) -> Self {
        Self::Custom(palette)
    }
}

/// The accepted range of [`ProcessingConfig::brightness`].
pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = -1.0..=1.0;
/// The accepted range of [`ProcessingConfig::contrast`].
pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.0..=4.0;
/// The accepted range of [`ProcessingConfig::saturation`].
pub const SATURATION_RANGE: RangeInclusive<f32> = 0.0..=2.0;
/// The accepted range of [`ProcessingConfig::blur`] and [`ProcessingConfig::sharpen`].
pub const FILTER_RANGE: RangeInclusive<f32> = 0.0..=10.0;
/// The accepted range of [`ProcessingConfig::strength`].
pub const STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Describes everything about how one image is processed.
///
/// The default config applies Floyd–Steinberg dithering with the black and white preset
/// and leaves the tone and sharpness of the image unchanged.
///
/// # Examples
/// ```
/// # use ditherlab::{DitherMethod, ProcessingConfig, QuantizeMethod, QuantizeOptions, PaletteSize};
/// # fn main() -> Result<(), ditherlab::ConfigError> {
/// let config = ProcessingConfig::new()
///     .method(DitherMethod::Atkinson)
///     .preset("gameboy")
///     .contrast(1.2)
///     .serpentine(true);
/// config.validate()?;
///
/// // generate a palette from the image itself instead
/// let config = config.quantize(Some(
///     QuantizeOptions::new()
///         .method(QuantizeMethod::Popularity)
///         .max_colors(PaletteSize::try_from(16u8)?),
/// ));
/// config.validate()?;
///
/// assert!(ProcessingConfig::new().preset("nes").validate().is_err());
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcessingConfig {
    /// The dithering method.
    pub(crate) method: DitherMethod,
    /// The fixed palette, used when `quantize` is `None`.
    pub(crate) palette: PaletteSource,
    /// The options for generating a palette from the image, if enabled.
    pub(crate) quantize: Option<QuantizeOptions>,
    /// The side length of the blocks the image is downsampled by.
    pub(crate) pixel_size: u32,
    /// The per-pixel tone adjustments.
    pub(crate) tone: ToneOptions,
    /// The blur strength.
    pub(crate) blur: f32,
    /// The sharpen strength.
    pub(crate) sharpen: f32,
    /// The dither strength.
    pub(crate) strength: f32,
    /// Whether error diffusion scans odd rows right to left.
    pub(crate) serpentine: bool,
    /// The color distance used to match palette colors.
    pub(crate) metric: ColorMetric,
    /// The seed for random noise dithering.
    pub(crate) seed: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingConfig {
    /// Creates a new [`ProcessingConfig`] with default values.
    pub fn new() -> Self {
        Self {
            method: DitherMethod::FloydSteinberg,
            palette: PaletteSource::default(),
            quantize: None,
            pixel_size: 1,
            tone: ToneOptions::new(),
            blur: 0.0,
            sharpen: 0.0,
            strength: 1.0,
            serpentine: false,
            metric: ColorMetric::Euclidean,
            seed: 0,
        }
    }

    /// Sets the dithering method.
    ///
    /// The default method is [`DitherMethod::FloydSteinberg`].
    pub fn method(mut self, method: DitherMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the fixed palette.
    ///
    /// The default palette is the `bw` preset.
    pub fn palette(mut self, palette: impl Into<PaletteSource>) -> Self {
        self.palette = palette.into();
        self
    }

    /// Sets the fixed palette to the built-in palette with the given id.
    pub fn preset(self, id: &str) -> Self {
        self.palette(PaletteSource::Preset(id.to_owned()))
    }

    /// Enables or disables generating the palette from the image.
    /// When enabled, this takes precedence over the fixed palette.
    ///
    /// By default, quantization is disabled.
    pub fn quantize(mut self, quantize: Option<QuantizeOptions>) -> Self {
        self.quantize = quantize;
        self
    }

    /// Sets the pixel size, which must be in `1..=MAX_PIXEL_SIZE`.
    ///
    /// A pixel size of `n` averages each `n` by `n` block of the input into a single pixel
    /// before any other processing, so the output is `n` times smaller in each dimension
    /// (rounded up).
    ///
    /// The default pixel size is `1`, which keeps the input dimensions.
    pub fn pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    /// Sets all tone adjustments at once.
    pub fn tone(mut self, tone: ToneOptions) -> Self {
        self.tone = tone;
        self
    }

    /// Sets whether the colors are inverted. The default is `false`.
    pub fn invert(mut self, invert: bool) -> Self {
        self.tone.invert = invert;
        self
    }

    /// Sets the brightness offset. The default is `0.0`.
    pub fn brightness(mut self, brightness: f32) -> Self {
        self.tone.brightness = brightness;
        self
    }

    /// Sets the contrast factor. The default is `1.0`.
    pub fn contrast(mut self, contrast: f32) -> Self {
        self.tone.contrast = contrast;
        self
    }

    /// Sets the saturation factor. The default is `1.0`.
    pub fn saturation(mut self, saturation: f32) -> Self {
        self.tone.saturation = saturation;
        self
    }

    /// Sets whether the image is converted to greyscale. The default is `false`.
    pub fn greyscale(mut self, greyscale: bool) -> Self {
        self.tone.greyscale = greyscale;
        self
    }

    /// Sets the blur strength. The default is `0.0`, which disables the blur.
    pub fn blur(mut self, blur: f32) -> Self {
        self.blur = blur;
        self
    }

    /// Sets the sharpen strength. The default is `0.0`, which disables sharpening.
    pub fn sharpen(mut self, sharpen: f32) -> Self {
        self.sharpen = sharpen;
        self
    }

    /// Sets the dither strength. The default is `1.0`.
    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Sets whether error diffusion scans odd rows right to left. The default is `false`.
    pub fn serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Sets the color distance metric. The default is [`ColorMetric::Euclidean`].
    pub fn metric(mut self, metric: ColorMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the seed for random noise dithering. The default is `0`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The per-pixel tone adjustments.
    #[must_use]
    pub fn tone_options(&self) -> &ToneOptions {
        &self.tone
    }

    /// The dithering method.
    #[must_use]
    pub fn dither_method(&self) -> DitherMethod {
        self.method
    }

    /// Checks every parameter and resolves the fixed palette.
    ///
    /// # Errors
    /// Returns the first problem found: an unknown preset, a pixel size outside of
    /// `1..=MAX_PIXEL_SIZE`, or a numeric parameter that is not finite or out of range.
    pub fn validate(&self) -> Result<Palette, ConfigError> {
        if !(1..=MAX_PIXEL_SIZE).contains(&self.pixel_size) {
            return Err(ConfigError::PixelSize(self.pixel_size));
        }

        let ToneOptions { brightness, contrast, saturation, .. } = self.tone;
        check_range("brightness", brightness, BRIGHTNESS_RANGE)?;
        check_range("contrast", contrast, CONTRAST_RANGE)?;
        check_range("saturation", saturation, SATURATION_RANGE)?;
        check_range("blur", self.blur, FILTER_RANGE)?;
        check_range("sharpen", self.sharpen, FILTER_RANGE)?;
        check_range("strength", self.strength, STRENGTH_RANGE)?;

        self.palette.resolve()
    }
}

/// Returns an error if `value` is NaN or outside of `range`.
fn check_range(name: &'static str, value: f32, range: RangeInclusive<f32>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use palette::Srgb;

    #[test]
    fn defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(config.method, DitherMethod::FloydSteinberg);
        assert_eq!(config.palette, PaletteSource::Preset("bw".to_owned()));
        assert_eq!(config.quantize, None);
        assert_eq!(config.pixel_size, 1);
        assert!(config.tone.is_identity());
        assert_eq!(config.metric, ColorMetric::Euclidean);
        assert!(!config.serpentine);
        assert_eq!(config.validate(), Ok(Palette::black_and_white()));
    }

    #[test]
    fn setters() {
        let config = ProcessingConfig::new()
            .invert(true)
            .brightness(0.1)
            .contrast(1.5)
            .saturation(0.5)
            .greyscale(true);
        assert_eq!(
            *config.tone_options(),
            ToneOptions {
                invert: true,
                brightness: 0.1,
                contrast: 1.5,
                saturation: 0.5,
                greyscale: true,
            }
        );
    }

    #[test]
    fn unknown_preset() {
        let config = ProcessingConfig::new().preset("nes");
        assert_eq!(config.validate(), Err(ConfigError::UnknownPreset("nes".to_owned())));
    }

    #[test]
    fn custom_palette() {
        let palette = Palette::new(vec![Srgb::new(1, 2, 3)]).unwrap();
        let config = ProcessingConfig::new().palette(palette.clone());
        assert_eq!(config.validate(), Ok(palette));
    }

    #[test]
    fn pixel_size_bounds() {
        assert_eq!(
            ProcessingConfig::new().pixel_size(0).validate(),
            Err(ConfigError::PixelSize(0))
        );
        assert_eq!(
            ProcessingConfig::new().pixel_size(33).validate(),
            Err(ConfigError::PixelSize(33))
        );
        assert!(ProcessingConfig::new().pixel_size(32).validate().is_ok());
    }

    #[test]
    fn numeric_ranges() {
        let bad = [
            ProcessingConfig::new().strength(1.5),
            ProcessingConfig::new().strength(f32::NAN),
            ProcessingConfig::new().blur(11.0),
            ProcessingConfig::new().sharpen(-1.0),
            ProcessingConfig::new().contrast(f32::INFINITY),
            ProcessingConfig::new().saturation(2.5),
            ProcessingConfig::new().brightness(-2.0),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));
        }

        let err = ProcessingConfig::new().blur(12.0).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange { name: "blur", value: 12.0, min: 0.0, max: 10.0 }
        );
    }
}
