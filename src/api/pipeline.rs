//! Contains the [`Pipeline`] that runs all processing stages in order.

use crate::{
    convolution, tone, ColorMatcher, ConfigError, Ditherer, Error, Palette, PixelBuffer,
    ProcessingConfig,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, instrument, warn};

/// One unit of work: an image, how to process it, and an id to correlate the result with.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    /// Identifies the request. Later requests have larger ids.
    pub id: u64,
    /// The input image.
    pub buffer: PixelBuffer,
    /// How to process the image.
    pub config: ProcessingConfig,
}

/// The outcome of a [`ProcessingRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    /// The id of the request this result belongs to.
    pub id: u64,
    /// The processed image or the reason processing failed.
    pub outcome: Result<PixelBuffer, Error>,
}

impl ProcessingResult {
    /// Whether processing succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure reason as text, if processing failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.outcome.as_ref().err().map(ToString::to_string)
    }
}

/// A validated [`ProcessingConfig`], ready to be applied to any number of images.
///
/// The stages run in this order:
/// 1. downsampling by the pixel size
/// 2. tone adjustment
/// 3. sharpen
/// 4. blur
/// 5. palette resolution (quantization of the filtered image, if enabled, or the fixed palette)
/// 6. dithering
///
/// # Examples
/// ```
/// # use ditherlab::{DitherMethod, Pipeline, PixelBuffer, ProcessingConfig};
/// # fn main() -> Result<(), ditherlab::Error> {
/// let config = ProcessingConfig::new()
///     .method(DitherMethod::Bayer4x4)
///     .preset("gameboy")
///     .pixel_size(2);
/// let pipeline = Pipeline::new(config)?;
///
/// let input = PixelBuffer::filled(9, 4, [200, 180, 40, 255]);
/// let output = pipeline.process(&input);
/// assert_eq!(output.dimensions(), (5, 2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// The validated config.
    config: ProcessingConfig,
    /// The resolved fixed palette.
    palette: Palette,
}

impl Pipeline {
    /// Validates `config` and resolves its fixed palette.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] found by [`ProcessingConfig::validate`].
    pub fn new(config: ProcessingConfig) -> Result<Self, ConfigError> {
        let palette = config.validate()?;
        Ok(Self { config, palette })
    }

    /// The config this pipeline applies.
    #[must_use]
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Creates the ditherer specified by the config.
    fn ditherer(&self) -> Ditherer {
        let ProcessingConfig { method, strength, serpentine, seed, .. } = self.config;
        #[allow(clippy::expect_used)]
        Ditherer::new(method)
            .with_strength(strength)
            .expect("validated strength")
            .serpentine(serpentine)
            .seed(seed)
    }

    /// Returns the palette to dither the filtered image with.
    fn matcher(&self, image: &PixelBuffer) -> ColorMatcher {
        let palette = if let Some(options) = self.config.quantize {
            let output = options.palette(image);
            debug!(
                method = %options.method,
                max_colors = options.max_colors.into_inner(),
                colors = output.palette.len(),
                "generated palette"
            );
            output.palette
        } else {
            debug!(colors = self.palette.len(), "fixed palette");
            self.palette.clone()
        };

        ColorMatcher::new(palette, self.config.metric)
    }

    /// Runs every stage on `buffer`.
    #[must_use]
    #[instrument(
        level = "debug",
        skip_all,
        fields(width = buffer.width(), height = buffer.height(), method = %self.config.method)
    )]
    pub fn process(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let config = &self.config;

        let image = buffer.downsample(config.pixel_size);
        let image = tone::adjust(&image, &config.tone);
        let image = convolution::sharpen(&image, config.sharpen);
        let image = convolution::blur(&image, config.blur);
        debug!(
            sharpen = config.sharpen,
            blur_passes = convolution::blur_passes(config.blur),
            "filtered"
        );

        let matcher = self.matcher(&image);
        self.ditherer().dither(&image, &matcher)
    }

    /// Runs every stage on `buffer`, using multiple threads where possible.
    ///
    /// The output is identical to [`Pipeline::process`].
    #[cfg(feature = "threads")]
    #[must_use]
    #[instrument(
        level = "debug",
        skip_all,
        fields(width = buffer.width(), height = buffer.height(), method = %self.config.method)
    )]
    pub fn process_par(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let config = &self.config;

        let image = buffer.downsample(config.pixel_size);
        let image = tone::adjust_par(&image, &config.tone);
        let image = convolution::sharpen_par(&image, config.sharpen);
        let image = convolution::blur_par(&image, config.blur);
        debug!(
            sharpen = config.sharpen,
            blur_passes = convolution::blur_passes(config.blur),
            "filtered"
        );

        let matcher = self.matcher(&image);
        self.ditherer().dither_par(&image, &matcher)
    }

    /// Processes a request, converting every failure into a failed [`ProcessingResult`].
    ///
    /// An invalid config yields [`Error::InvalidConfig`],
    /// and a panic during processing yields [`Error::ComputationFailure`].
    #[must_use]
    pub fn run(request: ProcessingRequest) -> ProcessingResult {
        let ProcessingRequest { id, buffer, config } = request;
        guarded(id, move || Ok(Self::new(config)?.process(&buffer)))
    }

    /// The parallel version of [`Pipeline::run`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn run_par(request: ProcessingRequest) -> ProcessingResult {
        let ProcessingRequest { id, buffer, config } = request;
        guarded(id, move || Ok(Self::new(config)?.process_par(&buffer)))
    }
}

/// Extracts the message of a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Runs `process`, catching any panic, and wraps the outcome into a [`ProcessingResult`].
pub(crate) fn guarded(
    id: u64,
    process: impl FnOnce() -> Result<PixelBuffer, Error>,
) -> ProcessingResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(process))
        .unwrap_or_else(|payload| Err(Error::ComputationFailure(panic_message(payload.as_ref()))));

    if let Err(error) = &outcome {
        warn!(id, %error, "processing failed");
    }

    ProcessingResult { id, outcome }
}
