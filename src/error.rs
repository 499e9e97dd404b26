//! The error types returned by `ditherlab`.

use crate::{MAX_COLORS, MAX_PIXEL_SIZE, MIN_COLORS};
use thiserror::Error;

/// The reasons a [`ProcessingConfig`](crate::ProcessingConfig) or one of its parts can be rejected.
///
/// All of these are detected before any pixel is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A palette must contain at least one color.
    #[error("palette is empty")]
    EmptyPalette,
    /// The requested number of quantized colors is outside of `MIN_COLORS..=MAX_COLORS`.
    #[error("palette size {0} is outside of {MIN_COLORS}..={MAX_COLORS}")]
    PaletteSize(u16),
    /// No built-in palette has the given id.
    #[error("unknown palette preset `{0}`")]
    UnknownPreset(String),
    /// The given name is not a known dither method.
    #[error("unknown dither method `{0}`")]
    UnknownMethod(String),
    /// The given name is not a known quantization algorithm.
    #[error("unknown quantization algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// The given name is not a known color distance metric.
    #[error("unknown color metric `{0}`")]
    UnknownMetric(String),
    /// The pixel size is outside of `1..=MAX_PIXEL_SIZE`.
    #[error("pixel size {0} is outside of 1..={MAX_PIXEL_SIZE}")]
    PixelSize(u32),
    /// A numeric parameter is not finite or lies outside of its accepted range.
    #[error("parameter `{name}` = {value} is outside of {min}..={max}")]
    OutOfRange {
        /// The name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// The smallest accepted value.
        min: f32,
        /// The largest accepted value.
        max: f32,
    },
}

/// The error type for all fallible `ditherlab` operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The request was rejected before entering the pipeline.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The number of samples in a pixel buffer does not equal `width * height * 4`.
    #[error("pixel buffer has {actual} samples, expected {expected}")]
    BufferSize {
        /// The number of samples implied by the dimensions.
        expected: usize,
        /// The number of samples provided.
        actual: usize,
    },
    /// Processing failed unexpectedly (e.g., a panic inside the pipeline).
    #[error("computation failed: {0}")]
    ComputationFailure(String),
}
