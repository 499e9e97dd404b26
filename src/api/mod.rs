//! Contains the types and functions for the high level processing API.

mod config;
pub(crate) mod pipeline;
pub mod presets;
mod quantize_method;
mod worker;

pub use config::{
    PaletteSource, ProcessingConfig, BRIGHTNESS_RANGE, CONTRAST_RANGE, FILTER_RANGE,
    SATURATION_RANGE, STRENGTH_RANGE,
};
pub use pipeline::{Pipeline, ProcessingRequest, ProcessingResult};
pub use quantize_method::{QuantizeMethod, QuantizeOptions};
pub use worker::{RequestTracker, Worker};
