//! A library for turning full color images into reduced palette, dithered images.
//!
//! An image goes through these stages, each of which is also usable on its own:
//! - downsampling into larger "pixels" ([`PixelBuffer::downsample`])
//! - per-pixel tone adjustment: invert, brightness, contrast, saturation, greyscale ([`tone`])
//! - sharpen and box blur filters ([`convolution`])
//! - palette resolution: one of the built-in [`presets`], a custom [`Palette`],
//!   or a palette generated from the image by [`median_cut`] or [`popularity`] quantization
//! - dithering against that palette with one of fifteen methods ([`DitherMethod`]):
//!   plain threshold, random noise, Bayer and cluster dot ordered dithering,
//!   and eight error diffusion kernels
//!
//! # Features
//! To reduce dependencies and compile times, `ditherlab` has several `cargo` features
//! that can be turned off or on:
//! - `threads`: exposes parallel versions of most functions via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//! - `serde`: implements `Serialize` and `Deserialize` for the configuration types.
//!
//! # High-Level API
//! To get started with the high-level API, see [`ProcessingConfig`] and [`Pipeline`].
//! For interactive use, [`Worker`] runs the pipeline on a background thread
//! and only delivers the result of the latest request.
//! ```no_run
//! # use ditherlab::{DitherMethod, Pipeline, PixelBuffer, ProcessingConfig, QuantizeOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let config = ProcessingConfig::new()
//!     .method(DitherMethod::Atkinson)
//!     .contrast(1.2)
//!     .sharpen(2.0)
//!     .quantize(Some(QuantizeOptions::new())) // generate an 8 color palette
//!     .serpentine(true);
//!
//! // Run the pipeline in parallel
//! let dithered = Pipeline::new(config)?.process_par(&PixelBuffer::from(&img));
//! image::RgbaImage::from(dithered).save("dithered.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod dither;
mod error;
mod matcher;
mod types;

pub mod convolution;
pub mod median_cut;
pub mod popularity;
pub mod tone;

pub use api::*;
pub use dither::*;
pub use error::{ConfigError, Error};
pub use matcher::{nearest_index, ColorMatcher, ColorMetric};
pub use tone::ToneOptions;
pub use types::*;

/// The smallest number of colors a quantizer can be asked for is `2`.
pub const MIN_COLORS: u16 = 2;

/// The largest number of colors a quantizer can be asked for is `128`.
pub const MAX_COLORS: u16 = 128;

/// The largest supported pixel size is `32`.
pub const MAX_PIXEL_SIZE: u32 = 32;
