//! Contains the builder struct for dynamic palette generation.

use crate::{median_cut, popularity, ConfigError, PaletteSize, PixelBuffer, QuantizeOutput};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The set of supported color quantization methods.
///
/// See the descriptions on each enum variant for more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum QuantizeMethod {
    /// Median cut (Heckbert).
    ///
    /// Gives a balanced palette that also covers colors that only occur in small areas.
    ///
    /// See the [`median_cut`](crate::median_cut) module for more details.
    #[default]
    MedianCut,
    /// The most frequent exact colors.
    ///
    /// Best for flat artwork that already has few colors.
    ///
    /// See the [`popularity`](crate::popularity) module for more details.
    Popularity,
}

impl QuantizeMethod {
    /// Both methods, in the order they are usually presented.
    pub const ALL: [Self; 2] = [Self::MedianCut, Self::Popularity];

    /// The human readable name of this method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MedianCut => "Median Cut",
            Self::Popularity => "Popularity",
        }
    }

    /// The short kebab-case identifier of this method.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MedianCut => "median-cut",
            Self::Popularity => "popularity",
        }
    }

    /// Runs this quantization method on the given buffer.
    #[must_use]
    pub fn palette(self, buffer: &PixelBuffer, palette_size: PaletteSize) -> QuantizeOutput {
        match self {
            Self::MedianCut => median_cut::palette(buffer, palette_size),
            Self::Popularity => popularity::palette(buffer, palette_size),
        }
    }
}

impl Display for QuantizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuantizeMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|method| {
                method.name().eq_ignore_ascii_case(name) || method.id().eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_owned()))
    }
}

/// A builder struct to specify the parameters for generating a palette from the image itself.
///
/// # Examples
/// ```
/// # use ditherlab::{PaletteSize, QuantizeMethod, QuantizeOptions};
/// let options = QuantizeOptions::new()
///     .method(QuantizeMethod::Popularity)
///     .max_colors(PaletteSize::from_clamped(16));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QuantizeOptions {
    /// The quantization method.
    pub(crate) method: QuantizeMethod,
    /// The maximum number of colors in the generated palette.
    pub(crate) max_colors: PaletteSize,
}

impl QuantizeOptions {
    /// Creates a new [`QuantizeOptions`] with default values:
    /// [`QuantizeMethod::MedianCut`] and `8` colors.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            method: QuantizeMethod::MedianCut,
            max_colors: PaletteSize::DEFAULT,
        }
    }

    /// Sets the quantization method.
    ///
    /// The default method is [`QuantizeMethod::MedianCut`].
    #[must_use]
    pub const fn method(mut self, method: QuantizeMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the maximum number of colors in the generated palette.
    ///
    /// The default is `8` colors.
    #[must_use]
    pub const fn max_colors(mut self, max_colors: PaletteSize) -> Self {
        self.max_colors = max_colors;
        self
    }

    /// Runs the quantizer on the given buffer.
    #[must_use]
    pub fn palette(&self, buffer: &PixelBuffer) -> QuantizeOutput {
        self.method.palette(buffer, self.max_colors)
    }
}

impl From<QuantizeMethod> for QuantizeOptions {
    fn from(method: QuantizeMethod) -> Self {
        Self::new().method(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = QuantizeOptions::default();
        assert_eq!(options, QuantizeOptions::new());
        assert_eq!(options.method, QuantizeMethod::MedianCut);
        assert_eq!(options.max_colors.into_inner(), 8);
    }

    #[test]
    fn parse_method() {
        assert_eq!("Median Cut".parse(), Ok(QuantizeMethod::MedianCut));
        assert_eq!("median-cut".parse(), Ok(QuantizeMethod::MedianCut));
        assert_eq!("POPULARITY".parse(), Ok(QuantizeMethod::Popularity));
        assert_eq!(
            "octree".parse::<QuantizeMethod>(),
            Err(ConfigError::UnknownAlgorithm("octree".to_owned()))
        );
        for method in QuantizeMethod::ALL {
            assert_eq!(method.to_string().parse(), Ok(method));
        }
    }

    #[test]
    fn dispatch() {
        let buffer = PixelBuffer::filled(8, 8, [10, 20, 30, 255]);
        for method in QuantizeMethod::ALL {
            let output = QuantizeOptions::from(method).palette(&buffer);
            assert_eq!(output.palette.len(), 1);
        }
    }
}
