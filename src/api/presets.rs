//! The built-in palettes.

use crate::{ConfigError, Palette};
use palette::Srgb;

/// A built-in palette, referenced by its `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// The identifier used in a [`PaletteSource::Preset`](crate::PaletteSource::Preset).
    pub id: &'static str,
    /// The human readable name.
    pub name: &'static str,
    /// The colors, in display order.
    pub colors: &'static [Srgb<u8>],
}

impl Preset {
    /// Returns the colors of this preset as a [`Palette`].
    #[must_use]
    pub fn palette(&self) -> Palette {
        #[allow(clippy::expect_used)]
        Palette::new(self.colors.to_vec()).expect("presets are non-empty")
    }
}

/// Shorthand for the preset tables.
const fn rgb(red: u8, green: u8, blue: u8) -> Srgb<u8> {
    Srgb::new(red, green, blue)
}

/// The id of the default preset.
pub const DEFAULT_ID: &str = "bw";

/// Every built-in palette.
pub static PRESETS: [Preset; 6] = [
    Preset {
        id: "bw",
        name: "1-Bit Black & White",
        colors: &[rgb(0, 0, 0), rgb(255, 255, 255)],
    },
    Preset {
        id: "gameboy",
        name: "Gameboy (Classic)",
        colors: &[
            rgb(15, 56, 15),
            rgb(48, 98, 48),
            rgb(139, 172, 15),
            rgb(155, 188, 15),
        ],
    },
    Preset {
        id: "cga1",
        name: "CGA (Palette 1 High)",
        colors: &[
            rgb(0, 0, 0),
            rgb(85, 255, 255),
            rgb(255, 85, 255),
            rgb(255, 255, 255),
        ],
    },
    Preset {
        id: "mac",
        name: "Macintosh II",
        colors: &[
            rgb(255, 255, 255),
            rgb(255, 255, 0),
            rgb(255, 102, 0),
            rgb(221, 0, 0),
            rgb(255, 0, 153),
            rgb(51, 0, 153),
            rgb(0, 0, 204),
            rgb(0, 153, 255),
            rgb(0, 170, 0),
            rgb(0, 102, 0),
            rgb(102, 51, 0),
            rgb(153, 102, 51),
            rgb(187, 187, 187),
            rgb(136, 136, 136),
            rgb(68, 68, 68),
            rgb(0, 0, 0),
        ],
    },
    Preset {
        id: "vaporwave",
        name: "Vaporwave",
        colors: &[
            rgb(255, 113, 206),
            rgb(1, 205, 254),
            rgb(5, 255, 161),
            rgb(185, 103, 255),
            rgb(255, 251, 150),
            rgb(45, 45, 65),
        ],
    },
    Preset {
        id: "cyberpunk",
        name: "Cyberpunk",
        colors: &[
            rgb(15, 15, 20),
            rgb(252, 224, 40),
            rgb(0, 240, 255),
            rgb(255, 0, 60),
            rgb(113, 28, 145),
        ],
    },
];

/// Returns every built-in palette.
#[must_use]
pub fn all() -> &'static [Preset] {
    &PRESETS
}

/// Looks up a built-in palette by id (case-insensitive).
///
/// # Errors
/// Returns [`ConfigError::UnknownPreset`] if no preset has the given id.
///
/// # Examples
/// ```
/// # use ditherlab::presets;
/// let gameboy = presets::find("gameboy").unwrap();
/// assert_eq!(gameboy.colors.len(), 4);
/// assert!(presets::find("nes").is_err());
/// ```
pub fn find(id: &str) -> Result<&'static Preset, ConfigError> {
    PRESETS
        .iter()
        .find(|preset| preset.id.eq_ignore_ascii_case(id.trim()))
        .ok_or_else(|| ConfigError::UnknownPreset(id.to_owned()))
}
