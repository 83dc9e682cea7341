//! Pixel types and luma helpers.
//!
//! # Types
//!
//! - [`Rgba8`] - one RGBA pixel, 8 bits per channel
//! - [`Rgb`] - an opaque color triple (tint colors, fill colors)
//!
//! # Luma
//!
//! Two luma weightings are in use:
//!
//! - [`REC709_LUMA`] - used by saturation adjustment (filter-effects semantics)
//! - [`BLEND_LUMA`] - used by the non-separable "color" blend mode
//!   (compositing semantics)
//!
//! # Used By
//!
//! - [`crate::RasterImage`] - pixel storage
//! - `atmos-ops` - per-pixel stages

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Luma Constants
// ============================================================================

/// Rec.709 luminance coefficient for red channel.
///
/// Used in the standard luminance formula: `Y = 0.2126*R + 0.7152*G + 0.0722*B`
pub const REC709_LUMA_R: f32 = 0.2126;

/// Rec.709 luminance coefficient for green channel.
pub const REC709_LUMA_G: f32 = 0.7152;

/// Rec.709 luminance coefficient for blue channel.
pub const REC709_LUMA_B: f32 = 0.0722;

/// Rec.709 luminance coefficients as an array [R, G, B].
pub const REC709_LUMA: [f32; 3] = [REC709_LUMA_R, REC709_LUMA_G, REC709_LUMA_B];

/// Luma weights of the compositing "color"/"luminosity" blend modes.
pub const BLEND_LUMA: [f32; 3] = [0.3, 0.59, 0.11];

/// Calculate Rec.709 luminance from RGB values.
///
/// # Example
///
/// ```
/// use atmos_core::luminance_rec709;
///
/// let y = luminance_rec709([1.0, 1.0, 1.0]);
/// assert!((y - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    rgb[0] * REC709_LUMA_R + rgb[1] * REC709_LUMA_G + rgb[2] * REC709_LUMA_B
}

/// Rounds and clamps a channel value into `[0, 255]`.
///
/// Every stage writes channels through this so out-of-range math never wraps.
///
/// ```
/// use atmos_core::clamp_u8;
///
/// assert_eq!(clamp_u8(-3.0), 0);
/// assert_eq!(clamp_u8(127.6), 128);
/// assert_eq!(clamp_u8(300.0), 255);
/// ```
#[inline]
pub fn clamp_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// Rgba8
// ============================================================================

/// One RGBA pixel with straight (non-premultiplied) alpha.
pub type Rgba8 = [u8; 4];

// ============================================================================
// Rgb
// ============================================================================

/// An opaque 8-bit RGB color.
///
/// Parses from and formats to hex (`#RRGGBB`), which is also its serde
/// representation when the `serde` feature is on.
///
/// ```
/// use atmos_core::Rgb;
///
/// let red: Rgb = "#ff0000".parse().unwrap();
/// assert_eq!(red, Rgb::new(255, 0, 0));
/// assert_eq!(red.to_string(), "#ff0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// White.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Creates a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a gray with all channels equal.
    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }

    /// Returns the color as an opaque RGBA pixel.
    #[inline]
    pub const fn to_rgba8(self) -> Rgba8 {
        [self.r, self.g, self.b, 255]
    }

    /// Returns the channels normalized to `[0, 1]`.
    #[inline]
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid_color(s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::invalid_color(s))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}
