//! # atmos-core
//!
//! Core types for the atmos image toolkit.
//!
//! - [`RasterImage`] - RGBA8 raster with non-zero dimensions and cheap clones
//! - [`Rgb`] - opaque color triple, parsed from hex
//! - [`Error`] / [`Result`] - shared error type
//!
//! ## Crate Structure
//!
//! ```text
//! atmos-core (this crate)
//!    ^
//!    |
//!    +-- atmos-io  (decode / encode)
//!    +-- atmos-ops (effect pipeline, collage, render session)
//!    +-- atmos-cli (the `atmos` binary)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - hex-string (de)serialization for [`Rgb`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod pixel;

pub use error::{Error, Result};
pub use image::{RasterImage, CHANNELS};
pub use pixel::{
    clamp_u8, luminance_rec709, Rgb, Rgba8, BLEND_LUMA, REC709_LUMA, REC709_LUMA_B,
    REC709_LUMA_G, REC709_LUMA_R,
};

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::Rgb;

    #[test]
    fn test_rgb_yaml_as_hex() {
        let yaml = serde_yaml::to_string(&Rgb::new(255, 0, 16)).unwrap();
        assert!(yaml.contains("#ff0010"));
        let back: Rgb = serde_yaml::from_str("'#ff0010'").unwrap();
        assert_eq!(back, Rgb::new(255, 0, 16));
        assert!(serde_yaml::from_str::<Rgb>("nope").is_err());
    }
}
