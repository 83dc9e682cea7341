//! # atmos-ops
//!
//! Pixel effects for atmosphere wallpapers.
//!
//! The core is [`render`], a fixed-order pipeline of independent stages
//! driven by an [`EffectParameters`] value. Any stage whose parameter sits
//! at its no-op value is skipped entirely.
//!
//! # Modules
//!
//! - [`resize`] - Downscale-to-bound and separable resampling
//! - [`warp`] - Wave distortion
//! - [`grain`] - Monochrome noise
//! - [`filter`] - Gaussian-like blur
//! - [`adjust`] - Brightness and saturation
//! - [`composite`] - Color-blend tint and Porter-Duff over
//! - [`clarity`] - Radial center clarity
//! - [`pipeline`] - The stages wired together
//! - [`collage`] - Blob collage wallpaper mode
//! - [`session`] - Latest-wins background rendering
//!
//! # Example
//!
//! ```rust
//! use atmos_core::{RasterImage, Rgb};
//! use atmos_ops::{render, EffectParameters};
//! use rand::SeedableRng;
//! use rand_pcg::Pcg32;
//!
//! let src = RasterImage::filled(4, 4, [128, 128, 128, 255]).unwrap();
//! let params = EffectParameters {
//!     tint_color: Rgb::new(255, 0, 0),
//!     tint_opacity: 0.5,
//!     ..Default::default()
//! };
//! let out = render(&src, &params, &mut Pcg32::seed_from_u64(0)).unwrap();
//! assert!(out.pixel(0, 0)[0] > 128);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod parallel;

pub mod adjust;
pub mod clarity;
pub mod collage;
pub mod composite;
pub mod filter;
pub mod grain;
pub mod params;
pub mod pipeline;
pub mod resize;
pub mod session;
pub mod warp;

pub use error::{OpsError, OpsResult};
pub use params::{EffectParameters, Stage};
pub use pipeline::render;
pub use resize::Filter;
