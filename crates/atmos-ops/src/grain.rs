//! Film grain / noise.
//!
//! Monochrome grain: each pixel gets one uniform random offset that is added
//! to R, G and B alike, so the noise shifts brightness without tinting.
//! Alpha is never touched.
//!
//! Randomness comes from the caller's generator. Pixels are visited in
//! row-major order with exactly one draw each, which makes the output a pure
//! function of the generator state.

use atmos_core::{RasterImage, CHANNELS};
use rand::Rng;
use tracing::trace;

/// Largest useful intensity: no channel can move further than this.
pub const MAX_INTENSITY: f32 = 255.0;

/// Adds one offset to a channel, keeping the result within `intensity` of
/// the original and inside `[0, 255]`.
#[inline]
fn jitter(c: u8, offset: f32, intensity: f32) -> u8 {
    let c = c as f32;
    let lo = (c - intensity).max(0.0).ceil();
    let hi = (c + intensity).min(255.0).floor();
    (c + offset).round().clamp(lo, hi) as u8
}

/// Returns `src` with grain of magnitude `intensity` applied.
///
/// Each pixel draws one offset uniformly from `[-intensity, +intensity]`.
/// A non-positive intensity returns the input unchanged without drawing from
/// `rng`. Intensities above [`MAX_INTENSITY`] are capped to it.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::grain::add_noise;
/// use rand::SeedableRng;
/// use rand_pcg::Pcg32;
///
/// let src = RasterImage::filled(4, 4, [100, 100, 100, 255]).unwrap();
/// let mut rng = Pcg32::seed_from_u64(7);
/// let noisy = add_noise(&src, 10.0, &mut rng);
/// for (_, _, p) in noisy.pixels() {
///     assert!((90..=110).contains(&p[0]));
///     assert_eq!(p[0], p[1]);
///     assert_eq!(p[3], 255);
/// }
/// ```
pub fn add_noise<R: Rng + ?Sized>(src: &RasterImage, intensity: f32, rng: &mut R) -> RasterImage {
    if intensity.is_nan() || intensity <= 0.0 {
        return src.clone();
    }
    let intensity = intensity.min(MAX_INTENSITY);
    trace!(w = src.width(), h = src.height(), intensity, "add_noise");

    let mut out = src.clone();
    for px in out.data_mut().chunks_exact_mut(CHANNELS) {
        let offset: f32 = rng.gen_range(-intensity..=intensity);
        for c in &mut px[..3] {
            *c = jitter(*c, offset, intensity);
        }
    }
    out
}
