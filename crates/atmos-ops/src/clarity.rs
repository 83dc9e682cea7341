//! Center clarity.
//!
//! Radially mixes the unprocessed frame back in around the image center so
//! the subject stays sharp while the edges carry the full effect.

use crate::OpsResult;
use atmos_core::{clamp_u8, RasterImage, Rgba8};
use tracing::trace;

/// Falloff radius used when none is given: half the shorter side.
pub fn default_radius(width: u32, height: u32) -> f32 {
    width.min(height) as f32 / 2.0
}

/// Weight of the original pixel at distance `d` from the center.
///
/// 1 at the center, 0 at and beyond `radius`, linear in between.
#[inline]
pub fn clarity_weight(d: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return if d <= 0.0 { 1.0 } else { 0.0 };
    }
    ((radius - d) / radius).clamp(0.0, 1.0)
}

#[inline]
fn mix(processed: Rgba8, original: Rgba8, t: f32) -> Rgba8 {
    let ch = |i: usize| clamp_u8(processed[i] as f32 * (1.0 - t) + original[i] as f32 * t);
    [ch(0), ch(1), ch(2), 255]
}

/// Blends `original` into `processed` with a linear radial falloff.
///
/// The center is `(width / 2, height / 2)` in whole pixels. `radius`
/// defaults to [`default_radius`]. Output alpha is always 255.
///
/// # Errors
///
/// Fails if the two images differ in size.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::clarity::center_clarity;
///
/// let original = RasterImage::filled(9, 9, [255, 255, 255, 255]).unwrap();
/// let processed = RasterImage::filled(9, 9, [0, 0, 0, 255]).unwrap();
/// let out = center_clarity(&original, &processed, None).unwrap();
/// assert_eq!(out.pixel(4, 4), [255, 255, 255, 255]);
/// assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
/// ```
pub fn center_clarity(
    original: &RasterImage,
    processed: &RasterImage,
    radius: Option<f32>,
) -> OpsResult<RasterImage> {
    original.ensure_same_size(processed)?;
    let (w, h) = processed.dimensions();
    let radius = radius.unwrap_or_else(|| default_radius(w, h));
    let (cx, cy) = ((w / 2) as f32, (h / 2) as f32);
    trace!(w, h, radius, "center_clarity");

    Ok(RasterImage::from_fn(w, h, |x, y| {
        let d = (x as f32 - cx).hypot(y as f32 - cy);
        mix(processed.pixel(x, y), original.pixel(x, y), clarity_weight(d, radius))
    })?)
}
