//! Brightness and saturation adjustment.
//!
//! Saturation scales each pixel's distance from its own Rec.709 luma:
//! `c' = L + s * (c - L)`. At 100% the pixel is unchanged, at 0% it becomes
//! gray, above 100% chroma is amplified. Brightness multiplies every color
//! channel. Both are applied before the single clamp, so stacking them never
//! loses precision to an intermediate round.

use atmos_core::{clamp_u8, luminance_rec709, RasterImage, Rgba8};
use tracing::trace;

/// Adjusts one pixel. Percentages are on the 100 = identity scale.
#[inline]
pub fn adjust_pixel(p: Rgba8, saturation_percent: f32, brightness_percent: f32) -> Rgba8 {
    let s = saturation_percent / 100.0;
    let b = brightness_percent / 100.0;
    let rgb = [p[0] as f32, p[1] as f32, p[2] as f32];
    let l = luminance_rec709(rgb);
    let out = rgb.map(|c| (l + s * (c - l)) * b);
    [clamp_u8(out[0]), clamp_u8(out[1]), clamp_u8(out[2]), p[3]]
}

/// Returns `src` with saturation and brightness applied.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::adjust::brightness_saturation;
///
/// let src = RasterImage::filled(2, 2, [200, 100, 50, 255]).unwrap();
/// let gray = brightness_saturation(&src, 0.0, 100.0);
/// let p = gray.pixel(0, 0);
/// assert_eq!(p[0], p[1]);
/// assert_eq!(p[1], p[2]);
/// ```
pub fn brightness_saturation(
    src: &RasterImage,
    saturation_percent: f32,
    brightness_percent: f32,
) -> RasterImage {
    trace!(saturation_percent, brightness_percent, "brightness_saturation");
    src.map_pixels(|p| adjust_pixel(p, saturation_percent, brightness_percent))
}
