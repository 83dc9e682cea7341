//! Warp/distortion operations.
//!
//! Backward-mapped resampling: each effect computes a source coordinate for
//! every destination pixel, so the destination has no holes and every pixel
//! is written exactly once. Sources are read from the input raster, which is
//! never the buffer being written.
//!
//! When the `parallel` feature is enabled, rows are processed with rayon.

use crate::parallel::for_each_row;
use crate::OpsResult;
use atmos_core::{RasterImage, Rgba8, CHANNELS};
use tracing::trace;

/// Nearest sample with coordinates rounded and clamped into the image.
#[inline]
fn sample_nearest(src: &RasterImage, x: f32, y: f32) -> Rgba8 {
    let max_x = (src.width() - 1) as f32;
    let max_y = (src.height() - 1) as f32;
    let sx = x.round().clamp(0.0, max_x) as u32;
    let sy = y.round().clamp(0.0, max_y) as u32;
    src.pixel(sx, sy)
}

/// Apply a generic warp using a coordinate generator function.
///
/// `coord_fn(x, y)` returns the source position for destination `(x, y)`.
pub fn apply_warp<F>(src: &RasterImage, coord_fn: F) -> OpsResult<RasterImage>
where
    F: Fn(u32, u32) -> (f32, f32) + Send + Sync,
{
    let (w, h) = src.dimensions();
    let mut dst = vec![0u8; src.data().len()];

    for_each_row(&mut dst, src.row_len(), |y, row| {
        for x in 0..w {
            let (sx, sy) = coord_fn(x, y as u32);
            let idx = x as usize * CHANNELS;
            row[idx..idx + CHANNELS].copy_from_slice(&sample_nearest(src, sx, sy));
        }
    });

    Ok(RasterImage::from_rgba8(w, h, dst)?)
}

/// Apply a two-axis sine wave distortion.
///
/// Destination `(x, y)` samples the source at
/// `(x + amplitude * sin(y / frequency), y + amplitude * sin(x / frequency))`.
///
/// # Arguments
/// * `amplitude` - Displacement in pixels
/// * `frequency` - Wave period divisor (larger = longer waves), must be > 0
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::warp::wave;
///
/// let src = RasterImage::from_fn(8, 8, |x, y| [x as u8, y as u8, 0, 255]).unwrap();
/// let same = wave(&src, 0.0, 3.0).unwrap();
/// assert_eq!(same, src);
/// ```
pub fn wave(src: &RasterImage, amplitude: f32, frequency: f32) -> OpsResult<RasterImage> {
    trace!(w = src.width(), h = src.height(), amplitude, frequency, "wave");
    apply_warp(src, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        (
            fx + amplitude * (fy / frequency).sin(),
            fy + amplitude * (fx / frequency).sin(),
        )
    })
}
