//! Blur filtering.
//!
//! The atmosphere blur is a Gaussian approximation built from repeated box
//! blurs: three passes of a box of radius `r` converge on a bell-shaped
//! kernel, and each pass is a separable sliding-window sum whose cost does
//! not depend on `r`.
//!
//! # Example
//!
//! ```rust
//! use atmos_ops::filter::box_blur;
//!
//! let src = vec![0.5f32; 16 * 16 * 4];
//! let result = box_blur(&src, 16, 16, 4, 3).unwrap();
//! assert_eq!(result.len(), src.len());
//! ```

use crate::parallel::for_each_row;
use crate::{OpsError, OpsResult};
use atmos_core::{clamp_u8, RasterImage, CHANNELS};
use tracing::{debug, trace};

/// Number of box passes used to approximate a Gaussian.
pub const BLUR_PASSES: usize = 3;

/// Largest radius that still changes the result for a `width` x `height`
/// image. Beyond it the window only adds copies of the clamped edge samples.
#[inline]
fn effective_radius(radius: usize, width: usize, height: usize) -> usize {
    radius.min(width.max(height))
}

/// Blurs an RGBA raster with a Gaussian-like kernel of the given radius.
///
/// The radius is rounded to whole pixels and capped at the longer image
/// side. A rounded radius of 0 returns the input unchanged (sharing its
/// buffer). All four channels are filtered; edges clamp. Values stay in
/// `f32` across passes and are rounded once.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::filter::blur;
///
/// let src = RasterImage::filled(8, 8, [40, 80, 120, 255]).unwrap();
/// let out = blur(&src, 2.0).unwrap();
/// assert_eq!(out.pixel(0, 0), [40, 80, 120, 255]);
/// ```
pub fn blur(src: &RasterImage, radius: f32) -> OpsResult<RasterImage> {
    let r = if radius.is_finite() { radius.max(0.0).round() as usize } else { 0 };
    if r == 0 {
        return Ok(src.clone());
    }
    let (w, h) = src.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let r = effective_radius(r, wu, hu);
    debug!(w, h, radius = r, passes = BLUR_PASSES, "Applying blur");

    // Each assignment drops the previous buffer, so at most two are alive.
    let mut buf: Vec<f32> = src.data().iter().map(|&v| v as f32).collect();
    for _ in 0..BLUR_PASSES {
        buf = blur_horizontal(&buf, wu, hu, CHANNELS, r);
        buf = blur_vertical(&buf, wu, hu, CHANNELS, r);
    }

    let bytes = buf.into_iter().map(clamp_u8).collect();
    Ok(RasterImage::from_rgba8(w, h, bytes)?)
}

/// Fast box blur using sliding window (separable).
///
/// Each output sample is the mean of the `2 * radius + 1` samples around it
/// along each axis, with coordinates clamped at the edges. Radii past the
/// longer side are capped there.
pub fn box_blur(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    radius: usize,
) -> OpsResult<Vec<f32>> {
    trace!(width, height, channels, radius, "box_blur");

    if width == 0 || height == 0 || channels == 0 {
        return Err(OpsError::InvalidDimensions(
            "width, height, and channels must be > 0".into(),
        ));
    }

    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| OpsError::InvalidDimensions("image dimensions overflow".into()))?;

    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected,
            src.len()
        )));
    }

    let radius = effective_radius(radius, width, height);
    let temp = blur_horizontal(src, width, height, channels, radius);
    Ok(blur_vertical(&temp, width, height, channels, radius))
}

/// Horizontal blur pass.
fn blur_horizontal(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    radius: usize,
) -> Vec<f32> {
    let inv_size = 1.0 / (2 * radius + 1) as f32;
    let mut dst = vec![0.0f32; width * height * channels];

    for_each_row(&mut dst, width * channels, |y, row| {
        let line = &src[y * width * channels..(y + 1) * width * channels];
        for c in 0..channels {
            // Window centered on x = 0; the left half is clamped to the first sample.
            let mut sum = line[c] * radius as f32;
            for kx in 0..=radius {
                sum += line[kx.min(width - 1) * channels + c];
            }

            for x in 0..width {
                row[x * channels + c] = sum * inv_size;

                let left = x.saturating_sub(radius);
                let right = (x + radius + 1).min(width - 1);
                sum += line[right * channels + c] - line[left * channels + c];
            }
        }
    });

    dst
}

#[inline]
fn row_at(src: &[f32], stride: usize, y: usize) -> &[f32] {
    &src[y * stride..(y + 1) * stride]
}

/// Vertical blur pass.
///
/// Walks the rows top to bottom with one running sum per column, so it reads
/// `src` in place instead of transposing it.
fn blur_vertical(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    radius: usize,
) -> Vec<f32> {
    let stride = width * channels;
    let inv_size = 1.0 / (2 * radius + 1) as f32;
    let mut dst = vec![0.0f32; stride * height];

    // Window centered on y = 0; the top half is clamped to the first row.
    let mut sums: Vec<f32> = row_at(src, stride, 0).iter().map(|&v| v * radius as f32).collect();
    for ky in 0..=radius {
        for (s, &v) in sums.iter_mut().zip(row_at(src, stride, ky.min(height - 1))) {
            *s += v;
        }
    }

    for (y, out) in dst.chunks_exact_mut(stride).enumerate() {
        for (o, &s) in out.iter_mut().zip(&sums) {
            *o = s * inv_size;
        }

        let top = row_at(src, stride, y.saturating_sub(radius));
        let bottom = row_at(src, stride, (y + radius + 1).min(height - 1));
        for ((s, &add), &sub) in sums.iter_mut().zip(bottom).zip(top) {
            *s += add - sub;
        }
    }

    dst
}
