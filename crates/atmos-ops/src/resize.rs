//! Image resize and the downscale-to-bound stage.
//!
//! Provides separable filtered resampling of RGBA8 rasters and the first
//! pipeline stage, which limits the working resolution.
//!
//! # Filters
//!
//! - [`Filter::Nearest`] - Fastest, no interpolation (blocky)
//! - [`Filter::Bilinear`] - Triangle filter, widened when downscaling
//! - [`Filter::Lanczos3`] - Sinc-based, sharpest downscale
//!
//! # Example
//!
//! ```rust
//! use atmos_core::RasterImage;
//! use atmos_ops::resize::{downscale_to_bound, Filter};
//!
//! let src = RasterImage::filled(2000, 1000, [10, 20, 30, 255]).unwrap();
//! let work = downscale_to_bound(&src, 1000, Filter::Bilinear).unwrap();
//! assert_eq!(work.dimensions(), (1000, 500));
//! ```

use crate::parallel::for_each_row;
use crate::{OpsError, OpsResult};
use atmos_core::{clamp_u8, RasterImage, CHANNELS};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Nearest-neighbor (fastest, no interpolation).
    Nearest,
    /// Bilinear (triangle) interpolation.
    #[default]
    Bilinear,
    /// Lanczos-3 (high quality, may ring on hard edges).
    Lanczos3,
}

impl Filter {
    /// Returns the support radius for this filter.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the filter kernel at position x.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Nearest => nearest_weight(x),
            Filter::Bilinear => bilinear_weight(x),
            Filter::Lanczos3 => lanczos_weight(x, 3.0),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = OpsError;

    fn from_str(s: &str) -> OpsResult<Self> {
        match s.to_lowercase().as_str() {
            "nearest" | "point" => Ok(Filter::Nearest),
            "bilinear" | "linear" | "triangle" => Ok(Filter::Bilinear),
            "lanczos" | "lanczos3" => Ok(Filter::Lanczos3),
            _ => Err(OpsError::InvalidParameter(format!(
                "unknown filter '{s}' (valid: nearest, bilinear, lanczos3)"
            ))),
        }
    }
}

#[inline]
fn nearest_weight(x: f32) -> f32 {
    if x.abs() < 0.5 { 1.0 } else { 0.0 }
}

#[inline]
fn bilinear_weight(x: f32) -> f32 {
    let ax = x.abs();
    if ax < 1.0 { 1.0 - ax } else { 0.0 }
}

#[inline]
fn lanczos_weight(x: f32, a: f32) -> f32 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Calculates the aspect-preserving size whose longer side is at most `bound`.
///
/// Images already within the bound keep their size. The shorter side is
/// rounded and never drops below 1.
///
/// # Example
///
/// ```rust
/// use atmos_ops::resize::fit_within;
///
/// assert_eq!(fit_within(2000, 1000, 1000), (1000, 500));
/// assert_eq!(fit_within(1000, 3000, 1500), (500, 1500));
/// assert_eq!(fit_within(640, 480, 1920), (640, 480));
/// ```
pub fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    if width <= bound && height <= bound {
        return (width, height);
    }
    let long = width.max(height) as f64;
    let scale = bound as f64 / long;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, bound);
    if width >= height {
        (bound, fit(height))
    } else {
        (fit(width), bound)
    }
}

/// Downscales `src` so neither side exceeds `bound`.
///
/// Returns a clone sharing the source buffer when no scaling is needed, so
/// the no-op case costs no copy.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] if `bound` is zero.
pub fn downscale_to_bound(src: &RasterImage, bound: u32, filter: Filter) -> OpsResult<RasterImage> {
    if bound == 0 {
        return Err(OpsError::InvalidParameter("max dimension must be > 0".into()));
    }
    let (w, h) = src.dimensions();
    let (dst_w, dst_h) = fit_within(w, h, bound);
    if (dst_w, dst_h) == (w, h) {
        trace!(w, h, bound, "downscale: within bound");
        return Ok(src.clone());
    }
    debug!(w, h, dst_w, dst_h, ?filter, "Downscaling to working resolution");
    resize(src, dst_w, dst_h, filter)
}

/// Resizes an RGBA8 raster to `dst_w` x `dst_h`.
///
/// All four channels are filtered in `f32` and rounded once at the end.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::resize::{resize, Filter};
///
/// let src = RasterImage::filled(16, 16, [128, 64, 32, 255]).unwrap();
/// let dst = resize(&src, 32, 8, Filter::Lanczos3).unwrap();
/// assert_eq!(dst.dimensions(), (32, 8));
/// ```
pub fn resize(src: &RasterImage, dst_w: u32, dst_h: u32, filter: Filter) -> OpsResult<RasterImage> {
    if dst_w == 0 || dst_h == 0 {
        return Err(OpsError::InvalidDimensions(
            "destination size must be > 0".into(),
        ));
    }
    let (src_w, src_h) = src.dimensions();
    let data: Vec<f32> = src.data().iter().map(|&v| v as f32).collect();

    // Two-pass separable resize: horizontal then vertical
    let temp = resize_horizontal(&data, src_w as usize, src_h as usize, dst_w as usize, filter);
    let result = resize_vertical(&temp, dst_w as usize, src_h as usize, dst_h as usize, filter);

    let bytes = result.into_iter().map(clamp_u8).collect();
    Ok(RasterImage::from_rgba8(dst_w, dst_h, bytes)?)
}

/// Source taps for one destination sample: first index and normalized weights.
fn taps(dst: usize, src_len: usize, scale: f32, filter: Filter) -> (usize, Vec<f32>) {
    let support = filter.support() * scale.max(1.0);
    let center = (dst as f32 + 0.5) * scale - 0.5;
    let first = ((center - support).floor() as isize).max(0) as usize;
    let last = ((center + support).ceil().max(0.0) as usize).min(src_len - 1);

    let mut weights: Vec<f32> = (first..=last)
        .map(|s| filter.weight((s as f32 - center) / scale.max(1.0)))
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum.abs() > f32::EPSILON {
        for w in &mut weights {
            *w /= sum;
        }
    } else {
        // Filter missed every tap (nearest on an exact half); take the closest.
        let nearest = (center.round().max(0.0) as usize).clamp(first, last);
        weights.iter_mut().for_each(|w| *w = 0.0);
        weights[nearest - first] = 1.0;
    }
    (first, weights)
}

/// Horizontal resize pass.
fn resize_horizontal(src: &[f32], src_w: usize, src_h: usize, dst_w: usize, filter: Filter) -> Vec<f32> {
    let scale = src_w as f32 / dst_w as f32;
    let columns: Vec<_> = (0..dst_w).map(|x| taps(x, src_w, scale, filter)).collect();
    let mut dst = vec![0.0f32; dst_w * src_h * CHANNELS];

    for_each_row(&mut dst, dst_w * CHANNELS, |y, row| {
        let src_row = &src[y * src_w * CHANNELS..(y + 1) * src_w * CHANNELS];
        for (x, (first, weights)) in columns.iter().enumerate() {
            let out = &mut row[x * CHANNELS..(x + 1) * CHANNELS];
            for (i, w) in weights.iter().enumerate() {
                let s = (first + i) * CHANNELS;
                for c in 0..CHANNELS {
                    out[c] += src_row[s + c] * w;
                }
            }
        }
    });

    dst
}

/// Vertical resize pass.
fn resize_vertical(src: &[f32], src_w: usize, src_h: usize, dst_h: usize, filter: Filter) -> Vec<f32> {
    let scale = src_h as f32 / dst_h as f32;
    let row_len = src_w * CHANNELS;
    let mut dst = vec![0.0f32; row_len * dst_h];

    for_each_row(&mut dst, row_len, |y, row| {
        let (first, weights) = taps(y, src_h, scale, filter);
        for (i, w) in weights.iter().enumerate() {
            let src_row = &src[(first + i) * row_len..(first + i + 1) * row_len];
            for (o, s) in row.iter_mut().zip(src_row) {
                *o += s * w;
            }
        }
    });

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_weights() {
        assert!((Filter::Nearest.weight(0.0) - 1.0).abs() < 0.01);
        assert!((Filter::Nearest.weight(0.6) - 0.0).abs() < 0.01);

        assert!((Filter::Bilinear.weight(0.0) - 1.0).abs() < 0.01);
        assert!((Filter::Bilinear.weight(0.5) - 0.5).abs() < 0.01);

        assert!((Filter::Lanczos3.weight(0.0) - 1.0).abs() < 0.01);
        assert_eq!(Filter::Lanczos3.weight(3.5), 0.0);
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("Lanczos".parse::<Filter>().unwrap(), Filter::Lanczos3);
        assert_eq!("linear".parse::<Filter>().unwrap(), Filter::Bilinear);
        assert_eq!("point".parse::<Filter>().unwrap(), Filter::Nearest);
        assert!("mitchell".parse::<Filter>().is_err());
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(2000, 1000, 1000), (1000, 500));
        assert_eq!(fit_within(1000, 2000, 1000), (500, 1000));
        assert_eq!(fit_within(1000, 1000, 1000), (1000, 1000));
        assert_eq!(fit_within(5000, 1, 100), (100, 1));
        assert_eq!(fit_within(1920, 1080, 1280), (1280, 720));
    }

    #[test]
    fn test_downscale_reaches_bound() {
        let src = RasterImage::filled(2000, 1000, [50, 100, 150, 255]).unwrap();
        let dst = downscale_to_bound(&src, 1000, Filter::Bilinear).unwrap();
        assert_eq!(dst.dimensions(), (1000, 500));
        // Constant image stays constant
        for (_, _, p) in dst.pixels() {
            assert_eq!(p, [50, 100, 150, 255]);
        }
    }

    #[test]
    fn test_downscale_within_bound_shares_buffer() {
        let src = RasterImage::filled(64, 32, [1, 2, 3, 255]).unwrap();
        let dst = downscale_to_bound(&src, 64, Filter::Lanczos3).unwrap();
        assert!(dst.shares_buffer(&src));
    }

    #[test]
    fn test_downscale_zero_bound_rejected() {
        let src = RasterImage::new(4, 4).unwrap();
        assert!(downscale_to_bound(&src, 0, Filter::Bilinear).is_err());
    }

    #[test]
    fn test_resize_upscale_constant() {
        let src = RasterImage::filled(4, 4, [128, 128, 128, 255]).unwrap();
        for filter in [Filter::Nearest, Filter::Bilinear, Filter::Lanczos3] {
            let dst = resize(&src, 8, 8, filter).unwrap();
            assert_eq!(dst.dimensions(), (8, 8));
            for (_, _, p) in dst.pixels() {
                assert_eq!(p, [128, 128, 128, 255], "{filter:?}");
            }
        }
    }

    #[test]
    fn test_resize_downscale_averages() {
        // Alternating black/white columns average to mid-gray.
        let src = RasterImage::from_fn(64, 4, |x, _| {
            let v = if x % 2 == 0 { 0 } else { 255 };
            [v, v, v, 255]
        })
        .unwrap();
        let dst = resize(&src, 16, 4, Filter::Bilinear).unwrap();
        for (x, _, p) in dst.pixels() {
            if (2..14).contains(&x) {
                assert!((p[0] as i32 - 128).abs() <= 8, "x={x} got {}", p[0]);
            }
        }
    }
}
