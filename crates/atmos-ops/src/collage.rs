//! Blob collage.
//!
//! The second wallpaper mode: a dark base covered with soft-edged "blobs",
//! each showing the part of the source image around the blob, then grain.
//!
//! A blob outline is a ring of 6 to 9 vertices at jittered radii joined by
//! quadratic curves that all bend toward the blob center, which gives the
//! petal-like shapes. Outlines are flattened to polygons and filled with the
//! even-odd rule at pixel centers.

use crate::composite::over_rgba8;
use crate::resize::{downscale_to_bound, Filter};
use crate::{grain, OpsError, OpsResult};
use atmos_core::{RasterImage, Rgb};
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, trace};

/// Line segments per flattened curve.
const CURVE_SEGMENTS: usize = 12;

/// Collage settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CollageOptions {
    /// Number of blobs to stamp.
    pub blob_count: usize,
    /// Grain intensity applied to the finished canvas.
    pub grain: f32,
    /// Canvas fill color.
    pub base: Rgb,
    /// Longest side of the working image.
    pub max_dimension: u32,
}

impl Default for CollageOptions {
    fn default() -> Self {
        Self {
            blob_count: 50,
            grain: 10.0,
            base: Rgb::gray(0x11),
            max_dimension: crate::params::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// One randomly shaped stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Center in canvas coordinates.
    pub center: (f32, f32),
    /// Nominal width of the stamped region.
    pub width: f32,
    /// Nominal height of the stamped region.
    pub height: f32,
    /// Outline vertices before flattening.
    pub vertices: Vec<(f32, f32)>,
}

#[inline]
fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..1.0)
}

impl Blob {
    /// Draws a blob centered somewhere inside a `width` x `height` canvas.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Self {
        let cx = unit(rng) * width as f32;
        let cy = unit(rng) * height as f32;
        let w = 100.0 + unit(rng) * 200.0;
        let h = 100.0 + unit(rng) * 200.0;
        let steps = 6 + (unit(rng) * 4.0) as usize;

        let vertices = (0..steps)
            .map(|i| {
                let angle = TAU * i as f32 / steps as f32;
                let r = (w / 2.0) * (0.7 + unit(rng) * 0.6);
                (cx + r * angle.cos(), cy + r * angle.sin())
            })
            .collect();

        Self { center: (cx, cy), width: w, height: h, vertices }
    }

    /// Flattened outline: curves between consecutive vertices with the
    /// center as control point, closed by a straight edge.
    pub fn polygon(&self) -> Vec<(f32, f32)> {
        let Some(&first) = self.vertices.first() else {
            return Vec::new();
        };
        let (cx, cy) = self.center;
        let mut out = vec![first];
        for pair in self.vertices.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            for s in 1..=CURVE_SEGMENTS {
                let t = s as f32 / CURVE_SEGMENTS as f32;
                let (a, b, c) = ((1.0 - t) * (1.0 - t), 2.0 * (1.0 - t) * t, t * t);
                out.push((a * x0 + b * cx + c * x1, a * y0 + b * cy + c * y1));
            }
        }
        out
    }
}

/// Sorted x crossings of the horizontal line at `y` with a closed polygon.
fn crossings(poly: &[(f32, f32)], y: f32, xs: &mut Vec<f32>) {
    xs.clear();
    let n = poly.len();
    for i in 0..n {
        let (x0, y0) = poly[i];
        let (x1, y1) = poly[(i + 1) % n];
        if (y0 <= y) != (y1 <= y) {
            xs.push(x0 + (y - y0) / (y1 - y0) * (x1 - x0));
        }
    }
    xs.sort_by(f32::total_cmp);
}

/// Calls `f(x, y)` for every pixel of a `width` x `height` grid whose
/// center lies inside `poly` (even-odd rule).
pub fn fill_polygon<F>(poly: &[(f32, f32)], width: u32, height: u32, mut f: F)
where
    F: FnMut(u32, u32),
{
    if poly.len() < 3 {
        return;
    }
    let (min_y, max_y) = poly
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    let y0 = (min_y - 0.5).ceil().max(0.0) as u32;
    let y1 = ((max_y - 0.5).floor().max(-1.0) + 1.0).min(height as f32) as u32;

    let mut xs = Vec::new();
    for y in y0..y1 {
        crossings(poly, y as f32 + 0.5, &mut xs);
        for span in xs.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().clamp(0.0, width as f32) as u32;
            let end = (span[1] - 0.5).ceil().clamp(0.0, width as f32) as u32;
            for x in start..end {
                f(x, y);
            }
        }
    }
}

/// Stamps the source region under `blob` onto `canvas`.
///
/// The region is `width` x `height` pixels; its top-left is at
/// `center - size / 2` on the canvas and at the same point clamped to 0 in
/// the source.
fn stamp(canvas: &mut RasterImage, source: &RasterImage, blob: &Blob) {
    let (cw, ch) = canvas.dimensions();
    let (left, top) = (blob.center.0 - blob.width / 2.0, blob.center.1 - blob.height / 2.0);
    let (dx, dy) = (left.floor() as i64, top.floor() as i64);
    let (sx0, sy0) = (left.max(0.0).floor() as i64, top.max(0.0).floor() as i64);
    let (tw, th) = (blob.width as i64, blob.height as i64);

    fill_polygon(&blob.polygon(), cw, ch, |px, py| {
        let (lx, ly) = (px as i64 - dx, py as i64 - dy);
        if !(0..tw).contains(&lx) || !(0..th).contains(&ly) {
            return;
        }
        let Ok(fg) = source.try_pixel((sx0 + lx) as u32, (sy0 + ly) as u32) else {
            return;
        };
        let bg = canvas.pixel(px, py);
        canvas.set_pixel(px, py, over_rgba8(fg, bg));
    });
}

/// Builds a blob collage from `source`.
///
/// The canvas has the dimensions of `source` downscaled to
/// `opts.max_dimension`. All randomness comes from `rng`.
///
/// # Errors
///
/// Fails on a zero `max_dimension` or a non-finite grain.
///
/// # Example
///
/// ```rust
/// use atmos_core::RasterImage;
/// use atmos_ops::collage::{collage, CollageOptions};
/// use rand::SeedableRng;
/// use rand_pcg::Pcg32;
///
/// let src = RasterImage::filled(320, 240, [200, 180, 160, 255]).unwrap();
/// let out = collage(&src, &CollageOptions::default(), &mut Pcg32::seed_from_u64(4)).unwrap();
/// assert_eq!(out.dimensions(), (320, 240));
/// ```
pub fn collage<R: Rng + ?Sized>(
    source: &RasterImage,
    opts: &CollageOptions,
    rng: &mut R,
) -> OpsResult<RasterImage> {
    if !opts.grain.is_finite() {
        return Err(OpsError::InvalidParameter(format!(
            "grain must be finite, got {}",
            opts.grain
        )));
    }
    let work = downscale_to_bound(source, opts.max_dimension, Filter::default())?;
    let (w, h) = work.dimensions();
    debug!(w, h, blobs = opts.blob_count, "Building collage");

    let mut canvas = RasterImage::filled(w, h, opts.base.to_rgba8())?;
    for i in 0..opts.blob_count {
        let blob = Blob::random(rng, w, h);
        trace!(i, center = ?blob.center, steps = blob.vertices.len(), "blob");
        stamp(&mut canvas, &work, &blob);
    }

    Ok(grain::add_noise(&canvas, opts.grain.min(grain::MAX_INTENSITY), rng))
}
