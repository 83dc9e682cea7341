//! Compositing and blending.
//!
//! Provides the Porter-Duff over operator and the non-separable "color"
//! blend mode used by the tint overlay.
//!
//! # Color blend
//!
//! The color mode keeps the backdrop's luma and takes hue and saturation from
//! the source (W3C Compositing Level 1):
//!
//! ```text
//! Lum(C)        = 0.3 R + 0.59 G + 0.11 B
//! B(Cb, Cs)     = SetLum(Cs, Lum(Cb))
//! SetLum(C, l)  = ClipColor(C + (l - Lum(C)))
//! ```
//!
//! # Example
//!
//! ```rust
//! use atmos_ops::composite::{blend_color, over_pixel};
//!
//! let gray = [0.5, 0.5, 0.5];
//! let red = [1.0, 0.0, 0.0];
//! let tinted = blend_color(gray, red);
//! assert!(tinted[0] > tinted[1]);
//!
//! let fg = [1.0, 0.0, 0.0, 0.5]; // Semi-transparent red
//! let bg = [0.0, 0.0, 1.0, 1.0]; // Opaque blue
//! let result = over_pixel(fg, bg);
//! assert!(result[0] > 0.4 && result[2] > 0.4);
//! ```

use atmos_core::{clamp_u8, RasterImage, Rgb, Rgba8, BLEND_LUMA};
use tracing::trace;

const EPS: f32 = 1e-6;

/// Luma used by the non-separable blend modes.
#[inline]
pub fn lum(c: [f32; 3]) -> f32 {
    c[0] * BLEND_LUMA[0] + c[1] * BLEND_LUMA[1] + c[2] * BLEND_LUMA[2]
}

/// Pulls an out-of-gamut color back into `[0, 1]` while keeping its luma.
pub fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut c = c;
    if n < 0.0 && l - n > EPS {
        c = c.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > EPS {
        c = c.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    c
}

/// Shifts `c` so its luma equals `l`, then clips into gamut.
#[inline]
pub fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

/// "Color" blend: hue and saturation of `source`, luma of `backdrop`.
///
/// Inputs and output are unit-range RGB.
#[inline]
pub fn blend_color(backdrop: [f32; 3], source: [f32; 3]) -> [f32; 3] {
    set_lum(source, lum(backdrop))
}

/// Composites foreground over background (Porter-Duff Over).
///
/// Straight (non-premultiplied) unit-range RGBA in and out.
#[inline]
pub fn over_pixel(fg: [f32; 4], bg: [f32; 4]) -> [f32; 4] {
    let fg_a = fg[3];
    let bg_a = bg[3];
    let out_a = fg_a + bg_a * (1.0 - fg_a);

    if out_a < 1e-8 {
        return [0.0, 0.0, 0.0, 0.0];
    }

    let inv_out_a = 1.0 / out_a;
    [
        (fg[0] * fg_a + bg[0] * bg_a * (1.0 - fg_a)) * inv_out_a,
        (fg[1] * fg_a + bg[1] * bg_a * (1.0 - fg_a)) * inv_out_a,
        (fg[2] * fg_a + bg[2] * bg_a * (1.0 - fg_a)) * inv_out_a,
        out_a,
    ]
}

#[inline]
fn to_unit(p: Rgba8) -> [f32; 4] {
    [
        p[0] as f32 / 255.0,
        p[1] as f32 / 255.0,
        p[2] as f32 / 255.0,
        p[3] as f32 / 255.0,
    ]
}

#[inline]
fn from_unit(p: [f32; 4]) -> Rgba8 {
    [
        clamp_u8(p[0] * 255.0),
        clamp_u8(p[1] * 255.0),
        clamp_u8(p[2] * 255.0),
        clamp_u8(p[3] * 255.0),
    ]
}

/// Porter-Duff over on 8-bit pixels.
#[inline]
pub fn over_rgba8(fg: Rgba8, bg: Rgba8) -> Rgba8 {
    match fg[3] {
        255 => fg,
        0 => bg,
        _ => from_unit(over_pixel(to_unit(fg), to_unit(bg))),
    }
}

/// Draws a solid `color` at `opacity` over one pixel with the color blend.
///
/// Uses the general source-over formula with blending, so translucent
/// backdrops are handled:
///
/// ```text
/// co = as*(1-ab)*Cs + as*ab*B(Cb, Cs) + (1-as)*ab*Cb
/// ao = as + ab*(1-as)
/// ```
pub fn tint_pixel(p: Rgba8, color: [f32; 3], opacity: f32) -> Rgba8 {
    let a_s = opacity.clamp(0.0, 1.0);
    let [r, g, b, a_b] = to_unit(p);
    let cb = [r, g, b];
    let a_o = a_s + a_b * (1.0 - a_s);
    if a_o < 1e-8 {
        return p;
    }

    let mixed = blend_color(cb, color);
    let channel = |i: usize| {
        (a_s * (1.0 - a_b) * color[i] + a_s * a_b * mixed[i] + (1.0 - a_s) * a_b * cb[i]) / a_o
    };
    from_unit([channel(0), channel(1), channel(2), a_o])
}

/// Returns `src` with a solid color laid over it in "color" blend mode.
///
/// # Example
///
/// ```rust
/// use atmos_core::{RasterImage, Rgb};
/// use atmos_ops::composite::tint;
///
/// let src = RasterImage::filled(4, 4, [128, 128, 128, 255]).unwrap();
/// let out = tint(&src, Rgb::new(255, 0, 0), 0.5);
/// let p = out.pixel(0, 0);
/// assert!(p[0] > p[1]);
/// assert_eq!(p[1], p[2]);
/// assert_eq!(p[3], 255);
/// ```
pub fn tint(src: &RasterImage, color: Rgb, opacity: f32) -> RasterImage {
    trace!(%color, opacity, "tint");
    let cs = color.to_unit();
    src.map_pixels(|p| tint_pixel(p, cs, opacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_lum_hits_target() {
        for c in [[1.0, 0.0, 0.0], [0.2, 0.9, 0.4], [0.0, 0.0, 1.0]] {
            for l in [0.1, 0.5, 0.9] {
                let out = set_lum(c, l);
                assert_relative_eq!(lum(out), l, epsilon = 1e-4);
                for v in out {
                    assert!((-1e-5..=1.0 + 1e-5).contains(&v), "{out:?}");
                }
            }
        }
    }

    #[test]
    fn test_blend_color_red_over_gray() {
        let out = blend_color([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]);
        assert_relative_eq!(out[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(out[1], out[2], epsilon = 1e-6);
        assert_relative_eq!(lum(out), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_blend_color_gray_source_gives_gray() {
        let out = blend_color([0.8, 0.1, 0.3], [0.5, 0.5, 0.5]);
        let l = lum([0.8, 0.1, 0.3]);
        for v in out {
            assert_relative_eq!(v, l, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_tint_opacity_extremes() {
        let p = [30, 140, 200, 255];
        assert_eq!(tint_pixel(p, [1.0, 0.0, 0.0], 0.0), p);

        let full = tint_pixel(p, [1.0, 0.0, 0.0], 1.0);
        let expected = blend_color([30.0 / 255.0, 140.0 / 255.0, 200.0 / 255.0], [1.0, 0.0, 0.0]);
        assert_eq!(full, from_unit([expected[0], expected[1], expected[2], 1.0]));
    }

    #[test]
    fn test_tint_transparent_backdrop_takes_source() {
        let p = tint_pixel([0, 0, 0, 0], [0.0, 1.0, 0.0], 0.5);
        assert_eq!(p, [0, 255, 0, 128]);
    }

    #[test]
    fn test_over_pixel_opaque_fg() {
        let fg = [0.2, 0.4, 0.6, 1.0];
        let bg = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(over_pixel(fg, bg), fg);
    }

    #[test]
    fn test_over_rgba8() {
        assert_eq!(over_rgba8([1, 2, 3, 255], [9, 9, 9, 255]), [1, 2, 3, 255]);
        assert_eq!(over_rgba8([1, 2, 3, 0], [9, 9, 9, 255]), [9, 9, 9, 255]);
        let half = over_rgba8([255, 0, 0, 128], [0, 0, 255, 255]);
        assert_eq!(half[3], 255);
        assert!(half[0] > 120 && half[2] > 120);
    }

    #[test]
    fn test_over_both_transparent() {
        assert_eq!(over_pixel([1.0, 1.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0]), [0.0; 4]);
    }
}
