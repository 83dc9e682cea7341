//! End-to-end tests for the effect pipeline.

use atmos_core::{RasterImage, Rgb};
use atmos_ops::composite::tint_pixel;
use atmos_ops::resize::{downscale_to_bound, Filter};
use atmos_ops::{render, EffectParameters};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};

// ============================================================================
// Helpers
// ============================================================================

/// Generator wrapper that counts how often it is asked for randomness.
struct CountingRng {
    inner: Pcg32,
    calls: usize,
}

impl CountingRng {
    fn new(seed: u64) -> Self {
        Self { inner: Pcg32::seed_from_u64(seed), calls: 0 }
    }
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.calls += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.calls += 1;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.calls += 1;
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.calls += 1;
        self.inner.try_fill_bytes(dest)
    }
}

fn scene(w: u32, h: u32) -> RasterImage {
    RasterImage::from_fn(w, h, |x, y| {
        [
            (x * 255 / w.max(1)) as u8,
            (y * 255 / h.max(1)) as u8,
            ((x ^ y) & 0xff) as u8,
            255,
        ]
    })
    .unwrap()
}

// ============================================================================
// No-op behavior
// ============================================================================

#[test]
fn test_noop_pipeline_equals_downscaled_source() {
    for (w, h, bound) in [(40, 30, 1920), (300, 120, 100), (17, 64, 32)] {
        let src = scene(w, h);
        let params = EffectParameters { max_dimension: bound, ..Default::default() };
        assert!(params.is_noop());

        let out = render(&src, &params, &mut Pcg32::seed_from_u64(1)).unwrap();
        let expected = downscale_to_bound(&src, bound, Filter::Bilinear).unwrap();
        assert_eq!(out, expected, "{w}x{h} bound {bound}");
    }
}

#[test]
fn test_zero_amplitude_ignores_frequency() {
    let src = scene(50, 40);
    let base = render(&src, &EffectParameters::default(), &mut Pcg32::seed_from_u64(0)).unwrap();
    for freq in [0.01, 1.0, 37.5, 1.0e6] {
        let params = EffectParameters { distortion_frequency: freq, ..Default::default() };
        let out = render(&src, &params, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(out, base, "frequency {freq}");
    }
}

#[test]
fn test_zero_noise_never_touches_rng() {
    let src = scene(32, 32);
    let params = EffectParameters {
        blur_radius: 2.0,
        saturation_percent: 60.0,
        tint_color: Rgb::new(20, 200, 90),
        tint_opacity: 0.4,
        distortion_amplitude: 3.0,
        center_clarity: true,
        noise_intensity: 0.0,
        ..Default::default()
    };
    let mut rng = CountingRng::new(5);
    render(&src, &params, &mut rng).unwrap();
    assert_eq!(rng.calls, 0);

    let noisy = EffectParameters { noise_intensity: 4.0, ..params };
    let mut rng = CountingRng::new(5);
    render(&src, &noisy, &mut rng).unwrap();
    assert!(rng.calls >= 32 * 32);
}

// ============================================================================
// Stage properties through the pipeline
// ============================================================================

#[test]
fn test_noise_only_stays_within_intensity() {
    let src = scene(64, 48);
    let params = EffectParameters { noise_intensity: 9.0, ..Default::default() };
    let out = render(&src, &params, &mut Pcg32::seed_from_u64(42)).unwrap();
    for ((_, _, o), (_, _, n)) in src.pixels().zip(out.pixels()) {
        for c in 0..3 {
            let lo = (o[c] as i32 - 9).max(0);
            let hi = (o[c] as i32 + 9).min(255);
            assert!((lo..=hi).contains(&(n[c] as i32)), "{o:?} -> {n:?}");
        }
        assert_eq!(o[3], n[3]);
    }
}

#[test]
fn test_center_clarity_restores_center_only() {
    let src = scene(81, 61);
    let effects = EffectParameters {
        blur_radius: 3.0,
        saturation_percent: 0.0,
        ..Default::default()
    };
    let with_clarity = EffectParameters { center_clarity: true, ..effects.clone() };

    let plain = render(&src, &effects, &mut Pcg32::seed_from_u64(0)).unwrap();
    let clear = render(&src, &with_clarity, &mut Pcg32::seed_from_u64(0)).unwrap();

    assert_eq!(clear.pixel(40, 30), src.pixel(40, 30));
    // Default radius is 30; corners are fully processed.
    for (x, y) in [(0, 0), (80, 0), (0, 60), (80, 60)] {
        assert_eq!(clear.pixel(x, y), plain.pixel(x, y));
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_red_tint_over_gray_is_uniform() {
    let gray = [128, 128, 128, 255];
    let src = RasterImage::filled(4, 4, gray).unwrap();
    let params = EffectParameters {
        tint_color: Rgb::new(255, 0, 0),
        tint_opacity: 0.5,
        ..Default::default()
    };
    let out = render(&src, &params, &mut Pcg32::seed_from_u64(0)).unwrap();

    let expected = tint_pixel(gray, [1.0, 0.0, 0.0], 0.5);
    assert!((191..=192).contains(&expected[0]), "{expected:?}");
    assert!((100..=101).contains(&expected[1]), "{expected:?}");
    assert_eq!(expected[1], expected[2]);
    assert_eq!(expected[3], 255);
    for (_, _, p) in out.pixels() {
        assert_eq!(p, expected);
    }
}

#[test]
fn test_downscale_bound_sets_working_size() {
    let src = RasterImage::filled(2000, 1000, [60, 70, 80, 255]).unwrap();
    let params = EffectParameters {
        max_dimension: 1000,
        blur_radius: 1.0,
        noise_intensity: 3.0,
        ..Default::default()
    };
    let out = render(&src, &params, &mut Pcg32::seed_from_u64(3)).unwrap();
    assert_eq!(out.dimensions(), (1000, 500));
}

#[test]
fn test_portrait_downscale() {
    let src = scene(300, 900);
    let params = EffectParameters { max_dimension: 450, ..Default::default() };
    let out = render(&src, &params, &mut Pcg32::seed_from_u64(0)).unwrap();
    assert_eq!(out.dimensions(), (150, 450));
}

// ============================================================================
// Extreme parameters
// ============================================================================

#[test]
fn test_max_noise_intensity_renders() {
    let src = RasterImage::filled(4, 4, [128, 128, 128, 255]).unwrap();
    let params = EffectParameters { noise_intensity: f32::MAX, ..Default::default() };
    assert!(params.validated().is_ok());

    let out = render(&src, &params, &mut Pcg32::seed_from_u64(9)).unwrap();
    assert_eq!(out.dimensions(), (4, 4));
    for (_, _, p) in out.pixels() {
        assert_eq!(p[0], p[1]);
        assert_eq!(p[3], 255);
    }
}

#[test]
fn test_huge_blur_radius_is_fast_and_capped() {
    let src = scene(8, 8);
    for radius in [4.0e8, 1.0e30, f32::MAX] {
        let params = EffectParameters { blur_radius: radius, ..Default::default() };
        let started = Instant::now();
        let out = render(&src, &params, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5), "radius {radius}");

        let clamped = EffectParameters { blur_radius: 8.0, ..Default::default() };
        let expected = render(&src, &clamped, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(out, expected, "radius {radius}");
    }
}
