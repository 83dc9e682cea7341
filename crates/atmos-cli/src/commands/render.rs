//! Atmosphere render command.
//!
//! Effect parameters start from the no-op set, or from a YAML preset when
//! `--preset` is given; individual flags then override single fields.

use crate::RenderArgs;
use anyhow::{Context, Result};
use atmos_ops::EffectParameters;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::{load_image, make_rng, save_image};

/// Runs the render command.
pub fn run(args: RenderArgs) -> Result<()> {
    let params = build_params(&args)?;
    let source = load_image(&args.input)?;
    info!(
        input = %args.input.display(),
        w = source.width(),
        h = source.height(),
        stages = ?params.stages(),
        "Rendering"
    );

    let mut rng = make_rng(args.seed);
    let start = Instant::now();
    let output = atmos_ops::render(&source, &params, &mut rng)
        .with_context(|| format!("Render failed: {}", args.input.display()))?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Render done");

    save_image(&args.output, &output)
}

/// Loads effect parameters from a YAML preset.
pub fn load_preset(path: &Path) -> Result<EffectParameters> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Invalid preset: {}", path.display()))
}

/// Merges preset and flags into validated parameters.
fn build_params(args: &RenderArgs) -> Result<EffectParameters> {
    let mut p = match &args.preset {
        Some(path) => load_preset(path)?,
        None => EffectParameters::default(),
    };

    if let Some(v) = args.blur {
        p.blur_radius = v;
    }
    if let Some(v) = args.saturation {
        p.saturation_percent = v;
    }
    if let Some(v) = args.brightness {
        p.brightness_percent = v;
    }
    if let Some(c) = args.tint {
        p.tint_color = c;
    }
    if let Some(v) = args.tint_opacity {
        p.tint_opacity = v;
    }
    if let Some(v) = args.noise {
        p.noise_intensity = v;
    }
    if let Some(v) = args.amplitude {
        p.distortion_amplitude = v;
    }
    if let Some(v) = args.frequency {
        p.distortion_frequency = v;
    }
    if args.clarity {
        p.center_clarity = true;
    }
    if args.clarity_radius.is_some() {
        p.clarity_radius = args.clarity_radius;
    }
    if let Some(v) = args.max_size {
        p.max_dimension = v;
    }
    if let Some(f) = args.resample {
        p.resample = f;
    }

    debug!(?p, "Effect parameters");
    p.validated().context("Invalid effect parameters")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use atmos_core::{RasterImage, Rgb};
    use clap::Parser;

    fn render_args(argv: &[&str]) -> RenderArgs {
        let mut full = vec!["atmos", "render"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Render(args) => args,
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_flags_without_preset() {
        let args = render_args(&["in.png", "--blur", "2.5", "--tint", "102030", "--tint-opacity", "3"]);
        let p = build_params(&args).unwrap();
        assert_eq!(p.blur_radius, 2.5);
        assert_eq!(p.tint_color, Rgb::new(0x10, 0x20, 0x30));
        // Opacity clamps during validation.
        assert_eq!(p.tint_opacity, 1.0);
        assert_eq!(p.saturation_percent, 100.0);
    }

    #[test]
    fn test_flags_override_preset() {
        let dir = tempfile::tempdir().unwrap();
        let preset = dir.path().join("haze.yaml");
        std::fs::write(&preset, "blur_radius: 8\nnoise_intensity: 4\ncenter_clarity: true\n").unwrap();

        let args = render_args(&["in.png", "--preset", preset.to_str().unwrap(), "--blur", "1"]);
        let p = build_params(&args).unwrap();
        assert_eq!(p.blur_radius, 1.0);
        assert_eq!(p.noise_intensity, 4.0);
        assert!(p.center_clarity);
    }

    #[test]
    fn test_bad_preset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let preset = dir.path().join("bad.yaml");
        std::fs::write(&preset, "blur_radius: [1, 2]\n").unwrap();
        let args = render_args(&["in.png", "--preset", preset.to_str().unwrap()]);
        let err = build_params(&args).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
    }

    #[test]
    fn test_invalid_combination_is_error() {
        let args = render_args(&["in.png", "--amplitude", "5", "--frequency", "0"]);
        assert!(build_params(&args).is_err());
    }

    #[test]
    fn test_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        let src = RasterImage::from_fn(120, 60, |x, y| [x as u8, y as u8, 90, 255]).unwrap();
        atmos_io::write(&input, &src).unwrap();

        let args = render_args(&[
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--max-size",
            "60",
            "--noise",
            "5",
            "--seed",
            "3",
        ]);
        run(args).unwrap();

        let out = atmos_io::read(&output).unwrap();
        assert_eq!(out.dimensions(), (60, 30));
    }
}
