//! atmos - atmosphere wallpaper generator
//!
//! Turns a photo into a soft, hazy wallpaper, or into a blob collage.

use anyhow::{Context, Result};
use atmos_core::Rgb;
use atmos_ops::Filter;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "atmos_wallpaper.png";

#[derive(Parser)]
#[command(name = "atmos")]
#[command(author, version, about = "Atmosphere wallpaper generator")]
#[command(long_about = "
Turns a photo into an atmospheric wallpaper: wave distortion, grain, blur,
saturation, a color-blend tint and an optional sharp center.

Examples:
  atmos render photo.jpg                          # No-op render, downscaled to 1920
  atmos render photo.jpg --blur 6 --noise 8 --tint 3060c0 --tint-opacity 0.4
  atmos render photo.jpg --preset haze.yaml --clarity -o wall.png
  atmos collage photo.jpg --blobs 80 --seed 7
  atmos info photo.jpg wall.png
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the atmosphere effects to an image
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Build a blob collage from an image
    #[command(visible_alias = "c")]
    Collage(CollageArgs),

    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),
}

/// Arguments for the `render` command.
#[derive(Args)]
struct RenderArgs {
    /// Input image
    input: PathBuf,

    /// Output image (.png or .jpg)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// YAML preset with effect parameters; flags below override it
    #[arg(short, long)]
    preset: Option<PathBuf>,

    /// Blur radius in pixels
    #[arg(short, long)]
    blur: Option<f32>,

    /// Saturation percent (100 = unchanged)
    #[arg(short, long)]
    saturation: Option<f32>,

    /// Brightness percent (100 = unchanged)
    #[arg(long)]
    brightness: Option<f32>,

    /// Tint color as hex RRGGBB
    #[arg(short, long)]
    tint: Option<Rgb>,

    /// Tint opacity 0..1
    #[arg(long)]
    tint_opacity: Option<f32>,

    /// Grain intensity (max per-pixel offset)
    #[arg(short, long)]
    noise: Option<f32>,

    /// Wave distortion amplitude in pixels
    #[arg(short, long)]
    amplitude: Option<f32>,

    /// Wave distortion period divisor
    #[arg(short, long)]
    frequency: Option<f32>,

    /// Keep the image center sharp
    #[arg(long)]
    clarity: bool,

    /// Center clarity falloff radius (default: half the shorter side)
    #[arg(long)]
    clarity_radius: Option<f32>,

    /// Longest side of the working image
    #[arg(short, long)]
    max_size: Option<u32>,

    /// Downscale filter: nearest, bilinear, lanczos3
    #[arg(long)]
    resample: Option<Filter>,

    /// Seed for reproducible grain
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the `collage` command.
#[derive(Args)]
struct CollageArgs {
    /// Input image
    input: PathBuf,

    /// Output image (.png or .jpg)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Number of blobs
    #[arg(short, long, default_value = "50")]
    blobs: usize,

    /// Grain intensity applied at the end
    #[arg(short = 'n', long, default_value = "10")]
    grain: f32,

    /// Canvas base color as hex RRGGBB
    #[arg(long, default_value = "111111")]
    base: Rgb,

    /// Longest side of the canvas
    #[arg(short, long, default_value = "1920")]
    max_size: u32,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for the `info` command.
#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,
}

/// Installs the tracing subscriber. `RUST_LOG` wins over `-v`.
///
/// The returned guard must live until exit so buffered file logs flush.
fn init_logging(verbose: u8, log: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file: {}", path.display()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Collage(args) => commands::collage::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_flags() {
        let cli = Cli::parse_from([
            "atmos", "-vv", "render", "in.jpg", "--blur", "3", "--tint", "#ff8000",
            "--tint-opacity", "0.5", "--clarity", "--resample", "lanczos3",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.blur, Some(3.0));
        assert_eq!(args.tint, Some(Rgb::new(255, 128, 0)));
        assert_eq!(args.resample, Some(Filter::Lanczos3));
        assert!(args.clarity);
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_parse_collage_defaults() {
        let cli = Cli::parse_from(["atmos", "collage", "in.png", "-j", "2"]);
        assert_eq!(cli.threads, 2);
        let Commands::Collage(args) = cli.command else {
            panic!("expected collage");
        };
        assert_eq!(args.blobs, 50);
        assert_eq!(args.base, Rgb::gray(0x11));
        assert_eq!(args.max_size, 1920);
    }

    #[test]
    fn test_bad_tint_is_rejected() {
        assert!(Cli::try_parse_from(["atmos", "render", "in.png", "--tint", "zzz"]).is_err());
    }
}
