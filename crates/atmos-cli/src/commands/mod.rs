//! CLI command implementations

pub mod collage;
pub mod info;
pub mod render;

use anyhow::{Context, Result};
use atmos_core::RasterImage;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::path::Path;
use tracing::info;

/// Load image from path
pub fn load_image(path: &Path) -> Result<RasterImage> {
    atmos_io::read(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &RasterImage) -> Result<()> {
    atmos_io::write(path, image).with_context(|| format!("Failed to save: {}", path.display()))?;
    info!(path = %path.display(), w = image.width(), h = image.height(), "Saved");
    Ok(())
}

/// Seeded generator, or one seeded from the OS when `seed` is `None`.
pub fn make_rng(seed: Option<u64>) -> Pcg32 {
    match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    }
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
