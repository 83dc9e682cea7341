//! # atmos-io
//!
//! Image I/O for atmos.
//!
//! Every decoder produces an RGBA8 [`RasterImage`]; RGB and grayscale
//! sources get alpha 255.
//!
//! - **PNG** - 8/16-bit gray, gray+alpha, RGB, RGBA and palette in; RGBA8 out
//! - **JPEG** - baseline/progressive in; RGB out (alpha dropped)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use atmos_io::{read, write};
//!
//! let image = read("input.jpg")?;
//! write("output.png", &image)?;
//! # Ok::<(), atmos_io::IoError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};

use atmos_core::RasterImage;
use std::path::Path;
use tracing::debug;

/// Summary of a decoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Detected container format.
    pub format: Format,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// True if every pixel has alpha 255.
    pub opaque: bool,
}

fn unsupported(format: Format, what: &str) -> IoError {
    IoError::UnsupportedFormat(format!("{what} {format} (feature disabled or unknown format)"))
}

/// Reads an image from a file, auto-detecting the format.
///
/// The format is detected by magic bytes, falling back to the extension.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), %format, "Reading image");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path),
        other => Err(unsupported(other, "cannot read")),
    }
}

/// Decodes an image held in memory, detecting the format from its bytes.
pub fn read_from_memory(data: &[u8]) -> IoResult<RasterImage> {
    match Format::from_bytes(data) {
        #[cfg(feature = "png")]
        Format::Png => png::read_from_memory(data),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read_from_memory(data),
        other => Err(unsupported(other, "cannot decode")),
    }
}

/// Writes an image, choosing the format from the file extension.
///
/// `.png` writes lossless RGBA8; `.jpg`/`.jpeg` writes RGB at the default
/// quality.
pub fn write<P: AsRef<Path>>(path: P, image: &RasterImage) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), %format, w = image.width(), h = image.height(), "Writing image");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write(path, image, jpeg::DEFAULT_QUALITY),
        other => Err(unsupported(other, "cannot write")),
    }
}

/// Decodes a file and reports its format and size.
pub fn probe<P: AsRef<Path>>(path: P) -> IoResult<ImageInfo> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    let image = read(path)?;
    Ok(ImageInfo {
        format,
        width: image.width(),
        height: image.height(),
        opaque: image.is_opaque(),
    })
}
