//! PNG format support.
//!
//! Decodes 8- and 16-bit grayscale, gray+alpha, RGB, RGBA and palette
//! images into RGBA8 rasters, and encodes rasters as 8-bit RGBA with an
//! sRGB chunk.
//!
//! # Example
//!
//! ```rust,no_run
//! use atmos_io::png::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.png", &image)?;
//! # Ok::<(), atmos_io::IoError>(())
//! ```

use crate::{IoError, IoResult};
use atmos_core::RasterImage;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Seek, Write};
use std::path::Path;
use tracing::trace;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Decodes a PNG held in memory.
pub fn read_from_memory(data: &[u8]) -> IoResult<RasterImage> {
    decode(Cursor::new(data))
}

fn decode<R: BufRead + Seek>(reader: R) -> IoResult<RasterImage> {
    let mut decoder = png::Decoder::new(reader);
    // Palette and sub-byte gray become 8-bit RGB(A)/gray; tRNS becomes alpha.
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    trace!(w = info.width, h = info.height, color = ?info.color_type, depth = ?info.bit_depth, "png decode");

    let samples = &buf[..info.buffer_size()];
    let samples = match info.bit_depth {
        png::BitDepth::Eight => samples.to_vec(),
        png::BitDepth::Sixteen => samples
            .chunks_exact(2)
            .map(|be| u16_to_u8(u16::from_be_bytes([be[0], be[1]])))
            .collect(),
        depth => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {depth:?}",
                info.color_type
            )));
        }
    };

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => samples,
        png::ColorType::Rgb => samples
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => samples.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::GrayscaleAlpha => samples
            .chunks_exact(2)
            .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
            .collect(),
        png::ColorType::Indexed => {
            return Err(IoError::DecodeError("palette was not expanded".into()));
        }
    };

    Ok(RasterImage::from_rgba8(info.width, info.height, rgba)?)
}

/// Scales a 16-bit sample to 8 bits with rounding.
#[inline]
fn u16_to_u8(v: u16) -> u8 {
    ((v as u32 * 255 + 32767) / 65535) as u8
}

/// Writes an image to a PNG file as 8-bit RGBA.
pub fn write<P: AsRef<Path>>(path: P, image: &RasterImage) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    encode(BufWriter::new(file), image)
}

/// Encodes an image as an 8-bit RGBA PNG in memory.
pub fn write_to_memory(image: &RasterImage) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(&mut buffer, image)?;
    Ok(buffer)
}

fn encode<W: Write>(writer: W, image: &RasterImage) -> IoResult<()> {
    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .write_image_data(image.data())
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}
