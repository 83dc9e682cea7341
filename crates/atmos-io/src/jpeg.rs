//! JPEG format support.
//!
//! Baseline and progressive JPEGs decode to opaque RGBA8 rasters. Gray,
//! 16-bit gray and CMYK sources are converted to RGB on the way in.
//! Encoding drops alpha.

use crate::{IoError, IoResult};
use atmos_core::RasterImage;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;

/// Default encode quality (1-100).
pub const DEFAULT_QUALITY: u8 = 90;

/// Reads a JPEG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<RasterImage> {
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Decodes a JPEG held in memory.
pub fn read_from_memory(data: &[u8]) -> IoResult<RasterImage> {
    decode(data)
}

fn decode<R: Read>(reader: R) -> IoResult<RasterImage> {
    let mut decoder = jpeg_decoder::Decoder::new(reader);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let (width, height) = (info.width as u32, info.height as u32);
    trace!(w = width, h = height, format = ?info.pixel_format, "jpeg decode");

    let rgb: Vec<u8> = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => pixels,
        jpeg_decoder::PixelFormat::L8 => pixels.iter().flat_map(|&g| [g, g, g]).collect(),
        jpeg_decoder::PixelFormat::L16 => pixels
            .chunks_exact(2)
            .flat_map(|l16| [l16[0], l16[0], l16[0]])
            .collect(),
        jpeg_decoder::PixelFormat::CMYK32 => pixels
            .chunks_exact(4)
            .flat_map(|cmyk| {
                let k = 1.0 - cmyk[3] as f32 / 255.0;
                let ch = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
                [ch(cmyk[0]), ch(cmyk[1]), ch(cmyk[2])]
            })
            .collect(),
    };

    Ok(RasterImage::from_rgb8(width, height, &rgb)?)
}

/// Writes an image to a JPEG file, discarding alpha.
pub fn write<P: AsRef<Path>>(path: P, image: &RasterImage, quality: u8) -> IoResult<()> {
    let data = write_to_memory(image, quality)?;
    std::fs::write(path.as_ref(), data)?;
    Ok(())
}

/// Encodes an image as JPEG in memory, discarding alpha.
pub fn write_to_memory(image: &RasterImage, quality: u8) -> IoResult<Vec<u8>> {
    use jpeg_encoder::{ColorType, Encoder};

    let (w, h) = image.dimensions();
    let (w16, h16) = match (u16::try_from(w), u16::try_from(h)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(IoError::EncodeError(format!(
                "{w}x{h} exceeds the JPEG size limit of 65535"
            )));
        }
    };

    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(image.data(), w16, h16, ColorType::Rgba)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    Ok(buffer)
}
