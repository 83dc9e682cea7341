//! Raster image buffer.
//!
//! [`RasterImage`] is the single image type flowing through the workspace:
//! an RGBA grid with 8 bits per channel and straight alpha.
//!
//! # Memory Layout
//!
//! Pixels are stored **row-major**, top-to-bottom, channels interleaved:
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//!         ...
//! ```
//!
//! # Ownership
//!
//! The buffer lives behind an [`Arc`], so cloning a raster is cheap and
//! shares data. Processing stages never write into their input; they build a
//! new raster (or call [`RasterImage::data_mut`], which copies on write when
//! the buffer is shared). A clone handed to a stage is therefore a safe
//! snapshot of the pre-stage pixels.
//!
//! # Usage
//!
//! ```rust
//! use atmos_core::RasterImage;
//!
//! let mut img = RasterImage::filled(4, 4, [128, 128, 128, 255]).unwrap();
//! img.set_pixel(1, 2, [255, 0, 0, 255]);
//! assert_eq!(img.pixel(1, 2), [255, 0, 0, 255]);
//! ```

use crate::pixel::Rgba8;
use crate::{Error, Result};
use std::sync::Arc;

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 4;

/// Owned RGBA8 raster with non-zero dimensions.
///
/// Zero-area rasters cannot be constructed: every constructor fails with
/// [`Error::InvalidDimensions`] instead, so downstream stages may assume
/// `width >= 1 && height >= 1`.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Pixel data buffer (Arc for cheap cloning)
    data: Arc<Vec<u8>>,
    /// Image width in pixels
    width: u32,
    /// Image height in pixels
    height: u32,
}

/// Validates dimensions and returns the expected buffer length.
fn buffer_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "zero-sized image"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "buffer size overflows"))
}

impl RasterImage {
    /// Creates a transparent black image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = buffer_len(width, height)?;
        Ok(Self {
            data: Arc::new(vec![0; len]),
            width,
            height,
        })
    }

    /// Creates an image from interleaved RGBA8 data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if a side is zero or the data
    /// length is not `width * height * 4`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atmos_core::RasterImage;
    ///
    /// let img = RasterImage::from_rgba8(2, 1, vec![0; 8]).unwrap();
    /// assert_eq!(img.dimensions(), (2, 1));
    /// assert!(RasterImage::from_rgba8(2, 1, vec![0; 7]).is_err());
    /// ```
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = buffer_len(width, height)?;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} bytes, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
        })
    }

    /// Creates an image from interleaved RGB8 data, with alpha set to 255.
    pub fn from_rgb8(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        let expected = buffer_len(width, height)? / CHANNELS * 3;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} RGB bytes, got {}", expected, data.len()),
            ));
        }
        let rgba = data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect();
        Self::from_rgba8(width, height, rgba)
    }

    /// Creates an image filled with a single pixel value.
    pub fn filled(width: u32, height: u32, pixel: Rgba8) -> Result<Self> {
        let len = buffer_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / CHANNELS {
            data.extend_from_slice(&pixel);
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
        })
    }

    /// Creates an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> Rgba8,
    {
        let len = buffer_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the image dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the number of bytes in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the pixel data.
    ///
    /// If the data is shared (Arc refcount > 1), this clones it first so
    /// other holders keep their snapshot.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Returns `true` if both images share the same buffer.
    #[inline]
    pub fn shares_buffer(&self, other: &RasterImage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    #[inline]
    fn pixel_offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Returns the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.pixel_offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3]]
    }

    /// Returns the pixel at (x, y), or an error if out of bounds.
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<Rgba8> {
        if x < self.width && y < self.height {
            Ok(self.pixel(x, y))
        } else {
            Err(Error::out_of_bounds(x, y, self.width, self.height))
        }
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.pixel_offset(x, y);
        self.data_mut()[o..o + CHANNELS].copy_from_slice(&pixel);
    }

    /// Iterates over all pixels with their coordinates, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Rgba8)> + '_ {
        let w = self.width;
        self.data.chunks_exact(CHANNELS).enumerate().map(move |(i, p)| {
            let i = i as u32;
            (i % w, i / w, [p[0], p[1], p[2], p[3]])
        })
    }

    /// Returns a new image with `f` applied to every pixel.
    ///
    /// The receiver is left untouched.
    ///
    /// ```rust
    /// use atmos_core::RasterImage;
    ///
    /// let img = RasterImage::filled(2, 2, [10, 20, 30, 255]).unwrap();
    /// let inv = img.map_pixels(|p| [255 - p[0], 255 - p[1], 255 - p[2], p[3]]);
    /// assert_eq!(inv.pixel(0, 0), [245, 235, 225, 255]);
    /// assert_eq!(img.pixel(0, 0), [10, 20, 30, 255]);
    /// ```
    pub fn map_pixels<F>(&self, f: F) -> RasterImage
    where
        F: Fn(Rgba8) -> Rgba8,
    {
        let data = self
            .data
            .chunks_exact(CHANNELS)
            .flat_map(|p| f([p[0], p[1], p[2], p[3]]))
            .collect();
        RasterImage {
            data: Arc::new(data),
            width: self.width,
            height: self.height,
        }
    }

    /// Returns an error unless both images have the same dimensions.
    pub fn ensure_same_size(&self, other: &RasterImage) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), other.dimensions()));
        }
        Ok(())
    }

    /// Returns `true` if every pixel has alpha 255.
    pub fn is_opaque(&self) -> bool {
        self.data.chunks_exact(CHANNELS).all(|p| p[3] == 255)
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
