//! Core types for image loading: the raster buffer and decode errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// I/O error during file reading.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Channel layout of a [`RasterImage`] pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channels {
    /// 3 bytes per pixel, opaque.
    Rgb,
    /// 4 bytes per pixel, straight (non-premultiplied) alpha.
    Rgba,
}

impl Channels {
    /// Number of bytes each pixel occupies in the buffer.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An in-memory raster with interleaved 8-bit channels.
///
/// Backgrounds are `Rgb`; overlays are `Rgba` (loaders promote alpha-less
/// overlays to alpha = 255). All compositing operations treat the buffer as
/// immutable input and allocate new buffers for their results.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub channels: Channels,
    /// Interleaved pixel data in row-major order.
    /// Length is width * height * channels.bytes_per_pixel().
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create an RGB raster from raw pixel data.
    pub fn new_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 3) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            channels: Channels::Rgb,
            pixels,
        }
    }

    /// Create an RGBA raster from raw pixel data.
    pub fn new_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            channels: Channels::Rgba,
            pixels,
        }
    }

    /// Create a RasterImage from an `image::RgbImage`.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new_rgb(width, height, img.into_raw())
    }

    /// Create a RasterImage from an `image::RgbaImage`.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new_rgba(width, height, img.into_raw())
    }

    /// Convert to an `image::RgbImage` for further processing.
    ///
    /// Returns `None` for RGBA rasters or mismatched buffers.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != Channels::Rgb {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Bytes per pixel for this raster's layout.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels.bytes_per_pixel()
    }

    /// True if the layout carries an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == Channels::Rgba
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Byte offset of pixel (x, y) in the buffer.
    ///
    /// Callers must ensure x < width and y < height.
    #[inline]
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.bytes_per_pixel()
    }

    /// Return an RGB copy of this raster, dropping alpha if present.
    pub fn to_rgb(&self) -> RasterImage {
        match self.channels {
            Channels::Rgb => self.clone(),
            Channels::Rgba => {
                let mut pixels = Vec::with_capacity((self.width * self.height * 3) as usize);
                for chunk in self.pixels.chunks_exact(4) {
                    pixels.extend_from_slice(&chunk[..3]);
                }
                RasterImage::new_rgb(self.width, self.height, pixels)
            }
        }
    }

    /// Return an RGBA copy of this raster, promoting opaque RGB to alpha = 255.
    pub fn to_rgba(&self) -> RasterImage {
        match self.channels {
            Channels::Rgba => self.clone(),
            Channels::Rgb => {
                let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
                for chunk in self.pixels.chunks_exact(3) {
                    pixels.extend_from_slice(chunk);
                    pixels.push(255);
                }
                RasterImage::new_rgba(self.width, self.height, pixels)
            }
        }
    }

    /// Copy out a pixel-coordinate subregion, clamped to the image bounds.
    ///
    /// The region starts at (left, top) and extends `width` x `height` pixels;
    /// the part that falls outside the image is cut off. Output is at least
    /// 1x1 as long as the source is non-empty.
    pub fn crop(&self, left: u32, top: u32, width: u32, height: u32) -> RasterImage {
        let left = left.min(self.width.saturating_sub(1));
        let top = top.min(self.height.saturating_sub(1));
        let right = (left + width).min(self.width);
        let bottom = (top + height).min(self.height);

        let out_w = right.saturating_sub(left).max(1);
        let out_h = bottom.saturating_sub(top).max(1);

        let bpp = self.bytes_per_pixel();
        let mut pixels = Vec::with_capacity(out_w as usize * out_h as usize * bpp);
        for y in 0..out_h {
            let src_start = self.pixel_index(left, top + y);
            let src_end = src_start + out_w as usize * bpp;
            pixels.extend_from_slice(&self.pixels[src_start..src_end]);
        }

        RasterImage {
            width: out_w,
            height: out_h,
            channels: self.channels,
            pixels,
        }
    }
}
