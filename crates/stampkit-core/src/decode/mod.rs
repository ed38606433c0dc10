//! Image loading for stamp compositing.
//!
//! This module provides functionality for:
//! - Decoding backgrounds (JPEG/PNG) into opaque RGB rasters
//! - Decoding overlays (PNG preferred) into RGBA rasters
//! - Applying EXIF orientation so pixel data is always upright
//!
//! Overlays without an alpha channel are promoted to alpha = 255 on load so
//! rotation and blending can treat every overlay uniformly.

mod load;
mod types;

pub use load::{decode_background, decode_overlay};
pub use types::{Channels, DecodeError, Orientation, RasterImage};
