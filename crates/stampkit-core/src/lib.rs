//! Stampkit Core - Overlay compositing library
//!
//! This crate provides the core compositing functionality for stampkit:
//! dominant-direction estimation, overlay rotation and alpha blending, and
//! YOLO-style label derivation for object-detection dataset augmentation.
//!
//! The typical flow is: load a background and an overlay with [`decode`],
//! place the overlay with [`composite`] (or through a [`session::StampSession`]
//! for interactive preview/commit), then persist the composite via [`encode`]
//! and the labels via [`label`].

pub mod compose;
pub mod decode;
pub mod direction;
pub mod encode;
pub mod label;
pub mod session;

pub use compose::{
    alpha_blend, composite, composite_with_rng, compute_rotated_bounds, rotate_image,
    ComposeError, CompositeResult, RotationMode,
};
pub use decode::{decode_background, decode_overlay, Channels, DecodeError, RasterImage};
pub use direction::{estimate_direction, DirectionError, DirectionEstimate};
pub use encode::{encode_jpeg, encode_png, EncodeError};
pub use session::StampSession;

/// A point in background-image pixel coordinates where the overlay's
/// center is placed.
///
/// Signed so the caller can report pointer positions that fall outside the
/// image; the compositor rejects those with
/// [`ComposeError::AnchorOutOfBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Anchor {
    /// Horizontal position in pixels from the left edge.
    pub x: i32,
    /// Vertical position in pixels from the top edge.
    pub y: i32,
}

impl Anchor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True if this anchor lies inside a width x height image rectangle.
    pub fn in_bounds(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

/// An object location in normalized YOLO label coordinates.
///
/// All four numeric fields are fractions of the image width/height in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedBBox {
    /// Object class identifier.
    pub class_id: u32,
    /// Box center, fraction of image width.
    pub center_x: f64,
    /// Box center, fraction of image height.
    pub center_y: f64,
    /// Box width, fraction of image width.
    pub width: f64,
    /// Box height, fraction of image height.
    pub height: f64,
}

impl NormalizedBBox {
    pub fn new(class_id: u32, center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            class_id,
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Check that every numeric field lies in [0, 1].
    pub fn is_normalized(&self) -> bool {
        [self.center_x, self.center_y, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Same box relabeled with a different class.
    pub fn with_class(self, class_id: u32) -> Self {
        Self { class_id, ..self }
    }

    /// Area of the box in normalized units.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}
