//! Overlay compositing: rotation-mode resolution, alpha blending, and
//! bounding-box derivation.
//!
//! [`composite`] is the main entry point: it resolves the rotation angle for
//! the selected [`RotationMode`], rotates the overlay about its center with
//! canvas expansion, blends it onto a copy of the background at the anchor,
//! and derives the normalized YOLO-style bounding box of the stamped region.
//!
//! The background is never mutated; every call returns fresh buffers.

mod blend;
mod rotate;

pub use blend::alpha_blend;
pub use rotate::{compute_rotated_bounds, rotate_image};

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RasterImage;
use crate::direction::{estimate_direction, DirectionError};
use crate::{Anchor, NormalizedBBox};

/// How the overlay's rotation angle is chosen.
///
/// The selection is caller-held state: it persists across composite calls
/// until changed. `Random` draws a fresh angle on every call; `Fixed`
/// carries the last angle explicitly set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationMode {
    /// Rotate by this many degrees, clockwise-positive.
    Fixed(f64),
    /// Rotate by a fresh uniform draw from [0, 360) per call.
    Random,
    /// Rotate to the dominant gradient direction of the background region
    /// under the overlay's footprint.
    DirectionAligned,
}

impl RotationMode {
    /// Parse a fixed angle from free-form text input.
    ///
    /// Unparseable input recovers to 0 degrees rather than failing, so a
    /// half-typed angle in a UI field never interrupts live preview.
    pub fn fixed_from_input(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(angle) => RotationMode::Fixed(angle),
            Err(_) => {
                debug!("unparseable fixed angle {:?}, defaulting to 0", text);
                RotationMode::Fixed(0.0)
            }
        }
    }
}

impl Default for RotationMode {
    fn default() -> Self {
        RotationMode::Fixed(0.0)
    }
}

/// Errors from overlay compositing.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The anchor point lies outside the background rectangle.
    #[error("Anchor ({x}, {y}) is outside the {width}x{height} background")]
    AnchorOutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    /// Blend operands differ in spatial dimensions.
    #[error(
        "Dimension mismatch: background {background_width}x{background_height}, \
         overlay {overlay_width}x{overlay_height}"
    )]
    DimensionMismatch {
        background_width: u32,
        background_height: u32,
        overlay_width: u32,
        overlay_height: u32,
    },

    /// No opaque overlay pixel lands inside the background.
    #[error("Overlay footprint has no opaque pixels inside the background")]
    EmptyFootprint,

    /// Direction estimation failed for `DirectionAligned` mode.
    #[error(transparent)]
    Direction(#[from] DirectionError),
}

/// Output of [`composite`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    /// The background with the overlay blended in, same dimensions as the
    /// input background.
    pub image: RasterImage,
    /// Tight normalized bounding box of the stamped footprint, class 0.
    pub bbox: NormalizedBBox,
    /// The rotation angle that was applied, in degrees.
    pub angle_degrees: f64,
}

/// Composite an overlay onto a background at the anchor.
///
/// `Random` mode draws from the thread-local generator; use
/// [`composite_with_rng`] to inject a seeded one.
///
/// # Errors
///
/// - [`ComposeError::AnchorOutOfBounds`] when the anchor lies outside the
///   background rectangle. In-bounds anchors near an edge never fail:
///   the direction-estimation region slides inward and the paste window is
///   clipped to the background.
/// - [`ComposeError::EmptyFootprint`] when no opaque overlay pixel lands
///   inside the background (e.g. a fully transparent overlay).
/// - [`ComposeError::Direction`] when `DirectionAligned` estimation fails.
pub fn composite(
    background: &RasterImage,
    overlay: &RasterImage,
    anchor: Anchor,
    mode: RotationMode,
) -> Result<CompositeResult, ComposeError> {
    composite_with_rng(background, overlay, anchor, mode, &mut rand::thread_rng())
}

/// [`composite`] with a caller-supplied random generator for `Random` mode.
pub fn composite_with_rng<R: Rng>(
    background: &RasterImage,
    overlay: &RasterImage,
    anchor: Anchor,
    mode: RotationMode,
    rng: &mut R,
) -> Result<CompositeResult, ComposeError> {
    if !anchor.in_bounds(background.width, background.height) {
        return Err(ComposeError::AnchorOutOfBounds {
            x: anchor.x,
            y: anchor.y,
            width: background.width,
            height: background.height,
        });
    }

    let overlay = overlay.to_rgba();
    let angle_degrees = resolve_angle(background, &overlay, anchor, mode, rng)?;
    debug!(
        "compositing at ({}, {}) with angle {:.2} deg",
        anchor.x, anchor.y, angle_degrees
    );

    let rotated = rotate_image(&overlay, angle_degrees, [0, 0, 0, 0]);
    let left = anchor.x as i64 - rotated.width as i64 / 2;
    let top = anchor.y as i64 - rotated.height as i64 / 2;

    let bbox = footprint_bbox(&rotated, left, top, background.width, background.height)
        .ok_or(ComposeError::EmptyFootprint)?;

    let mut canvas = background.to_rgb();
    blend::blend_into(&mut canvas, &rotated, left, top);

    Ok(CompositeResult {
        image: canvas,
        bbox,
        angle_degrees,
    })
}

fn resolve_angle<R: Rng>(
    background: &RasterImage,
    overlay: &RasterImage,
    anchor: Anchor,
    mode: RotationMode,
    rng: &mut R,
) -> Result<f64, ComposeError> {
    match mode {
        RotationMode::Fixed(angle) => Ok(angle),
        RotationMode::Random => Ok(rng.gen_range(0.0..360.0)),
        RotationMode::DirectionAligned => {
            let region = direction_region(background, overlay, anchor);
            let estimate = estimate_direction(&region)?;
            Ok(estimate.angle_degrees())
        }
    }
}

/// The overlay-sized background window centered on the anchor.
///
/// At the image edges the window slides inward instead of failing, so every
/// in-bounds anchor yields a region of the overlay's full size (clipped to
/// the background when the overlay is larger than it).
fn direction_region(
    background: &RasterImage,
    overlay: &RasterImage,
    anchor: Anchor,
) -> RasterImage {
    let max_left = (background.width as i64 - overlay.width as i64).max(0);
    let max_top = (background.height as i64 - overlay.height as i64).max(0);

    let left = (anchor.x as i64 - overlay.width as i64 / 2).clamp(0, max_left);
    let top = (anchor.y as i64 - overlay.height as i64 / 2).clamp(0, max_top);

    if left != anchor.x as i64 - overlay.width as i64 / 2
        || top != anchor.y as i64 - overlay.height as i64 / 2
    {
        debug!(
            "direction region clamped to ({}, {}) for anchor ({}, {})",
            left, top, anchor.x, anchor.y
        );
    }

    background.crop(left as u32, top as u32, overlay.width, overlay.height)
}

/// Tight normalized bounding box of the rotated overlay's nonzero-alpha
/// pixels that land inside the background, or `None` if there are none.
fn footprint_bbox(
    rotated: &RasterImage,
    left: i64,
    top: i64,
    bg_width: u32,
    bg_height: u32,
) -> Option<NormalizedBBox> {
    let mut bounds: Option<(i64, i64, i64, i64)> = None;

    for oy in 0..rotated.height as i64 {
        let cy = top + oy;
        if cy < 0 || cy >= bg_height as i64 {
            continue;
        }
        for ox in 0..rotated.width as i64 {
            let cx = left + ox;
            if cx < 0 || cx >= bg_width as i64 {
                continue;
            }
            if rotated.pixels[rotated.pixel_index(ox as u32, oy as u32) + 3] == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (cx, cy, cx, cy),
                Some((x0, y0, x1, y1)) => (x0.min(cx), y0.min(cy), x1.max(cx), y1.max(cy)),
            });
        }
    }

    let (x0, y0, x1, y1) = bounds?;
    let (w, h) = (bg_width as f64, bg_height as f64);

    Some(NormalizedBBox {
        class_id: 0,
        center_x: ((x0 + x1 + 1) as f64 / 2.0 / w).clamp(0.0, 1.0),
        center_y: ((y0 + y1 + 1) as f64 / 2.0 / h).clamp(0.0, 1.0),
        width: ((x1 - x0 + 1) as f64 / w).clamp(0.0, 1.0),
        height: ((y1 - y0 + 1) as f64 / h).clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_background(side: u32) -> RasterImage {
        RasterImage::new_rgb(side, side, vec![128u8; (side * side * 3) as usize])
    }

    fn red_overlay(side: u32) -> RasterImage {
        let pixels = (0..side * side).flat_map(|_| [255, 0, 0, 255]).collect();
        RasterImage::new_rgba(side, side, pixels)
    }

    /// Brightness increasing top to bottom; dominant direction is +90 deg.
    fn ramp_background(side: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((side * side * 3) as usize);
        for y in 0..side {
            for _ in 0..side {
                let v = (y * 255 / side) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        RasterImage::new_rgb(side, side, pixels)
    }

    #[test]
    fn test_centered_opaque_stamp_label() {
        let result = composite(
            &gray_background(200),
            &red_overlay(50),
            Anchor::new(100, 100),
            RotationMode::Fixed(0.0),
        )
        .unwrap();

        assert_eq!(result.bbox.center_x, 0.5);
        assert_eq!(result.bbox.center_y, 0.5);
        assert_eq!(result.bbox.width, 0.25);
        assert_eq!(result.bbox.height, 0.25);
        assert_eq!(result.angle_degrees, 0.0);

        // The stamp replaces the background inside its footprint
        let idx = result.image.pixel_index(100, 100);
        assert_eq!(&result.image.pixels[idx..idx + 3], &[255, 0, 0]);
        let idx = result.image.pixel_index(70, 70);
        assert_eq!(&result.image.pixels[idx..idx + 3], &[128, 128, 128]);

        // Background input is untouched
        assert_eq!(result.image.width, 200);
    }

    #[test]
    fn test_transparent_overlay_is_empty_footprint() {
        let overlay = RasterImage::new_rgba(20, 20, vec![0u8; 20 * 20 * 4]);
        let err = composite(
            &gray_background(100),
            &overlay,
            Anchor::new(50, 50),
            RotationMode::Fixed(0.0),
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyFootprint));
    }

    #[test]
    fn test_45_degree_stamp_footprint_side() {
        let result = composite(
            &gray_background(200),
            &red_overlay(50),
            Anchor::new(100, 100),
            RotationMode::Fixed(45.0),
        )
        .unwrap();

        // 50 * (cos45 + sin45) ~ 70.7 px before normalization
        let side = result.bbox.width * 200.0;
        assert!((side - 70.7).abs() < 2.5, "side was {}", side);
        let side = result.bbox.height * 200.0;
        assert!((side - 70.7).abs() < 2.5, "side was {}", side);
    }

    #[test]
    fn test_anchor_out_of_bounds() {
        let bg = gray_background(100);
        let overlay = red_overlay(10);

        for anchor in [
            Anchor::new(-5, 50),
            Anchor::new(50, -1),
            Anchor::new(100, 50),
            Anchor::new(50, 250),
        ] {
            let err =
                composite(&bg, &overlay, anchor, RotationMode::Fixed(0.0)).unwrap_err();
            assert!(
                matches!(err, ComposeError::AnchorOutOfBounds { .. }),
                "anchor {:?} should be rejected",
                anchor
            );
        }
    }

    #[test]
    fn test_edge_anchor_clips_footprint() {
        let result = composite(
            &gray_background(200),
            &red_overlay(50),
            Anchor::new(0, 0),
            RotationMode::Fixed(0.0),
        )
        .unwrap();

        // Only the quarter of the stamp inside the image is labeled
        assert!(result.bbox.is_normalized());
        assert_eq!(result.bbox.width, 25.0 / 200.0);
        assert_eq!(result.bbox.height, 25.0 / 200.0);
        assert_eq!(result.bbox.center_x, 12.5 / 200.0);
    }

    #[test]
    fn test_direction_aligned_follows_background() {
        // A vertical luminance ramp has dominant direction 90 deg, so the
        // 40x20 overlay comes out stamped as 20x40
        let overlay = {
            let pixels = (0..40 * 20).flat_map(|_| [0, 0, 255, 255]).collect();
            RasterImage::new_rgba(40, 20, pixels)
        };
        let result = composite(
            &ramp_background(100),
            &overlay,
            Anchor::new(50, 50),
            RotationMode::DirectionAligned,
        )
        .unwrap();

        assert!((result.angle_degrees - 90.0).abs() < 1.0);
        let w = result.bbox.width * 100.0;
        let h = result.bbox.height * 100.0;
        assert!((w - 20.0).abs() < 2.0, "width was {}", w);
        assert!((h - 40.0).abs() < 2.0, "height was {}", h);
    }

    #[test]
    fn test_direction_aligned_region_too_small() {
        let err = composite(
            &gray_background(100),
            &red_overlay(3),
            Anchor::new(50, 50),
            RotationMode::DirectionAligned,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Direction(DirectionError::InsufficientRegionSize { .. })
        ));
    }

    #[test]
    fn test_direction_aligned_uniform_background_is_zero() {
        let result = composite(
            &gray_background(100),
            &red_overlay(20),
            Anchor::new(50, 50),
            RotationMode::DirectionAligned,
        )
        .unwrap();
        assert_eq!(result.angle_degrees, 0.0);
    }

    #[test]
    fn test_random_mode_draws_fresh_angles() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let bg = gray_background(100);
        let overlay = red_overlay(20);
        let anchor = Anchor::new(50, 50);

        let mut rng = StdRng::seed_from_u64(42);
        let a = composite_with_rng(&bg, &overlay, anchor, RotationMode::Random, &mut rng)
            .unwrap();
        let b = composite_with_rng(&bg, &overlay, anchor, RotationMode::Random, &mut rng)
            .unwrap();

        assert!((0.0..360.0).contains(&a.angle_degrees));
        assert!((0.0..360.0).contains(&b.angle_degrees));
        assert_ne!(a.angle_degrees, b.angle_degrees);

        // Same seed reproduces the same draw
        let mut rng = StdRng::seed_from_u64(42);
        let c = composite_with_rng(&bg, &overlay, anchor, RotationMode::Random, &mut rng)
            .unwrap();
        assert_eq!(a.angle_degrees, c.angle_degrees);
    }

    #[test]
    fn test_fixed_mode_is_bit_identical() {
        let bg = gray_background(120);
        let overlay = red_overlay(30);
        let anchor = Anchor::new(60, 40);

        let a = composite(&bg, &overlay, anchor, RotationMode::Fixed(33.3)).unwrap();
        let b = composite(&bg, &overlay, anchor, RotationMode::Fixed(33.3)).unwrap();

        assert_eq!(a.image.pixels, b.image.pixels);
        assert_eq!(a.bbox, b.bbox);
    }

    #[test]
    fn test_fixed_from_input() {
        assert_eq!(
            RotationMode::fixed_from_input("45.5"),
            RotationMode::Fixed(45.5)
        );
        assert_eq!(
            RotationMode::fixed_from_input(" -10 "),
            RotationMode::Fixed(-10.0)
        );
        assert_eq!(
            RotationMode::fixed_from_input("abc"),
            RotationMode::Fixed(0.0)
        );
        assert_eq!(RotationMode::fixed_from_input(""), RotationMode::Fixed(0.0));
    }

    #[test]
    fn test_default_mode_is_fixed_zero() {
        assert_eq!(RotationMode::default(), RotationMode::Fixed(0.0));
    }
}
