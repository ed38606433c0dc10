//! Overlay rotation with bilinear interpolation.
//!
//! Rotation uses inverse mapping: for each pixel of the output canvas, the
//! source position that lands there is computed and sampled bilinearly. The
//! canvas is expanded to the rotated bounds, so no corner of the overlay is
//! ever cropped; destination pixels with no source coverage take the fill
//! color.
//!
//! Angles are in degrees, clockwise-positive in image coordinates (y down).

use crate::decode::RasterImage;

/// Compute the canvas size that encloses an image rotated by the given angle.
///
/// Exact multiples of 90 degrees take a fast path so dimension swaps stay
/// lossless.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle_normalized = angle_degrees % 360.0;

    // No rotation, including multiples of 360
    if angle_normalized.abs() < 0.001 || (360.0 - angle_normalized.abs()).abs() < 0.001 {
        return (width, height);
    }

    let abs_angle = angle_normalized.abs();
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }
    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // Enclosing box of a rotated w x h rectangle
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate a raster about its center by `angle_degrees`, clockwise-positive.
///
/// The result is always RGBA; alpha-less inputs are promoted to opaque
/// first. The output canvas is expanded to [`compute_rotated_bounds`], and
/// destination pixels outside the rotated source take `fill` (use
/// `[0, 0, 0, 0]` for the transparent corners the compositor expects, or any
/// constant color for alpha-less workflows).
pub fn rotate_image(image: &RasterImage, angle_degrees: f64, fill: [u8; 4]) -> RasterImage {
    // No resampling loss when there is nothing to rotate
    if angle_degrees.abs() < 0.001 {
        return image.to_rgba();
    }

    let src = image.to_rgba();
    let (src_w, src_h) = (src.width as f64, src.height as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(src.width, src.height, angle_degrees);

    // Inverse mapping: walking destination pixels with the negated angle
    // rotates the content clockwise for positive input
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = vec![0u8; dst_w as usize * dst_h as usize * 4];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let pixel = sample_bilinear(&src, src_x, src_y, fill);

            let dst_idx = (dst_y as usize * dst_w as usize + dst_x as usize) * 4;
            output[dst_idx..dst_idx + 4].copy_from_slice(&pixel);
        }
    }

    RasterImage::new_rgba(dst_w, dst_h, output)
}

/// Pixel (x, y) of an RGBA raster as floats.
#[inline]
fn get_pixel_f64(image: &RasterImage, px: usize, py: usize) -> [f64; 4] {
    let idx = (py * image.width as usize + px) * 4;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
        image.pixels[idx + 3] as f64,
    ]
}

/// Sample an RGBA raster at a fractional position.
///
/// The four nearest pixels are weighted by distance; positions outside the
/// source return `fill`.
fn sample_bilinear(image: &RasterImage, x: f64, y: f64, fill: [u8; 4]) -> [u8; 4] {
    let (w, h) = (image.width as i64, image.height as i64);

    if x < 0.0 || x >= (w - 1) as f64 || y < 0.0 || y >= (h - 1) as f64 {
        return fill;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}
