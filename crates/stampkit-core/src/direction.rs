//! Dominant gradient-direction estimation.
//!
//! Computes horizontal and vertical 5x5 Sobel gradients over a region,
//! histograms the per-pixel gradient orientations into 180 bins spanning
//! [-pi, pi), and reports the left edge of the fullest bin as the region's
//! dominant direction. The 1-degree bin granularity and the bin-edge (not
//! bin-center) selection are load-bearing: labels produced against existing
//! datasets depend on them.

use thiserror::Error;

use crate::decode::RasterImage;

/// Number of orientation histogram bins over [-pi, pi).
pub const HISTOGRAM_BINS: usize = 180;

/// Minimum region side length for the 5x5 gradient kernel.
pub const MIN_REGION_SIZE: u32 = 5;

// Separable 5-tap Sobel: smoothing cross derivative.
const SOBEL_SMOOTH: [f64; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
const SOBEL_DERIV: [f64; 5] = [-1.0, -2.0, 0.0, 2.0, 1.0];

// ITU-R BT.709 luminance coefficients.
const LUMINANCE_R: f64 = 0.2126;
const LUMINANCE_G: f64 = 0.7152;
const LUMINANCE_B: f64 = 0.0722;

/// Errors from direction estimation.
#[derive(Debug, Error)]
pub enum DirectionError {
    /// The region is smaller than the gradient kernel.
    #[error("Region {width}x{height} is too small for the 5x5 gradient kernel")]
    InsufficientRegionSize { width: u32, height: u32 },
}

/// A per-pixel scalar field with the region's dimensions.
///
/// Produced for the gradient magnitude and direction planes; intended for
/// diagnostics and visualization, not required by the compositing path.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    /// Field width in pixels.
    pub width: u32,
    /// Field height in pixels.
    pub height: u32,
    /// Row-major values, length width * height.
    pub values: Vec<f64>,
}

impl GradientField {
    /// Value at (x, y). Callers must ensure x < width and y < height.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

/// Result of [`estimate_direction`].
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionEstimate {
    /// Dominant gradient orientation in radians, always the left edge of a
    /// histogram bin over [-pi, pi).
    pub angle: f64,
    /// Per-pixel gradient magnitude sqrt(gx^2 + gy^2).
    pub magnitude: GradientField,
    /// Per-pixel gradient orientation atan2(gy, gx) in (-pi, pi].
    pub direction: GradientField,
}

impl DirectionEstimate {
    /// Dominant angle converted to degrees.
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Estimate the dominant gradient direction of a region.
///
/// The region is converted to grayscale first (BT.709 luminance, alpha
/// ignored). Gradients use a fixed 5x5 Sobel kernel pair with border
/// clamping, at f64 precision.
///
/// A textureless region has zero gradients everywhere; atan2(0, 0) = 0 puts
/// all mass in the bin whose left edge is exactly 0 rad, so the result stays
/// deterministic.
///
/// # Errors
///
/// Returns [`DirectionError::InsufficientRegionSize`] if either side of the
/// region is smaller than 5 pixels.
pub fn estimate_direction(region: &RasterImage) -> Result<DirectionEstimate, DirectionError> {
    if region.width < MIN_REGION_SIZE || region.height < MIN_REGION_SIZE {
        return Err(DirectionError::InsufficientRegionSize {
            width: region.width,
            height: region.height,
        });
    }

    let lum = to_luminance(region);
    let (w, h) = (region.width as usize, region.height as usize);

    let mut magnitude = vec![0.0f64; w * h];
    let mut direction = vec![0.0f64; w * h];
    let mut histogram = [0u32; HISTOGRAM_BINS];

    for y in 0..h {
        for x in 0..w {
            let (gx, gy) = sobel_at(&lum, w, h, x, y);
            let idx = y * w + x;
            magnitude[idx] = (gx * gx + gy * gy).sqrt();
            let theta = gy.atan2(gx);
            direction[idx] = theta;
            histogram[bin_index(theta)] += 1;
        }
    }

    Ok(DirectionEstimate {
        angle: dominant_angle(&histogram),
        magnitude: GradientField {
            width: region.width,
            height: region.height,
            values: magnitude,
        },
        direction: GradientField {
            width: region.width,
            height: region.height,
            values: direction,
        },
    })
}

/// Grayscale plane of a raster, alpha ignored.
fn to_luminance(region: &RasterImage) -> Vec<f64> {
    let bpp = region.bytes_per_pixel();
    region
        .pixels
        .chunks_exact(bpp)
        .map(|px| {
            LUMINANCE_R * px[0] as f64 + LUMINANCE_G * px[1] as f64 + LUMINANCE_B * px[2] as f64
        })
        .collect()
}

/// 5x5 Sobel response at one pixel, border pixels clamped to the edge.
#[inline]
fn sobel_at(lum: &[f64], w: usize, h: usize, x: usize, y: usize) -> (f64, f64) {
    let mut gx = 0.0;
    let mut gy = 0.0;
    for (ky, (&sy_smooth, &sy_deriv)) in SOBEL_SMOOTH.iter().zip(SOBEL_DERIV.iter()).enumerate() {
        let sy = (y as i64 + ky as i64 - 2).clamp(0, h as i64 - 1) as usize;
        let row = &lum[sy * w..(sy + 1) * w];
        for (kx, (&sx_smooth, &sx_deriv)) in
            SOBEL_SMOOTH.iter().zip(SOBEL_DERIV.iter()).enumerate()
        {
            let sx = (x as i64 + kx as i64 - 2).clamp(0, w as i64 - 1) as usize;
            let v = row[sx];
            gx += v * sy_smooth * sx_deriv;
            gy += v * sy_deriv * sx_smooth;
        }
    }
    (gx, gy)
}

/// Histogram bin for an orientation in (-pi, pi].
///
/// Bins are uniform over [-pi, pi); the +pi endpoint folds into the last bin.
#[inline]
fn bin_index(theta: f64) -> usize {
    let width = 2.0 * std::f64::consts::PI / HISTOGRAM_BINS as f64;
    (((theta + std::f64::consts::PI) / width) as usize).min(HISTOGRAM_BINS - 1)
}

/// Left edge of the fullest bin, ties broken by lowest bin index.
fn dominant_angle(histogram: &[u32; HISTOGRAM_BINS]) -> f64 {
    let width = 2.0 * std::f64::consts::PI / HISTOGRAM_BINS as f64;
    let mut best = 0usize;
    for (i, &count) in histogram.iter().enumerate() {
        if count > histogram[best] {
            best = i;
        }
    }
    -std::f64::consts::PI + best as f64 * width
}
