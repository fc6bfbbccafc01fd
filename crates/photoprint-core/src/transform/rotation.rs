//! Rotate and flip with an expanded canvas.
//!
//! Rotation follows 2D canvas conventions: y grows downward, so a positive
//! angle turns the picture clockwise on screen. The pivot is the center of
//! the output canvas and mirroring happens before the rotation, exactly as
//! `translate(center); rotate(θ); scale(-1, 1); drawImage(...)` would.
//!
//! # Algorithm
//!
//! Right-angle turns are exact pixel permutations. Every other angle uses
//! inverse mapping: for each output pixel center we find the source point
//! that lands there and interpolate in premultiplied alpha, so corners that
//! fall outside the source stay transparent without dark fringes.
//!
//! For output pixel center `q` (relative to the output center) the source
//! point is:
//! ```text
//! p.x = ±( q.x * cos θ + q.y * sin θ)   (negated when flipping)
//! p.y =   -q.x * sin θ + q.y * cos θ
//! ```

use image::imageops;

use super::TransformError;
use crate::decode::PhotoBuffer;

/// Interpolation filter for rotation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Angles closer than this to a multiple of 90 degrees count as exact.
const RIGHT_ANGLE_EPSILON: f64 = 1e-6;

/// Compute the dimensions of the bounding box for a rotated image.
///
/// `round(|w cos θ| + |h sin θ|)` by `round(|w sin θ| + |h cos θ|)`,
/// never smaller than 1x1.
///
/// # Example
///
/// ```
/// use photoprint_core::transform::compute_rotated_bounds;
///
/// // 90-degree rotation swaps dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// // No rotation preserves dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Rotate (clockwise for positive angles) and optionally mirror an image.
///
/// The output canvas is the rotated bounding box from
/// [`compute_rotated_bounds`]; areas not covered by the source are
/// transparent.
///
/// # Errors
///
/// `TransformError::CanvasUnavailable` when the expanded canvas is too
/// large to allocate.
pub fn apply_rotate_flip(
    image: &PhotoBuffer,
    angle_degrees: f64,
    flip_horizontal: bool,
    filter: InterpolationFilter,
) -> Result<PhotoBuffer, TransformError> {
    if let Some(turns) = quarter_turns(angle_degrees) {
        return rotate_right_angle(image, turns, flip_horizontal);
    }

    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_degrees);
    let mut output = PhotoBuffer::blank(dst_w, dst_h).ok_or(TransformError::CanvasUnavailable {
        width: dst_w,
        height: dst_h,
    })?;

    let angle_rad = angle_degrees.to_radians();
    let (sin, cos) = angle_rad.sin_cos();
    let mirror = if flip_horizontal { -1.0 } else { 1.0 };

    let src_cx = image.width as f64 / 2.0;
    let src_cy = image.height as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    for dst_y in 0..dst_h {
        let qy = dst_y as f64 + 0.5 - dst_cy;
        for dst_x in 0..dst_w {
            let qx = dst_x as f64 + 0.5 - dst_cx;

            // Inverse rotation, then undo the mirror, then back to pixel-index space
            let px = mirror * (qx * cos + qy * sin);
            let py = -qx * sin + qy * cos;
            let src_x = px + src_cx - 0.5;
            let src_y = py + src_cy - 0.5;

            let pixel = match filter {
                InterpolationFilter::Bilinear => sample_bilinear(image, src_x, src_y),
                InterpolationFilter::Lanczos3 => sample_lanczos3(image, src_x, src_y),
            };

            let idx = (dst_y as usize * dst_w as usize + dst_x as usize) * 4;
            output.pixels[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    Ok(output)
}

/// Number of clockwise quarter turns if the angle is a right-angle multiple.
fn quarter_turns(angle_degrees: f64) -> Option<u8> {
    if !angle_degrees.is_finite() {
        return None;
    }
    let turns = angle_degrees / 90.0;
    let rounded = turns.round();
    if (turns - rounded).abs() * 90.0 < RIGHT_ANGLE_EPSILON {
        Some(rounded.rem_euclid(4.0) as u8)
    } else {
        None
    }
}

fn rotate_right_angle(
    image: &PhotoBuffer,
    turns: u8,
    flip_horizontal: bool,
) -> Result<PhotoBuffer, TransformError> {
    if turns == 0 && !flip_horizontal {
        return Ok(image.clone());
    }

    let rgba = image.to_rgba_image().ok_or(TransformError::CanvasUnavailable {
        width: image.width,
        height: image.height,
    })?;
    let rgba = if flip_horizontal {
        imageops::flip_horizontal(&rgba)
    } else {
        rgba
    };
    let rotated = match turns {
        1 => imageops::rotate90(&rgba),
        2 => imageops::rotate180(&rgba),
        3 => imageops::rotate270(&rgba),
        _ => rgba,
    };
    Ok(PhotoBuffer::from_rgba_image(rotated))
}

/// Running sum of premultiplied samples.
#[derive(Default)]
struct Accumulator {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
    weight: f64,
}

impl Accumulator {
    /// Add a neighbor; `None` is a transparent texel outside the source.
    #[inline]
    fn add(&mut self, texel: Option<[u8; 4]>, weight: f64) {
        self.weight += weight;
        if let Some([r, g, b, a]) = texel {
            let wa = a as f64 * weight;
            self.r += r as f64 * wa;
            self.g += g as f64 * wa;
            self.b += b as f64 * wa;
            self.a += wa;
        }
    }

    fn resolve(self) -> [u8; 4] {
        if self.weight.abs() < f64::EPSILON || self.a <= 0.0 {
            return [0, 0, 0, 0];
        }
        let alpha = (self.a / self.weight).clamp(0.0, 255.0).round() as u8;
        if alpha == 0 {
            return [0, 0, 0, 0];
        }
        let channel = |sum: f64| (sum / self.a).clamp(0.0, 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), alpha]
    }
}

#[inline]
fn texel(image: &PhotoBuffer, x: i64, y: i64) -> Option<[u8; 4]> {
    if x < 0 || y < 0 || x >= image.width as i64 || y >= image.height as i64 {
        return None;
    }
    Some(image.pixel(x as u32, y as u32))
}

/// Sample a pixel using bilinear interpolation over the 4 nearest texels.
fn sample_bilinear(image: &PhotoBuffer, x: f64, y: f64) -> [u8; 4] {
    // Entirely outside the source, including its half-pixel fringe
    if x <= -1.0 || y <= -1.0 || x >= image.width as f64 || y >= image.height as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = Accumulator::default();
    acc.add(texel(image, x0, y0), (1.0 - fx) * (1.0 - fy));
    acc.add(texel(image, x0 + 1, y0), fx * (1.0 - fy));
    acc.add(texel(image, x0, y0 + 1), (1.0 - fx) * fy);
    acc.add(texel(image, x0 + 1, y0 + 1), fx * fy);
    acc.resolve()
}

/// Sample a pixel using Lanczos3 interpolation over a 6x6 neighborhood.
fn sample_lanczos3(image: &PhotoBuffer, x: f64, y: f64) -> [u8; 4] {
    if x <= -1.0 || y <= -1.0 || x >= image.width as f64 || y >= image.height as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut acc = Accumulator::default();
    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            if weight != 0.0 {
                acc.add(texel(image, px, py), weight);
            }
        }
    }
    acc.resolve()
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
