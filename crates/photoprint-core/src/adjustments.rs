//! Per-pixel color grading.
//!
//! Applies the six slider adjustments to RGBA pixel data. Each stage reads
//! the value left by the previous one, so the order is fixed:
//!
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation (luma weights 0.3 / 0.59 / 0.11)
//! 4. Temperature
//! 5. Highlights or shadows (BT.709 luminance, split at 128)
//!
//! Channels are clamped to [0, 255] and rounded once, after the last stage.
//! Alpha is never touched. There is no neighbor dependency, so the buffer
//! can be graded in independent tiles.

use crate::decode::PhotoBuffer;
use crate::ColorAdjustments;

/// Bytes per tile when grading on the rayon pool (64K pixels).
#[cfg(feature = "parallel")]
const TILE_BYTES: usize = 64 * 1024 * 4;

/// Apply all adjustments to RGBA pixel data in place.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `adjustments` - The adjustment values to apply
pub fn apply_adjustments(pixels: &mut [u8], adjustments: &ColorAdjustments) {
    // Early exit if no adjustments
    if adjustments.is_default() {
        return;
    }

    let factors = Factors::from(adjustments);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        pixels
            .par_chunks_mut(TILE_BYTES)
            .for_each(|tile| grade_tile(tile, &factors));
    }

    #[cfg(not(feature = "parallel"))]
    grade_tile(pixels, &factors);
}

/// Grade a whole buffer, handing it back to the caller.
pub fn apply_to_buffer(mut image: PhotoBuffer, adjustments: &ColorAdjustments) -> PhotoBuffer {
    apply_adjustments(&mut image.pixels, adjustments);
    image
}

/// Slider values pre-divided into the factors the per-pixel math uses.
#[derive(Debug, Clone, Copy)]
struct Factors {
    brightness: f64,
    contrast: f64,
    saturation: f64,
    temperature: f64,
    highlights: f64,
    shadows: f64,
}

impl From<&ColorAdjustments> for Factors {
    fn from(adj: &ColorAdjustments) -> Self {
        let adj = adj.clamped();
        Self {
            brightness: 255.0 * (adj.brightness as f64 / 100.0),
            contrast: 1.0 + adj.contrast as f64 / 100.0,
            saturation: 1.0 + adj.saturation as f64 / 100.0,
            temperature: 255.0 * (adj.temperature as f64 / 100.0),
            highlights: 255.0 * (adj.highlights as f64 / 100.0),
            shadows: 255.0 * (adj.shadows as f64 / 100.0),
        }
    }
}

fn grade_tile(pixels: &mut [u8], factors: &Factors) {
    for chunk in pixels.chunks_exact_mut(4) {
        let (r, g, b) = grade_pixel(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64, factors);
        chunk[0] = to_channel(r);
        chunk[1] = to_channel(g);
        chunk[2] = to_channel(b);
    }
}

#[inline]
fn grade_pixel(r: f64, g: f64, b: f64, f: &Factors) -> (f64, f64, f64) {
    // Brightness
    let (r, g, b) = (r + f.brightness, g + f.brightness, b + f.brightness);

    // Contrast around mid-gray
    let contrast = |c: f64| (((c / 255.0) - 0.5) * f.contrast + 0.5) * 255.0;
    let (r, g, b) = (contrast(r), contrast(g), contrast(b));

    // Saturation: push away from (or pull toward) the luma gray
    let gray = 0.3 * r + 0.59 * g + 0.11 * b;
    let saturate = |c: f64| gray + (c - gray) * f.saturation;
    let (r, g, b) = (saturate(r), saturate(g), saturate(b));

    // Temperature: warm shifts red up and blue down, cool the reverse.
    // A negative factor already carries the reversed direction.
    let (r, b) = (r + f.temperature, b - f.temperature);

    // Highlights or shadows, chosen by luminance
    let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    let lift = if luminance > 128.0 {
        f.highlights
    } else {
        f.shadows
    };
    (r + lift, g + lift, b + lift)
}

#[inline]
fn to_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}
