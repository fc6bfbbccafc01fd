//! Image resizing backed by the `image` crate's resamplers.
//!
//! All functions return new `PhotoBuffer` instances without modifying the input.

use super::{fits_canvas, FilterType, PhotoBuffer};

/// Resize an image to exact dimensions.
///
/// Returns `None` when either target dimension is zero or the target
/// cannot be allocated as a canvas.
pub fn resize(
    image: &PhotoBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Option<PhotoBuffer> {
    if !fits_canvas(width, height) {
        return None;
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Some(image.clone());
    }

    let rgba = image.to_rgba_image()?;
    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());
    Some(PhotoBuffer::from_rgba_image(resized))
}
