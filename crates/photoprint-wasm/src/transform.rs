//! WASM bindings for geometric transforms and unit conversion.
//!
//! Angles are in degrees, positive = clockwise on screen, matching the
//! canvas `rotate()` convention the preview uses.

use crate::types::{filter_from_u8, interpolation, parse_aspect, parse_unit, to_js_error, JsPhotoBuffer};
use photoprint_core::transform::{self, CropRect, CropRequest};
use wasm_bindgen::prelude::*;

/// Rotate and optionally mirror an image.
///
/// The canvas grows to fit the rotated image; uncovered corners are
/// transparent. Mirroring happens before rotation.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const preview = apply_rotate_flip(image, 15.0, false, false);
/// const exported = apply_rotate_flip(image, 15.0, false, true);
/// ```
#[wasm_bindgen]
pub fn apply_rotate_flip(
    image: &JsPhotoBuffer,
    angle_degrees: f64,
    flip_horizontal: bool,
    use_lanczos: bool,
) -> Result<JsPhotoBuffer, JsValue> {
    transform::apply_rotate_flip(
        &image.to_buffer(),
        angle_degrees,
        flip_horizontal,
        interpolation(use_lanczos),
    )
    .map(JsPhotoBuffer::from_buffer)
    .map_err(to_js_error)
}

/// Canvas size after rotating a `width` x `height` image, as `[w, h]`.
#[wasm_bindgen]
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> Vec<u32> {
    let (w, h) = transform::compute_rotated_bounds(width, height, angle_degrees);
    vec![w, h]
}

/// Trim to the target aspect around the center, then scale to exactly
/// `width` x `height`.
///
/// `filter`: 0 = Nearest, 1 = Bilinear, 2 = Lanczos3.
#[wasm_bindgen]
pub fn center_crop_to(
    image: &JsPhotoBuffer,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsPhotoBuffer, JsValue> {
    transform::center_crop_to(&image.to_buffer(), width, height, filter_from_u8(filter))
        .map(JsPhotoBuffer::from_buffer)
        .map_err(to_js_error)
}

/// Straighten by `rotation` degrees, then cut out a pixel rectangle.
///
/// The rectangle is in the coordinates of the rotated canvas. Pass `0` for
/// `output_width` and `output_height` to keep the rectangle's own size.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn crop_with_straighten(
    image: &JsPhotoBuffer,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rotation: f64,
    output_width: u32,
    output_height: u32,
) -> Result<JsPhotoBuffer, JsValue> {
    let request = crop_request(
        CropRect::new(x, y, width, height),
        rotation,
        output_width,
        output_height,
    );
    transform::crop_with_straighten(&image.to_buffer(), &request)
        .map(|outcome| JsPhotoBuffer::from_buffer(outcome.image))
        .map_err(to_js_error)
}

/// Largest centered `[x, y, width, height]` of an aspect preset
/// (`freeform`, `1:1`, `9:16`, `4:1`, `16:9`).
#[wasm_bindgen]
pub fn aspect_crop_rect(preset: &str, width: u32, height: u32) -> Result<Vec<f64>, JsValue> {
    let rect = parse_aspect(preset)
        .map_err(to_js_error)?
        .centered_rect(width, height);
    Ok(vec![rect.x, rect.y, rect.width, rect.height])
}

/// Convert a physical length to fractional pixels (`mm`, `in`, `cm`, `px`).
#[wasm_bindgen]
pub fn to_pixels(value: f64, unit: &str, dpi: f64) -> Result<f64, JsValue> {
    let unit = parse_unit(unit).map_err(to_js_error)?;
    Ok(photoprint_core::to_pixels(value, unit, dpi))
}

pub(crate) fn crop_request(
    rect: CropRect,
    rotation: f64,
    output_width: u32,
    output_height: u32,
) -> CropRequest {
    let mut request = CropRequest::new(rect);
    request.rotation = rotation;
    if output_width > 0 && output_height > 0 {
        request.output = Some((output_width, output_height));
    }
    request
}
