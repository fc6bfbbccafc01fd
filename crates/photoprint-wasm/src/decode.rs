//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode PNG, JPEG or TIFF bytes
//! - [`decode_data_uri`] - Decode a `data:` URI as produced by `FileReader`
//! - [`resize`] - Resize an image to exact dimensions
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, resize } from '@photoprint/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! const thumb = resize(image, 256, 256, 1);
//! ```

use crate::types::{filter_from_u8, to_js_error, JsPhotoBuffer};
use photoprint_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an uploaded image from its file bytes.
///
/// JPEG EXIF orientation is applied, so the result is upright.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image or the image is
/// larger than a canvas can hold.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsPhotoBuffer, JsValue> {
    decode::decode_bytes(bytes)
        .map(JsPhotoBuffer::from_buffer)
        .map_err(to_js_error)
}

/// Decode a base64 `data:` URI.
#[wasm_bindgen]
pub fn decode_data_uri(uri: &str) -> Result<JsPhotoBuffer, JsValue> {
    decode::decode_data_uri(uri)
        .map(JsPhotoBuffer::from_buffer)
        .map_err(to_js_error)
}

/// Resize an image to exact dimensions.
///
/// # Arguments
///
/// * `image` - Source image
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
///
/// # Errors
///
/// Returns an error for a zero target dimension.
#[wasm_bindgen]
pub fn resize(
    image: &JsPhotoBuffer,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsPhotoBuffer, JsValue> {
    resize_buffer(image, width, height, filter).map_err(to_js_error)
}

fn resize_buffer(
    image: &JsPhotoBuffer,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsPhotoBuffer, String> {
    decode::resize(&image.to_buffer(), width, height, filter_from_u8(filter))
        .map(JsPhotoBuffer::from_buffer)
        .ok_or_else(|| format!("Cannot resize to {width}x{height}"))
}
