//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core photoprint
//! types, and the small parsers that turn the UI's string tags into core enums.

use photoprint_core::decode::{FilterType, PhotoBuffer};
use photoprint_core::print::PaperSize;
use photoprint_core::transform::{AspectPreset, InterpolationFilter};
use photoprint_core::Unit;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

/// An RGBA image wrapper for JavaScript.
///
/// Pixel layout matches `ImageData.data`: 4 bytes per pixel, row-major, so the
/// buffer can go straight into `new ImageData(pixels, width, height)`.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8ClampedArray`-compatible `Uint8Array`.
#[wasm_bindgen]
pub struct JsPhotoBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsPhotoBuffer {
    /// Wrap canvas pixels.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsPhotoBuffer, JsValue> {
        check_pixels(width, height, &pixels).map_err(to_js_error)?;
        Ok(JsPhotoBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {}
}

impl JsPhotoBuffer {
    pub(crate) fn from_buffer(img: PhotoBuffer) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert back to a core PhotoBuffer. Clones the pixel data.
    pub(crate) fn to_buffer(&self) -> PhotoBuffer {
        PhotoBuffer::new(self.width, self.height, self.pixels.clone())
    }
}

/// Reject pixel data that does not cover `width x height` RGBA pixels.
pub(crate) fn check_pixels(width: u32, height: u32, pixels: &[u8]) -> Result<(), String> {
    let expected = width as usize * height as usize * 4;
    if width == 0 || height == 0 {
        return Err(format!("Image size {width}x{height} is empty"));
    }
    if pixels.len() != expected {
        return Err(format!(
            "Expected {expected} bytes for a {width}x{height} RGBA image, got {}",
            pixels.len()
        ));
    }
    Ok(())
}

/// Turn any error into the string `JsValue` the UI expects.
pub(crate) fn to_js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest (fastest, lowest quality)
/// - 1 = Bilinear (good balance of speed and quality)
/// - 2 = Lanczos3 (best quality, slowest)
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Preview rotations use bilinear sampling, exports Lanczos3.
pub(crate) fn interpolation(use_lanczos: bool) -> InterpolationFilter {
    if use_lanczos {
        InterpolationFilter::Lanczos3
    } else {
        InterpolationFilter::Bilinear
    }
}

pub(crate) fn parse_paper(tag: &str) -> Result<PaperSize, String> {
    tag.parse()
}

pub(crate) fn parse_unit(tag: &str) -> Result<Unit, String> {
    tag.parse::<Unit>().map_err(|e| e.to_string())
}

pub(crate) fn parse_aspect(tag: &str) -> Result<AspectPreset, String> {
    AspectPreset::ALL
        .into_iter()
        .find(|preset| preset.as_str() == tag.trim())
        .ok_or_else(|| format!("Unknown aspect preset '{tag}'"))
}
