//! Color adjustment WASM bindings.
//!
//! Exposes the slider values as a class with getters and setters so the
//! editor panel can bind to it directly.

use crate::types::{to_js_error, JsPhotoBuffer};
use photoprint_core::adjustments::apply_to_buffer;
use wasm_bindgen::prelude::*;

/// Color adjustments wrapper for JavaScript
#[wasm_bindgen]
pub struct ColorAdjustments {
    inner: photoprint_core::ColorAdjustments,
}

#[wasm_bindgen]
impl ColorAdjustments {
    /// Create new adjustments with every slider at zero
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: photoprint_core::ColorAdjustments::new(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> f32 {
        self.inner.brightness
    }

    #[wasm_bindgen(setter)]
    pub fn set_brightness(&mut self, value: f32) {
        self.inner.brightness = value;
    }

    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f32 {
        self.inner.contrast
    }

    #[wasm_bindgen(setter)]
    pub fn set_contrast(&mut self, value: f32) {
        self.inner.contrast = value;
    }

    #[wasm_bindgen(getter)]
    pub fn saturation(&self) -> f32 {
        self.inner.saturation
    }

    #[wasm_bindgen(setter)]
    pub fn set_saturation(&mut self, value: f32) {
        self.inner.saturation = value;
    }

    /// Negative is cooler, positive warmer
    #[wasm_bindgen(getter)]
    pub fn temperature(&self) -> f32 {
        self.inner.temperature
    }

    #[wasm_bindgen(setter)]
    pub fn set_temperature(&mut self, value: f32) {
        self.inner.temperature = value;
    }

    #[wasm_bindgen(getter)]
    pub fn highlights(&self) -> f32 {
        self.inner.highlights
    }

    #[wasm_bindgen(setter)]
    pub fn set_highlights(&mut self, value: f32) {
        self.inner.highlights = value;
    }

    #[wasm_bindgen(getter)]
    pub fn shadows(&self) -> f32 {
        self.inner.shadows
    }

    #[wasm_bindgen(setter)]
    pub fn set_shadows(&mut self, value: f32) {
        self.inner.shadows = value;
    }

    /// Check if all adjustments are at default values
    pub fn is_default(&self) -> bool {
        self.inner.is_default()
    }

    /// Serialize to a plain object for storage
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(to_js_error)
    }

    /// Deserialize from a plain object; missing sliders are zero
    pub fn from_json(value: JsValue) -> Result<ColorAdjustments, JsValue> {
        let inner: photoprint_core::ColorAdjustments =
            serde_wasm_bindgen::from_value(value).map_err(to_js_error)?;
        Ok(Self { inner })
    }
}

impl Default for ColorAdjustments {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAdjustments {
    /// Slider values clamped into their valid range.
    pub(crate) fn values(&self) -> photoprint_core::ColorAdjustments {
        self.inner.clamped()
    }
}

/// Apply all adjustments to an image.
///
/// Returns a new image; the source is left untouched. Alpha is preserved.
///
/// # Example (TypeScript)
/// ```typescript
/// const adj = new ColorAdjustments();
/// adj.brightness = 20;
/// adj.temperature = -15;
///
/// const graded = apply_adjustments(sourceImage, adj);
/// ```
#[wasm_bindgen]
pub fn apply_adjustments(image: &JsPhotoBuffer, adjustments: &ColorAdjustments) -> JsPhotoBuffer {
    JsPhotoBuffer::from_buffer(apply_to_buffer(image.to_buffer(), &adjustments.values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::PhotoBuffer;

    fn pixel_image(rgba: [u8; 4]) -> JsPhotoBuffer {
        JsPhotoBuffer::from_buffer(PhotoBuffer::filled(1, 1, rgba).unwrap())
    }

    #[test]
    fn test_color_adjustments() {
        let mut adj = ColorAdjustments::new();
        assert!(adj.is_default());

        adj.set_brightness(10.0);
        assert_eq!(adj.brightness(), 10.0);
        assert!(!adj.is_default());

        adj.set_contrast(-5.0);
        adj.set_saturation(20.0);
        adj.set_temperature(-30.0);
        adj.set_highlights(40.0);
        adj.set_shadows(-50.0);
        assert_eq!(adj.contrast(), -5.0);
        assert_eq!(adj.saturation(), 20.0);
        assert_eq!(adj.temperature(), -30.0);
        assert_eq!(adj.highlights(), 40.0);
        assert_eq!(adj.shadows(), -50.0);
    }

    #[test]
    fn test_apply_adjustments_identity() {
        let image = pixel_image([128, 64, 32, 200]);
        let result = apply_adjustments(&image, &ColorAdjustments::new());
        assert_eq!(result.pixels(), vec![128, 64, 32, 200]);
    }

    #[test]
    fn test_full_brightness_saturates() {
        let image = pixel_image([10, 20, 30, 77]);
        let mut adj = ColorAdjustments::new();
        adj.set_brightness(100.0);
        assert_eq!(apply_adjustments(&image, &adj).pixels(), vec![255, 255, 255, 77]);
    }

    #[test]
    fn test_out_of_range_slider_is_clamped() {
        let image = pixel_image([10, 20, 30, 255]);
        let mut over = ColorAdjustments::new();
        over.set_brightness(500.0);
        let mut max = ColorAdjustments::new();
        max.set_brightness(100.0);
        assert_eq!(
            apply_adjustments(&image, &over).pixels(),
            apply_adjustments(&image, &max).pixels()
        );
    }

    #[test]
    fn test_apply_adjustments_does_not_modify_original() {
        let image = pixel_image([100, 100, 100, 255]);
        let mut adj = ColorAdjustments::new();
        adj.set_brightness(50.0);
        let _ = apply_adjustments(&image, &adj);
        assert_eq!(image.pixels(), vec![100, 100, 100, 255]);
    }
}
