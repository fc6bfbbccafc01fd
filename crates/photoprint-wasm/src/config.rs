//! Editor configuration from JavaScript.
//!
//! The UI keeps its settings as a plain object; this wrapper loads and
//! validates it once and hands the typed config to the other bindings.

use crate::types::{parse_paper, to_js_error};
use photoprint_core::config::ConfigError;
use photoprint_core::pipeline::BatchOptions;
use photoprint_core::print::{Background, PrintSheetSpec};
use photoprint_core::EditorConfig;
use wasm_bindgen::prelude::*;

/// Validated editor settings.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsEditorConfig {
    inner: EditorConfig,
}

#[wasm_bindgen]
impl JsEditorConfig {
    /// Stock settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a plain object. Missing keys take their stock value;
    /// unknown keys are rejected.
    pub fn from_object(value: JsValue) -> Result<JsEditorConfig, JsValue> {
        let inner: EditorConfig = serde_wasm_bindgen::from_value(value).map_err(to_js_error)?;
        Self::validated(inner).map_err(to_js_error)
    }

    /// Load from a JSON string.
    pub fn from_json(json: &str) -> Result<JsEditorConfig, JsValue> {
        Self::parse_json(json).map_err(to_js_error)
    }

    /// Plain-object form, suitable for storage.
    pub fn to_object(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(to_js_error)
    }

    /// DPI used by the single-image resize dialog
    #[wasm_bindgen(getter)]
    pub fn crop_dpi(&self) -> f64 {
        self.inner.crop_dpi
    }

    /// Whether batch runs remove the background first
    #[wasm_bindgen(getter)]
    pub fn remove_background(&self) -> bool {
        self.inner.batch.remove_background
    }

    #[wasm_bindgen(setter)]
    pub fn set_remove_background(&mut self, value: bool) {
        self.inner.batch.remove_background = value;
    }
}

impl JsEditorConfig {
    fn validated(inner: EditorConfig) -> Result<Self, ConfigError> {
        inner.validate()?;
        Ok(Self { inner })
    }

    fn parse_json(json: &str) -> Result<Self, ConfigError> {
        EditorConfig::from_json(json).map(|inner| Self { inner })
    }

    pub(crate) fn batch_options(&self) -> BatchOptions {
        self.inner.batch
    }

    /// Sheet settings for a paper tag, batch or single-image flavor, with an
    /// optional fill override (`transparent` or a CSS color).
    pub(crate) fn sheet(
        &self,
        paper: &str,
        batch: bool,
        background: Option<&str>,
    ) -> Result<PrintSheetSpec, String> {
        let paper = parse_paper(paper)?;
        let spec = if batch {
            self.inner.batch_sheet_for(paper)
        } else {
            self.inner.single_sheet_for(paper)
        };
        match background {
            Some(tag) => {
                let background = tag.parse::<Background>().map_err(|e| e.to_string())?;
                Ok(spec.with_background(background))
            }
            None => Ok(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::print::{Color, PaperSize};

    #[test]
    fn test_stock_config() {
        let config = JsEditorConfig::new();
        assert_eq!(config.crop_dpi(), 300.0);
        assert!(config.remove_background());
    }

    #[test]
    fn test_json_config_is_validated() {
        let config = JsEditorConfig::parse_json(r#"{"crop_dpi": 600}"#).unwrap();
        assert_eq!(config.crop_dpi(), 600.0);
        assert!(matches!(
            JsEditorConfig::parse_json(r#"{"crop_dpi": -1}"#),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_sheet_flavors() {
        let config = JsEditorConfig::new();
        let batch = config.sheet("4x6", true, None).unwrap();
        assert_eq!(batch, PrintSheetSpec::batch(PaperSize::FourBySix));
        let single = config.sheet("5x7", false, Some("#ff0000")).unwrap();
        assert_eq!(single.paper, PaperSize::FiveBySeven);
        assert_eq!(single.background, Background::Solid(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_sheet_rejects_bad_tags() {
        let config = JsEditorConfig::new();
        assert!(config.sheet("a4", true, None).is_err());
        assert!(config.sheet("4x6", false, Some("not-a-color")).is_err());
    }

    #[test]
    fn test_remove_background_toggle() {
        let mut config = JsEditorConfig::new();
        config.set_remove_background(false);
        assert!(!config.batch_options().remove_background);
    }
}
