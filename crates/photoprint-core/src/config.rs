//! Editor configuration.
//!
//! Every field has a default matching the editor's stock behavior, so a
//! config only needs the values it wants to change. Unknown keys are
//! rejected.
//!
//! ```json
//! {
//!   "crop_dpi": 300,
//!   "batch": {
//!     "remove_background": true,
//!     "crop": { "preset": "35x45mm", "width": 35, "height": 45, "unit": "mm" },
//!     "dpi": 300
//!   },
//!   "batch_sheet": {
//!     "paper": "4x6",
//!     "dpi": 300,
//!     "cutting_margin": { "value": 2, "unit": "mm" },
//!     "border": { "value": 0.2, "unit": "mm" },
//!     "border_color": "#c8c8c8b3",
//!     "background": "#ffffff"
//!   },
//!   "single_sheet": { "...": "same shape as batch_sheet" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::BatchOptions;
use crate::print::{PaperSize, PrintSheetSpec};
use crate::units::{Length, DEFAULT_DPI};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings for both editor modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Resolution for turning physical sizes into pixels in the
    /// single-image resize dialog.
    pub crop_dpi: f64,
    /// Default recipe for batch processing.
    pub batch: BatchOptions,
    /// Print sheet settings for batch export.
    pub batch_sheet: PrintSheetSpec,
    /// Print sheet settings for single-image export.
    pub single_sheet: PrintSheetSpec,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            crop_dpi: DEFAULT_DPI,
            batch: BatchOptions::default(),
            batch_sheet: PrintSheetSpec::batch(PaperSize::default()),
            single_sheet: PrintSheetSpec::single(PaperSize::default()),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_dpi("crop_dpi", self.crop_dpi)?;
        check_dpi("batch.dpi", self.batch.dpi)?;
        if let Some(crop) = &self.batch.crop {
            crop.target_pixels(self.batch.dpi)
                .map_err(|e| ConfigError::Validation(format!("batch.crop: {e}")))?;
        }
        for (name, sheet) in [("batch_sheet", &self.batch_sheet), ("single_sheet", &self.single_sheet)] {
            check_dpi(&format!("{name}.dpi"), sheet.dpi)?;
            check_length(&format!("{name}.cutting_margin"), sheet.cutting_margin)?;
            check_length(&format!("{name}.border"), sheet.border)?;
        }
        Ok(())
    }

    /// Batch sheet settings for another paper size.
    pub fn batch_sheet_for(&self, paper: PaperSize) -> PrintSheetSpec {
        PrintSheetSpec {
            paper,
            ..self.batch_sheet
        }
    }

    /// Single-image sheet settings for another paper size.
    pub fn single_sheet_for(&self, paper: PaperSize) -> PrintSheetSpec {
        PrintSheetSpec {
            paper,
            ..self.single_sheet
        }
    }
}

fn check_dpi(name: &str, dpi: f64) -> Result<(), ConfigError> {
    if dpi.is_finite() && dpi > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be positive, got {dpi}")))
    }
}

fn check_length(name: &str, length: Length) -> Result<(), ConfigError> {
    if length.value.is_finite() && length.value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must not be negative, got {}{}",
            length.value, length.unit
        )))
    }
}
