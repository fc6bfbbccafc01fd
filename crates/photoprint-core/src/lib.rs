//! Photoprint Core - compositing library for the photoprint editor
//!
//! This crate provides the deterministic image pipeline behind the editor:
//! unit-aware crop and resize geometry, rotation, per-pixel color grading,
//! print-sheet tiling, and the orchestration that strings remote AI edits
//! and local operations together.

pub mod adjustments;
pub mod config;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod print;
pub mod transform;
pub mod units;

pub use config::EditorConfig;
pub use decode::{EncodedImage, PhotoBuffer};
pub use pipeline::{AiBackend, BatchQueue, EditSession, RemoteOperation};
pub use print::{compose_sheet, layout_prints, PaperSize, PrintSheetSpec};
pub use transform::{apply_rotate_flip, center_crop_to, compute_rotated_bounds, crop_with_straighten};
pub use units::{to_pixels, Length, Unit, DEFAULT_DPI};

/// Slider-driven color adjustments for the editor
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorAdjustments {
    /// Brightness (-100 to 100)
    pub brightness: f32,
    /// Contrast (-100 to 100)
    pub contrast: f32,
    /// Saturation (-100 to 100)
    pub saturation: f32,
    /// Color temperature (-100 cool to 100 warm)
    pub temperature: f32,
    /// Highlights (-100 to 100)
    pub highlights: f32,
    /// Shadows (-100 to 100)
    pub shadows: f32,
}

impl ColorAdjustments {
    /// Valid range of every adjustment.
    pub const MIN: f32 = -100.0;
    pub const MAX: f32 = 100.0;

    /// Create a new ColorAdjustments with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with every field clamped into [-100, 100]. NaN becomes 0.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32| {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(Self::MIN, Self::MAX)
            }
        };
        Self {
            brightness: clamp(self.brightness),
            contrast: clamp(self.contrast),
            saturation: clamp(self.saturation),
            temperature: clamp(self.temperature),
            highlights: clamp(self.highlights),
            shadows: clamp(self.shadows),
        }
    }
}
