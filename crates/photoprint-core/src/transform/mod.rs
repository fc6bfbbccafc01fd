//! Geometric transforms: rotation, flipping and cropping.
//!
//! Every operation takes a buffer by reference and returns a new one; the
//! input is never modified.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Mirroring is applied before rotation
//! - Crop rectangles are in pixels, origin at the top-left corner

mod crop;
mod rotation;

use thiserror::Error;

pub use crop::{
    center_crop_to, crop_region, crop_with_straighten, AspectPreset, CropOutcome, CropRect,
    CropRequest,
};
pub use rotation::{apply_rotate_flip, compute_rotated_bounds, InterpolationFilter};

/// Errors from geometric operations. Each is fatal for the single operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The crop rectangle rounds to zero width or height.
    #[error("Crop area {width}x{height} is empty")]
    EmptyCrop { width: f64, height: f64 },

    /// A requested output dimension is zero.
    #[error("Target size {width}x{height} must be positive")]
    ZeroTarget { width: u32, height: u32 },

    /// The output canvas could not be allocated.
    #[error("Cannot allocate a {width}x{height} canvas")]
    CanvasUnavailable { width: u32, height: u32 },
}
