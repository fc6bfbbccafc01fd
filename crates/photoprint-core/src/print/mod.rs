//! Print sheet layout.
//!
//! Tiles a finished photo over a sheet of photo paper:
//!
//! 1. Build a stamp: fill, photo inset by the border width, border frame
//! 2. Plan a grid of `stamp + cutting margin` cells that fits the paper
//! 3. Center the grid (no margin after the last row or column)
//! 4. Draw the stamp into every cell on white paper
//!
//! All lengths are converted to whole pixels once, at the sheet DPI, which
//! is independent of the DPI used for crop targets.

mod color;
mod layout;
mod sheet_spec;

use thiserror::Error;

use crate::encode::EncodeError;

pub(crate) use color::composite_over;
pub use color::{Background, Color, InvalidColor};
pub use layout::{build_stamp, compose_sheet, layout_prints, layout_prints_encoded, plan_grid, GridLayout};
pub use sheet_spec::{PaperSize, PrintSheetSpec};

/// Errors for a single photo's sheet. Other photos are unaffected.
#[derive(Debug, Clone, Error)]
pub enum LayoutError {
    /// The photo has no pixels.
    #[error("Photo has zero width or height")]
    EmptyPhoto,

    /// Not even one framed photo fits on the paper.
    #[error(
        "A {stamp_width}x{stamp_height} print does not fit on {paper_width}x{paper_height} paper"
    )]
    DoesNotFit {
        stamp_width: u32,
        stamp_height: u32,
        paper_width: u32,
        paper_height: u32,
    },

    /// A stamp or sheet canvas could not be allocated.
    #[error("Cannot allocate a {width}x{height} canvas")]
    CanvasUnavailable { width: u32, height: u32 },

    /// The finished sheet could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
