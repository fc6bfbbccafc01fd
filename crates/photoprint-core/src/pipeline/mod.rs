//! Edit orchestration.
//!
//! Two modes share the same building blocks:
//!
//! - [`batch`]: a queue of photos run through `remove background -> crop`,
//!   one at a time, with per-item status and failure isolation
//! - [`session`]: one photo edited interactively, each operation one-shot
//!
//! Remote AI edits go through the [`remote::AiBackend`] trait. Awaiting it is
//! the only suspension point; all pixel work runs to completion in between.

pub mod batch;
pub mod remote;
pub mod session;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::print::LayoutError;
use crate::transform::TransformError;

pub use batch::{
    BatchOptions, BatchQueue, BatchSummary, CropPreset, CropSettings, EditItem, ItemId,
    ItemStatus, PrintExport,
};
pub use remote::{validate_response, AiBackend, RemoteError, RemoteOperation};
pub use session::{BackgroundFill, EditSession, EditingState};

/// Failure of one edit operation or one batch item.
#[derive(Debug, Clone, Error)]
pub enum EditError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Rejected before any image was touched.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors that stop a whole batch action before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("No images to process")]
    EmptyBatch,

    #[error("No processed images to export")]
    NothingToExport,

    #[error("Invalid crop settings: {0}")]
    InvalidCrop(String),
}
