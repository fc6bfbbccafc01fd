//! Photoprint WASM - WebAssembly bindings for the photoprint editor
//!
//! This crate exposes the photoprint-core pipeline to the browser UI.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible image wrapper and tag parsers
//! - `decode` / `encode` - Uploads in, PNG exports out
//! - `adjustments` - Color grading sliders
//! - `transform` - Rotation, flipping and cropping
//! - `print` - Print sheet tiling
//! - `config` - Editor settings loaded from a plain object
//! - `backend` - The remote AI service, reached through JS callbacks
//! - `batch` - Batch queue with per-item progress
//! - `session` - Single-image editing session
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditSession, JsAiBackend } from '@photoprint/wasm';
//!
//! await init();
//!
//! const session = JsEditSession.open(new Uint8Array(await file.arrayBuffer()));
//! await session.apply_remote(backend, 'remove-background');
//! const preview = session.current();
//! ```

use wasm_bindgen::prelude::*;

mod adjustments;
mod backend;
mod batch;
mod config;
mod decode;
mod encode;
mod print;
mod session;
mod transform;
mod types;

pub use adjustments::{apply_adjustments, ColorAdjustments};
pub use backend::JsAiBackend;
pub use batch::{JsBatchQueue, JsPrintExport};
pub use config::JsEditorConfig;
pub use decode::{decode_data_uri, decode_image, resize};
pub use encode::{encode_png, png_data_uri};
pub use print::{compose_print_sheet, paper_pixels, print_grid};
pub use session::JsEditSession;
pub use transform::{
    apply_rotate_flip, aspect_crop_rect, center_crop_to, compute_rotated_bounds,
    crop_with_straighten, to_pixels,
};
pub use types::JsPhotoBuffer;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
