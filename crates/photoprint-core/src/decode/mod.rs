//! Image intake for photoprint.
//!
//! This module provides functionality for:
//! - Parsing and producing `data:` URIs with MIME sniffing
//! - Decoding JPEG, PNG and TIFF into RGBA buffers (EXIF orientation applied)
//! - Resizing buffers to exact dimensions
//!
//! # Architecture
//!
//! Decoding runs synchronously on whatever thread calls it. In the browser
//! that is the UI thread; the bindings never decode while a remote call is
//! pending for the same buffer.

mod data_uri;
mod raster;
mod resize;
mod types;

pub use data_uri::EncodedImage;
pub use raster::{decode_bytes, decode_data_uri, decode_image};
pub use resize::resize;
pub use types::{fits_canvas, DecodeError, FilterType, Orientation, PhotoBuffer, MAX_CANVAS_PIXELS};
