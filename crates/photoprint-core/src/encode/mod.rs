//! Image encoding for photoprint exports.
//!
//! This module provides functionality for:
//! - Encoding RGBA buffers to PNG
//! - Producing `data:` URIs for download links and remote transport
//!
//! # Architecture
//!
//! Encoding is synchronous and single-threaded, like decoding.

mod png;

pub use png::{encode_png, png_data_uri, EncodeError};
