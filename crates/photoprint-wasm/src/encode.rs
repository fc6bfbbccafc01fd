//! Image encoding WASM bindings.
//!
//! Every export the editor produces is PNG, so transparency from background
//! removal survives the download.
//!
//! ```typescript
//! import { encode_png, png_data_uri } from '@photoprint/wasm';
//!
//! const bytes = encode_png(image);
//! const href = png_data_uri(image);
//! ```

use crate::types::{to_js_error, JsPhotoBuffer};
use photoprint_core::encode;
use wasm_bindgen::prelude::*;

/// Encode an image to PNG file bytes.
///
/// # Errors
///
/// Returns an error if encoding fails internally.
#[wasm_bindgen]
pub fn encode_png(image: &JsPhotoBuffer) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(&image.to_buffer())
        .map(|encoded| encoded.into_bytes())
        .map_err(to_js_error)
}

/// Encode an image to a `data:image/png;base64,` URI.
#[wasm_bindgen]
pub fn png_data_uri(image: &JsPhotoBuffer) -> Result<String, JsValue> {
    encode::png_data_uri(&image.to_buffer()).map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::PhotoBuffer;

    fn test_image() -> JsPhotoBuffer {
        JsPhotoBuffer::from_buffer(PhotoBuffer::filled(8, 5, [200, 100, 50, 128]).unwrap())
    }

    #[test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&test_image()).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_data_uri_roundtrip_dimensions() {
        let uri = png_data_uri(&test_image()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let decoded = photoprint_core::decode::decode_data_uri(&uri).unwrap();
        assert_eq!((decoded.width, decoded.height), (8, 5));
        assert_eq!(decoded.pixel(0, 0), [200, 100, 50, 128]);
    }
}
