//! Raster decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{fits_canvas, DecodeError, EncodedImage, Orientation, PhotoBuffer};

/// Decode an encoded image into an RGBA buffer.
///
/// JPEG input has its EXIF orientation applied, matching what a browser
/// shows for the same file.
pub fn decode_image(encoded: &EncodedImage) -> Result<PhotoBuffer, DecodeError> {
    let orientation = if encoded.format() == ImageFormat::Jpeg {
        extract_orientation(encoded.bytes())
    } else {
        Orientation::Normal
    };

    let img = ImageReader::with_format(Cursor::new(encoded.bytes()), encoded.format())
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }
    if !fits_canvas(width, height) {
        return Err(DecodeError::TooLarge { width, height });
    }

    let oriented = apply_orientation(img, orientation);
    Ok(PhotoBuffer::from_rgba_image(oriented.into_rgba8()))
}

/// Sniff and decode raw file bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<PhotoBuffer, DecodeError> {
    let encoded = EncodedImage::from_bytes(bytes.to_vec())?;
    decode_image(&encoded)
}

/// Decode a `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<PhotoBuffer, DecodeError> {
    decode_image(&EncodedImage::from_data_uri(uri)?)
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default()
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
