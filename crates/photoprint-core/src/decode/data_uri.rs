//! Encoded images and `data:` URI transport.
//!
//! Encoded images cross every boundary of the editor: file intake, the
//! remote AI collaborator, and export. They travel as
//! `data:<mime>;base64,<payload>` strings.

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use super::DecodeError;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Formats accepted at the intake boundary.
const ACCEPTED: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Tiff];

/// An encoded raster whose format tag always matches its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap raw file bytes, sniffing the format from the payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let format = sniff(&bytes)?;
        Ok(Self { format, bytes })
    }

    /// Wrap bytes already known to be PNG (produced by our own encoder).
    pub(crate) fn png(bytes: Vec<u8>) -> Self {
        Self {
            format: ImageFormat::Png,
            bytes,
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    ///
    /// The declared MIME type must agree with what the payload actually is.
    /// Extra `;key=value` parameters before `;base64` are ignored.
    pub fn from_data_uri(uri: &str) -> Result<Self, DecodeError> {
        let uri = uri.trim();
        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| DecodeError::MalformedDataUri("missing data: prefix".to_string()))?;
        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| DecodeError::MalformedDataUri("missing ;base64, marker".to_string()))?;

        // Parameters such as `;charset=binary` may sit between type and marker
        let declared = rest[..marker]
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let payload = &rest[marker + BASE64_MARKER.len()..];
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| DecodeError::MalformedDataUri(e.to_string()))?;

        let encoded = Self::from_bytes(bytes)?;
        let declared_format = format_from_mime(&declared)
            .ok_or_else(|| DecodeError::MalformedDataUri(format!("unsupported type {declared}")))?;
        if declared_format != encoded.format {
            return Err(DecodeError::MimeMismatch {
                declared,
                detected: encoded.mime().to_string(),
            });
        }
        Ok(encoded)
    }

    /// Render as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "{DATA_PREFIX}{}{BASE64_MARKER}{}",
            self.mime(),
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// MIME type of the payload.
    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Detect the payload format from its magic bytes.
fn sniff(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }
    let format = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    if ACCEPTED.contains(&format) {
        Ok(format)
    } else {
        Err(DecodeError::InvalidFormat)
    }
}

fn format_from_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/tiff" | "image/tif" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    fn data_uri(mime: &str, bytes: &[u8]) -> String {
        format!(
            "data:{mime};base64,{}",
            general_purpose::STANDARD.encode(bytes)
        )
    }

    #[test]
    fn test_sniffs_png() {
        let encoded = EncodedImage::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Png);
        assert_eq!(encoded.mime(), "image/png");
    }

    #[test]
    fn test_rejects_empty_and_unknown_payloads() {
        assert!(matches!(
            EncodedImage::from_bytes(vec![]),
            Err(DecodeError::InvalidFormat)
        ));
        assert!(matches!(
            EncodedImage::from_bytes(b"Hello".to_vec()),
            Err(DecodeError::InvalidFormat)
        ));
    }

    #[test]
    fn test_parses_data_uri() {
        let uri = data_uri("image/jpeg", JPEG_MAGIC);
        let encoded = EncodedImage::from_data_uri(&uri).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Jpeg);
        assert_eq!(encoded.bytes(), JPEG_MAGIC);
    }

    #[test]
    fn test_accepts_jpg_alias() {
        let uri = data_uri("image/jpg", JPEG_MAGIC);
        assert!(EncodedImage::from_data_uri(&uri).is_ok());
    }

    #[test]
    fn test_ignores_mime_parameters() {
        let uri = data_uri("image/png;charset=binary", PNG_MAGIC);
        let encoded = EncodedImage::from_data_uri(&uri).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Png);

        let uri = data_uri("image/jpeg;name=a.jpg;charset=binary", PNG_MAGIC);
        assert!(matches!(
            EncodedImage::from_data_uri(&uri),
            Err(DecodeError::MimeMismatch { declared, .. }) if declared == "image/jpeg"
        ));
    }

    #[test]
    fn test_rejects_mime_mismatch() {
        let uri = data_uri("image/png", JPEG_MAGIC);
        match EncodedImage::from_data_uri(&uri) {
            Err(DecodeError::MimeMismatch { declared, detected }) => {
                assert_eq!(declared, "image/png");
                assert_eq!(detected, "image/jpeg");
            }
            other => panic!("expected MimeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_uris() {
        assert!(matches!(
            EncodedImage::from_data_uri("image/png;base64,AAAA"),
            Err(DecodeError::MalformedDataUri(_))
        ));
        assert!(matches!(
            EncodedImage::from_data_uri("data:image/png,rawtext"),
            Err(DecodeError::MalformedDataUri(_))
        ));
        assert!(matches!(
            EncodedImage::from_data_uri("data:image/png;base64,!!!"),
            Err(DecodeError::MalformedDataUri(_))
        ));
    }

    #[test]
    fn test_data_uri_output_format() {
        let encoded = EncodedImage::from_bytes(PNG_MAGIC.to_vec()).unwrap();
        let uri = encoded.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(EncodedImage::from_data_uri(&uri).unwrap(), encoded);
    }
}
