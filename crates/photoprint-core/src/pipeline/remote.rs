//! The remote AI collaborator.
//!
//! Generative edits run on a service outside this crate. Each one takes an
//! encoded image and hands back an encoded image of the same picture; the
//! background generator takes only a text prompt. Awaiting these calls is
//! the only place the pipeline suspends.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodeError, EncodedImage};

/// Image-to-image edits offered by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteOperation {
    RemoveBackground,
    EnhanceFace,
    Upscale,
    CorrectColor,
    RemoveBlemishes,
}

impl RemoteOperation {
    pub const ALL: [RemoteOperation; 5] = [
        RemoteOperation::RemoveBackground,
        RemoteOperation::EnhanceFace,
        RemoteOperation::Upscale,
        RemoteOperation::CorrectColor,
        RemoteOperation::RemoveBlemishes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RemoteOperation::RemoveBackground => "remove-background",
            RemoteOperation::EnhanceFace => "enhance-face",
            RemoteOperation::Upscale => "upscale",
            RemoteOperation::CorrectColor => "correct-color",
            RemoteOperation::RemoveBlemishes => "remove-blemishes",
        }
    }

    /// Whether the reply may have different dimensions than the input.
    pub fn changes_dimensions(self) -> bool {
        matches!(self, RemoteOperation::Upscale)
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ways a remote call can fail. None of them touch the image being edited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service answered without an image.
    #[error("{operation} returned no image")]
    NoImage { operation: String },

    /// The request never completed.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service did not answer in time.
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u32 },

    /// The service answered with something that is not a usable image.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A remote image service.
///
/// Implementations decide transport, authentication and timeouts. The
/// returned futures are awaited on the calling thread and need not be `Send`.
pub trait AiBackend {
    /// Run an image-to-image edit.
    fn edit(
        &self,
        operation: RemoteOperation,
        image: &EncodedImage,
    ) -> impl Future<Output = Result<EncodedImage, RemoteError>>;

    /// Produce a background image from a text prompt.
    fn generate_background(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<EncodedImage, RemoteError>>;
}

/// Check a raw service reply and turn it into an image.
///
/// The reply must be a non-empty `data:` URI whose declared MIME type
/// matches its payload.
pub fn validate_response(
    operation: impl fmt::Display,
    reply: Option<&str>,
) -> Result<EncodedImage, RemoteError> {
    let uri = match reply.map(str::trim) {
        Some(uri) if !uri.is_empty() => uri,
        _ => {
            return Err(RemoteError::NoImage {
                operation: operation.to_string(),
            })
        }
    };
    EncodedImage::from_data_uri(uri).map_err(RemoteError::from)
}

impl From<DecodeError> for RemoteError {
    fn from(err: DecodeError) -> Self {
        RemoteError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PhotoBuffer;
    use crate::encode::png_data_uri;

    #[test]
    fn test_operation_tags() {
        for op in RemoteOperation::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
        assert!(RemoteOperation::Upscale.changes_dimensions());
        assert!(!RemoteOperation::RemoveBackground.changes_dimensions());
    }

    #[test]
    fn test_validate_missing_reply() {
        let err = validate_response(RemoteOperation::EnhanceFace, None).unwrap_err();
        assert_eq!(err.to_string(), "enhance-face returned no image");
        assert!(matches!(
            validate_response("generate-background", Some("  ")),
            Err(RemoteError::NoImage { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_image() {
        assert!(matches!(
            validate_response(RemoteOperation::Upscale, Some("data:text/plain;base64,aGVsbG8=")),
            Err(RemoteError::InvalidResponse(_))
        ));
        assert!(matches!(
            validate_response(RemoteOperation::Upscale, Some("https://example.com/x.png")),
            Err(RemoteError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_validate_accepts_png_uri() {
        let uri = png_data_uri(&PhotoBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap()).unwrap();
        let image = validate_response(RemoteOperation::RemoveBackground, Some(&uri)).unwrap();
        assert_eq!(image.mime(), "image/png");
    }
}
