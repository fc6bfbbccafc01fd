//! The remote AI service, reached through JavaScript callbacks.
//!
//! The page owns the network: it passes two functions, each returning a
//! Promise that resolves to a `data:` URI string. Rust awaits those
//! promises and validates the reply before anything is decoded.
//!
//! ```typescript
//! const backend = new JsAiBackend(
//!   (operation, imageDataUri, timeoutSeconds) => api.edit(operation, imageDataUri, timeoutSeconds),
//!   (prompt, timeoutSeconds) => api.generateBackground(prompt, timeoutSeconds),
//! );
//! ```

use js_sys::{Function, Promise};
use photoprint_core::pipeline::{validate_response, AiBackend, RemoteError, RemoteOperation};
use photoprint_core::EncodedImage;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

const DEFAULT_TIMEOUT_SECONDS: u32 = 30;

/// Remote AI callbacks supplied by the page.
#[wasm_bindgen]
#[derive(Clone)]
pub struct JsAiBackend {
    edit: Function,
    generate_background: Function,
    timeout_seconds: u32,
}

#[wasm_bindgen]
impl JsAiBackend {
    /// # Arguments
    ///
    /// * `edit` - `(operation, imageDataUri, timeoutSeconds) => Promise<string | null>`
    /// * `generate_background` - `(prompt, timeoutSeconds) => Promise<string | null>`
    #[wasm_bindgen(constructor)]
    pub fn new(edit: Function, generate_background: Function) -> Self {
        Self {
            edit,
            generate_background,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Timeout passed to the callbacks. A rejection whose `name` is
    /// `TimeoutError` (as from `AbortSignal.timeout`) is reported as a timeout.
    #[wasm_bindgen(getter)]
    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
    }

    #[wasm_bindgen(setter)]
    pub fn set_timeout_seconds(&mut self, seconds: u32) {
        self.timeout_seconds = seconds;
    }
}

impl AiBackend for JsAiBackend {
    async fn edit(
        &self,
        operation: RemoteOperation,
        image: &EncodedImage,
    ) -> Result<EncodedImage, RemoteError> {
        let called = self.edit.call3(
            &JsValue::NULL,
            &JsValue::from_str(operation.as_str()),
            &JsValue::from_str(&image.to_data_uri()),
            &JsValue::from(self.timeout_seconds),
        );
        let reply = self.settle(called).await?;
        validate_response(operation, reply.as_deref())
    }

    async fn generate_background(&self, prompt: &str) -> Result<EncodedImage, RemoteError> {
        let called = self.generate_background.call2(
            &JsValue::NULL,
            &JsValue::from_str(prompt),
            &JsValue::from(self.timeout_seconds),
        );
        let reply = self.settle(called).await?;
        validate_response("generate-background", reply.as_deref())
    }
}

impl JsAiBackend {
    /// Await whatever the callback returned; plain values count as resolved.
    async fn settle(&self, called: Result<JsValue, JsValue>) -> Result<Option<String>, RemoteError> {
        let value = called.map_err(|err| self.remote_error(err))?;
        let resolved = JsFuture::from(Promise::resolve(&value))
            .await
            .map_err(|err| self.remote_error(err))?;
        Ok(resolved.as_string())
    }

    fn remote_error(&self, err: JsValue) -> RemoteError {
        if let Some(error) = err.dyn_ref::<js_sys::Error>() {
            if String::from(error.name()) == "TimeoutError" {
                return RemoteError::Timeout {
                    seconds: self.timeout_seconds,
                };
            }
            return RemoteError::Transport(String::from(error.message()));
        }
        RemoteError::Transport(
            err.as_string()
                .unwrap_or_else(|| "remote call rejected".to_string()),
        )
    }
}

/// WASM-specific tests that call into JavaScript.
///
/// Run with `wasm-pack test --headless --chrome`.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use photoprint_core::encode::png_data_uri;
    use photoprint_core::PhotoBuffer;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn backend(edit_body: &str) -> JsAiBackend {
        JsAiBackend::new(
            Function::new_with_args("op, uri, timeout", edit_body),
            Function::new_with_args("prompt, timeout", "return Promise.resolve(null);"),
        )
    }

    fn sample() -> EncodedImage {
        let uri = png_data_uri(&PhotoBuffer::filled(2, 2, [1, 2, 3, 255]).unwrap()).unwrap();
        EncodedImage::from_data_uri(&uri).unwrap()
    }

    #[wasm_bindgen_test]
    async fn test_echo_backend_returns_image() {
        let backend = backend("return Promise.resolve(uri);");
        let image = backend.edit(RemoteOperation::EnhanceFace, &sample()).await.unwrap();
        assert_eq!(image.mime(), "image/png");
    }

    #[wasm_bindgen_test]
    async fn test_null_reply_is_no_image() {
        let backend = backend("return null;");
        let err = backend.edit(RemoteOperation::Upscale, &sample()).await.unwrap_err();
        assert_eq!(err.to_string(), "upscale returned no image");
    }

    #[wasm_bindgen_test]
    async fn test_rejection_is_transport_error() {
        let backend = backend("return Promise.reject(new Error('offline'));");
        let err = backend.edit(RemoteOperation::Upscale, &sample()).await.unwrap_err();
        assert_eq!(err, RemoteError::Transport("offline".to_string()));
    }

    #[wasm_bindgen_test]
    async fn test_timeout_error_name() {
        let mut backend = backend(
            "const e = new Error('slow'); e.name = 'TimeoutError'; return Promise.reject(e);",
        );
        backend.set_timeout_seconds(45);
        let err = backend.edit(RemoteOperation::Upscale, &sample()).await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout { seconds: 45 });
    }

    #[wasm_bindgen_test]
    async fn test_empty_generation_reply() {
        let backend = backend("return null;");
        assert!(matches!(
            backend.generate_background("beach").await,
            Err(RemoteError::NoImage { .. })
        ));
    }
}
