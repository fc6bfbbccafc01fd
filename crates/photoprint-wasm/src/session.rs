//! Single-image editing WASM bindings.
//!
//! Local edits are synchronous and return the new preview. Remote edits
//! return a Promise; while one is in flight every other call on the session
//! fails with a "busy" error, so a slow reply can never land on top of a
//! newer edit.
//!
//! ```typescript
//! const session = JsEditSession.open(bytes);
//! await session.apply_remote(backend, 'remove-background');
//! session.set_background('#ffffff');
//! session.rotate_by(90);
//! const png = session.export_png();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::adjustments::ColorAdjustments;
use crate::backend::JsAiBackend;
use crate::config::JsEditorConfig;
use crate::transform::crop_request;
use crate::types::{parse_aspect, parse_unit, to_js_error, JsPhotoBuffer};
use js_sys::Promise;
use photoprint_core::pipeline::{EditError, EditSession, RemoteOperation};
use photoprint_core::print::Background;
use photoprint_core::transform::CropRect;
use photoprint_core::{EncodedImage, Length};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

const BUSY: &str = "An edit is still running; wait for it to finish";

/// One photo being edited.
#[wasm_bindgen]
pub struct JsEditSession {
    session: Rc<RefCell<EditSession>>,
}

#[wasm_bindgen]
impl JsEditSession {
    /// Start a session from uploaded file bytes.
    pub fn open(bytes: Vec<u8>) -> Result<JsEditSession, JsValue> {
        let upload = EncodedImage::from_bytes(bytes).map_err(to_js_error)?;
        EditSession::open(&upload)
            .map(Self::from_session)
            .map_err(to_js_error)
    }

    /// Start a session from a `data:` URI.
    pub fn open_data_uri(uri: &str) -> Result<JsEditSession, JsValue> {
        EditSession::open_data_uri(uri)
            .map(Self::from_session)
            .map_err(to_js_error)
    }

    /// The rendered preview.
    pub fn current(&self) -> Result<JsPhotoBuffer, JsValue> {
        self.read(|session| JsPhotoBuffer::from_buffer(session.current().clone()))
            .map_err(to_js_error)
    }

    /// The image as uploaded.
    pub fn original(&self) -> Result<JsPhotoBuffer, JsValue> {
        self.read(|session| JsPhotoBuffer::from_buffer(session.original().clone()))
            .map_err(to_js_error)
    }

    /// The edit recipe as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        let state = self.read(|session| session.state().clone()).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&state).map_err(to_js_error)
    }

    /// Run a remote edit: `remove-background`, `enhance-face`, `upscale`,
    /// `correct-color` or `remove-blemishes`.
    pub fn apply_remote(&self, backend: &JsAiBackend, operation: &str) -> Promise {
        let session = Rc::clone(&self.session);
        let backend = backend.clone();
        let operation = parse_operation(operation);

        future_to_promise(async move {
            let operation = operation.map_err(to_js_error)?;
            let mut session = session
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str(BUSY))?;
            session
                .apply_remote(&backend, operation)
                .await
                .map_err(to_js_error)?;
            Ok(JsPhotoBuffer::from_buffer(session.current().clone()).into())
        })
    }

    /// Generate a backdrop from a text prompt and show it behind the subject.
    pub fn generate_background(&self, backend: &JsAiBackend, prompt: String) -> Promise {
        let session = Rc::clone(&self.session);
        let backend = backend.clone();

        future_to_promise(async move {
            let mut session = session
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str(BUSY))?;
            session
                .generate_background(&backend, &prompt)
                .await
                .map_err(to_js_error)?;
            Ok(JsPhotoBuffer::from_buffer(session.current().clone()).into())
        })
    }

    /// Turn by `degrees`, clockwise positive.
    pub fn rotate_by(&self, degrees: f64) -> Result<JsPhotoBuffer, JsValue> {
        self.edit(|session| session.rotate_by(degrees))
            .map_err(to_js_error)
    }

    pub fn set_rotation(&self, degrees: f64) -> Result<JsPhotoBuffer, JsValue> {
        self.edit(|session| session.set_rotation(degrees))
            .map_err(to_js_error)
    }

    pub fn toggle_flip(&self) -> Result<JsPhotoBuffer, JsValue> {
        self.edit(EditSession::toggle_flip).map_err(to_js_error)
    }

    pub fn set_adjustments(&self, adjustments: &ColorAdjustments) -> Result<JsPhotoBuffer, JsValue> {
        let values = adjustments.values();
        self.edit(|session| session.set_adjustments(values))
            .map_err(to_js_error)
    }

    /// `transparent` or a CSS color; shown where the background was removed.
    pub fn set_background(&self, background: &str) -> Result<JsPhotoBuffer, JsValue> {
        let background = background.parse::<Background>().map_err(to_js_error)?;
        self.edit(|session| session.set_background(background))
            .map_err(to_js_error)
    }

    /// Freeform crop, straightened by `rotation` degrees. Pass `0` for the
    /// output size to keep the rectangle's own size.
    #[allow(clippy::too_many_arguments)]
    pub fn crop(
        &self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: f64,
        output_width: u32,
        output_height: u32,
    ) -> Result<JsPhotoBuffer, JsValue> {
        let request = crop_request(
            CropRect::new(x, y, width, height),
            rotation,
            output_width,
            output_height,
        );
        self.edit(|session| session.crop(&request))
            .map_err(to_js_error)
    }

    /// Largest centered crop of an aspect preset (`1:1`, `9:16`, ...).
    pub fn crop_to_aspect(&self, preset: &str) -> Result<JsPhotoBuffer, JsValue> {
        let preset = parse_aspect(preset).map_err(to_js_error)?;
        self.edit(|session| session.crop_to_aspect(preset))
            .map_err(to_js_error)
    }

    /// Center-crop and scale to a physical size, e.g. `35, 45, 'mm'`.
    pub fn resize_to(
        &self,
        width: f64,
        height: f64,
        unit: &str,
        config: &JsEditorConfig,
    ) -> Result<JsPhotoBuffer, JsValue> {
        let unit = parse_unit(unit).map_err(to_js_error)?;
        let dpi = config.crop_dpi();
        self.edit(|session| {
            session.resize_to(Length::new(width, unit), Length::new(height, unit), dpi)
        })
        .map_err(to_js_error)
    }

    /// Back to the uploaded image.
    pub fn reset(&self) -> Result<JsPhotoBuffer, JsValue> {
        self.edit(|session| {
            session.reset();
            Ok(())
        })
        .map_err(to_js_error)
    }

    /// Full-quality PNG bytes of the edited photo.
    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        self.read(EditSession::export_png)
            .map_err(to_js_error)?
            .map(EncodedImage::into_bytes)
            .map_err(to_js_error)
    }

    /// Tile the edited photo on a sheet; returns PNG bytes.
    ///
    /// `background` overrides the stamp fill (`transparent` or a CSS color).
    pub fn print_sheet(
        &self,
        config: &JsEditorConfig,
        paper: &str,
        background: Option<String>,
    ) -> Result<Vec<u8>, JsValue> {
        let spec = config
            .sheet(paper, false, background.as_deref())
            .map_err(to_js_error)?;
        self.read(|session| session.print_sheet_with(&spec))
            .map_err(to_js_error)?
            .map(EncodedImage::into_bytes)
            .map_err(to_js_error)
    }
}

impl JsEditSession {
    fn from_session(session: EditSession) -> Self {
        Self {
            session: Rc::new(RefCell::new(session)),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&EditSession) -> T) -> Result<T, &'static str> {
        let session = self.session.try_borrow().map_err(|_| BUSY)?;
        Ok(f(&*session))
    }

    /// Apply a local edit and hand back the new preview.
    fn edit(
        &self,
        f: impl FnOnce(&mut EditSession) -> Result<(), EditError>,
    ) -> Result<JsPhotoBuffer, String> {
        let mut session = self.session.try_borrow_mut().map_err(|_| BUSY.to_string())?;
        f(&mut *session).map_err(|e| e.to_string())?;
        Ok(JsPhotoBuffer::from_buffer(session.current().clone()))
    }
}

fn parse_operation(tag: &str) -> Result<RemoteOperation, String> {
    RemoteOperation::ALL
        .into_iter()
        .find(|op| op.as_str() == tag.trim())
        .ok_or_else(|| format!("Unknown remote operation '{tag}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::encode::encode_png;
    use photoprint_core::PhotoBuffer;

    fn session(width: u32, height: u32) -> JsEditSession {
        let png = encode_png(&PhotoBuffer::filled(width, height, [30, 60, 90, 255]).unwrap()).unwrap();
        JsEditSession::open(png.into_bytes()).unwrap()
    }

    #[test]
    fn test_open_shows_upload() {
        let session = session(20, 10);
        let current = session.current().unwrap();
        assert_eq!((current.width(), current.height()), (20, 10));
    }

    #[test]
    fn test_rotation_and_reset() {
        let session = session(20, 10);
        let rotated = session.rotate_by(90.0).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (10, 20));
        let flipped = session.toggle_flip().unwrap();
        assert_eq!((flipped.width(), flipped.height()), (10, 20));
        let reset = session.reset().unwrap();
        assert_eq!((reset.width(), reset.height()), (20, 10));
    }

    #[test]
    fn test_crop_to_aspect_square() {
        let session = session(40, 20);
        let cropped = session.crop_to_aspect("1:1").unwrap();
        assert_eq!((cropped.width(), cropped.height()), (20, 20));
    }

    #[test]
    fn test_resize_to_inches() {
        let session = session(900, 900);
        let resized = session.resize_to(1.0, 2.0, "in", &JsEditorConfig::new()).unwrap();
        assert_eq!((resized.width(), resized.height()), (300, 600));
    }

    #[test]
    fn test_edit_refused_while_busy() {
        let session = session(4, 4);
        let _running = session.session.borrow_mut();
        assert_eq!(session.edit(EditSession::toggle_flip).err(), Some(BUSY.to_string()));
        assert!(session.read(|s| s.current().width).is_err());
    }

    #[test]
    fn test_export_png_bytes() {
        let session = session(6, 3);
        let bytes = session.export_png().unwrap();
        let decoded = photoprint_core::decode::decode_bytes(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (6, 3));
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!(parse_operation("upscale"), Ok(RemoteOperation::Upscale));
        assert_eq!(
            parse_operation("remove-background"),
            Ok(RemoteOperation::RemoveBackground)
        );
        assert!(parse_operation("sharpen").is_err());
    }
}
