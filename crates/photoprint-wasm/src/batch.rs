//! Batch mode WASM bindings.
//!
//! The queue lives behind `Rc<RefCell<_>>` so a running `process()` promise
//! can hold it while the page keeps a handle. Calls that need the queue
//! while a run is in flight fail with a "busy" error; progress arrives
//! through the `on_update` callback instead.
//!
//! ```typescript
//! const queue = new JsBatchQueue();
//! for (const file of files) {
//!   queue.add(file.name, new Uint8Array(await file.arrayBuffer()));
//! }
//! const summary = await queue.process(backend, config, (item) => render(item));
//! const sheets = queue.export_prints(config, '4x6');
//! ```

use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;

use crate::backend::JsAiBackend;
use crate::config::JsEditorConfig;
use crate::types::{to_js_error, JsPhotoBuffer};
use js_sys::{Function, Promise};
use photoprint_core::pipeline::{BatchQueue, EditItem, ItemId, ItemStatus, PrintExport};
use photoprint_core::EncodedImage;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::console;

const BUSY: &str = "Batch is processing; wait for it to finish";

/// Item state as the page sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct ItemView {
    id: ItemId,
    name: String,
    status: ItemStatus,
    error: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl From<&EditItem> for ItemView {
    fn from(item: &EditItem) -> Self {
        Self {
            id: item.id(),
            name: item.name().to_string(),
            status: item.status(),
            error: item.error().map(str::to_string),
            width: item.result().map(|photo| photo.width),
            height: item.result().map(|photo| photo.height),
        }
    }
}

/// One exported print sheet.
#[wasm_bindgen]
pub struct JsPrintExport {
    id: ItemId,
    file_name: String,
    png: Option<Vec<u8>>,
    error: Option<String>,
}

#[wasm_bindgen]
impl JsPrintExport {
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Suggested download name, `{stem}-print-{paper}.png`
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    /// PNG bytes, absent when the photo did not fit the paper
    #[wasm_bindgen(getter)]
    pub fn png(&self) -> Option<Vec<u8>> {
        self.png.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }
}

impl From<PrintExport> for JsPrintExport {
    fn from(export: PrintExport) -> Self {
        let (png, error) = match export.sheet {
            Ok(sheet) => (Some(sheet.into_bytes()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            id: export.id,
            file_name: export.file_name,
            png,
            error,
        }
    }
}

/// The batch queue.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsBatchQueue {
    queue: Rc<RefCell<BatchQueue>>,
    stop: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl JsBatchQueue {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a photo from its file bytes. Returns the item id.
    pub fn add(&self, name: String, bytes: Vec<u8>) -> Result<ItemId, JsValue> {
        let source = EncodedImage::from_bytes(bytes).map_err(to_js_error)?;
        self.add_source(name, source).map_err(to_js_error)
    }

    /// Add a photo from a `data:` URI.
    pub fn add_data_uri(&self, name: String, uri: &str) -> Result<ItemId, JsValue> {
        let source = EncodedImage::from_data_uri(uri).map_err(to_js_error)?;
        self.add_source(name, source).map_err(to_js_error)
    }

    /// Remove an item. Returns false when the id is unknown.
    pub fn remove(&self, id: ItemId) -> Result<bool, JsValue> {
        Ok(self.queue_mut().map_err(to_js_error)?.remove(id).is_some())
    }

    pub fn clear(&self) -> Result<(), JsValue> {
        self.queue_mut().map_err(to_js_error)?.clear();
        Ok(())
    }

    /// Put every item back to pending.
    pub fn reset(&self) -> Result<(), JsValue> {
        self.queue_mut().map_err(to_js_error)?.reset();
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> Result<usize, JsValue> {
        Ok(self.queue_ref().map_err(to_js_error)?.len())
    }

    /// Snapshot of every item: `{ id, name, status, error, width, height }`.
    pub fn items(&self) -> Result<JsValue, JsValue> {
        let views = self.views().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&views).map_err(to_js_error)
    }

    /// Finished photo of an item, if it succeeded.
    pub fn result(&self, id: ItemId) -> Result<Option<JsPhotoBuffer>, JsValue> {
        let queue = self.queue_ref().map_err(to_js_error)?;
        Ok(queue
            .get(id)
            .and_then(EditItem::result)
            .cloned()
            .map(JsPhotoBuffer::from_buffer))
    }

    /// Run every pending or failed item through the batch recipe.
    ///
    /// Resolves to `{ succeeded, failed, skipped, not_started }`. Rejects
    /// when the queue is empty, the crop settings are invalid, or a run is
    /// already in flight.
    pub fn process(
        &self,
        backend: &JsAiBackend,
        config: &JsEditorConfig,
        on_update: Option<Function>,
    ) -> Promise {
        let queue = Rc::clone(&self.queue);
        let stop = Rc::clone(&self.stop);
        let backend = backend.clone();
        let options = config.batch_options();

        future_to_promise(async move {
            let mut queue = queue
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str(BUSY))?;
            stop.set(false);

            let summary = queue
                .process_with(
                    &backend,
                    &options,
                    || stop.get(),
                    |item| report(item, on_update.as_ref()),
                )
                .await
                .map_err(to_js_error)?;

            serde_wasm_bindgen::to_value(&summary).map_err(to_js_error)
        })
    }

    /// Ask a running `process()` to stop before its next item.
    pub fn stop(&self) {
        self.stop.set(true);
    }

    /// One print sheet per successful item.
    pub fn export_prints(
        &self,
        config: &JsEditorConfig,
        paper: &str,
    ) -> Result<Vec<JsPrintExport>, JsValue> {
        let spec = config.sheet(paper, true, None).map_err(to_js_error)?;
        let queue = self.queue_ref().map_err(to_js_error)?;
        let exports = queue.export_prints(&spec).map_err(to_js_error)?;
        Ok(exports.into_iter().map(JsPrintExport::from).collect())
    }
}

impl JsBatchQueue {
    fn queue_ref(&self) -> Result<std::cell::Ref<'_, BatchQueue>, &'static str> {
        self.queue.try_borrow().map_err(|_| BUSY)
    }

    fn queue_mut(&self) -> Result<RefMut<'_, BatchQueue>, &'static str> {
        self.queue.try_borrow_mut().map_err(|_| BUSY)
    }

    fn add_source(&self, name: String, source: EncodedImage) -> Result<ItemId, &'static str> {
        Ok(self.queue_mut()?.add(name, source))
    }

    fn views(&self) -> Result<Vec<ItemView>, &'static str> {
        Ok(self.queue_ref()?.items().iter().map(ItemView::from).collect())
    }
}

/// Forward a status change to the page.
fn report(item: &EditItem, on_update: Option<&Function>) {
    if let Some(error) = item.error() {
        console::warn_1(&JsValue::from_str(&format!(
            "Batch item {} ({}) failed: {error}",
            item.id(),
            item.name()
        )));
    }
    let Some(callback) = on_update else {
        return;
    };
    match serde_wasm_bindgen::to_value(&ItemView::from(item)) {
        Ok(view) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &view) {
                console::error_2(&JsValue::from_str("Batch update callback threw:"), &err);
            }
        }
        Err(err) => console::error_1(&to_js_error(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::encode::encode_png;
    use photoprint_core::PhotoBuffer;

    fn png(width: u32, height: u32) -> EncodedImage {
        encode_png(&PhotoBuffer::filled(width, height, [90, 90, 90, 255]).unwrap()).unwrap()
    }

    #[test]
    fn test_add_and_view_items() {
        let queue = JsBatchQueue::new();
        let first = queue.add_source("a.png".to_string(), png(4, 4)).unwrap();
        let second = queue.add_source("b.png".to_string(), png(4, 4)).unwrap();
        assert_ne!(first, second);

        let views = queue.views().unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].name, "a.png");
        assert_eq!(views[0].status, ItemStatus::Pending);
        assert_eq!(views[0].width, None);
    }

    #[test]
    fn test_busy_while_borrowed() {
        let queue = JsBatchQueue::new();
        let _running = queue.queue.borrow_mut();
        assert_eq!(queue.add_source("a.png".to_string(), png(2, 2)), Err(BUSY));
        assert!(queue.views().is_err());
    }

    #[test]
    fn test_stop_flag() {
        let queue = JsBatchQueue::new();
        assert!(!queue.stop.get());
        queue.stop();
        assert!(queue.stop.get());
    }

    #[test]
    fn test_print_export_conversion() {
        let ok = JsPrintExport::from(PrintExport {
            id: 3,
            file_name: "me-print-4x6.png".to_string(),
            sheet: Ok(png(2, 2)),
        });
        assert_eq!(ok.id(), 3);
        assert_eq!(ok.file_name(), "me-print-4x6.png");
        assert!(ok.png().is_some());
        assert_eq!(ok.error(), None);

        let failed = JsPrintExport::from(PrintExport {
            id: 4,
            file_name: "big-print-4x6.png".to_string(),
            sheet: Err(photoprint_core::print::LayoutError::EmptyPhoto),
        });
        assert!(failed.png().is_none());
        assert!(failed.error().is_some());
    }
}
