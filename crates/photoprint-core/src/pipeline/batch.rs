//! Batch mode: many photos, one recipe.
//!
//! Each item runs `decode -> remove background -> center crop` and ends in
//! `success` or `error`. Items are processed one at a time, in order. A
//! failing item records its message and the batch moves on. Items that
//! already succeeded are skipped on later runs until the queue is reset.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::remote::{AiBackend, RemoteOperation};
use super::{BatchError, EditError};
use crate::decode::{decode_image, EncodedImage, FilterType, PhotoBuffer};
use crate::encode::encode_png;
use crate::print::{compose_sheet, LayoutError, PrintSheetSpec};
use crate::transform::center_crop_to;
use crate::units::{Length, Unit, DEFAULT_DPI};

/// Identifies an item for the lifetime of its queue.
pub type ItemId = u64;

/// Named crop sizes, plus `custom` for explicit dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropPreset {
    /// Passport and visa photos.
    #[default]
    #[serde(rename = "35x45mm")]
    Passport,
    #[serde(rename = "1.5x1.5in")]
    Square1_5In,
    #[serde(rename = "2x2in")]
    Square2In,
    #[serde(rename = "custom")]
    Custom,
}

impl CropPreset {
    /// `(width, height)` of a named preset; `None` for custom.
    pub fn size(self) -> Option<(Length, Length)> {
        match self {
            CropPreset::Passport => Some((Length::mm(35.0), Length::mm(45.0))),
            CropPreset::Square1_5In => Some((
                Length::new(1.5, Unit::Inches),
                Length::new(1.5, Unit::Inches),
            )),
            CropPreset::Square2In => Some((
                Length::new(2.0, Unit::Inches),
                Length::new(2.0, Unit::Inches),
            )),
            CropPreset::Custom => None,
        }
    }
}

/// Target size for the center crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSettings {
    pub preset: CropPreset,
    /// Used only by `custom`.
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl CropSettings {
    /// Settings for a named preset, with the dimension fields filled in.
    pub fn preset(preset: CropPreset) -> Self {
        match preset.size() {
            Some((width, height)) => Self {
                preset,
                width: width.value,
                height: height.value,
                unit: width.unit,
            },
            None => Self::custom(0.0, 0.0, Unit::Pixels),
        }
    }

    pub fn custom(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            preset: CropPreset::Custom,
            width,
            height,
            unit,
        }
    }

    /// Whole-pixel target at `dpi`, rounded once.
    ///
    /// # Errors
    ///
    /// `BatchError::InvalidCrop` when either side is not a positive number
    /// or rounds to zero pixels.
    pub fn target_pixels(&self, dpi: f64) -> Result<(u32, u32), BatchError> {
        let (width, height) = self.preset.size().unwrap_or((
            Length::new(self.width, self.unit),
            Length::new(self.height, self.unit),
        ));
        if !(width.value.is_finite() && width.value > 0.0)
            || !(height.value.is_finite() && height.value > 0.0)
        {
            return Err(BatchError::InvalidCrop(format!(
                "crop size {}x{} {} must be positive",
                width.value, height.value, width.unit
            )));
        }
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(BatchError::InvalidCrop(format!("DPI {dpi} must be positive")));
        }

        let target = (width.to_pixel_count(dpi), height.to_pixel_count(dpi));
        if target.0 == 0 || target.1 == 0 {
            return Err(BatchError::InvalidCrop(format!(
                "crop size {}x{} {} is smaller than a pixel",
                width.value, height.value, width.unit
            )));
        }
        Ok(target)
    }
}

impl Default for CropSettings {
    fn default() -> Self {
        Self::preset(CropPreset::default())
    }
}

/// What to do to every item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub remove_background: bool,
    /// `None` skips cropping.
    pub crop: Option<CropSettings>,
    /// Resolution used to turn crop sizes into pixels.
    pub dpi: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            remove_background: true,
            crop: Some(CropSettings::default()),
            dpi: DEFAULT_DPI,
        }
    }
}

/// Lifecycle of an item: `pending -> processing -> success | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Error,
}

/// One photo in the batch.
#[derive(Debug, Clone)]
pub struct EditItem {
    id: ItemId,
    name: String,
    source: EncodedImage,
    status: ItemStatus,
    result: Option<PhotoBuffer>,
    error: Option<String>,
}

impl EditItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// File name the photo was added under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &EncodedImage {
        &self.source
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Finished photo; present exactly when the status is `success`.
    pub fn result(&self) -> Option<&PhotoBuffer> {
        self.result.as_ref()
    }

    /// Failure message; present exactly when the status is `error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn mark_processing(&mut self) {
        self.status = ItemStatus::Processing;
        self.result = None;
        self.error = None;
    }

    fn finish(&mut self, outcome: Result<PhotoBuffer, EditError>) {
        match outcome {
            Ok(photo) => {
                self.status = ItemStatus::Success;
                self.result = Some(photo);
                self.error = None;
            }
            Err(err) => {
                self.status = ItemStatus::Error;
                self.result = None;
                self.error = Some(err.to_string());
            }
        }
    }

    fn reset(&mut self) {
        self.status = ItemStatus::Pending;
        self.result = None;
        self.error = None;
    }
}

/// Counts from one processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Items already successful before the run.
    pub skipped: usize,
    /// Items left untouched because the run was stopped.
    pub not_started: usize,
}

/// A print sheet for one successful item.
#[derive(Debug, Clone)]
pub struct PrintExport {
    pub id: ItemId,
    /// `{stem}-print-{paper}.png`
    pub file_name: String,
    pub sheet: Result<EncodedImage, LayoutError>,
}

/// The ordered set of photos in batch mode.
#[derive(Debug, Default)]
pub struct BatchQueue {
    items: Vec<EditItem>,
    next_id: ItemId,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a photo as `pending`.
    pub fn add(&mut self, name: impl Into<String>, source: EncodedImage) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(EditItem {
            id,
            name: name.into(),
            source,
            status: ItemStatus::Pending,
            result: None,
            error: None,
        });
        debug!(id, "Item queued");
        id
    }

    pub fn remove(&mut self, id: ItemId) -> Option<EditItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Put every item back to `pending` so the next run redoes it.
    pub fn reset(&mut self) {
        self.items.iter_mut().for_each(EditItem::reset);
    }

    pub fn items(&self) -> &[EditItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&EditItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Process every item that has not succeeded yet.
    pub async fn process<B: AiBackend>(
        &mut self,
        backend: &B,
        options: &BatchOptions,
    ) -> Result<BatchSummary, BatchError> {
        self.process_with(backend, options, || false, |_| {}).await
    }

    /// Like [`process`](Self::process), but checks `stop` before each item
    /// and leaves the remaining items untouched once it returns `true`.
    pub async fn process_until<B: AiBackend>(
        &mut self,
        backend: &B,
        options: &BatchOptions,
        stop: impl FnMut() -> bool,
    ) -> Result<BatchSummary, BatchError> {
        self.process_with(backend, options, stop, |_| {}).await
    }

    /// Full form of [`process_until`](Self::process_until): `on_update` sees
    /// every item each time its status changes.
    #[instrument(skip_all, fields(items = self.items.len()))]
    pub async fn process_with<B: AiBackend>(
        &mut self,
        backend: &B,
        options: &BatchOptions,
        mut stop: impl FnMut() -> bool,
        mut on_update: impl FnMut(&EditItem),
    ) -> Result<BatchSummary, BatchError> {
        if self.items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        // Validate before any item changes state
        let target = options
            .crop
            .map(|crop| crop.target_pixels(options.dpi))
            .transpose()?;

        let mut summary = BatchSummary::default();
        for index in 0..self.items.len() {
            if self.items[index].status == ItemStatus::Success {
                summary.skipped += 1;
                continue;
            }
            if stop() {
                summary.not_started = self.items[index..]
                    .iter()
                    .filter(|item| item.status != ItemStatus::Success)
                    .count();
                info!(remaining = summary.not_started, "Batch stopped");
                break;
            }

            let item = &mut self.items[index];
            item.mark_processing();
            debug!(id = item.id, name = %item.name, "Processing item");
            on_update(item);

            let outcome =
                process_item(backend, &self.items[index].source, options.remove_background, target)
                    .await;

            let item = &mut self.items[index];
            match &outcome {
                Ok(_) => summary.succeeded += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(id = item.id, name = %item.name, error = %err, "Item failed");
                }
            }
            item.finish(outcome);
            on_update(item);
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch finished"
        );
        Ok(summary)
    }

    /// One print sheet per successful item.
    ///
    /// A photo that does not fit the paper gets an error entry; the others
    /// are still exported.
    pub fn export_prints(&self, spec: &PrintSheetSpec) -> Result<Vec<PrintExport>, BatchError> {
        let exports: Vec<PrintExport> = self
            .items
            .iter()
            .filter_map(|item| item.result.as_ref().map(|photo| (item, photo)))
            .map(|(item, photo)| {
                let sheet = compose_sheet(photo, spec).and_then(|sheet| Ok(encode_png(&sheet)?));
                if let Err(err) = &sheet {
                    warn!(id = item.id, error = %err, "Print sheet skipped");
                }
                PrintExport {
                    id: item.id,
                    file_name: print_file_name(&item.name, spec),
                    sheet,
                }
            })
            .collect();

        if exports.is_empty() {
            return Err(BatchError::NothingToExport);
        }
        Ok(exports)
    }
}

/// Run the fixed per-item sequence.
async fn process_item<B: AiBackend>(
    backend: &B,
    source: &EncodedImage,
    remove_background: bool,
    target: Option<(u32, u32)>,
) -> Result<PhotoBuffer, EditError> {
    let mut photo = decode_image(source)?;

    if remove_background {
        let reply = backend
            .edit(RemoteOperation::RemoveBackground, source)
            .await?;
        photo = decode_image(&reply)?;
    }

    if let Some((width, height)) = target {
        photo = center_crop_to(&photo, width, height, FilterType::Lanczos3)?;
    }

    Ok(photo)
}

fn print_file_name(name: &str, spec: &PrintSheetSpec) -> String {
    // Everything before the first dot: "holiday.photo.jpg" prints as "holiday"
    let stem = Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .and_then(|file| file.split('.').next())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("photo");
    format!("{stem}-print-{}.png", spec.paper)
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;

    use pollster::block_on;

    use super::*;
    use crate::pipeline::remote::RemoteError;
    use crate::print::PaperSize;

    /// Returns its input unchanged, failing for chosen calls.
    #[derive(Default)]
    struct MockBackend {
        calls: Cell<usize>,
        fail_on_call: HashSet<usize>,
        seen: RefCell<Vec<RemoteOperation>>,
    }

    impl MockBackend {
        fn failing_on(calls: &[usize]) -> Self {
            Self {
                fail_on_call: calls.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl AiBackend for MockBackend {
        async fn edit(
            &self,
            operation: RemoteOperation,
            image: &EncodedImage,
        ) -> Result<EncodedImage, RemoteError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            self.seen.borrow_mut().push(operation);
            if self.fail_on_call.contains(&call) {
                return Err(RemoteError::NoImage {
                    operation: operation.to_string(),
                });
            }
            Ok(image.clone())
        }

        async fn generate_background(&self, _prompt: &str) -> Result<EncodedImage, RemoteError> {
            Err(RemoteError::Transport("not used".to_string()))
        }
    }

    fn png(width: u32, height: u32) -> EncodedImage {
        encode_png(&PhotoBuffer::filled(width, height, [90, 60, 30, 255]).unwrap()).unwrap()
    }

    fn queue_of(count: usize) -> BatchQueue {
        let mut queue = BatchQueue::new();
        for i in 0..count {
            queue.add(format!("photo{i}.jpg"), png(40, 30));
        }
        queue
    }

    #[test]
    fn test_preset_targets() {
        assert_eq!(CropSettings::default().target_pixels(300.0).unwrap(), (413, 531));
        assert_eq!(
            CropSettings::preset(CropPreset::Square2In).target_pixels(300.0).unwrap(),
            (600, 600)
        );
        assert_eq!(
            CropSettings::preset(CropPreset::Square1_5In).target_pixels(300.0).unwrap(),
            (450, 450)
        );
    }

    #[test]
    fn test_preset_ignores_stale_custom_fields() {
        let settings = CropSettings {
            width: 1.0,
            ..CropSettings::preset(CropPreset::Passport)
        };
        assert_eq!(settings.target_pixels(300.0).unwrap(), (413, 531));
    }

    #[test]
    fn test_custom_target_validation() {
        assert_eq!(
            CropSettings::custom(4.0, 5.0, Unit::Centimeters).target_pixels(300.0).unwrap(),
            (472, 591)
        );
        for (w, h) in [(0.0, 5.0), (-1.0, 5.0), (f64::NAN, 1.0), (0.001, 1.0)] {
            assert!(matches!(
                CropSettings::custom(w, h, Unit::Millimeters).target_pixels(300.0),
                Err(BatchError::InvalidCrop(_))
            ));
        }
    }

    #[test]
    fn test_crop_settings_json() {
        let settings: CropSettings =
            serde_json::from_str(r#"{"preset":"custom","width":2,"height":3,"unit":"in"}"#).unwrap();
        assert_eq!(settings.target_pixels(300.0).unwrap(), (600, 900));
    }

    #[test]
    fn test_add_remove_and_ids() {
        let mut queue = BatchQueue::new();
        let a = queue.add("a.png", png(2, 2));
        let b = queue.add("b.png", png(2, 2));
        assert_ne!(a, b);
        assert_eq!(queue.get(a).unwrap().status(), ItemStatus::Pending);
        assert_eq!(queue.remove(a).unwrap().name(), "a.png");
        assert!(queue.remove(a).is_none());
        assert_eq!(queue.len(), 1);
        // Ids are never reused
        let c = queue.add("c.png", png(2, 2));
        assert_ne!(c, a);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut queue = BatchQueue::new();
        let result = block_on(queue.process(&MockBackend::default(), &BatchOptions::default()));
        assert!(matches!(result, Err(BatchError::EmptyBatch)));
    }

    #[test]
    fn test_invalid_crop_rejected_before_any_item_changes() {
        let mut queue = queue_of(2);
        let options = BatchOptions {
            crop: Some(CropSettings::custom(0.0, 10.0, Unit::Pixels)),
            ..Default::default()
        };
        let backend = MockBackend::default();
        let result = block_on(queue.process(&backend, &options));
        assert!(matches!(result, Err(BatchError::InvalidCrop(_))));
        assert_eq!(backend.calls.get(), 0);
        assert!(queue.items().iter().all(|i| i.status() == ItemStatus::Pending));
    }

    #[test]
    fn test_end_to_end_passport_crop() {
        let mut queue = BatchQueue::new();
        let id = queue.add("portrait.png", png(1000, 1000));
        let backend = MockBackend::default();

        let summary = block_on(queue.process(&backend, &BatchOptions::default())).unwrap();

        assert_eq!(summary.succeeded, 1);
        let item = queue.get(id).unwrap();
        assert_eq!(item.status(), ItemStatus::Success);
        assert!(item.error().is_none());
        let result = item.result().unwrap();
        assert_eq!((result.width, result.height), (413, 531));
        assert_eq!(*backend.seen.borrow(), vec![RemoteOperation::RemoveBackground]);
    }

    #[test]
    fn test_failure_is_isolated_to_one_item() {
        let mut queue = queue_of(5);
        let backend = MockBackend::failing_on(&[2]);

        let summary = block_on(queue.process(&backend, &BatchOptions::default())).unwrap();

        assert_eq!((summary.succeeded, summary.failed), (4, 1));
        let statuses: Vec<_> = queue.items().iter().map(EditItem::status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Success,
                ItemStatus::Error,
                ItemStatus::Success,
                ItemStatus::Success,
                ItemStatus::Success,
            ]
        );
        let failed = &queue.items()[1];
        assert_eq!(failed.error(), Some("remove-background returned no image"));
        assert!(failed.result().is_none());
    }

    #[test]
    fn test_rerun_skips_successful_items() {
        let mut queue = queue_of(3);
        let first = MockBackend::failing_on(&[3]);
        block_on(queue.process(&first, &BatchOptions::default())).unwrap();
        let before: Vec<_> = queue.items()[..2]
            .iter()
            .map(|i| i.result().cloned())
            .collect();

        let second = MockBackend::default();
        let summary = block_on(queue.process(&second, &BatchOptions::default())).unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(second.calls.get(), 1);
        let after: Vec<_> = queue.items()[..2]
            .iter()
            .map(|i| i.result().cloned())
            .collect();
        assert_eq!(before, after);
        assert!(queue.items().iter().all(|i| i.status() == ItemStatus::Success));
    }

    #[test]
    fn test_reset_reprocesses_everything() {
        let mut queue = queue_of(2);
        block_on(queue.process(&MockBackend::default(), &BatchOptions::default())).unwrap();
        queue.reset();
        assert!(queue.items().iter().all(|i| i.status() == ItemStatus::Pending && i.result().is_none()));

        let backend = MockBackend::default();
        block_on(queue.process(&backend, &BatchOptions::default())).unwrap();
        assert_eq!(backend.calls.get(), 2);
    }

    #[test]
    fn test_undecodable_source_fails_before_remote_call() {
        let mut queue = BatchQueue::new();
        // Valid PNG signature, garbage body
        let broken = EncodedImage::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3]).unwrap();
        queue.add("broken.png", broken);
        let backend = MockBackend::default();

        let summary = block_on(queue.process(&backend, &BatchOptions::default())).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(backend.calls.get(), 0);
        assert_eq!(queue.items()[0].status(), ItemStatus::Error);
    }

    #[test]
    fn test_no_background_no_crop_keeps_source() {
        let mut queue = queue_of(1);
        let options = BatchOptions {
            remove_background: false,
            crop: None,
            ..Default::default()
        };
        let backend = MockBackend::default();
        block_on(queue.process(&backend, &options)).unwrap();
        let result = queue.items()[0].result().unwrap();
        assert_eq!((result.width, result.height), (40, 30));
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn test_stop_leaves_remaining_items_pending() {
        let mut queue = queue_of(4);
        let mut checks = 0;
        let summary = block_on(queue.process_until(
            &MockBackend::default(),
            &BatchOptions::default(),
            || {
                checks += 1;
                checks > 2
            },
        ))
        .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.not_started, 2);
        let statuses: Vec<_> = queue.items().iter().map(EditItem::status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Success,
                ItemStatus::Success,
                ItemStatus::Pending,
                ItemStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_observer_sees_each_transition() {
        let mut queue = queue_of(2);
        let mut seen = Vec::new();
        block_on(queue.process_with(
            &MockBackend::failing_on(&[1]),
            &BatchOptions::default(),
            || false,
            |item| seen.push((item.id(), item.status())),
        ))
        .unwrap();
        assert_eq!(
            seen,
            vec![
                (0, ItemStatus::Processing),
                (0, ItemStatus::Error),
                (1, ItemStatus::Processing),
                (1, ItemStatus::Success),
            ]
        );
    }

    #[test]
    fn test_export_names_and_sheets() {
        let mut queue = BatchQueue::new();
        queue.add("holiday.photo.jpg", png(1000, 1000));
        queue.add("second.png", png(1000, 1000));
        block_on(queue.process(&MockBackend::failing_on(&[2]), &BatchOptions::default())).unwrap();

        let spec = PrintSheetSpec::batch(PaperSize::FiveBySeven);
        let exports = queue.export_prints(&spec).unwrap();

        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].file_name, "holiday-print-5x7.png");
        let sheet = exports[0].sheet.as_ref().unwrap();
        let decoded = decode_image(sheet).unwrap();
        assert_eq!((decoded.width, decoded.height), (2100, 1500));
    }

    #[test]
    fn test_export_without_successes() {
        let queue = queue_of(2);
        assert!(matches!(
            queue.export_prints(&PrintSheetSpec::default()),
            Err(BatchError::NothingToExport)
        ));
    }

    #[test]
    fn test_export_reports_unfit_photo_per_item() {
        let mut queue = BatchQueue::new();
        queue.add("huge.png", png(3000, 100));
        queue.add("small.png", png(100, 100));
        let options = BatchOptions {
            remove_background: false,
            crop: None,
            ..Default::default()
        };
        block_on(queue.process(&MockBackend::default(), &options)).unwrap();

        let exports = queue.export_prints(&PrintSheetSpec::default()).unwrap();
        assert!(matches!(exports[0].sheet, Err(LayoutError::DoesNotFit { .. })));
        assert!(exports[1].sheet.is_ok());
    }

    #[test]
    fn test_print_file_name_fallback() {
        let spec = PrintSheetSpec::default();
        assert_eq!(print_file_name("", &spec), "photo-print-4x6.png");
        assert_eq!(print_file_name("scan", &spec), "scan-print-4x6.png");
        assert_eq!(print_file_name("trip.2024.final.png", &spec), "trip-print-4x6.png");
        assert_eq!(print_file_name(".hidden", &spec), "photo-print-4x6.png");
    }
}
