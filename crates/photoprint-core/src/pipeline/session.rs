//! Single-image mode.
//!
//! An [`EditSession`] owns three images:
//!
//! - the *original*, as uploaded
//! - the *base*, which remote edits and crops replace
//! - the *current* image, the base rendered through the [`EditingState`]
//!   recipe (rotate and flip, color grade, background underlay)
//!
//! Every operation is one-shot. It either commits a new base and state
//! together or fails and leaves everything as it was. The only undo is
//! [`EditSession::reset`], back to the original upload.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::remote::{AiBackend, RemoteOperation};
use super::EditError;
use crate::adjustments::apply_to_buffer;
use crate::decode::{decode_image, EncodedImage, FilterType, PhotoBuffer};
use crate::encode::encode_png;
use crate::print::{composite_over, compose_sheet, Background, Color, PaperSize, PrintSheetSpec};
use crate::transform::{
    apply_rotate_flip, center_crop_to, crop_with_straighten, AspectPreset, CropRequest,
    InterpolationFilter, TransformError,
};
use crate::units::Length;
use crate::ColorAdjustments;

/// What shows through where the background was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundFill {
    #[default]
    Transparent,
    Solid(Color),
    /// The image from the last background generation.
    Generated,
}

/// The edit recipe applied on top of the base image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingState {
    pub background_removed: bool,
    pub background: BackgroundFill,
    pub background_prompt: String,
    pub face_enhanced: bool,
    pub upscaled: bool,
    pub color_corrected: bool,
    pub blemishes_removed: bool,
    /// Degrees clockwise, in [0, 360).
    pub rotation: f64,
    pub flip: bool,
    pub adjustments: ColorAdjustments,
    /// Straighten angle of the last crop.
    pub crop_rotation: f64,
}

impl EditingState {
    fn record(&mut self, operation: RemoteOperation) {
        match operation {
            RemoteOperation::RemoveBackground => {
                self.background_removed = true;
                self.background = BackgroundFill::Transparent;
            }
            RemoteOperation::EnhanceFace => self.face_enhanced = true,
            RemoteOperation::Upscale => self.upscaled = true,
            RemoteOperation::CorrectColor => self.color_corrected = true,
            RemoteOperation::RemoveBlemishes => self.blemishes_removed = true,
        }
    }
}

/// One photo being edited.
#[derive(Debug, Clone)]
pub struct EditSession {
    original: PhotoBuffer,
    base: PhotoBuffer,
    generated_background: Option<PhotoBuffer>,
    state: EditingState,
    current: PhotoBuffer,
}

impl EditSession {
    /// Start a session from an uploaded image.
    pub fn open(upload: &EncodedImage) -> Result<Self, EditError> {
        let original = decode_image(upload)?;
        debug!(width = original.width, height = original.height, "Session opened");
        Ok(Self {
            base: original.clone(),
            current: original.clone(),
            original,
            generated_background: None,
            state: EditingState::default(),
        })
    }

    pub fn open_data_uri(uri: &str) -> Result<Self, EditError> {
        Self::open(&EncodedImage::from_data_uri(uri)?)
    }

    pub fn original(&self) -> &PhotoBuffer {
        &self.original
    }

    pub fn base(&self) -> &PhotoBuffer {
        &self.base
    }

    /// The rendered preview.
    pub fn current(&self) -> &PhotoBuffer {
        &self.current
    }

    pub fn state(&self) -> &EditingState {
        &self.state
    }

    // -- Remote edits ---------------------------------------------------------

    /// Send the base image through a remote edit and adopt the reply.
    #[instrument(skip(self, backend))]
    pub async fn apply_remote<B: AiBackend>(
        &mut self,
        backend: &B,
        operation: RemoteOperation,
    ) -> Result<(), EditError> {
        let request = encode_png(&self.base)?;
        let reply = backend.edit(operation, &request).await?;
        let edited = decode_image(&reply)?;

        if !operation.changes_dimensions()
            && (edited.width, edited.height) != (self.base.width, self.base.height)
        {
            warn!(
                width = edited.width,
                height = edited.height,
                "Remote edit changed the image size"
            );
        }

        let mut state = self.state.clone();
        state.record(operation);
        self.commit(edited, self.generated_background.clone(), state)
    }

    pub async fn remove_background<B: AiBackend>(&mut self, backend: &B) -> Result<(), EditError> {
        self.apply_remote(backend, RemoteOperation::RemoveBackground).await
    }

    pub async fn enhance_face<B: AiBackend>(&mut self, backend: &B) -> Result<(), EditError> {
        self.apply_remote(backend, RemoteOperation::EnhanceFace).await
    }

    pub async fn upscale<B: AiBackend>(&mut self, backend: &B) -> Result<(), EditError> {
        self.apply_remote(backend, RemoteOperation::Upscale).await
    }

    pub async fn correct_color<B: AiBackend>(&mut self, backend: &B) -> Result<(), EditError> {
        self.apply_remote(backend, RemoteOperation::CorrectColor).await
    }

    pub async fn remove_blemishes<B: AiBackend>(&mut self, backend: &B) -> Result<(), EditError> {
        self.apply_remote(backend, RemoteOperation::RemoveBlemishes).await
    }

    /// Generate a backdrop from a prompt and show it behind the subject.
    #[instrument(skip(self, backend))]
    pub async fn generate_background<B: AiBackend>(
        &mut self,
        backend: &B,
        prompt: &str,
    ) -> Result<(), EditError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(EditError::InvalidInput("background prompt is empty".to_string()));
        }
        let reply = backend.generate_background(prompt).await?;
        let backdrop = decode_image(&reply)?;

        let mut state = self.state.clone();
        state.background_removed = true;
        state.background = BackgroundFill::Generated;
        state.background_prompt = prompt.to_string();
        self.commit(self.base.clone(), Some(backdrop), state)
    }

    // -- Local edits ----------------------------------------------------------

    /// Turn by `degrees` (clockwise positive) on top of the current rotation.
    pub fn rotate_by(&mut self, degrees: f64) -> Result<(), EditError> {
        self.set_rotation(self.state.rotation + degrees)
    }

    pub fn set_rotation(&mut self, degrees: f64) -> Result<(), EditError> {
        if !degrees.is_finite() {
            return Err(EditError::InvalidInput(format!("rotation {degrees} is not a number")));
        }
        let mut state = self.state.clone();
        state.rotation = degrees.rem_euclid(360.0);
        self.commit_state(state)
    }

    pub fn toggle_flip(&mut self) -> Result<(), EditError> {
        let mut state = self.state.clone();
        state.flip = !state.flip;
        self.commit_state(state)
    }

    pub fn set_adjustments(&mut self, adjustments: ColorAdjustments) -> Result<(), EditError> {
        let mut state = self.state.clone();
        state.adjustments = adjustments.clamped();
        self.commit_state(state)
    }

    /// Choose what shows through transparent pixels. Picking a fill marks the
    /// background as removed, so a pre-cut upload gets the underlay too.
    pub fn set_background(&mut self, background: Background) -> Result<(), EditError> {
        let mut state = self.state.clone();
        state.background_removed = true;
        state.background = match background {
            Background::Transparent => BackgroundFill::Transparent,
            Background::Solid(color) => BackgroundFill::Solid(color),
        };
        self.commit_state(state)
    }

    /// Freeform crop of the base image, optionally straightened.
    pub fn crop(&mut self, request: &CropRequest) -> Result<(), EditError> {
        let outcome = crop_with_straighten(&self.base, request)?;
        let mut state = self.state.clone();
        state.crop_rotation = outcome.rotation;
        self.commit(outcome.image, self.generated_background.clone(), state)
    }

    /// Largest centered crop of the given aspect.
    pub fn crop_to_aspect(&mut self, preset: AspectPreset) -> Result<(), EditError> {
        let rect = preset.centered_rect(self.base.width, self.base.height);
        self.crop(&CropRequest::new(rect))
    }

    /// Center-crop and scale the base to a physical size.
    pub fn resize_to(&mut self, width: Length, height: Length, dpi: f64) -> Result<(), EditError> {
        let target = (width.to_pixel_count(dpi), height.to_pixel_count(dpi));
        if target.0 == 0 || target.1 == 0 {
            return Err(EditError::InvalidInput(format!(
                "size {}{} x {}{} is smaller than a pixel",
                width.value, width.unit, height.value, height.unit
            )));
        }
        let resized = center_crop_to(&self.base, target.0, target.1, FilterType::Lanczos3)?;
        self.commit(resized, self.generated_background.clone(), self.state.clone())
    }

    /// Back to the uploaded image and an empty recipe.
    pub fn reset(&mut self) {
        self.base = self.original.clone();
        self.current = self.original.clone();
        self.generated_background = None;
        self.state = EditingState::default();
    }

    // -- Output ---------------------------------------------------------------

    /// Render the base through the recipe.
    pub fn render(&self, filter: InterpolationFilter) -> Result<PhotoBuffer, EditError> {
        render(
            &self.base,
            self.generated_background.as_ref(),
            &self.state,
            filter,
        )
    }

    /// Full-quality PNG of the edited photo.
    pub fn export_png(&self) -> Result<EncodedImage, EditError> {
        Ok(encode_png(&self.render(InterpolationFilter::Lanczos3)?)?)
    }

    /// Tile the edited photo on a sheet with the single-image print settings.
    pub fn print_sheet(&self, paper: PaperSize) -> Result<EncodedImage, EditError> {
        self.print_sheet_with(&PrintSheetSpec::single(paper))
    }

    pub fn print_sheet_with(&self, spec: &PrintSheetSpec) -> Result<EncodedImage, EditError> {
        let photo = self.render(InterpolationFilter::Lanczos3)?;
        let sheet = compose_sheet(&photo, spec)?;
        Ok(encode_png(&sheet)?)
    }

    fn commit_state(&mut self, state: EditingState) -> Result<(), EditError> {
        self.commit(self.base.clone(), self.generated_background.clone(), state)
    }

    /// Render first; only a successful render replaces anything.
    fn commit(
        &mut self,
        base: PhotoBuffer,
        generated_background: Option<PhotoBuffer>,
        state: EditingState,
    ) -> Result<(), EditError> {
        let current = render(
            &base,
            generated_background.as_ref(),
            &state,
            InterpolationFilter::Bilinear,
        )?;
        self.base = base;
        self.generated_background = generated_background;
        self.state = state;
        self.current = current;
        Ok(())
    }
}

/// Rotate and flip, color grade, then draw over the background fill.
fn render(
    base: &PhotoBuffer,
    backdrop: Option<&PhotoBuffer>,
    state: &EditingState,
    filter: InterpolationFilter,
) -> Result<PhotoBuffer, EditError> {
    let turned = apply_rotate_flip(base, state.rotation, state.flip, filter)?;
    let graded = apply_to_buffer(turned, &state.adjustments);

    if !state.background_removed {
        return Ok(graded);
    }

    let (width, height) = (graded.width, graded.height);
    let mut canvas = match (state.background, backdrop) {
        (BackgroundFill::Solid(color), _) => PhotoBuffer::filled(width, height, color.to_array())
            .ok_or(TransformError::CanvasUnavailable { width, height })?,
        (BackgroundFill::Generated, Some(backdrop)) => {
            center_crop_to(backdrop, width, height, FilterType::Bilinear)?
        }
        _ => return Ok(graded),
    };
    composite_over(&mut canvas, &graded, 0, 0);
    Ok(canvas)
}
