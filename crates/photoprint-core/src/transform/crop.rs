//! Cropping: plain rectangles, center-crop-to-target and straightened crops.
//!
//! # Coordinate System
//!
//! - Crop rectangles are in pixels of the frame they cut from
//! - Fractional rectangles are rounded once, when the output is allocated
//! - Origin is top-left corner
//! - Pixels of a rectangle that fall outside the frame come out transparent

use image::imageops;
use serde::{Deserialize, Serialize};

use super::rotation::{apply_rotate_flip, InterpolationFilter};
use super::TransformError;
use crate::decode::{resize, FilterType, PhotoBuffer};

/// A crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width` x `height` frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// Rounded origin and size, or `None` when the rounded area is empty.
    fn to_pixels(self) -> Option<(i64, i64, u32, u32)> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let width = self.width.round();
        let height = self.height.round();
        if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
            return None;
        }
        Some((
            self.x.round() as i64,
            self.y.round() as i64,
            width as u32,
            height as u32,
        ))
    }
}

/// Freeform crop, optionally straightened and resized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Rectangle in the frame of the rotated (bounding-box expanded) image.
    pub rect: CropRect,
    /// Straighten angle in degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    /// Exact output size; `None` keeps the rectangle's own size.
    #[serde(default)]
    pub output: Option<(u32, u32)>,
    #[serde(default)]
    pub filter: FilterType,
}

impl CropRequest {
    pub fn new(rect: CropRect) -> Self {
        Self {
            rect,
            rotation: 0.0,
            output: None,
            filter: FilterType::default(),
        }
    }
}

/// Result of [`crop_with_straighten`]: the pixels and the angle they were cut at.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutcome {
    pub image: PhotoBuffer,
    pub rotation: f64,
}

/// Aspect-ratio presets offered by the single-image crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectPreset {
    #[default]
    #[serde(rename = "freeform")]
    Freeform,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Story,
    #[serde(rename = "4:1")]
    Banner,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectPreset {
    pub const ALL: [AspectPreset; 5] = [
        AspectPreset::Freeform,
        AspectPreset::Square,
        AspectPreset::Story,
        AspectPreset::Banner,
        AspectPreset::Widescreen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectPreset::Freeform => "freeform",
            AspectPreset::Square => "1:1",
            AspectPreset::Story => "9:16",
            AspectPreset::Banner => "4:1",
            AspectPreset::Widescreen => "16:9",
        }
    }

    /// Width over height, `None` for freeform.
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Freeform => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::Story => Some(9.0 / 16.0),
            AspectPreset::Banner => Some(4.0),
            AspectPreset::Widescreen => Some(16.0 / 9.0),
        }
    }

    /// Largest rectangle of this aspect centered in a `width` x `height` frame.
    pub fn centered_rect(self, width: u32, height: u32) -> CropRect {
        let Some(ratio) = self.ratio() else {
            return CropRect::full(width, height);
        };
        let (w, h) = (width as f64, height as f64);
        let (crop_w, crop_h) = if w / h > ratio {
            (h * ratio, h)
        } else {
            (w, w / ratio)
        };
        CropRect::new((w - crop_w) / 2.0, (h - crop_h) / 2.0, crop_w, crop_h)
    }
}

/// Extract a rectangle of pixels.
///
/// Parts of the rectangle outside the image are transparent.
///
/// # Errors
///
/// `EmptyCrop` when the rounded rectangle has no area, `CanvasUnavailable`
/// when it is too large to allocate.
pub fn crop_region(image: &PhotoBuffer, rect: CropRect) -> Result<PhotoBuffer, TransformError> {
    let (left, top, out_width, out_height) = rect.to_pixels().ok_or(TransformError::EmptyCrop {
        width: rect.width,
        height: rect.height,
    })?;

    // Fast path: the whole image
    if left == 0 && top == 0 && out_width == image.width && out_height == image.height {
        return Ok(image.clone());
    }

    let mut output =
        PhotoBuffer::blank(out_width, out_height).ok_or(TransformError::CanvasUnavailable {
            width: out_width,
            height: out_height,
        })?;

    // Intersection with the source, in source coordinates
    let src_x0 = left.max(0);
    let src_y0 = top.max(0);
    // Origins far off the canvas saturate rather than overflow
    let src_x1 = left.saturating_add(out_width as i64).min(image.width as i64);
    let src_y1 = top.saturating_add(out_height as i64).min(image.height as i64);
    if src_x0 >= src_x1 || src_y0 >= src_y1 {
        return Ok(output);
    }

    let row_bytes = ((src_x1 - src_x0) * 4) as usize;
    for src_y in src_y0..src_y1 {
        let src_start = ((src_y as usize * image.width as usize) + src_x0 as usize) * 4;
        let dst_y = (src_y - top) as usize;
        let dst_x = (src_x0 - left) as usize;
        let dst_start = (dst_y * out_width as usize + dst_x) * 4;
        output.pixels[dst_start..dst_start + row_bytes]
            .copy_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    Ok(output)
}

/// Crop to the target aspect ratio about the center, then scale to exactly
/// `target_width` x `target_height`.
///
/// The relatively longer source dimension is trimmed symmetrically. The
/// final resize absorbs any rounding difference between the trimmed region
/// and the target aspect, so the output size always matches the request.
///
/// # Example
///
/// ```
/// use photoprint_core::decode::{FilterType, PhotoBuffer};
/// use photoprint_core::transform::center_crop_to;
///
/// let wide = PhotoBuffer::filled(400, 200, [0, 0, 0, 255]).unwrap();
/// let square = center_crop_to(&wide, 100, 100, FilterType::Bilinear).unwrap();
/// assert_eq!((square.width, square.height), (100, 100));
/// ```
pub fn center_crop_to(
    image: &PhotoBuffer,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<PhotoBuffer, TransformError> {
    if target_width == 0 || target_height == 0 {
        return Err(TransformError::ZeroTarget {
            width: target_width,
            height: target_height,
        });
    }
    if image.is_empty() {
        return Err(TransformError::EmptyCrop {
            width: image.width as f64,
            height: image.height as f64,
        });
    }

    let (crop_x, crop_y, crop_w, crop_h) =
        centered_crop_box(image.width, image.height, target_width, target_height);

    let cropped = if crop_w == image.width && crop_h == image.height {
        image.clone()
    } else {
        let rgba = image.to_rgba_image().ok_or(TransformError::CanvasUnavailable {
            width: image.width,
            height: image.height,
        })?;
        let region = imageops::crop_imm(&rgba, crop_x, crop_y, crop_w, crop_h).to_image();
        PhotoBuffer::from_rgba_image(region)
    };

    resize(&cropped, target_width, target_height, filter).ok_or(
        TransformError::CanvasUnavailable {
            width: target_width,
            height: target_height,
        },
    )
}

/// Integer crop box `(x, y, w, h)` of the target aspect, centered in the source.
fn centered_crop_box(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
    let source_aspect = src_w as f64 / src_h as f64;
    let target_aspect = target_w as f64 / target_h as f64;

    if source_aspect > target_aspect {
        // Source is relatively wider: trim the sides
        let crop_w = ((src_h as f64 * target_aspect).round() as u32).clamp(1, src_w);
        ((src_w - crop_w) / 2, 0, crop_w, src_h)
    } else {
        // Source is relatively taller (or equal): trim top and bottom
        let crop_h = ((src_w as f64 / target_aspect).round() as u32).clamp(1, src_h);
        (0, (src_h - crop_h) / 2, src_w, crop_h)
    }
}

/// Straighten, cut out a rectangle, and optionally resize.
///
/// The source is rotated about its center onto an expanded canvas (see
/// [`apply_rotate_flip`]) and `request.rect` is read in that canvas's
/// coordinates. With a zero angle this is the source frame itself.
pub fn crop_with_straighten(
    image: &PhotoBuffer,
    request: &CropRequest,
) -> Result<CropOutcome, TransformError> {
    if let Some((w, h)) = request.output {
        if w == 0 || h == 0 {
            return Err(TransformError::ZeroTarget {
                width: w,
                height: h,
            });
        }
    }
    // Reject an empty rectangle before paying for the rotation
    if request.rect.to_pixels().is_none() {
        return Err(TransformError::EmptyCrop {
            width: request.rect.width,
            height: request.rect.height,
        });
    }

    let interpolation = match request.filter {
        FilterType::Lanczos3 => InterpolationFilter::Lanczos3,
        FilterType::Nearest | FilterType::Bilinear => InterpolationFilter::Bilinear,
    };
    let rotated = apply_rotate_flip(image, request.rotation, false, interpolation)?;
    let cropped = crop_region(&rotated, request.rect)?;

    let image = match request.output {
        Some((w, h)) => resize(&cropped, w, h, request.filter)
            .ok_or(TransformError::CanvasUnavailable { width: w, height: h })?,
        None => cropped,
    };

    Ok(CropOutcome {
        image,
        rotation: request.rotation,
    })
}
