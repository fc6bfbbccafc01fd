//! Print sheet WASM bindings.
//!
//! ```typescript
//! const config = new JsEditorConfig();
//! const [cols, rows] = print_grid(photo.width, photo.height, config, '4x6', true);
//! const png = compose_print_sheet(photo, config, '4x6', true);
//! ```

use crate::config::JsEditorConfig;
use crate::types::{to_js_error, JsPhotoBuffer};
use photoprint_core::encode::encode_png;
use photoprint_core::print::{compose_sheet, plan_grid, PrintSheetSpec};
use wasm_bindgen::prelude::*;

/// Tile a photo across a sheet of paper and return the sheet as PNG bytes.
///
/// # Arguments
///
/// * `paper` - `4x6` or `5x7`
/// * `batch` - batch sheet settings when true, single-image otherwise
/// * `background` - optional fill override, `transparent` or a CSS color
///
/// # Errors
///
/// Returns an error if the framed photo does not fit the paper.
#[wasm_bindgen]
pub fn compose_print_sheet(
    image: &JsPhotoBuffer,
    config: &JsEditorConfig,
    paper: &str,
    batch: bool,
    background: Option<String>,
) -> Result<Vec<u8>, JsValue> {
    let spec = config
        .sheet(paper, batch, background.as_deref())
        .map_err(to_js_error)?;
    sheet_png(image, &spec).map_err(to_js_error)
}

/// How many copies of a `width` x `height` photo fit on the paper, as
/// `[cols, rows]`.
#[wasm_bindgen]
pub fn print_grid(
    width: u32,
    height: u32,
    config: &JsEditorConfig,
    paper: &str,
    batch: bool,
) -> Result<Vec<u32>, JsValue> {
    let spec = config.sheet(paper, batch, None).map_err(to_js_error)?;
    grid_size(width, height, &spec).map_err(to_js_error)
}

/// Paper size in pixels at `dpi`, as `[width, height]`.
#[wasm_bindgen]
pub fn paper_pixels(paper: &str, dpi: f64) -> Result<Vec<u32>, JsValue> {
    let (w, h) = crate::types::parse_paper(paper)
        .map_err(to_js_error)?
        .pixels(dpi);
    Ok(vec![w, h])
}

fn sheet_png(image: &JsPhotoBuffer, spec: &PrintSheetSpec) -> Result<Vec<u8>, String> {
    let sheet = compose_sheet(&image.to_buffer(), spec).map_err(|e| e.to_string())?;
    encode_png(&sheet)
        .map(|png| png.into_bytes())
        .map_err(|e| e.to_string())
}

fn grid_size(width: u32, height: u32, spec: &PrintSheetSpec) -> Result<Vec<u32>, String> {
    let frame = spec.border_pixels().saturating_mul(2);
    let (paper_width, paper_height) = spec.paper_pixels();
    let grid = plan_grid(
        width.saturating_add(frame),
        height.saturating_add(frame),
        paper_width,
        paper_height,
        spec.margin_pixels(),
    )
    .map_err(|e| e.to_string())?;
    Ok(vec![grid.cols, grid.rows])
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoprint_core::print::PaperSize;
    use photoprint_core::PhotoBuffer;

    #[test]
    fn test_passport_grid_on_4x6() {
        let spec = PrintSheetSpec::batch(PaperSize::FourBySix);
        assert_eq!(grid_size(413, 531, &spec).unwrap(), vec![4, 2]);
    }

    #[test]
    fn test_oversized_photo_does_not_fit() {
        let spec = PrintSheetSpec::batch(PaperSize::FourBySix);
        assert!(grid_size(945, 1215, &spec).is_err());
    }

    #[test]
    fn test_sheet_png_is_paper_sized() {
        let photo = JsPhotoBuffer::from_buffer(PhotoBuffer::filled(300, 300, [0, 0, 255, 255]).unwrap());
        let png = sheet_png(&photo, &PrintSheetSpec::single(PaperSize::FourBySix)).unwrap();
        let sheet = photoprint_core::decode::decode_bytes(&png).unwrap();
        assert_eq!((sheet.width, sheet.height), (1800, 1200));
    }

    #[test]
    fn test_paper_pixels() {
        assert_eq!(paper_pixels("5x7", 300.0).unwrap(), vec![2100, 1500]);
    }
}
