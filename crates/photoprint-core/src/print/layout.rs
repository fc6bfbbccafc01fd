//! Stamp building and grid tiling.
//!
//! A *stamp* is one photo with its fill and frame. Stamps are repeated over
//! the paper in a grid with a cutting margin between neighbors (none after
//! the last row or column), and the grid is centered on the sheet.

use tracing::{debug, instrument, warn};

use super::color::{blend_over, composite_over, Color};
use super::{LayoutError, PrintSheetSpec};
use crate::decode::{EncodedImage, PhotoBuffer};
use crate::encode::encode_png;

/// Where the stamps go on a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    /// Stamp size plus cutting margin.
    pub cell_width: u32,
    pub cell_height: u32,
    /// Occupied area, without the trailing margin.
    pub total_width: u32,
    pub total_height: u32,
    /// `(paper - total) / 2`; may be fractional.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl GridLayout {
    /// Top-left pixel of the stamp at `(row, col)`.
    pub fn cell_origin(&self, row: u32, col: u32) -> (i64, i64) {
        (
            self.offset_x.floor() as i64 + col as i64 * self.cell_width as i64,
            self.offset_y.floor() as i64 + row as i64 * self.cell_height as i64,
        )
    }

    /// Every cell origin, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| self.cell_origin(row, col)))
    }

    pub fn count(&self) -> u32 {
        self.cols * self.rows
    }
}

/// Fit as many stamps as possible on the paper.
///
/// # Errors
///
/// `LayoutError::DoesNotFit` when not even one column or row fits.
pub fn plan_grid(
    stamp_width: u32,
    stamp_height: u32,
    paper_width: u32,
    paper_height: u32,
    margin: u32,
) -> Result<GridLayout, LayoutError> {
    let cell_width = stamp_width.saturating_add(margin);
    let cell_height = stamp_height.saturating_add(margin);

    let cols = if cell_width == 0 { 0 } else { paper_width / cell_width };
    let rows = if cell_height == 0 { 0 } else { paper_height / cell_height };
    if cols == 0 || rows == 0 {
        return Err(LayoutError::DoesNotFit {
            stamp_width,
            stamp_height,
            paper_width,
            paper_height,
        });
    }

    let total_width = cols * cell_width - margin;
    let total_height = rows * cell_height - margin;

    Ok(GridLayout {
        cols,
        rows,
        cell_width,
        cell_height,
        total_width,
        total_height,
        offset_x: (paper_width as f64 - total_width as f64) / 2.0,
        offset_y: (paper_height as f64 - total_height as f64) / 2.0,
    })
}

/// Frame one photo: fill, photo at `(border, border)`, then the border band.
pub fn build_stamp(photo: &PhotoBuffer, spec: &PrintSheetSpec) -> Result<PhotoBuffer, LayoutError> {
    if photo.is_empty() {
        return Err(LayoutError::EmptyPhoto);
    }

    let border = spec.border_pixels();
    let width = photo.width.saturating_add(border.saturating_mul(2));
    let height = photo.height.saturating_add(border.saturating_mul(2));

    let mut stamp = match spec.background.color() {
        Some(fill) => PhotoBuffer::filled(width, height, fill.to_array()),
        None => PhotoBuffer::blank(width, height),
    }
    .ok_or(LayoutError::CanvasUnavailable { width, height })?;

    composite_over(&mut stamp, photo, border as i64, border as i64);
    if border > 0 {
        stroke_frame(&mut stamp, border, spec.border_color);
    }
    Ok(stamp)
}

/// Blend `color` over the outermost `width` pixels on every side.
fn stroke_frame(image: &mut PhotoBuffer, width: u32, color: Color) {
    let rgba = color.to_array();
    let (w, h) = (image.width, image.height);
    for y in 0..h {
        let edge_row = y < width || y >= h.saturating_sub(width);
        for x in 0..w {
            if edge_row || x < width || x >= w.saturating_sub(width) {
                let idx = (y as usize * w as usize + x as usize) * 4;
                blend_over(&mut image.pixels[idx..idx + 4], rgba);
            }
        }
    }
}

/// Tile one photo over a full sheet of white paper.
#[instrument(skip_all, fields(paper = %spec.paper, width = photo.width, height = photo.height))]
pub fn compose_sheet(photo: &PhotoBuffer, spec: &PrintSheetSpec) -> Result<PhotoBuffer, LayoutError> {
    let stamp = build_stamp(photo, spec)?;
    let (paper_width, paper_height) = spec.paper_pixels();
    let grid = plan_grid(
        stamp.width,
        stamp.height,
        paper_width,
        paper_height,
        spec.margin_pixels(),
    )?;
    debug!(cols = grid.cols, rows = grid.rows, "Planned print grid");

    let mut sheet = PhotoBuffer::filled(paper_width, paper_height, Color::WHITE.to_array()).ok_or(
        LayoutError::CanvasUnavailable {
            width: paper_width,
            height: paper_height,
        },
    )?;

    for (x, y) in grid.cells() {
        composite_over(&mut sheet, &stamp, x, y);
    }

    Ok(sheet)
}

/// One sheet per photo. A photo that fails does not stop the rest.
pub fn layout_prints(
    photos: &[PhotoBuffer],
    spec: &PrintSheetSpec,
) -> Vec<Result<PhotoBuffer, LayoutError>> {
    let sheet = |(index, photo): (usize, &PhotoBuffer)| {
        let result = compose_sheet(photo, spec);
        if let Err(err) = &result {
            warn!(index, error = %err, "Photo skipped in print layout");
        }
        result
    };

    #[cfg(feature = "parallel")]
    let sheets: Vec<_> = {
        use rayon::prelude::*;
        photos.par_iter().enumerate().map(sheet).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let sheets: Vec<_> = photos.iter().enumerate().map(sheet).collect();

    sheets
}

/// [`layout_prints`], with each sheet PNG-encoded.
pub fn layout_prints_encoded(
    photos: &[PhotoBuffer],
    spec: &PrintSheetSpec,
) -> Vec<Result<EncodedImage, LayoutError>> {
    layout_prints(photos, spec)
        .into_iter()
        .map(|sheet| Ok(encode_png(&sheet?)?))
        .collect()
}
