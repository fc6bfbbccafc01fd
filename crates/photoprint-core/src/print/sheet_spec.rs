//! Paper presets and the settings that shape a print sheet.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::color::{Background, Color};
use crate::units::{Length, Unit, DEFAULT_DPI};

/// Photo paper sizes, always laid out landscape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    #[serde(rename = "4x6")]
    FourBySix,
    #[serde(rename = "5x7")]
    FiveBySeven,
}

impl PaperSize {
    pub fn as_str(self) -> &'static str {
        match self {
            PaperSize::FourBySix => "4x6",
            PaperSize::FiveBySeven => "5x7",
        }
    }

    /// Landscape size in inches, `(long, short)`.
    pub fn inches(self) -> (f64, f64) {
        match self {
            PaperSize::FourBySix => (6.0, 4.0),
            PaperSize::FiveBySeven => (7.0, 5.0),
        }
    }

    /// Landscape size in whole pixels at `dpi`.
    pub fn pixels(self, dpi: f64) -> (u32, u32) {
        let (long, short) = self.inches();
        (
            Length::new(long, Unit::Inches).to_pixel_count(dpi),
            Length::new(short, Unit::Inches).to_pixel_count(dpi),
        )
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "4x6" => Ok(PaperSize::FourBySix),
            "5x7" => Ok(PaperSize::FiveBySeven),
            other => Err(format!("Unknown paper size '{other}' (expected 4x6 or 5x7)")),
        }
    }
}

/// Everything needed to tile one photo onto a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintSheetSpec {
    pub paper: PaperSize,
    pub dpi: f64,
    /// Gap between neighboring stamps for the cutter.
    pub cutting_margin: Length,
    /// Width of the frame stroked around each photo.
    pub border: Length,
    pub border_color: Color,
    /// Fill under each photo inside its frame.
    pub background: Background,
}

impl PrintSheetSpec {
    /// Sheet settings used for batch exports: 2 mm cutting margin, a 0.2 mm
    /// light gray frame and a white fill.
    pub fn batch(paper: PaperSize) -> Self {
        Self {
            paper,
            dpi: DEFAULT_DPI,
            cutting_margin: Length::mm(2.0),
            border: Length::mm(0.2),
            border_color: Color::rgba(200, 200, 200, 179),
            background: Background::Solid(Color::WHITE),
        }
    }

    /// Sheet settings used by the single-image editor: 25 px cutting margin,
    /// a hairline translucent black frame and no fill.
    pub fn single(paper: PaperSize) -> Self {
        Self {
            paper,
            dpi: DEFAULT_DPI,
            cutting_margin: Length::px(25.0),
            border: Length::px(1.0),
            border_color: Color::rgba(0, 0, 0, 128),
            background: Background::Transparent,
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Paper size in pixels.
    pub fn paper_pixels(&self) -> (u32, u32) {
        self.paper.pixels(self.dpi)
    }

    /// Border width in whole pixels.
    pub fn border_pixels(&self) -> u32 {
        self.border.to_pixel_count(self.dpi)
    }

    /// Cutting margin in whole pixels.
    pub fn margin_pixels(&self) -> u32 {
        self.cutting_margin.to_pixel_count(self.dpi)
    }
}

impl Default for PrintSheetSpec {
    fn default() -> Self {
        Self::batch(PaperSize::default())
    }
}
