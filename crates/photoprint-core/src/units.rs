//! Physical length to pixel conversion.
//!
//! Conversions return fractional pixel counts. Callers round exactly once,
//! at the point where a buffer is allocated, so chained conversions never
//! accumulate rounding error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Print resolution used by crop targets and print sheets.
pub const DEFAULT_DPI: f64 = 300.0;

const MM_PER_INCH: f64 = 25.4;
const CM_PER_INCH: f64 = 2.54;

/// Length unit accepted by crop and layout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "cm")]
    Centimeters,
    #[default]
    #[serde(rename = "px")]
    Pixels,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Millimeters => "mm",
            Unit::Inches => "in",
            Unit::Centimeters => "cm",
            Unit::Pixels => "px",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a unit tag is not one of `mm`, `in`, `cm`, `px`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown unit '{0}' (expected mm, in, cm or px)")]
pub struct UnknownUnit(pub String);

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mm" => Ok(Unit::Millimeters),
            "in" => Ok(Unit::Inches),
            "cm" => Ok(Unit::Centimeters),
            "px" => Ok(Unit::Pixels),
            other => Err(UnknownUnit(other.to_string())),
        }
    }
}

/// Convert a physical length to a (fractional) pixel count.
///
/// No validation happens here: zero and negative values pass straight
/// through, and `dpi` is ignored for pixel input.
#[inline]
pub fn to_pixels(value: f64, unit: Unit, dpi: f64) -> f64 {
    match unit {
        Unit::Inches => value * dpi,
        Unit::Centimeters => (value / CM_PER_INCH) * dpi,
        Unit::Millimeters => (value / MM_PER_INCH) * dpi,
        Unit::Pixels => value,
    }
}

/// A length with its unit, as stored in settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub const fn mm(value: f64) -> Self {
        Self::new(value, Unit::Millimeters)
    }

    pub const fn px(value: f64) -> Self {
        Self::new(value, Unit::Pixels)
    }

    pub fn to_pixels(self, dpi: f64) -> f64 {
        to_pixels(self.value, self.unit, dpi)
    }

    /// Whole pixel count for allocation. Negative lengths become zero.
    pub fn to_pixel_count(self, dpi: f64) -> u32 {
        let px = self.to_pixels(dpi).round();
        if px.is_finite() && px > 0.0 {
            px.min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inch_conversion() {
        assert_eq!(to_pixels(1.0, Unit::Inches, 300.0), 300.0);
    }

    #[test]
    fn test_mm_conversion() {
        assert!((to_pixels(25.4, Unit::Millimeters, 300.0) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_cm_conversion() {
        assert!((to_pixels(2.54, Unit::Centimeters, 300.0) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_passport_preset_targets() {
        let w = to_pixels(35.0, Unit::Millimeters, DEFAULT_DPI).round();
        let h = to_pixels(45.0, Unit::Millimeters, DEFAULT_DPI).round();
        assert_eq!((w, h), (413.0, 531.0));
    }

    #[test]
    fn test_no_rounding_inside_converter() {
        let px = to_pixels(2.0, Unit::Millimeters, 300.0);
        assert!((px - 23.622_047).abs() < 1e-5);
    }

    #[test]
    fn test_negative_passes_through() {
        assert_eq!(to_pixels(-2.0, Unit::Inches, 300.0), -600.0);
        assert_eq!(to_pixels(0.0, Unit::Millimeters, 300.0), 0.0);
    }

    #[test]
    fn test_unit_parse_and_display() {
        for unit in [Unit::Millimeters, Unit::Inches, Unit::Centimeters, Unit::Pixels] {
            assert_eq!(unit.to_string().parse::<Unit>(), Ok(unit));
        }
        assert_eq!("ft".parse::<Unit>(), Err(UnknownUnit("ft".to_string())));
    }

    #[test]
    fn test_unit_serde_tags() {
        assert_eq!(serde_json::to_string(&Unit::Millimeters).unwrap(), "\"mm\"");
        let unit: Unit = serde_json::from_str("\"in\"").unwrap();
        assert_eq!(unit, Unit::Inches);
    }

    #[test]
    fn test_length_pixel_count() {
        assert_eq!(Length::mm(2.0).to_pixel_count(300.0), 24);
        assert_eq!(Length::mm(0.2).to_pixel_count(300.0), 2);
        assert_eq!(Length::px(-5.0).to_pixel_count(300.0), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Pixel input ignores the DPI entirely.
        #[test]
        fn prop_pixels_unchanged(value in -10_000.0f64..10_000.0, dpi in 1.0f64..1200.0) {
            prop_assert_eq!(to_pixels(value, Unit::Pixels, dpi), value);
        }

        /// One inch is 25.4 mm and 2.54 cm at any resolution.
        #[test]
        fn prop_units_agree(value in 0.0f64..100.0, dpi in 1.0f64..1200.0) {
            let inches = to_pixels(value, Unit::Inches, dpi);
            let mm = to_pixels(value * 25.4, Unit::Millimeters, dpi);
            let cm = to_pixels(value * 2.54, Unit::Centimeters, dpi);
            prop_assert!((inches - mm).abs() < 1e-6);
            prop_assert!((inches - cm).abs() < 1e-6);
        }
    }
}
