//! Colors for print fills and border strokes.
//!
//! Accepted notations: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)` with `a` in [0, 1], and the names `white` and `black`.
//! Fills additionally accept `transparent`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::PhotoBuffer;

/// Returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}'")]
pub struct InvalidColor(pub String);

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl FromStr for Color {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || InvalidColor(s.to_string());

        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::BLACK),
            _ => {}
        }

        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(args).ok_or_else(invalid);
        }

        Err(invalid())
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Color::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<u8>().ok();
    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(channel(r)?, channel(g)?, channel(b)?)),
        [r, g, b, a] => {
            let alpha: f64 = a.parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            Some(Color::rgba(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                (alpha * 255.0).round() as u8,
            ))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Fill behind a photo: a solid color or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    #[default]
    Transparent,
    Solid(Color),
}

impl Background {
    pub fn color(self) -> Option<Color> {
        match self {
            Background::Transparent => None,
            Background::Solid(color) => Some(color),
        }
    }
}

impl FromStr for Background {
    type Err = InvalidColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("transparent") {
            Ok(Background::Transparent)
        } else {
            s.parse().map(Background::Solid)
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Transparent => f.write_str("transparent"),
            Background::Solid(color) => color.fmt(f),
        }
    }
}

impl TryFrom<String> for Background {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(background: Background) -> Self {
        background.to_string()
    }
}

impl From<Color> for Background {
    fn from(color: Color) -> Self {
        Background::Solid(color)
    }
}

/// Source-over blend of `src` onto one straight-alpha RGBA pixel.
#[inline]
pub(crate) fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3] as f64 / 255.0;
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        dst[..4].copy_from_slice(&src);
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let blended = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
        dst[c] = blended.clamp(0.0, 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
}

/// Draw `top` over `bottom` with its top-left corner at `(x, y)`.
///
/// Parts of `top` that land outside `bottom` are dropped.
pub(crate) fn composite_over(bottom: &mut PhotoBuffer, top: &PhotoBuffer, x: i64, y: i64) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + top.width as i64).min(bottom.width as i64);
    let y1 = (y + top.height as i64).min(bottom.height as i64);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for dst_y in y0..y1 {
        let src_y = (dst_y - y) as usize;
        for dst_x in x0..x1 {
            let src_x = (dst_x - x) as usize;
            let src_idx = (src_y * top.width as usize + src_x) * 4;
            let dst_idx = (dst_y as usize * bottom.width as usize + dst_x as usize) * 4;
            let src = [
                top.pixels[src_idx],
                top.pixels[src_idx + 1],
                top.pixels[src_idx + 2],
                top.pixels[src_idx + 3],
            ];
            blend_over(&mut bottom.pixels[dst_idx..dst_idx + 4], src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!("#fff".parse::<Color>(), Ok(Color::WHITE));
        assert_eq!("#f0f0f0".parse::<Color>(), Ok(Color::rgb(240, 240, 240)));
        assert_eq!(
            "#00000080".parse::<Color>(),
            Ok(Color::rgba(0, 0, 0, 128))
        );
        assert_eq!("#ABCDEF".parse::<Color>(), Ok(Color::rgb(171, 205, 239)));
    }

    #[test]
    fn test_parse_names_and_functional() {
        assert_eq!("white".parse::<Color>(), Ok(Color::WHITE));
        assert_eq!(" Black ".parse::<Color>(), Ok(Color::BLACK));
        assert_eq!(
            "rgba(0,0,0,0.5)".parse::<Color>(),
            Ok(Color::rgba(0, 0, 0, 128))
        );
        assert_eq!(
            "rgb(1, 2, 3)".parse::<Color>(),
            Ok(Color::rgb(1, 2, 3))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "#ff", "#gggggg", "red", "rgba(1,2,3,1.5)", "rgb(300,0,0)"] {
            assert!(bad.parse::<Color>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_display_roundtrips() {
        for color in [Color::WHITE, Color::rgba(10, 20, 30, 40)] {
            assert_eq!(color.to_string().parse::<Color>(), Ok(color));
        }
        assert_eq!(Color::rgb(240, 240, 240).to_string(), "#f0f0f0");
    }

    #[test]
    fn test_background_parse() {
        assert_eq!(
            "transparent".parse::<Background>(),
            Ok(Background::Transparent)
        );
        assert_eq!(
            "#ffffff".parse::<Background>(),
            Ok(Background::Solid(Color::WHITE))
        );
        assert!("nope".parse::<Background>().is_err());
    }

    #[test]
    fn test_background_serde_as_string() {
        let json = serde_json::to_string(&Background::Solid(Color::WHITE)).unwrap();
        assert_eq!(json, "\"#ffffff\"");
        let bg: Background = serde_json::from_str("\"transparent\"").unwrap();
        assert_eq!(bg, Background::Transparent);
        assert!(serde_json::from_str::<Color>("\"bogus\"").is_err());
    }

    #[test]
    fn test_blend_over() {
        let mut px = [255, 255, 255, 255];
        blend_over(&mut px, [0, 0, 0, 0]);
        assert_eq!(px, [255, 255, 255, 255]);

        blend_over(&mut px, [0, 0, 0, 255]);
        assert_eq!(px, [0, 0, 0, 255]);

        let mut white = [255, 255, 255, 255];
        blend_over(&mut white, [0, 0, 0, 51]);
        assert_eq!(white, [204, 204, 204, 255]);

        let mut clear = [0, 0, 0, 0];
        blend_over(&mut clear, [200, 100, 0, 51]);
        assert_eq!(clear, [200, 100, 0, 51]);
    }

    #[test]
    fn test_composite_over_clips_to_bottom() {
        let mut bottom = PhotoBuffer::filled(4, 4, [255, 255, 255, 255]).unwrap();
        let top = PhotoBuffer::filled(3, 3, [1, 2, 3, 255]).unwrap();
        composite_over(&mut bottom, &top, 2, -1);
        assert_eq!(bottom.pixel(2, 0), [1, 2, 3, 255]);
        assert_eq!(bottom.pixel(3, 1), [1, 2, 3, 255]);
        assert_eq!(bottom.pixel(3, 2), [255, 255, 255, 255]);
        assert_eq!(bottom.pixel(1, 0), [255, 255, 255, 255]);
    }
}
