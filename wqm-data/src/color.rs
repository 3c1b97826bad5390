//! Value-to-color mapping for map markers and heat maps.
//!
//! A [`Scale`] spreads a `[min, max]` range over the anchors of a
//! [`Palette`]: the normalized position is clamped to `[0, 1]` and each pair
//! of adjacent anchors covers an equal share of it. Null and NaN values get
//! [`FALLBACK`].

use crate::aggregate::{defined_means, SiteSummary};
use crate::error::DegenerateScale;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Color> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Color, frac: f64) -> Color {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Color for null, NaN and otherwise unmappable values. Not an anchor of
/// any palette.
pub const FALLBACK: Color = Color::rgb(0x80, 0x80, 0x80);

/// ColorBrewer YlGnBu, 9 classes: light yellow (low) to dark blue (high).
const YL_GN_BU: [Color; 9] = [
    Color::rgb(0xff, 0xff, 0xd9),
    Color::rgb(0xed, 0xf8, 0xb1),
    Color::rgb(0xc7, 0xe9, 0xb4),
    Color::rgb(0x7f, 0xcd, 0xbb),
    Color::rgb(0x41, 0xb6, 0xc4),
    Color::rgb(0x1d, 0x91, 0xc0),
    Color::rgb(0x22, 0x5e, 0xa8),
    Color::rgb(0x25, 0x34, 0x94),
    Color::rgb(0x08, 0x1d, 0x58),
];

/// ColorBrewer RdBu, 11 classes: dark red (low) through white to dark blue.
const RD_BU: [Color; 11] = [
    Color::rgb(0x67, 0x00, 0x1f),
    Color::rgb(0xb2, 0x18, 0x2b),
    Color::rgb(0xd6, 0x60, 0x4d),
    Color::rgb(0xf4, 0xa5, 0x82),
    Color::rgb(0xfd, 0xdb, 0xc7),
    Color::rgb(0xf7, 0xf7, 0xf7),
    Color::rgb(0xd1, 0xe5, 0xf0),
    Color::rgb(0x92, 0xc5, 0xde),
    Color::rgb(0x43, 0x93, 0xc3),
    Color::rgb(0x21, 0x66, 0xac),
    Color::rgb(0x05, 0x30, 0x61),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Palette {
    /// Sequential, used for site means on the map.
    #[default]
    YlGnBu,
    /// Diverging, used for correlation heat maps over `[-1, 1]`.
    RdBu,
}

impl Palette {
    /// Ordered anchor colors, low to high. Always at least two.
    pub fn anchors(&self) -> &'static [Color] {
        match self {
            Palette::YlGnBu => &YL_GN_BU,
            Palette::RdBu => &RD_BU,
        }
    }
}

/// A value range mapped onto a palette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    min: f64,
    max: f64,
    palette: Palette,
}

impl Scale {
    /// Scale spanning the finite values given, on the default palette.
    pub fn build(values: &[f64]) -> Result<Scale, DegenerateScale> {
        Scale::build_with_palette(values, Palette::default())
    }

    /// Scale spanning the finite values given. Fails when there are none or
    /// when they are all equal.
    pub fn build_with_palette(values: &[f64], palette: Palette) -> Result<Scale, DegenerateScale> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let Some(&first) = finite.first() else {
            return Err(DegenerateScale::Empty);
        };
        let (min, max) = finite
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if min == max {
            return Err(DegenerateScale::Flat {
                value: min,
                count: finite.len(),
            });
        }
        if !(max - min).is_finite() {
            return Err(DegenerateScale::InvalidRange { min, max });
        }
        Ok(Scale { min, max, palette })
    }

    /// Scale over an explicit range, e.g. `[-1, 1]` for correlations.
    pub fn with_range(min: f64, max: f64, palette: Palette) -> Result<Scale, DegenerateScale> {
        if !min.is_finite() || !max.is_finite() || min >= max || !(max - min).is_finite() {
            return Err(DegenerateScale::InvalidRange { min, max });
        }
        Ok(Scale { min, max, palette })
    }

    /// Scale over the non-null means of a set of site summaries.
    pub fn from_summaries(summaries: &[SiteSummary]) -> Result<Scale, DegenerateScale> {
        Scale::build(&defined_means(summaries))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Normalized position of `value` in `[0, 1]`; `None` when it has none.
    pub fn position(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let t = (value - self.min) / (self.max - self.min);
        (!t.is_nan()).then(|| t.clamp(0.0, 1.0))
    }

    /// Color for a value. Values outside the range take the nearest end
    /// color; null and NaN take [`FALLBACK`].
    pub fn color_for(&self, value: Option<f64>) -> Color {
        let Some(t) = value.and_then(|v| self.position(v)) else {
            return FALLBACK;
        };
        let anchors = self.palette.anchors();
        let segments = anchors.len() - 1;
        let scaled = t * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        anchors[index].lerp(anchors[index + 1], scaled - index as f64)
    }
}
