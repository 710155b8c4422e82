use crate::scale::domain::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Relative luminance, 0 (black) to 1 (white).
    pub fn luminance(self) -> f64 {
        (0.2126 * f64::from(self.r) + 0.7152 * f64::from(self.g) + 0.0722 * f64::from(self.b))
            / 255.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Nine-class sequential blues, light to dark.
const BLUES: [Rgb; 9] = [
    Rgb::new(0xf7, 0xfb, 0xff),
    Rgb::new(0xde, 0xeb, 0xf7),
    Rgb::new(0xc6, 0xdb, 0xef),
    Rgb::new(0x9e, 0xca, 0xe1),
    Rgb::new(0x6b, 0xae, 0xd6),
    Rgb::new(0x42, 0x92, 0xc6),
    Rgb::new(0x21, 0x71, 0xb5),
    Rgb::new(0x08, 0x51, 0x9c),
    Rgb::new(0x08, 0x30, 0x6b),
];

/// Sample the sequential blues ramp at `t` in `[0, 1]`.
pub fn interpolate_blues(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (BLUES.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(BLUES.len() - 2);
    BLUES[i].lerp(BLUES[i + 1], scaled - i as f64)
}

/// Square-root mapping from a clamped value to a stroke width.
///
/// Square root so that perceived area, not raw length, grows with the
/// amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthScale {
    domain: Domain,
    range: (f64, f64),
}

fn signed_sqrt(v: f64) -> f64 {
    v.signum() * v.abs().sqrt()
}

impl WidthScale {
    pub fn new(domain: Domain, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn width_of(&self, value: f64) -> f64 {
        let v = self.domain.clamp(value);
        let lo = signed_sqrt(self.domain.lo());
        let hi = signed_sqrt(self.domain.hi());
        let t = (signed_sqrt(v) - lo) / (hi - lo);
        self.range.0 + (self.range.1 - self.range.0) * t
    }
}

/// Sequential colour mapping restricted to a luminance sub-range, so the
/// smallest visible edge is never close to the background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    domain: Domain,
    range: (f64, f64),
}

impl ColorScale {
    pub fn new(domain: Domain, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Position on the colour ramp for `value`, within the configured range.
    pub fn position(&self, value: f64) -> f64 {
        self.range.0 + (self.range.1 - self.range.0) * self.domain.normalize(value)
    }

    pub fn color_of(&self, value: f64) -> Rgb {
        interpolate_blues(self.position(value))
    }
}

/// Per-row logarithmic opacity over `[1, row_max]`.
///
/// Many small values stay distinguishable from zero instead of sharing
/// the faintest shade as they would on a linear scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpacityScale {
    row_max: f64,
    range: (f64, f64),
}

impl OpacityScale {
    pub fn for_row(row_max: f64, range: (f64, f64)) -> Self {
        Self { row_max, range }
    }

    pub fn opacity_of(&self, value: f64) -> f64 {
        let (lo, hi) = self.range;
        if self.row_max.is_nan() || self.row_max <= 1.0 {
            return (lo + hi) / 2.0;
        }
        let v = if value.is_nan() { 1.0 } else { value.max(1.0) };
        let t = (v.ln() / self.row_max.ln()).clamp(0.0, 1.0);
        lo + (hi - lo) * t
    }
}

/// Five-colour palette for purpose categories.
pub const PURPOSE_PALETTE: &[&str] = &["#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854"];

/// Tableau10 followed by Set3, for counterpart series.
pub const SERIES_PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab", "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462",
    "#b3de69", "#fccde5", "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

/// Colour for keys outside an ordinal domain, and for empty cells.
pub const NEUTRAL_COLOR: &str = "#eeeeee";

/// Categorical colours assigned in domain order, cycling when the domain
/// outgrows the palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdinalPalette {
    domain: Vec<String>,
    colors: &'static [&'static str],
}

impl OrdinalPalette {
    pub fn new(domain: Vec<String>, colors: &'static [&'static str]) -> Self {
        Self { domain, colors }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn color_of(&self, key: &str) -> &'static str {
        if self.colors.is_empty() {
            return NEUTRAL_COLOR;
        }
        match self.domain.iter().position(|k| k == key) {
            Some(i) => self.colors[i % self.colors.len()],
            None => NEUTRAL_COLOR,
        }
    }
}
