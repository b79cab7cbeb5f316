//! Orderings used to sort a palette.
//!
//! Every comparison ignores alpha.

use crate::Color;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The metric a [`ColorCollection`](crate::ColorCollection) is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending hue angle.
    #[default]
    Hue,
    /// Ascending perceived brightness.
    Brightness,
    /// Descending packed `RRGGBB` value.
    Value,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Hue, SortOrder::Brightness, SortOrder::Value];

    pub fn compare(self, a: &Color, b: &Color) -> Ordering {
        match self {
            SortOrder::Hue => hue(a, b),
            SortOrder::Brightness => brightness(a, b),
            SortOrder::Value => value(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Hue => "hue",
            SortOrder::Brightness => "brightness",
            SortOrder::Value => "value",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort order '{s}' (expected hue, brightness or value)"))
    }
}

/// Compare by gamma-correct grey value.
pub fn brightness(a: &Color, b: &Color) -> Ordering {
    perceived_brightness(*a).cmp(&perceived_brightness(*b))
}

/// Compare by hue angle. Achromatic colors sort as hue 0.
pub fn hue(a: &Color, b: &Color) -> Ordering {
    a.hue().total_cmp(&b.hue())
}

/// Compare packed RGB, largest first.
pub fn value(a: &Color, b: &Color) -> Ordering {
    b.to_rgb24().cmp(&a.to_rgb24())
}

/// Grey level of a color in `0..=255`.
///
/// Channels are linearised with the sRGB transfer curve, weighted by the
/// Rec. 709 luminance coefficients, and the sum is gamma encoded again.
pub fn perceived_brightness(color: Color) -> i32 {
    let luminance = 0.212655 * inverse_gamma(color.r)
        + 0.715158 * inverse_gamma(color.g)
        + 0.072187 * inverse_gamma(color.b);

    (gamma(luminance) * 255.0 + 0.5) as i32
}

fn inverse_gamma(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn gamma(v: f64) -> f64 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}
