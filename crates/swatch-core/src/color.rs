//! Color value types: packed ARGB and its HSL view.
//!
//! Conversions follow the usual hexcone formulas. Hue is measured in
//! degrees, saturation and lightness are fractions in `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable ARGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Unpack `0xAARRGGBB`.
    pub const fn from_argb(packed: u32) -> Self {
        Self {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// Pack as `0xAARRGGBB`. This is the key used by collection lookups.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Pack the color channels as `0xRRGGBB`, dropping alpha.
    pub const fn to_rgb24(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Hue in degrees, `0` for achromatic colors.
    pub fn hue(self) -> f64 {
        self.to_hsl().hue()
    }

    pub fn saturation(self) -> f64 {
        self.to_hsl().saturation()
    }

    pub fn lightness(self) -> f64 {
        self.to_hsl().lightness()
    }

    pub fn to_hsl(self) -> HslColor {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;

        if max == min {
            return HslColor::with_alpha(self.a, 0.0, 0.0, lightness);
        }

        let delta = max - min;
        let saturation = if lightness <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let mut hue = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        } * 60.0;
        if hue < 0.0 {
            hue += 360.0;
        }

        HslColor::with_alpha(self.a, hue, saturation, lightness)
    }
}

impl From<u32> for Color {
    fn from(packed: u32) -> Self {
        Color::from_argb(packed)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

/// A color expressed as hue, saturation and lightness.
///
/// Every setter clamps its channel: saturation and lightness to `[0, 1]`,
/// alpha to `[0, 255]`, and hue is wrapped into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslColor {
    alpha: u8,
    hue: f64,
    saturation: f64,
    lightness: f64,
}

impl HslColor {
    /// An opaque HSL color.
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self::with_alpha(255, hue, saturation, lightness)
    }

    pub fn with_alpha(alpha: u8, hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            alpha,
            hue: normalize_hue(hue),
            saturation: clamp_unit(saturation),
            lightness: clamp_unit(lightness),
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn hue(&self) -> f64 {
        self.hue
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    pub fn lightness(&self) -> f64 {
        self.lightness
    }

    pub fn set_alpha(&mut self, alpha: i32) {
        self.alpha = alpha.clamp(0, 255) as u8;
    }

    pub fn set_hue(&mut self, hue: f64) {
        self.hue = normalize_hue(hue);
    }

    pub fn set_saturation(&mut self, saturation: f64) {
        self.saturation = clamp_unit(saturation);
    }

    pub fn set_lightness(&mut self, lightness: f64) {
        self.lightness = clamp_unit(lightness);
    }

    pub fn to_rgb(&self) -> Color {
        self.to_rgb_with_alpha(self.alpha)
    }

    /// Convert to RGB, overriding the stored alpha.
    pub fn to_rgb_with_alpha(&self, alpha: u8) -> Color {
        let (s, l) = (self.saturation, self.lightness);

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let hk = self.hue / 360.0;

        let channel = |t: f64| -> u8 {
            let mut t = t;
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }

            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 1.0 / 2.0 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * 6.0 * (2.0 / 3.0 - t)
            } else {
                p
            };

            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };

        Color::argb(
            alpha,
            channel(hk + 1.0 / 3.0),
            channel(hk),
            channel(hk - 1.0 / 3.0),
        )
    }
}

impl From<Color> for HslColor {
    fn from(color: Color) -> Self {
        color.to_hsl()
    }
}

impl From<HslColor> for Color {
    fn from(hsl: HslColor) -> Self {
        hsl.to_rgb()
    }
}

impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HslColor [H={}, S={}, L={}]",
            self.hue, self.saturation, self.lightness
        )
    }
}

fn normalize_hue(hue: f64) -> f64 {
    if !hue.is_finite() {
        return 0.0;
    }
    let wrapped = hue.rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
