//! Built-in palettes.

use crate::{Color, ColorCollection};
use std::fmt;
use std::str::FromStr;

/// A palette that ships with the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NamedPalette {
    /// No colors at all.
    #[default]
    None,
    /// The 16 classic QBasic colors.
    Standard,
    /// Office 2010 theme colors followed by six rows of lighter and darker shades.
    Office2010,
    /// 64 opaque colors followed by half-transparent copies of the first 32.
    Paint,
    /// The 216-color web-safe cube.
    WebSafe,
}

impl NamedPalette {
    pub const ALL: [NamedPalette; 5] = [
        NamedPalette::None,
        NamedPalette::Standard,
        NamedPalette::Office2010,
        NamedPalette::Paint,
        NamedPalette::WebSafe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NamedPalette::None => "none",
            NamedPalette::Standard => "standard",
            NamedPalette::Office2010 => "office2010",
            NamedPalette::Paint => "paint",
            NamedPalette::WebSafe => "websafe",
        }
    }

    pub fn colors(self) -> Vec<Color> {
        match self {
            NamedPalette::None => Vec::new(),
            NamedPalette::Standard => QB_COLORS.to_vec(),
            NamedPalette::Office2010 => scaled_palette(&OFFICE_2010_TOP_ROW),
            NamedPalette::Paint => PAINT_COLORS
                .iter()
                .copied()
                .chain(PAINT_COLORS[..32].iter().map(|c| c.with_alpha(128)))
                .collect(),
            NamedPalette::WebSafe => web_safe(),
        }
    }

    pub fn to_collection(self) -> ColorCollection {
        self.colors().into_iter().collect()
    }
}

impl fmt::Display for NamedPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedPalette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace(['-', '_', ' '], "");
        NamedPalette::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let known: Vec<_> = NamedPalette::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown palette '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Expand a row of base colors into a shade grid.
///
/// The result starts with `top_row` unchanged, then holds six more rows,
/// each a copy of `top_row` with its lightness forced to 0.90, 0.73, 0.56,
/// 0.39, 0.22 and 0.05 in that order.
pub fn scaled_palette(top_row: &[Color]) -> Vec<Color> {
    let mut colors = Vec::with_capacity(top_row.len() * 7);
    colors.extend_from_slice(top_row);

    for i in (0..=5u32).rev() {
        let lightness = (5 + i + 16 * i) as f64 / 100.0;
        colors.extend(top_row.iter().map(|color| {
            let mut hsl = color.to_hsl();
            hsl.set_lightness(lightness);
            hsl.to_rgb()
        }));
    }

    colors
}

fn web_safe() -> Vec<Color> {
    const STEPS: [u8; 6] = [0, 51, 102, 153, 204, 255];

    let mut colors = Vec::with_capacity(216);
    for r in STEPS {
        for g in STEPS {
            for b in STEPS {
                colors.push(Color::rgb(r, g, b));
            }
        }
    }
    colors
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::rgb(r, g, b)
}

#[rustfmt::skip]
const QB_COLORS: [Color; 16] = [
    rgb(0, 0, 0), rgb(128, 0, 0), rgb(0, 128, 0), rgb(128, 128, 0),
    rgb(0, 0, 128), rgb(128, 0, 128), rgb(0, 128, 128), rgb(192, 192, 192),
    rgb(128, 128, 128), rgb(255, 0, 0), rgb(0, 255, 0), rgb(255, 255, 0),
    rgb(0, 0, 255), rgb(255, 0, 255), rgb(0, 255, 255), rgb(255, 255, 255),
];

#[rustfmt::skip]
const OFFICE_2010_TOP_ROW: [Color; 10] = [
    rgb(255, 255, 255), rgb(0, 0, 0), rgb(238, 236, 255), rgb(31, 73, 125),
    rgb(79, 129, 189), rgb(192, 80, 77), rgb(155, 187, 89), rgb(128, 100, 162),
    rgb(75, 172, 198), rgb(247, 150, 70),
];

#[rustfmt::skip]
const PAINT_COLORS: [Color; 64] = [
    rgb(0, 0, 0), rgb(64, 64, 64), rgb(255, 0, 0), rgb(255, 106, 0),
    rgb(255, 216, 0), rgb(182, 255, 0), rgb(76, 255, 0), rgb(0, 255, 33),
    rgb(0, 255, 144), rgb(0, 255, 255), rgb(0, 148, 255), rgb(0, 38, 255),
    rgb(72, 0, 255), rgb(178, 0, 255), rgb(255, 0, 220), rgb(255, 0, 110),
    rgb(255, 255, 255), rgb(128, 128, 128), rgb(127, 0, 0), rgb(127, 51, 0),
    rgb(127, 106, 0), rgb(91, 127, 0), rgb(38, 127, 0), rgb(0, 127, 14),
    rgb(0, 127, 70), rgb(0, 127, 127), rgb(0, 74, 127), rgb(0, 19, 127),
    rgb(33, 0, 127), rgb(87, 0, 127), rgb(127, 0, 110), rgb(127, 0, 55),
    rgb(160, 160, 160), rgb(48, 48, 48), rgb(255, 127, 127), rgb(255, 178, 127),
    rgb(255, 233, 127), rgb(218, 255, 127), rgb(165, 255, 127), rgb(127, 255, 142),
    rgb(127, 255, 197), rgb(127, 255, 255), rgb(127, 201, 255), rgb(127, 146, 255),
    rgb(161, 127, 255), rgb(214, 127, 255), rgb(255, 127, 237), rgb(255, 127, 182),
    rgb(192, 192, 192), rgb(96, 96, 96), rgb(127, 63, 63), rgb(127, 89, 63),
    rgb(127, 116, 63), rgb(109, 127, 63), rgb(82, 127, 63), rgb(63, 127, 71),
    rgb(63, 127, 98), rgb(63, 127, 127), rgb(63, 100, 127), rgb(63, 73, 127),
    rgb(80, 63, 127), rgb(107, 63, 127), rgb(127, 63, 118), rgb(127, 63, 91),
];
