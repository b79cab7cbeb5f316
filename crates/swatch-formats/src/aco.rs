//! Adobe Photoshop Color Swatch (.aco).
//!
//! Big-endian throughout. A file holds a version 1 block, optionally
//! followed by a version 2 block carrying the same swatches plus names:
//!
//! ```text
//! u16 version, u16 count
//! count x { u16 space, u16 v1, u16 v2, u16 v3, u16 v4
//!           [v2 only: u32 length, length x UTF-16BE code units] }
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use swatch_core::io::{
    read_u16_be, read_u32_be, read_utf16_be, try_read_array, try_read_u16_be, write_u16_be,
    write_u32_be, write_utf16_be,
};
use swatch_core::{
    Color, ColorCollection, HslColor, PaletteError, PaletteSerializer, PaletteSource, Result,
};

const SPACE_RGB: u16 = 0;
const SPACE_HSB: u16 = 1;
const SPACE_GRAYSCALE: u16 = 8;

const HUE_SCALE: f64 = 182.04;
const PERCENT_SCALE: f64 = 655.35;
const GRAY_SCALE: f64 = 39.0625;

/// Which blocks to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcoVersion {
    /// A single unnamed block.
    V1,
    /// A version 1 block followed by a named version 2 block.
    #[default]
    V2,
}

impl AcoVersion {
    fn number(self) -> u16 {
        match self {
            AcoVersion::V1 => 1,
            AcoVersion::V2 => 2,
        }
    }
}

impl FromStr for AcoVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "1" => Ok(AcoVersion::V1),
            "2" => Ok(AcoVersion::V2),
            _ => Err(format!("unknown ACO version '{s}' (expected 1 or 2)")),
        }
    }
}

/// Color space swatches are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcoColorSpace {
    #[default]
    Rgb,
    Hsb,
    Grayscale,
}

impl AcoColorSpace {
    fn code(self) -> u16 {
        match self {
            AcoColorSpace::Rgb => SPACE_RGB,
            AcoColorSpace::Hsb => SPACE_HSB,
            AcoColorSpace::Grayscale => SPACE_GRAYSCALE,
        }
    }

    fn encode(self, color: Color) -> [u16; 4] {
        match self {
            AcoColorSpace::Rgb => [
                color.r as u16 * 256,
                color.g as u16 * 256,
                color.b as u16 * 256,
                0,
            ],
            AcoColorSpace::Hsb => {
                let hsl = color.to_hsl();
                [
                    (hsl.hue() * HUE_SCALE) as u16,
                    (hsl.saturation() * PERCENT_SCALE) as u16,
                    (hsl.lightness() * PERCENT_SCALE) as u16,
                    0,
                ]
            }
            AcoColorSpace::Grayscale => {
                let level = if color.r == color.g && color.g == color.b {
                    color.r as f64
                } else {
                    (color.r as f64 + color.g as f64 + color.b as f64) / 3.0
                };
                [(level * GRAY_SCALE) as u16, 0, 0, 0]
            }
        }
    }
}

impl fmt::Display for AcoColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcoColorSpace::Rgb => "rgb",
            AcoColorSpace::Hsb => "hsb",
            AcoColorSpace::Grayscale => "grayscale",
        })
    }
}

impl FromStr for AcoColorSpace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(AcoColorSpace::Rgb),
            "hsb" | "hsl" => Ok(AcoColorSpace::Hsb),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(AcoColorSpace::Grayscale),
            _ => Err(format!(
                "unknown ACO color space '{s}' (expected rgb, hsb or grayscale)"
            )),
        }
    }
}

fn decode(space: u16, [v1, v2, v3, _]: [u16; 4]) -> Result<Color> {
    match space {
        SPACE_RGB => Ok(Color::rgb(
            (v1 / 256) as u8,
            (v2 / 256) as u8,
            (v3 / 256) as u8,
        )),
        SPACE_HSB => Ok(HslColor::new(
            v1 as f64 / HUE_SCALE,
            v2 as f64 / PERCENT_SCALE,
            v3 as f64 / PERCENT_SCALE,
        )
        .to_rgb()),
        SPACE_GRAYSCALE => {
            let level = (v1 as f64 / GRAY_SCALE).round().min(255.0) as u8;
            Ok(Color::rgb(level, level, level))
        }
        other => Err(PaletteError::UnsupportedColorSpace(other)),
    }
}

/// Reads versions 1 and 2; writes the configured version and color space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcoSerializer {
    version: AcoVersion,
    color_space: AcoColorSpace,
}

impl AcoSerializer {
    pub fn new(version: AcoVersion, color_space: AcoColorSpace) -> Self {
        Self {
            version,
            color_space,
        }
    }

    pub fn version(&self) -> AcoVersion {
        self.version
    }

    pub fn color_space(&self) -> AcoColorSpace {
        self.color_space
    }

    fn read_block(&self, source: &mut dyn PaletteSource, version: u16) -> Result<ColorCollection> {
        let count = read_u16_be(source)?;
        let mut palette = ColorCollection::with_capacity(count as usize);

        for _ in 0..count {
            let space = read_u16_be(source)?;
            let values = [
                read_u16_be(source)?,
                read_u16_be(source)?,
                read_u16_be(source)?,
                read_u16_be(source)?,
            ];
            let name = if version == 2 {
                let len = read_u32_be(source)? as usize;
                Some(read_utf16_be(source, len)?).filter(|name| !name.is_empty())
            } else {
                None
            };

            palette.push_named(decode(space, values)?, name);
        }

        tracing::debug!(version, count, "read ACO block");
        Ok(palette)
    }

    fn write_block(
        &self,
        sink: &mut dyn Write,
        palette: &ColorCollection,
        version: AcoVersion,
    ) -> Result<()> {
        let count = u16::try_from(palette.len()).map_err(|_| {
            PaletteError::invalid(format!(
                "an ACO file holds at most {} colors, got {}",
                u16::MAX,
                palette.len()
            ))
        })?;

        write_u16_be(sink, version.number())?;
        write_u16_be(sink, count)?;

        for (i, (color, name)) in palette.iter_named().enumerate() {
            write_u16_be(sink, self.color_space.code())?;
            for value in self.color_space.encode(color) {
                write_u16_be(sink, value)?;
            }

            if version == AcoVersion::V2 {
                let name = match name {
                    Some(name) if !name.is_empty() => name.to_owned(),
                    _ => format!("Swatch {}", i + 1),
                };
                write_u32_be(sink, name.encode_utf16().count() as u32)?;
                write_utf16_be(sink, &name)?;
            }
        }

        Ok(())
    }
}

impl PaletteSerializer for AcoSerializer {
    fn name(&self) -> &'static str {
        "Adobe Photoshop Color Swatch"
    }

    fn default_extension(&self) -> &'static str {
        "aco"
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        // The version word: high byte zero, low byte 1 or 2.
        match try_read_array::<2, _>(source) {
            Ok(Some([hi, lo])) => matches!(hi as u16 + lo as u16, 1 | 2),
            _ => false,
        }
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        let version = read_u16_be(source)?;
        if version != 1 && version != 2 {
            return Err(PaletteError::invalid(format!(
                "unsupported ACO version {version}"
            )));
        }

        let mut palette = self.read_block(source, version)?;

        // A version 2 block after version 1 supersedes it.
        if version == 1 && try_read_u16_be(source)? == Some(2) {
            palette = self.read_block(source, 2)?;
        }

        Ok(palette)
    }

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
        self.write_block(sink, palette, AcoVersion::V1)?;
        if self.version == AcoVersion::V2 {
            self.write_block(sink, palette, AcoVersion::V2)?;
        }
        Ok(())
    }
}
