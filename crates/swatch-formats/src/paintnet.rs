//! Paint.NET palette (.txt).
//!
//! Comment lines start with `;`. Every other eight character line is a
//! colour written as `AARRGGBB` hex. Paint.NET itself pads or truncates to
//! 96 entries when loading; the whole collection is written here.

use std::io::Write;
use swatch_core::io::{first_line, lines, read_text};
use swatch_core::{Color, ColorCollection, PaletteError, PaletteSerializer, PaletteSource, Result};

const HEADER: &str = "\
; Paint.NET Palette File
; Lines that start with a semicolon are comments
; Colors are written as 8-digit hexadecimal numbers: aarrggbb
; For example, this would specify green: FF00FF00
; The alpha ('aa') value specifies how transparent a color is. FF is fully opaque, 00 is fully transparent.
; A palette must consist of ninety six (96) colors. If there are less than this, the remaining color
; slots will be set to white (FFFFFFFF). If there are more, then the remaining colors will be ignored.
";

#[derive(Debug, Clone, Copy, Default)]
pub struct PaintNetPaletteSerializer;

impl PaletteSerializer for PaintNetPaletteSerializer {
    fn name(&self) -> &'static str {
        "Paint.NET Palette"
    }

    fn default_extension(&self) -> &'static str {
        "txt"
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        first_line(source, 256).is_some_and(|line| line.starts_with(';'))
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        let text = read_text(source)?;
        let mut palette = ColorCollection::new();

        for line in lines(&text).filter(|line| line.len() == 8 && !line.starts_with(';')) {
            if !line.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(PaletteError::invalid(format!(
                    "invalid palette contents found with data '{line}'"
                )));
            }
            let packed = u32::from_str_radix(line, 16)
                .map_err(|e| PaletteError::invalid(e.to_string()))?;
            palette.push(Color::from_argb(packed));
        }

        Ok(palette)
    }

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
        sink.write_all(HEADER.as_bytes())?;
        for color in palette.iter() {
            writeln!(sink, "{:08X}", color.to_argb())?;
        }
        Ok(())
    }
}
