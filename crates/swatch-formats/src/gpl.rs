//! GIMP Palette (.gpl).
//!
//! ```text
//! GIMP Palette
//! Name: Example
//! Columns: 8
//! #
//! 255 0   0   Red
//! ```
//!
//! Attribute lines before the first `#` line are ignored. After it, every
//! non-empty line not starting with `#` is `R G B [name...]`.

use std::io::Write;
use swatch_core::io::{first_line, lines, read_text};
use swatch_core::{Color, ColorCollection, PaletteError, PaletteSerializer, PaletteSource, Result};

const SIGNATURE: &str = "GIMP Palette";

#[derive(Debug, Clone, Copy, Default)]
pub struct GimpPaletteSerializer;

fn parse_channel(field: &str, line: &str) -> Result<u8> {
    field
        .parse()
        .map_err(|_| PaletteError::invalid(format!("invalid palette contents found with data '{line}'")))
}

impl PaletteSerializer for GimpPaletteSerializer {
    fn name(&self) -> &'static str {
        "GIMP Palette"
    }

    fn default_extension(&self) -> &'static str {
        "gpl"
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        first_line(source, 64).is_some_and(|line| line == SIGNATURE)
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        let text = read_text(source)?;
        let mut lines = lines(&text);

        if lines.next() != Some(SIGNATURE) {
            return Err(PaletteError::invalid("missing 'GIMP Palette' header"));
        }

        let mut palette = ColorCollection::new();
        let mut reading = false;

        for line in lines.filter(|line| !line.is_empty()) {
            if line.starts_with('#') {
                reading = true;
                continue;
            }
            if !reading {
                continue;
            }

            let parts: Vec<&str> = line
                .split([' ', '\t'])
                .filter(|part| !part.is_empty())
                .collect();
            if parts.len() < 3 {
                return Err(PaletteError::invalid(format!(
                    "invalid palette contents found with data '{line}'"
                )));
            }

            let color = Color::rgb(
                parse_channel(parts[0], line)?,
                parse_channel(parts[1], line)?,
                parse_channel(parts[2], line)?,
            );
            let name = (parts.len() > 3).then(|| parts[3..].join(" "));
            palette.push_named(color, name);
        }

        Ok(palette)
    }

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
        write!(sink, "{SIGNATURE}\nName: \nColumns: 8\n#\n")?;

        for (i, (color, name)) in palette.iter_named().enumerate() {
            write!(sink, "{:<3} {:<3} {:<3} ", color.r, color.g, color.b)?;
            match name {
                Some(name) => write!(sink, "{name}")?,
                None => write!(
                    sink,
                    "#{:02X}{:02X}{:02X} Swatch {i}",
                    color.r, color.g, color.b
                )?,
            }
            writeln!(sink)?;
        }

        Ok(())
    }
}
