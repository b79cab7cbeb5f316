//! JASC / PaintShop Pro palette (.pal).
//!
//! `JASC-PAL`, `0100`, the color count, then one `R G B` line per color.

use std::io::Write;
use swatch_core::io::{lines, read_head, read_text};
use swatch_core::{Color, ColorCollection, PaletteError, PaletteSerializer, PaletteSource, Result};

const SIGNATURE: &str = "JASC-PAL";
const VERSION: &str = "0100";

#[derive(Debug, Clone, Copy, Default)]
pub struct JascPaletteSerializer;

fn parse_color(line: &str) -> Result<Color> {
    let invalid = || PaletteError::invalid(format!("invalid palette contents found with data '{line}'"));

    let mut parts = line.split([' ', '\t']).filter(|part| !part.is_empty());
    let mut channel = || -> Result<u8> {
        parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(invalid)
    };

    Ok(Color::rgb(channel()?, channel()?, channel()?))
}

impl PaletteSerializer for JascPaletteSerializer {
    fn name(&self) -> &'static str {
        "JASC Palette"
    }

    fn default_extension(&self) -> &'static str {
        "pal"
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        let Some(head) = read_head(source, 32) else {
            return false;
        };
        let mut lines = lines(&head);
        lines.next() == Some(SIGNATURE) && lines.next() == Some(VERSION)
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        let text = read_text(source)?;
        let mut lines = lines(&text);

        if lines.next() != Some(SIGNATURE) || lines.next() != Some(VERSION) {
            return Err(PaletteError::invalid("invalid JASC palette header"));
        }

        let count: usize = lines
            .next()
            .and_then(|line| line.trim().parse().ok())
            .ok_or_else(|| PaletteError::invalid("invalid JASC color count"))?;

        let mut palette = ColorCollection::with_capacity(count.min(4096));
        for i in 0..count {
            let line = lines.next().ok_or_else(|| {
                PaletteError::invalid(format!("expected {count} colors, found {i}"))
            })?;
            palette.push(parse_color(line)?);
        }

        Ok(palette)
    }

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
        write!(sink, "{SIGNATURE}\n{VERSION}\n{}\n", palette.len())?;
        for color in palette.iter() {
            writeln!(sink, "{} {} {} ", color.r, color.g, color.b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<ColorCollection> {
        JascPaletteSerializer.deserialize(&mut Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_exact_output() {
        let palette = ColorCollection::from(vec![Color::rgb(255, 0, 0), Color::rgb(0, 255, 0)]);
        let mut out = Vec::new();
        JascPaletteSerializer.serialize(&mut out, &palette).unwrap();
        assert_eq!(out, b"JASC-PAL\n0100\n2\n255 0 0 \n0 255 0 \n");

        let back = JascPaletteSerializer.deserialize(&mut Cursor::new(out)).unwrap();
        assert_eq!(back, palette);
    }

    #[test]
    fn test_sniff() {
        let codec = JascPaletteSerializer;
        assert!(codec.can_read_from(&mut Cursor::new(b"JASC-PAL\r\n0100\r\n1\r\n".to_vec())));
        assert!(!codec.can_read_from(&mut Cursor::new(b"JASC-PAL\n0200\n".to_vec())));
        assert!(!codec.can_read_from(&mut Cursor::new(b"JASC-PAL\n".to_vec())));
        assert!(!codec.can_read_from(&mut Cursor::new(vec![0, 1, 2])));
    }

    #[test]
    fn test_crlf_and_tabs() {
        let palette = parse("JASC-PAL\r\n0100\r\n2\r\n1\t2\t3\r\n 4  5 6 \r\n").unwrap();
        assert_eq!(palette.colors(), [Color::rgb(1, 2, 3), Color::rgb(4, 5, 6)]);
    }

    #[test]
    fn test_extra_lines_ignored() {
        let palette = parse("JASC-PAL\n0100\n1\n1 2 3\n4 5 6\n").unwrap();
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_missing_color_line() {
        assert!(matches!(
            parse("JASC-PAL\n0100\n3\n1 2 3\n"),
            Err(PaletteError::InvalidData(_))
        ));
    }

    #[test]
    fn test_short_color_line() {
        assert!(matches!(
            parse("JASC-PAL\n0100\n1\n1 2\n"),
            Err(PaletteError::InvalidData(_))
        ));
    }

    #[test]
    fn test_bad_header_and_count() {
        assert!(parse("JASC-PAL\n0101\n0\n").is_err());
        assert!(matches!(
            parse("JASC-PAL\n0100\nmany\n"),
            Err(PaletteError::InvalidData(_))
        ));
    }
}
