//! Headerless palette of 8-bit `R G B` triples (.pal).
//!
//! There is no signature, so any stream whose length is a multiple of three
//! is accepted. The registry probes this codec last.

use std::io::{Read, Seek, SeekFrom, Write};
use swatch_core::{Color, ColorCollection, PaletteSerializer, PaletteSource, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct RawPaletteSerializer;

impl PaletteSerializer for RawPaletteSerializer {
    fn name(&self) -> &'static str {
        "Raw Palette"
    }

    fn default_extension(&self) -> &'static str {
        "pal"
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        let Ok(start) = source.stream_position() else {
            return false;
        };
        source
            .seek(SeekFrom::End(0))
            .is_ok_and(|end| end.saturating_sub(start) % 3 == 0)
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        Ok(bytes
            .chunks_exact(3)
            .map(|rgb| Color::rgb(rgb[0], rgb[1], rgb[2]))
            .collect())
    }

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
        let bytes: Vec<u8> = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
        sink.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sniff_length() {
        let codec = RawPaletteSerializer;
        assert!(codec.can_read_from(&mut Cursor::new(vec![0; 768])));
        assert!(codec.can_read_from(&mut Cursor::new(Vec::new())));
        assert!(!codec.can_read_from(&mut Cursor::new(vec![0; 10])));
    }

    #[test]
    fn test_alpha_dropped_on_write() {
        let palette = ColorCollection::from(vec![Color::argb(10, 1, 2, 3), Color::rgb(4, 5, 6)]);
        let mut out = Vec::new();
        RawPaletteSerializer.serialize(&mut out, &palette).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);

        let back = RawPaletteSerializer.deserialize(&mut Cursor::new(out)).unwrap();
        assert_eq!(back.colors(), [Color::rgb(1, 2, 3), Color::rgb(4, 5, 6)]);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let palette = RawPaletteSerializer
            .deserialize(&mut Cursor::new(vec![9, 8, 7, 6]))
            .unwrap();
        assert_eq!(palette.colors(), [Color::rgb(9, 8, 7)]);
    }
}
