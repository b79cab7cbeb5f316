//! IFF Interleaved Bitmap (.bbm, .lbm) colour maps.
//!
//! The file is a `FORM` container of type `ILBM` or `PBM `. Chunks are a
//! four byte tag, a big-endian length and the payload, padded to an even
//! size. Only the first `CMAP` chunk is read. Writing is not supported.

use std::io::{Seek, SeekFrom, Write};
use swatch_core::io::{read_array, read_bytes, read_u32_be, try_read_array};
use swatch_core::{Color, ColorCollection, PaletteError, PaletteSerializer, PaletteSource, Result};

const FORM: &[u8; 4] = b"FORM";
const CMAP: &[u8; 4] = b"CMAP";

fn is_bitmap(kind: &[u8; 4]) -> bool {
    kind == b"ILBM" || kind == b"PBM "
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InterleavedBitmapPaletteSerializer;

impl PaletteSerializer for InterleavedBitmapPaletteSerializer {
    fn name(&self) -> &'static str {
        "Interleaved Bitmap Palette"
    }

    fn default_extension(&self) -> &'static str {
        "bbm;lbm"
    }

    fn can_write(&self) -> bool {
        false
    }

    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
        let mut header = || -> Result<bool> {
            let form = read_array::<4, _>(source)?;
            read_u32_be(source)?;
            Ok(&form == FORM && is_bitmap(&read_array(source)?))
        };
        header().unwrap_or(false)
    }

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection> {
        if &read_array::<4, _>(source)? != FORM {
            return Err(PaletteError::invalid("form header not found"));
        }
        let _form_len = read_u32_be(source)?;
        if !is_bitmap(&read_array::<4, _>(source)?) {
            return Err(PaletteError::invalid("bitmap header not found"));
        }

        let mut palette = ColorCollection::new();

        while let Some(tag) = try_read_array::<4, _>(source)? {
            let len = read_u32_be(source)?;

            if &tag == CMAP {
                tracing::trace!(len, "reading CMAP chunk");
                let data = read_bytes(source, (len / 3 * 3) as usize)?;
                palette.extend(data.chunks_exact(3).map(|rgb| Color::rgb(rgb[0], rgb[1], rgb[2])));
                break;
            }

            tracing::trace!(
                tag = %String::from_utf8_lossy(&tag),
                len,
                "skipping chunk"
            );
            let padded = i64::from(len) + i64::from(len % 2);
            source.seek(SeekFrom::Current(padded))?;
        }

        Ok(palette)
    }

    fn serialize(&self, _sink: &mut dyn Write, _palette: &ColorCollection) -> Result<()> {
        Err(PaletteError::UnsupportedOperation {
            codec: self.name(),
            operation: "writing",
        })
    }
}
