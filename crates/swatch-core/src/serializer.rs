//! The codec seam.

use crate::{ColorCollection, Result};
use std::io::{Read, Seek, Write};

/// A readable, seekable byte source handed to codecs.
///
/// Implemented for every `Read + Seek` type, so files, buffered readers and
/// in-memory cursors all qualify.
pub trait PaletteSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> PaletteSource for T {}

/// A palette file format.
///
/// Implementations are stateless apart from their options and are shared
/// across threads through a [`Registry`](crate::Registry).
pub trait PaletteSerializer: Send + Sync {
    /// Display name, also the key the registry sorts and looks codecs up by.
    fn name(&self) -> &'static str;

    /// Extensions without the leading dot, `;`-separated (e.g. `"bbm;lbm"`).
    fn default_extension(&self) -> &'static str;

    fn extensions(&self) -> Vec<&'static str> {
        self.default_extension()
            .split(';')
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    /// Sniff the start of `source`.
    ///
    /// Never fails: an I/O error or unreadable content is a negative answer.
    /// The source position afterwards is unspecified.
    fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool;

    fn deserialize(&self, source: &mut dyn PaletteSource) -> Result<ColorCollection>;

    fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()>;

    /// Whether `ext` (with or without a leading dot) is one of this codec's
    /// extensions. Case is ignored.
    fn handles_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}
