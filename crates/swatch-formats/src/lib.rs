//! Palette file codecs for swatch, pure Rust.
//!
//! Implements the six palette formats understood by the swatch registry.
//!
//! # Features
//! - `aco` (default) Adobe Photoshop Color Swatch
//! - `gpl` (default) GIMP Palette
//! - `ilbm` (default) IFF Interleaved Bitmap colour maps, read only
//! - `jasc` (default) JASC / PaintShop Pro palette
//! - `paintnet` (default) Paint.NET palette
//! - `raw` (default) headerless RGB triples

use std::path::Path;
use swatch_core::{ColorCollection, PaletteError, Registry, Result, SharedRegistry};

#[cfg(feature = "aco")]
mod aco;
#[cfg(feature = "gpl")]
mod gpl;
#[cfg(feature = "ilbm")]
mod ilbm;
#[cfg(feature = "jasc")]
mod jasc;
#[cfg(feature = "paintnet")]
mod paintnet;
#[cfg(feature = "raw")]
mod raw;

#[cfg(feature = "aco")]
pub use aco::{AcoColorSpace, AcoSerializer, AcoVersion};
#[cfg(feature = "gpl")]
pub use gpl::GimpPaletteSerializer;
#[cfg(feature = "ilbm")]
pub use ilbm::InterleavedBitmapPaletteSerializer;
#[cfg(feature = "jasc")]
pub use jasc::JascPaletteSerializer;
#[cfg(feature = "paintnet")]
pub use paintnet::PaintNetPaletteSerializer;
#[cfg(feature = "raw")]
pub use raw::RawPaletteSerializer;

/// Register all enabled palette codecs with the registry.
pub fn register_all(registry: &mut Registry) {
    #[cfg(feature = "aco")]
    registry.register(AcoSerializer::default());
    #[cfg(feature = "gpl")]
    registry.register(GimpPaletteSerializer);
    #[cfg(feature = "ilbm")]
    registry.register(InterleavedBitmapPaletteSerializer);
    #[cfg(feature = "jasc")]
    registry.register(JascPaletteSerializer);
    #[cfg(feature = "paintnet")]
    registry.register(PaintNetPaletteSerializer);
    #[cfg(feature = "raw")]
    registry.register(RawPaletteSerializer);
}

// ============================================
// Process-wide registry
// ============================================

static DEFAULT: SharedRegistry = SharedRegistry::new(register_all);

/// The shared registry holding every enabled codec.
pub fn default_registry() -> std::sync::Arc<Registry> {
    DEFAULT.get()
}

/// Rebuild the shared registry on its next use.
pub fn invalidate_default_registry() {
    DEFAULT.invalidate();
}

/// Load a palette file with whichever codec recognises its contents.
pub fn load_palette(path: impl AsRef<Path>) -> Result<ColorCollection> {
    ColorCollection::load(path, &default_registry())
}

/// Save a palette, choosing the codec from the file extension.
pub fn save_palette(path: impl AsRef<Path>, palette: &ColorCollection) -> Result<()> {
    let path = path.as_ref();
    let registry = default_registry();
    let codec = registry.writer_for_path(path)?;
    palette.save_with(path, codec)
}

/// Decode an in-memory palette, probing its contents.
pub fn read_palette_bytes(bytes: &[u8]) -> Result<ColorCollection> {
    let registry = default_registry();
    let codec = registry
        .resolve_bytes(bytes)
        .ok_or_else(|| PaletteError::NotFound("no palette codec recognises the data".into()))?;
    codec.deserialize(&mut std::io::Cursor::new(bytes))
}
