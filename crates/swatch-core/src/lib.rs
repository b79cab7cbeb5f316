//! swatch-core: color palettes and the codec seam
//!
//! Holds the palette data model shared by every palette codec: the
//! [`Color`] value type and its HSL view, the observable
//! [`ColorCollection`], the [`PaletteSerializer`] contract that codecs
//! implement, and the [`Registry`] that resolves a file to the codec able
//! to read it.

mod collection;
mod color;
mod compare;
mod error;
mod palettes;
mod registry;
mod serializer;

pub mod io;

pub use collection::{ColorCollection, CollectionChange, SubscriptionId};
pub use color::{Color, HslColor};
pub use compare::{SortOrder, brightness, hue, perceived_brightness, value};
pub use error::{PaletteError, Result};
pub use palettes::{NamedPalette, scaled_palette};
pub use registry::{FileFilters, Registry, SharedRegistry};
pub use serializer::{PaletteSerializer, PaletteSource};
