//! Codec registry: lookup, content probing and file-dialog filters.

use crate::{PaletteError, PaletteSerializer, PaletteSource, Result};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};

/// Open and save filter strings in the `Label|mask|Label|mask` form used by
/// native file dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilters {
    pub open: String,
    pub save: String,
}

/// The set of available palette codecs, kept in ordinal name order.
///
/// Probing walks the codecs in that order and stops at the first one whose
/// [`can_read_from`](PaletteSerializer::can_read_from) accepts the input.
#[derive(Default)]
pub struct Registry {
    codecs: IndexMap<&'static str, Box<dyn PaletteSerializer>>,
    filters: OnceLock<FileFilters>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a codec. A codec with the same name replaces the earlier one.
    pub fn register<S: PaletteSerializer + 'static>(&mut self, codec: S) {
        self.register_boxed(Box::new(codec));
    }

    pub fn register_boxed(&mut self, codec: Box<dyn PaletteSerializer>) {
        let name = codec.name();
        if self.codecs.insert(name, codec).is_some() {
            warn!(codec = name, "replacing previously registered palette codec");
        }
        self.codecs.sort_keys();
        self.filters = OnceLock::new();
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn PaletteSerializer> {
        self.codecs.get(name).map(|codec| codec.as_ref())
    }

    /// Every codec, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn PaletteSerializer> + '_ {
        self.codecs.values().map(|codec| codec.as_ref())
    }

    pub fn readers(&self) -> impl Iterator<Item = &dyn PaletteSerializer> + '_ {
        self.iter().filter(|codec| codec.can_read())
    }

    pub fn writers(&self) -> impl Iterator<Item = &dyn PaletteSerializer> + '_ {
        self.iter().filter(|codec| codec.can_write())
    }

    /// Codecs claiming `ext`, in name order.
    pub fn find_by_extension(&self, ext: &str) -> Vec<&dyn PaletteSerializer> {
        self.iter()
            .filter(|codec| codec.handles_extension(ext))
            .collect()
    }

    /// First writable codec claiming the extension of `path`.
    pub fn writer_for_path(&self, path: &Path) -> Result<&dyn PaletteSerializer> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| PaletteError::UnsupportedFormat(path.display().to_string()))?;
        self.writers()
            .find(|codec| codec.handles_extension(ext))
            .ok_or_else(|| PaletteError::UnsupportedFormat(path.display().to_string()))
    }

    /// The writer behind a 1-based entry of the save filter.
    pub fn writer_for_filter_index(&self, filter_index: usize) -> Option<&dyn PaletteSerializer> {
        filter_index
            .checked_sub(1)
            .and_then(|i| self.writers().nth(i))
    }

    /// Find the codec able to read the file at `path`.
    ///
    /// The file is reopened for every candidate so one probe cannot disturb
    /// the next. `Ok(None)` means no codec recognised the contents.
    pub fn resolve(&self, path: &Path) -> Result<Option<&dyn PaletteSerializer>> {
        for codec in self.readers() {
            let mut reader = BufReader::new(File::open(path)?);
            let matched = codec.can_read_from(&mut reader);
            debug!(codec = codec.name(), path = %path.display(), matched, "probed palette");
            if matched {
                return Ok(Some(codec));
            }
        }
        Ok(None)
    }

    /// Probe a seekable source, rewinding to its current position before
    /// every candidate. The source is left at that position afterwards.
    pub fn resolve_source(
        &self,
        source: &mut dyn PaletteSource,
    ) -> Result<Option<&dyn PaletteSerializer>> {
        let start = source.stream_position()?;
        let mut found = None;
        for codec in self.readers() {
            source.seek(SeekFrom::Start(start))?;
            let matched = codec.can_read_from(source);
            debug!(codec = codec.name(), matched, "probed palette source");
            if matched {
                found = Some(codec);
                break;
            }
        }
        source.seek(SeekFrom::Start(start))?;
        Ok(found)
    }

    /// Probe an in-memory palette.
    pub fn resolve_bytes(&self, bytes: &[u8]) -> Option<&dyn PaletteSerializer> {
        self.readers()
            .find(|codec| codec.can_read_from(&mut Cursor::new(bytes)))
    }

    pub fn filters(&self) -> &FileFilters {
        self.filters.get_or_init(|| FileFilters {
            open: open_filter(self.readers()),
            save: save_filter(self.writers()),
        })
    }

    pub fn open_filter(&self) -> &str {
        &self.filters().open
    }

    pub fn save_filter(&self) -> &str {
        &self.filters().save
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.keys()).finish()
    }
}

fn masks(codec: &dyn PaletteSerializer) -> Vec<String> {
    codec
        .extensions()
        .iter()
        .map(|ext| format!("*.{ext}"))
        .collect()
}

fn filter_entry(codec: &dyn PaletteSerializer) -> String {
    let masks = masks(codec).join(";");
    format!("{} Files ({masks})|{masks}", codec.name())
}

fn open_filter<'a>(readers: impl Iterator<Item = &'a dyn PaletteSerializer>) -> String {
    let readers: Vec<_> = readers.collect();
    let mut parts = Vec::with_capacity(readers.len() + 2);

    if !readers.is_empty() {
        let all: IndexSet<String> = readers.iter().flat_map(|codec| masks(*codec)).collect();
        let all = all.into_iter().collect::<Vec<_>>().join(";");
        parts.push(format!("All Supported Palettes ({all})|{all}"));
    }
    parts.extend(readers.iter().map(|codec| filter_entry(*codec)));
    parts.push("All Files (*.*)|*.*".to_owned());

    parts.join("|")
}

fn save_filter<'a>(writers: impl Iterator<Item = &'a dyn PaletteSerializer>) -> String {
    writers.map(filter_entry).collect::<Vec<_>>().join("|")
}

/// A process-wide registry built on first use.
///
/// The builder runs under a lock the first time [`get`](Self::get) is
/// called, and again only after [`invalidate`](Self::invalidate).
pub struct SharedRegistry {
    build: fn(&mut Registry),
    slot: Mutex<Option<Arc<Registry>>>,
}

impl SharedRegistry {
    pub const fn new(build: fn(&mut Registry)) -> Self {
        Self {
            build,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Arc<Registry> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let registry = slot.get_or_insert_with(|| {
            let mut registry = Registry::new();
            (self.build)(&mut registry);
            debug!(codecs = registry.len(), "built palette registry");
            Arc::new(registry)
        });
        Arc::clone(registry)
    }

    /// Drop the cached registry. Handles already returned by `get` stay valid.
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let built = self
            .slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("SharedRegistry").field("built", &built).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, ColorCollection};
    use std::io::{Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts input starting with its magic byte.
    struct Magic {
        name: &'static str,
        ext: &'static str,
        magic: u8,
        writable: bool,
    }

    impl PaletteSerializer for Magic {
        fn name(&self) -> &'static str {
            self.name
        }

        fn default_extension(&self) -> &'static str {
            self.ext
        }

        fn can_write(&self) -> bool {
            self.writable
        }

        fn can_read_from(&self, source: &mut dyn PaletteSource) -> bool {
            let mut byte = [0u8; 1];
            source.read_exact(&mut byte).is_ok() && byte[0] == self.magic
        }

        fn deserialize(&self, _source: &mut dyn PaletteSource) -> Result<ColorCollection> {
            Ok(ColorCollection::from(vec![Color::rgb(self.magic, 0, 0)]))
        }

        fn serialize(&self, sink: &mut dyn Write, palette: &ColorCollection) -> Result<()> {
            sink.write_all(&[self.magic])?;
            for color in palette.iter() {
                sink.write_all(&[color.r])?;
            }
            Ok(())
        }
    }

    fn magic(name: &'static str, ext: &'static str, magic: u8, writable: bool) -> Magic {
        Magic {
            name,
            ext,
            magic,
            writable,
        }
    }

    fn sample() -> Registry {
        let mut registry = Registry::new();
        registry.register(magic("Zeta", "zz", b'z', true));
        registry.register(magic("Alpha", "aa;ab", b'a', false));
        registry.register(magic("Mid", "mm;aa", b'm', true));
        registry
    }

    #[test]
    fn test_sorted_by_name() {
        let names: Vec<_> = sample().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_ordinal_order_puts_uppercase_first() {
        let mut registry = Registry::new();
        registry.register(magic("b", "b", b'b', true));
        registry.register(magic("C", "c", b'c', true));
        let names: Vec<_> = registry.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["C", "b"]);
    }

    #[test]
    fn test_replacing_same_name() {
        let mut registry = sample();
        registry.register(magic("Mid", "new", b'n', true));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("Mid").unwrap().default_extension(), "new");
    }

    #[test]
    fn test_resolve_bytes_first_match() {
        let registry = sample();
        assert_eq!(registry.resolve_bytes(b"m...").map(|c| c.name()), Some("Mid"));
        assert!(registry.resolve_bytes(b"q").is_none());
        assert!(registry.resolve_bytes(b"").is_none());
    }

    #[test]
    fn test_resolve_source_rewinds() {
        let registry = sample();
        let mut cursor = Cursor::new(b"xz".to_vec());
        cursor.set_position(1);
        let found = registry.resolve_source(&mut cursor).unwrap();
        assert_eq!(found.map(|c| c.name()), Some("Zeta"));
        assert_eq!(cursor.position(), 1);

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"z");
    }

    #[test]
    fn test_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palette.bin");
        std::fs::write(&path, b"a").unwrap();

        let registry = sample();
        assert_eq!(registry.resolve(&path).unwrap().map(|c| c.name()), Some("Alpha"));

        let loaded = ColorCollection::load(&path, &registry).unwrap();
        assert_eq!(loaded[0], Color::rgb(b'a', 0, 0));

        std::fs::write(&path, b"?").unwrap();
        assert!(matches!(
            ColorCollection::load(&path, &registry),
            Err(PaletteError::NotFound(_))
        ));
    }

    #[test]
    fn test_extension_lookup() {
        let registry = sample();
        let names: Vec<_> = registry
            .find_by_extension(".AA")
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["Alpha", "Mid"]);

        let writer = registry.writer_for_path(Path::new("out.aa")).unwrap();
        assert_eq!(writer.name(), "Mid");
        assert!(matches!(
            registry.writer_for_path(Path::new("out.ab")),
            Err(PaletteError::UnsupportedFormat(_))
        ));
        assert!(registry.writer_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_filters() {
        let registry = sample();
        assert_eq!(
            registry.open_filter(),
            "All Supported Palettes (*.aa;*.ab;*.mm;*.zz)|*.aa;*.ab;*.mm;*.zz|\
             Alpha Files (*.aa;*.ab)|*.aa;*.ab|\
             Mid Files (*.mm;*.aa)|*.mm;*.aa|\
             Zeta Files (*.zz)|*.zz|\
             All Files (*.*)|*.*"
        );
        assert_eq!(
            registry.save_filter(),
            "Mid Files (*.mm;*.aa)|*.mm;*.aa|Zeta Files (*.zz)|*.zz"
        );
    }

    #[test]
    fn test_filters_rebuilt_on_register() {
        let mut registry = sample();
        let before = registry.save_filter().to_owned();
        registry.register(magic("Beta", "bb", b'b', true));
        assert_ne!(registry.save_filter(), before);
        assert!(registry.save_filter().starts_with("Beta Files (*.bb)|*.bb|"));
    }

    #[test]
    fn test_filter_index() {
        let registry = sample();
        assert!(registry.writer_for_filter_index(0).is_none());
        assert_eq!(registry.writer_for_filter_index(1).map(|c| c.name()), Some("Mid"));
        assert_eq!(registry.writer_for_filter_index(2).map(|c| c.name()), Some("Zeta"));
        assert!(registry.writer_for_filter_index(3).is_none());
    }

    #[test]
    fn test_save_with_read_only_codec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.aa");
        let palette = ColorCollection::from(vec![Color::BLACK]);
        let registry = sample();

        let err = palette
            .save_with(&path, registry.get("Alpha").unwrap())
            .unwrap_err();
        assert!(matches!(err, PaletteError::UnsupportedOperation { .. }));
        assert!(!path.exists());

        palette.save_with(&path, registry.get("Mid").unwrap()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), [b'm', 0]);
    }

    static BUILDS: AtomicUsize = AtomicUsize::new(0);

    fn build_sample(registry: &mut Registry) {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        registry.register(magic("Only", "o", b'o', true));
    }

    #[test]
    fn test_shared_registry_lazy_and_invalidated() {
        static SHARED: SharedRegistry = SharedRegistry::new(build_sample);

        assert_eq!(BUILDS.load(Ordering::SeqCst), 0);
        let first = SHARED.get();
        let second = SHARED.get();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);

        SHARED.invalidate();
        let third = SHARED.get();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 2);
        assert_eq!(first.len(), 1);
    }
}
