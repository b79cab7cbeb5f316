//! The ordered, observable palette container.

use crate::{Color, PaletteError, PaletteSerializer, Registry, Result, SortOrder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A structural change, delivered to listeners after it has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    Inserted { index: usize, color: Color },
    Removed { index: usize, color: Color },
    Replaced { index: usize, old: Color, new: Color },
    /// The swatch name at `index` changed.
    Renamed { index: usize, color: Color },
    Cleared,
}

/// Handle returned by [`ColorCollection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CollectionChange) + Send + Sync>;

/// Packed ARGB to first position.
type ReverseIndex = HashMap<u32, usize>;

/// An ordered palette. Duplicates are allowed and every entry may carry a
/// swatch name.
///
/// [`find`](Self::find) is backed by a reverse index that is built on the
/// first lookup and kept up to date by tail insertions. Any mutation that
/// shifts positions drops it and the next lookup rebuilds it.
///
/// Removing one occurrence of a duplicated color drops that color's key
/// from a live index, which hides the other occurrences from `find` until
/// [`rebuild_index`](Self::rebuild_index) is called or a later mutation
/// invalidates the index.
pub struct ColorCollection {
    colors: Vec<Color>,
    names: Vec<Option<String>>,
    index: Mutex<Option<ReverseIndex>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl ColorCollection {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            colors: Vec::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
            index: Mutex::new(None),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Build from packed `0xAARRGGBB` values.
    pub fn from_argb(values: impl IntoIterator<Item = u32>) -> Self {
        values.into_iter().map(Color::from_argb).collect()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().copied()
    }

    /// Colors paired with their swatch names.
    pub fn iter_named(&self) -> impl Iterator<Item = (Color, Option<&str>)> + '_ {
        self.colors
            .iter()
            .copied()
            .zip(self.names.iter().map(|n| n.as_deref()))
    }

    /// Swatch name at `index`, if one was set.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|n| n.as_deref())
    }

    pub fn set_name(&mut self, index: usize, name: Option<String>) -> Result<()> {
        let color = self.check_index(index)?;
        self.names[index] = name;
        self.notify(CollectionChange::Renamed { index, color });
        Ok(())
    }

    pub fn push(&mut self, color: Color) {
        self.push_named(color, None);
    }

    pub fn push_named(&mut self, color: Color, name: Option<String>) {
        let index = self.colors.len();
        self.insert_unchecked(index, color, name);
    }

    /// Insert at `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, color: Color) -> Result<()> {
        self.insert_named(index, color, None)
    }

    pub fn insert_named(&mut self, index: usize, color: Color, name: Option<String>) -> Result<()> {
        if index > self.colors.len() {
            return Err(PaletteError::IndexOutOfRange {
                index,
                len: self.colors.len(),
            });
        }
        self.insert_unchecked(index, color, name);
        Ok(())
    }

    fn insert_unchecked(&mut self, index: usize, color: Color, name: Option<String>) {
        let at_tail = index == self.colors.len();
        self.colors.insert(index, color);
        self.names.insert(index, name);

        let slot = self.index.get_mut().unwrap_or_else(PoisonError::into_inner);
        if at_tail {
            if let Some(map) = slot.as_mut() {
                map.entry(color.to_argb()).or_insert(index);
            }
        } else {
            *slot = None;
        }

        self.notify(CollectionChange::Inserted { index, color });
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Color> {
        self.check_index(index)?;
        let color = self.colors.remove(index);
        self.names.remove(index);

        let shifted = index < self.colors.len();
        let slot = self.index.get_mut().unwrap_or_else(PoisonError::into_inner);
        if shifted {
            *slot = None;
        } else if let Some(map) = slot.as_mut() {
            map.remove(&color.to_argb());
        }

        self.notify(CollectionChange::Removed { index, color });
        Ok(color)
    }

    /// Replace the color at `index`, keeping its swatch name. Returns the old color.
    pub fn replace(&mut self, index: usize, color: Color) -> Result<Color> {
        let old = self.check_index(index)?;
        self.colors[index] = color;

        let slot = self.index.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = slot.as_mut()
            && old.to_argb() != color.to_argb()
        {
            if map.get(&old.to_argb()) == Some(&index) {
                map.remove(&old.to_argb());
            }
            let first = map.entry(color.to_argb()).or_insert(index);
            *first = (*first).min(index);
        }

        self.notify(CollectionChange::Replaced {
            index,
            old,
            new: color,
        });
        Ok(old)
    }

    pub fn clear(&mut self) {
        self.colors.clear();
        self.names.clear();
        *self.index.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
        self.notify(CollectionChange::Cleared);
    }

    /// Position of the first entry equal to `color` (alpha included).
    pub fn find(&self, color: Color) -> Option<usize> {
        let mut slot = self.lock_index();
        let map = slot.get_or_insert_with(|| build_index(&self.colors));
        map.get(&color.to_argb()).copied()
    }

    /// Position of the first entry with the same red, green and blue.
    pub fn find_ignoring_alpha(&self, color: Color) -> Option<usize> {
        self.colors
            .iter()
            .position(|c| c.to_rgb24() == color.to_rgb24())
    }

    pub fn contains(&self, color: Color) -> bool {
        self.find(color).is_some()
    }

    /// Discard the reverse index and build it afresh from the current contents.
    pub fn rebuild_index(&self) {
        *self.lock_index() = Some(build_index(&self.colors));
    }

    /// Reorder the entries. Listeners see a [`CollectionChange::Cleared`]
    /// followed by one insertion per entry.
    pub fn sort(&mut self, order: SortOrder) {
        let mut entries: Vec<(Color, Option<String>)> = self
            .colors
            .drain(..)
            .zip(self.names.drain(..))
            .collect();
        entries.sort_unstable_by(|a, b| order.compare(&a.0, &b.0));

        self.clear();
        for (color, name) in entries {
            self.push_named(color, name);
        }
    }

    /// Register a listener for structural changes.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CollectionChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Read a palette file, picking the codec by probing its contents.
    pub fn load(path: impl AsRef<Path>, registry: &Registry) -> Result<Self> {
        let path = path.as_ref();
        let codec = registry.resolve(path)?.ok_or_else(|| {
            PaletteError::NotFound(format!("no palette codec recognises {}", path.display()))
        })?;
        let mut reader = BufReader::new(File::open(path)?);
        codec.deserialize(&mut reader)
    }

    /// Write with a default-configured `S`.
    pub fn save<S: PaletteSerializer + Default>(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with(path, &S::default())
    }

    /// Write with `codec`, replacing any existing file.
    ///
    /// The palette is encoded in memory first, so a failed encode leaves an
    /// existing file untouched.
    pub fn save_with(&self, path: impl AsRef<Path>, codec: &dyn PaletteSerializer) -> Result<()> {
        if !codec.can_write() {
            return Err(PaletteError::UnsupportedOperation {
                codec: codec.name(),
                operation: "writing",
            });
        }
        let mut bytes = Vec::new();
        codec.serialize(&mut bytes, self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<Color> {
        self.colors
            .get(index)
            .copied()
            .ok_or(PaletteError::IndexOutOfRange {
                index,
                len: self.colors.len(),
            })
    }

    fn lock_index(&self) -> MutexGuard<'_, Option<ReverseIndex>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&mut self, change: CollectionChange) {
        for (_, listener) in &mut self.listeners {
            listener(&change);
        }
    }
}

fn build_index(colors: &[Color]) -> ReverseIndex {
    tracing::trace!(len = colors.len(), "building reverse color index");
    let mut map = HashMap::with_capacity(colors.len());
    for (i, color) in colors.iter().enumerate() {
        map.entry(color.to_argb()).or_insert(i);
    }
    map
}

impl Default for ColorCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies colors and names. Listeners stay with the original.
impl Clone for ColorCollection {
    fn clone(&self) -> Self {
        Self {
            colors: self.colors.clone(),
            names: self.names.clone(),
            index: Mutex::new(None),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl PartialEq for ColorCollection {
    fn eq(&self, other: &Self) -> bool {
        self.colors.len() == other.colors.len()
            && self
                .colors
                .iter()
                .zip(&other.colors)
                .all(|(a, b)| a.to_argb() == b.to_argb())
    }
}

impl Eq for ColorCollection {}

impl fmt::Debug for ColorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorCollection")
            .field("colors", &self.colors)
            .field("names", &self.names)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl std::ops::Index<usize> for ColorCollection {
    type Output = Color;

    fn index(&self, index: usize) -> &Color {
        &self.colors[index]
    }
}

impl FromIterator<Color> for ColorCollection {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut collection = ColorCollection::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<Color> for ColorCollection {
    fn extend<I: IntoIterator<Item = Color>>(&mut self, iter: I) {
        for color in iter {
            self.push(color);
        }
    }
}

impl From<Vec<Color>> for ColorCollection {
    fn from(colors: Vec<Color>) -> Self {
        colors.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ColorCollection {
    type Item = &'a Color;
    type IntoIter = std::slice::Iter<'a, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}

// ============================================
// Serde: a sequence of {a, r, g, b, name?}
// ============================================

#[derive(Serialize)]
struct EntryRef<'a> {
    a: u8,
    r: u8,
    g: u8,
    b: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(default = "opaque")]
    a: u8,
    r: u8,
    g: u8,
    b: u8,
    #[serde(default)]
    name: Option<String>,
}

fn opaque() -> u8 {
    255
}

impl Serialize for ColorCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_named().map(|(c, name)| EntryRef {
            a: c.a,
            r: c.r,
            g: c.g,
            b: c.b,
            name,
        }))
    }
}

impl<'de> Deserialize<'de> for ColorCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        let mut collection = ColorCollection::with_capacity(entries.len());
        for entry in entries {
            collection.push_named(Color::argb(entry.a, entry.r, entry.g, entry.b), entry.name);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn recorder(collection: &mut ColorCollection) -> Arc<Mutex<Vec<CollectionChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        collection.subscribe(move |change| sink.lock().unwrap().push(change.clone()));
        log
    }

    fn linear_find(collection: &ColorCollection, color: Color) -> Option<usize> {
        collection.colors().iter().position(|c| *c == color)
    }

    #[test]
    fn test_find_first_occurrence() {
        let c = ColorCollection::from(vec![RED, GREEN, RED, BLUE]);
        assert_eq!(c.find(RED), Some(0));
        assert_eq!(c.find(BLUE), Some(3));
        assert_eq!(c.find(Color::WHITE), None);
    }

    #[test]
    fn test_find_respects_alpha() {
        let c = ColorCollection::from(vec![RED.with_alpha(10)]);
        assert_eq!(c.find(RED), None);
        assert_eq!(c.find_ignoring_alpha(RED), Some(0));
    }

    #[test]
    fn test_tail_insert_keeps_index() {
        let mut c = ColorCollection::from(vec![RED]);
        assert_eq!(c.find(RED), Some(0));
        c.push(GREEN);
        c.push(RED);
        assert!(c.index.lock().unwrap().is_some());
        assert_eq!(c.find(GREEN), Some(1));
        assert_eq!(c.find(RED), Some(0));
    }

    #[test]
    fn test_front_insert_invalidates_index() {
        let mut c = ColorCollection::from(vec![RED, GREEN]);
        assert_eq!(c.find(GREEN), Some(1));
        c.insert(0, BLUE).unwrap();
        assert!(c.index.lock().unwrap().is_none());
        assert_eq!(c.find(GREEN), Some(2));
        assert_eq!(c.find(BLUE), Some(0));
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut c = ColorCollection::new();
        assert!(matches!(
            c.insert(1, RED),
            Err(PaletteError::IndexOutOfRange { index: 1, len: 0 })
        ));
        assert!(matches!(
            c.remove_at(0),
            Err(PaletteError::IndexOutOfRange { .. })
        ));
        assert!(c.replace(0, RED).is_err());
    }

    #[test]
    fn test_index_matches_linear_scan() {
        let palette = [RED, GREEN, BLUE, Color::WHITE, Color::BLACK];
        let mut c = ColorCollection::new();
        let mut seed = 7u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as usize
        };

        for _ in 0..500 {
            let color = palette[next() % palette.len()];
            match next() % 4 {
                0 => c.push(color),
                1 => {
                    let at = next() % (c.len() + 1);
                    c.insert(at, color).unwrap();
                }
                2 if !c.is_empty() => {
                    let at = next() % c.len();
                    c.remove_at(at).unwrap();
                }
                3 if !c.is_empty() => {
                    let at = next() % c.len();
                    c.replace(at, color).unwrap();
                }
                _ => {}
            }

            for probe in palette {
                if let Some(i) = c.find(probe) {
                    assert_eq!(c[i], probe);
                }
            }
        }

        c.rebuild_index();
        for probe in palette {
            assert_eq!(c.find(probe), linear_find(&c, probe));
        }
    }

    #[test]
    fn test_index_complete_without_duplicates() {
        let mut c = ColorCollection::from_argb((0..50).map(|i| 0xFF00_0000 | i));
        assert_eq!(c.find(Color::from_argb(0xFF00_0000)), Some(0));
        c.remove_at(10).unwrap();
        assert_eq!(c.find(Color::from_argb(0xFF00_000B)), Some(10));
        c.replace(0, Color::from_argb(0xFF00_1000)).unwrap();
        assert_eq!(c.find(Color::from_argb(0xFF00_0000)), None);
        c.remove_at(c.len() - 1).unwrap();
        c.push(Color::from_argb(0xFF00_2000));
        assert!(c.index.lock().unwrap().is_some());
        for (i, color) in c.iter().enumerate() {
            assert_eq!(c.find(color), Some(i));
        }
    }

    #[test]
    fn test_tail_removal_of_duplicate_hides_earlier_occurrence() {
        let mut c = ColorCollection::from(vec![RED, GREEN, RED]);
        assert_eq!(c.find(RED), Some(0));

        c.remove_at(2).unwrap();
        assert_eq!(c.find(RED), None);
        assert_eq!(c.find_ignoring_alpha(RED), Some(0));

        c.rebuild_index();
        assert_eq!(c.find(RED), Some(0));
    }

    #[test]
    fn test_replace_updates_index() {
        let mut c = ColorCollection::from(vec![RED, GREEN, BLUE]);
        assert_eq!(c.find(BLUE), Some(2));
        let old = c.replace(0, BLUE).unwrap();
        assert_eq!(old, RED);
        assert_eq!(c.find(RED), None);
        assert_eq!(c.find(BLUE), Some(0));
    }

    #[test]
    fn test_notifications() {
        let mut c = ColorCollection::new();
        let log = recorder(&mut c);

        c.push(RED);
        c.insert(0, GREEN).unwrap();
        c.replace(1, BLUE).unwrap();
        c.set_name(1, Some("Blue".into())).unwrap();
        c.remove_at(0).unwrap();
        c.clear();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                CollectionChange::Inserted { index: 0, color: RED },
                CollectionChange::Inserted { index: 0, color: GREEN },
                CollectionChange::Replaced { index: 1, old: RED, new: BLUE },
                CollectionChange::Renamed { index: 1, color: BLUE },
                CollectionChange::Removed { index: 0, color: GREEN },
                CollectionChange::Cleared,
            ]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut c = ColorCollection::new();
        let log = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&log);
        let id = c.subscribe(move |_| *sink.lock().unwrap() += 1);
        c.push(RED);
        assert!(c.unsubscribe(id));
        assert!(!c.unsubscribe(id));
        c.push(GREEN);
        assert_eq!(*log.lock().unwrap(), 1);
    }

    #[test]
    fn test_sort_value_descending() {
        let mut c = ColorCollection::from(vec![BLUE, RED, GREEN, Color::WHITE, Color::BLACK]);
        c.sort(SortOrder::Value);
        let values: Vec<u32> = c.iter().map(Color::to_rgb24).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]), "{values:?}");
    }

    #[test]
    fn test_sort_hue_and_brightness_ascending() {
        let colors: Vec<Color> = (0..40u8)
            .map(|i| Color::rgb(i.wrapping_mul(37), i.wrapping_mul(91), i.wrapping_mul(13)))
            .collect();

        let mut c = ColorCollection::from(colors.clone());
        c.sort(SortOrder::Hue);
        assert!(c.colors().windows(2).all(|w| w[0].hue() <= w[1].hue()));

        let mut c = ColorCollection::from(colors);
        c.sort(SortOrder::Brightness);
        assert!(c.colors().windows(2).all(|w| {
            crate::perceived_brightness(w[0]) <= crate::perceived_brightness(w[1])
        }));
    }

    #[test]
    fn test_sort_keeps_names_with_colors() {
        let mut c = ColorCollection::new();
        c.push_named(RED, Some("red".into()));
        c.push_named(BLUE, Some("blue".into()));
        c.push(GREEN);
        c.sort(SortOrder::Value);
        let named: Vec<_> = c.iter_named().map(|(c, n)| (c, n.map(str::to_owned))).collect();
        assert_eq!(
            named,
            vec![
                (RED, Some("red".to_owned())),
                (GREEN, None),
                (BLUE, Some("blue".to_owned())),
            ]
        );
    }

    #[test]
    fn test_sort_notifies_clear_then_inserts() {
        let mut c = ColorCollection::from(vec![BLUE, RED]);
        let log = recorder(&mut c);
        c.sort(SortOrder::Value);
        let log = log.lock().unwrap();
        assert_eq!(log[0], CollectionChange::Cleared);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_equality_ignores_names() {
        let mut a = ColorCollection::from(vec![RED, GREEN]);
        let b = ColorCollection::from(vec![RED, GREEN]);
        a.set_name(0, Some("x".into())).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ColorCollection::from(vec![GREEN, RED]));
        assert_ne!(a, ColorCollection::from(vec![RED]));
    }

    #[test]
    fn test_clone_drops_listeners() {
        let mut a = ColorCollection::from(vec![RED]);
        let log = recorder(&mut a);
        let mut b = a.clone();
        b.push(GREEN);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_serde_shape() {
        let mut c = ColorCollection::from(vec![RED, GREEN.with_alpha(0)]);
        c.set_name(0, Some("Red".into())).unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"a": 255, "r": 255, "g": 0, "b": 0, "name": "Red"},
                {"a": 0, "r": 0, "g": 255, "b": 0},
            ])
        );

        let back: ColorCollection = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.name(0), Some("Red"));

        let defaulted: ColorCollection =
            serde_json::from_str(r#"[{"r": 1, "g": 2, "b": 3}]"#).unwrap();
        assert_eq!(defaulted[0], Color::rgb(1, 2, 3));
    }

    /// Writes a few bytes and then fails, like an encoder that hits a limit
    /// part way through.
    struct Failing;

    impl PaletteSerializer for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn default_extension(&self) -> &'static str {
            "fail"
        }

        fn can_read_from(&self, _source: &mut dyn crate::PaletteSource) -> bool {
            false
        }

        fn deserialize(&self, _source: &mut dyn crate::PaletteSource) -> Result<ColorCollection> {
            Ok(ColorCollection::new())
        }

        fn serialize(&self, sink: &mut dyn std::io::Write, _palette: &ColorCollection) -> Result<()> {
            sink.write_all(b"partial")?;
            Err(PaletteError::invalid("too many colors"))
        }
    }

    #[test]
    fn test_failed_save_keeps_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("palette.fail");
        std::fs::write(&path, b"original contents").unwrap();

        let result = ColorCollection::from(vec![RED]).save_with(&path, &Failing);
        assert!(matches!(result, Err(PaletteError::InvalidData(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"original contents");

        let fresh = dir.path().join("new.fail");
        assert!(ColorCollection::new().save_with(&fresh, &Failing).is_err());
        assert!(!fresh.exists());
    }
}
