//! Logical array state.
//!
//! [`CellStore`] owns everything that describes an array independent of how it is drawn:
//! the ordered values, a decoration tag set per index, per-index style properties, whole-array
//! style properties and the marker lines used by bar layouts.
//!
//! The store itself knows nothing about timelines. Every mutation that should be undoable goes
//! through an operation in [`crate::ops`], which captures the inverse before handing control
//! back to the recorder.

use crate::error::{ArrayError, ArrayResult};
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A marker line drawn above a bar (bar layouts only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkLine {
    /// First index the line spans (inclusive).
    pub start_index: usize,
    /// Last index the line spans (inclusive). `None` means the last index of the array.
    pub end_index: Option<usize>,
    /// Whether the round mark at the bar top is drawn.
    pub show_mark: bool,
    /// Whether the horizontal line is drawn.
    pub show_line: bool,
    /// Extra style properties for the mark.
    pub mark_style: BTreeMap<String, String>,
    /// Extra style properties for the line.
    pub line_style: BTreeMap<String, String>,
}

impl Default for MarkLine {
    fn default() -> Self {
        Self {
            start_index: 0,
            end_index: None,
            show_mark: true,
            show_line: true,
            mark_style: BTreeMap::new(),
            line_style: BTreeMap::new(),
        }
    }
}

impl MarkLine {
    /// Create a line spanning `start..=end`.
    pub fn spanning(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index: Some(end_index),
            ..Self::default()
        }
    }
}

/// Deep copy of a [`CellStore`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Cell values.
    pub values: Vec<CellValue>,
    /// Decoration tags per index.
    pub decorations: Vec<BTreeSet<String>>,
    /// Style properties per index.
    pub styles: Vec<BTreeMap<String, String>>,
    /// Whole-array style properties.
    pub array_styles: BTreeMap<String, String>,
    /// Marker lines keyed by index.
    pub marks: BTreeMap<usize, MarkLine>,
}

impl StoreSnapshot {
    /// Turn the snapshot back into a store.
    pub fn into_store(self) -> CellStore {
        let mut store = CellStore {
            values: self.values,
            decorations: self.decorations,
            styles: self.styles,
            array_styles: self.array_styles,
            marks: self.marks,
        };
        store.normalize();
        store
    }
}

/// Minimal capability set of an indexed, decoratable sequence.
pub trait IndexedSequence {
    /// Read the value at `index`.
    fn get(&self, index: usize) -> ArrayResult<&CellValue>;
    /// Write `value` at `index`, growing the sequence if needed. Returns the previous value.
    fn set(&mut self, index: usize, value: CellValue) -> CellValue;
    /// Number of addressable slots.
    fn size(&self) -> usize;
    /// Exchange the values at two indices.
    fn swap(&mut self, first: usize, second: usize) -> ArrayResult<()>;
    /// Attach a decoration tag. Returns `true` if the state changed.
    fn decorate(&mut self, index: usize, tag: &str) -> ArrayResult<bool>;
    /// Detach a decoration tag. Returns `true` if the state changed.
    fn undecorate(&mut self, index: usize, tag: &str) -> ArrayResult<bool>;
    /// Whether `index` carries `tag`.
    fn has_decoration(&self, index: usize, tag: &str) -> bool;
}

/// Logical state of one array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellStore {
    values: Vec<CellValue>,
    decorations: Vec<BTreeSet<String>>,
    styles: Vec<BTreeMap<String, String>>,
    array_styles: BTreeMap<String, String>,
    marks: BTreeMap<usize, MarkLine>,
}

impl CellStore {
    /// Create a store from an initial sequence of values.
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let len = values.len();
        Self {
            values,
            decorations: vec![BTreeSet::new(); len],
            styles: vec![BTreeMap::new(); len],
            array_styles: BTreeMap::new(),
            marks: BTreeMap::new(),
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if every slot holds [`CellValue::Empty`].
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(CellValue::is_empty)
    }

    /// All values in index order.
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Read the value at `index`.
    pub fn get(&self, index: usize) -> ArrayResult<&CellValue> {
        self.values
            .get(index)
            .ok_or_else(|| ArrayError::out_of_range(index, self.size()))
    }

    /// Write `value` at `index` and return what was there before.
    ///
    /// Writing past the end first backfills every slot in `size()..index` with
    /// [`CellValue::Empty`]. A freshly backfilled slot reports `Empty` as its previous value.
    /// Fails only when `index + 1` does not fit in a `usize`.
    pub fn set(&mut self, index: usize, value: CellValue) -> ArrayResult<CellValue> {
        let len = index
            .checked_add(1)
            .ok_or_else(|| ArrayError::out_of_range(index, self.size()))?;
        self.grow_to(len);
        Ok(std::mem::replace(&mut self.values[index], value))
    }

    /// Exchange the values at `first` and `second`.
    ///
    /// Decorations and styles belong to the index, not the value, so they stay in place.
    pub fn swap(&mut self, first: usize, second: usize) -> ArrayResult<()> {
        self.check(first)?;
        self.check(second)?;
        self.values.swap(first, second);
        Ok(())
    }

    /// Attach `tag` to `index`. Returns `false` if it was already present.
    pub fn add_decoration(&mut self, index: usize, tag: &str) -> ArrayResult<bool> {
        self.check(index)?;
        Ok(self.decorations[index].insert(tag.to_string()))
    }

    /// Detach `tag` from `index`. Returns `false` if it was not present.
    pub fn remove_decoration(&mut self, index: usize, tag: &str) -> ArrayResult<bool> {
        self.check(index)?;
        Ok(self.decorations[index].remove(tag))
    }

    /// Flip `tag` on `index`. Returns the new state.
    pub fn toggle_decoration(&mut self, index: usize, tag: &str) -> ArrayResult<bool> {
        self.check(index)?;
        let tags = &mut self.decorations[index];
        if tags.remove(tag) {
            Ok(false)
        } else {
            tags.insert(tag.to_string());
            Ok(true)
        }
    }

    /// Whether `index` carries `tag`. Out-of-range indices carry nothing.
    pub fn has_decoration(&self, index: usize, tag: &str) -> bool {
        self.decorations
            .get(index)
            .is_some_and(|tags| tags.contains(tag))
    }

    /// Decoration tags of `index`, if it exists.
    pub fn decorations(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.decorations.get(index)
    }

    /// Style property of a cell.
    pub fn style(&self, index: usize, property: &str) -> Option<&str> {
        self.styles
            .get(index)
            .and_then(|props| props.get(property))
            .map(String::as_str)
    }

    /// All style properties of a cell.
    pub fn styles(&self, index: usize) -> Option<&BTreeMap<String, String>> {
        self.styles.get(index)
    }

    /// Set (or with `None`, remove) a cell style property. Returns the previous value.
    pub fn set_style(
        &mut self,
        index: usize,
        property: &str,
        value: Option<String>,
    ) -> ArrayResult<Option<String>> {
        self.check(index)?;
        Ok(put_property(&mut self.styles[index], property, value))
    }

    /// Whole-array style property.
    pub fn array_style(&self, property: &str) -> Option<&str> {
        self.array_styles.get(property).map(String::as_str)
    }

    /// All whole-array style properties.
    pub fn array_styles(&self) -> &BTreeMap<String, String> {
        &self.array_styles
    }

    /// Set (or with `None`, remove) a whole-array style property. Returns the previous value.
    pub fn set_array_style(&mut self, property: &str, value: Option<String>) -> Option<String> {
        put_property(&mut self.array_styles, property, value)
    }

    /// Marker line at `index`, if any.
    pub fn mark(&self, index: usize) -> Option<&MarkLine> {
        self.marks.get(&index)
    }

    /// All marker lines keyed by index.
    pub fn marks(&self) -> &BTreeMap<usize, MarkLine> {
        &self.marks
    }

    /// Remove the marker line at `index` if there is one, otherwise insert `line`.
    ///
    /// Returns the removed line, or `None` if `line` was inserted.
    pub fn toggle_mark(&mut self, index: usize, line: MarkLine) -> ArrayResult<Option<MarkLine>> {
        self.check(index)?;
        match self.marks.remove(&index) {
            Some(existing) => Ok(Some(existing)),
            None => {
                self.marks.insert(index, line);
                Ok(None)
            }
        }
    }

    /// Deep copy of the whole store.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            values: self.values.clone(),
            decorations: self.decorations.clone(),
            styles: self.styles.clone(),
            array_styles: self.array_styles.clone(),
            marks: self.marks.clone(),
        }
    }

    /// Replace values wholesale, keeping per-index state aligned with the new length.
    pub(crate) fn replace_values(&mut self, values: Vec<CellValue>) {
        self.values = values;
        self.normalize();
    }

    /// Replace per-index decorations and styles, e.g. when restoring a checkpoint.
    pub(crate) fn replace_visual_state(
        &mut self,
        decorations: Vec<BTreeSet<String>>,
        styles: Vec<BTreeMap<String, String>>,
        array_styles: BTreeMap<String, String>,
        marks: BTreeMap<usize, MarkLine>,
    ) {
        self.decorations = decorations;
        self.styles = styles;
        self.array_styles = array_styles;
        self.marks = marks;
        self.normalize();
    }

    pub(crate) fn check(&self, index: usize) -> ArrayResult<()> {
        if index < self.size() {
            Ok(())
        } else {
            Err(ArrayError::out_of_range(index, self.size()))
        }
    }

    /// Drop every slot at or past `len`. Used to undo backfill that was never recorded.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
        self.normalize();
    }

    fn grow_to(&mut self, len: usize) {
        if len > self.values.len() {
            self.values.resize(len, CellValue::Empty);
            self.decorations.resize(len, BTreeSet::new());
            self.styles.resize(len, BTreeMap::new());
        }
    }

    fn normalize(&mut self) {
        let len = self.values.len();
        self.decorations.resize(len, BTreeSet::new());
        self.styles.resize(len, BTreeMap::new());
        self.marks.retain(|index, _| *index < len);
    }
}

impl IndexedSequence for CellStore {
    fn get(&self, index: usize) -> ArrayResult<&CellValue> {
        CellStore::get(self, index)
    }

    fn set(&mut self, index: usize, value: CellValue) -> CellValue {
        CellStore::set(self, index, value)
    }

    fn size(&self) -> usize {
        CellStore::size(self)
    }

    fn swap(&mut self, first: usize, second: usize) -> ArrayResult<()> {
        CellStore::swap(self, first, second)
    }

    fn decorate(&mut self, index: usize, tag: &str) -> ArrayResult<bool> {
        self.add_decoration(index, tag)
    }

    fn undecorate(&mut self, index: usize, tag: &str) -> ArrayResult<bool> {
        self.remove_decoration(index, tag)
    }

    fn has_decoration(&self, index: usize, tag: &str) -> bool {
        CellStore::has_decoration(self, index, tag)
    }
}

fn put_property(
    props: &mut BTreeMap<String, String>,
    property: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        Some(value) => props.insert(property.to_string(), value),
        None => props.remove(property),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_backfills_with_empty() {
        let mut store = CellStore::new(["a", "b"]);
        let previous = store.set(5, CellValue::from("x")).unwrap();

        assert_eq!(previous, CellValue::Empty);
        assert_eq!(store.size(), 6);
        for index in 2..5 {
            assert_eq!(store.get(index).unwrap(), &CellValue::Empty);
            assert!(store.decorations(index).unwrap().is_empty());
        }
        assert_eq!(store.get(5).unwrap(), &CellValue::from("x"));
    }

    #[test]
    fn test_set_at_max_index_is_out_of_range() {
        let mut store = CellStore::new([1, 2]);
        assert!(matches!(
            store.set(usize::MAX, CellValue::from(3)),
            Err(ArrayError::IndexOutOfRange { index: usize::MAX, len: 2 })
        ));
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn test_truncate_drops_backfilled_slots() {
        let mut store = CellStore::new([1, 2]);
        store.set(4, CellValue::from(5)).unwrap();
        store.toggle_mark(4, MarkLine::default()).unwrap();

        store.truncate(2);
        assert_eq!(store.size(), 2);
        assert!(store.decorations(2).is_none());
        assert!(store.mark(4).is_none());
    }

    #[test]
    fn test_get_out_of_range() {
        let store = CellStore::new([1, 2, 3]);
        assert!(matches!(
            store.get(3),
            Err(ArrayError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_swap_keeps_decorations_in_place() {
        let mut store = CellStore::new([1, 2]);
        store.add_decoration(0, "highlight").unwrap();
        store.swap(0, 1).unwrap();

        assert_eq!(store.values(), &[CellValue::from(2), CellValue::from(1)]);
        assert!(store.has_decoration(0, "highlight"));
        assert!(!store.has_decoration(1, "highlight"));

        store.swap(1, 1).unwrap();
        assert_eq!(store.values(), &[CellValue::from(2), CellValue::from(1)]);
        assert!(store.swap(0, 2).is_err());
    }

    #[test]
    fn test_decoration_idempotence() {
        let mut store = CellStore::new([1]);
        assert!(store.add_decoration(0, "x").unwrap());
        assert!(!store.add_decoration(0, "x").unwrap());
        assert!(store.remove_decoration(0, "x").unwrap());
        assert!(!store.remove_decoration(0, "x").unwrap());
        assert!(store.toggle_decoration(0, "x").unwrap());
        assert!(!store.toggle_decoration(0, "x").unwrap());
        assert!(!store.has_decoration(7, "x"));
    }

    #[test]
    fn test_styles_return_previous() {
        let mut store = CellStore::new([1]);
        assert_eq!(store.set_style(0, "color", Some("red".into())).unwrap(), None);
        assert_eq!(
            store.set_style(0, "color", None).unwrap(),
            Some("red".to_string())
        );
        assert_eq!(store.style(0, "color"), None);
        assert_eq!(store.set_array_style("width", Some("10px".into())), None);
        assert_eq!(store.array_style("width"), Some("10px"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = CellStore::new([3, 1, 4]);
        store.add_decoration(1, "highlight").unwrap();
        store.toggle_mark(2, MarkLine::default()).unwrap();

        let copy = store.snapshot().into_store();
        assert_eq!(copy, store);
    }
}
