//! Named per-point attribute columns.
//!
//! Every column stores one optional value per point and is kept in lockstep
//! with the owning sequence: structural edits on the sequence open or close
//! slots at the same indices in every column. Unset slots hold `None`.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use geoscene_core::{GeoSceneError, Result};

/// The value type stored by a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Floating point values.
    Numeric,
    /// True/false flags.
    Boolean,
    /// Strings stored as indices into a per-column table of distinct values.
    Interned,
}

impl AttributeKind {
    fn label(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Interned => "string",
        }
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Numeric(f64),
    Boolean(bool),
    Text(String),
}

impl AttributeValue {
    /// Kind of column able to store this value.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Numeric(_) => AttributeKind::Numeric,
            Self::Boolean(_) => AttributeKind::Boolean,
            Self::Text(_) => AttributeKind::Interned,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered set of distinct strings referenced by an interned column.
#[derive(Debug, Clone, Default)]
pub struct InternTable {
    values: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl InternTable {
    fn intern(&mut self, value: &str) -> u32 {
        if let Some(&id) = self.lookup.get(value) {
            return id;
        }
        let id = u32::try_from(self.values.len()).unwrap_or(u32::MAX);
        self.values.push(value.to_string());
        self.lookup.insert(value.to_string(), id);
        id
    }

    /// Distinct values in first-seen order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Looks up the string for an id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&str> {
        self.values.get(id as usize).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
enum ColumnStorage {
    Numeric(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Interned(Vec<Option<u32>>, InternTable),
}

/// Applies the same slot operation to whichever vector a column holds.
macro_rules! with_slots {
    ($storage:expr, $slots:ident => $body:expr) => {
        match $storage {
            ColumnStorage::Numeric($slots) => $body,
            ColumnStorage::Boolean($slots) => $body,
            ColumnStorage::Interned($slots, _) => $body,
        }
    };
}

/// One attribute column.
#[derive(Debug, Clone)]
pub struct AttributeColumn {
    storage: ColumnStorage,
}

impl AttributeColumn {
    fn new(kind: AttributeKind, len: usize) -> Self {
        let storage = match kind {
            AttributeKind::Numeric => ColumnStorage::Numeric(vec![None; len]),
            AttributeKind::Boolean => ColumnStorage::Boolean(vec![None; len]),
            AttributeKind::Interned => {
                ColumnStorage::Interned(vec![None; len], InternTable::default())
            }
        };
        Self { storage }
    }

    /// Value kind of this column.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self.storage {
            ColumnStorage::Numeric(_) => AttributeKind::Numeric,
            ColumnStorage::Boolean(_) => AttributeKind::Boolean,
            ColumnStorage::Interned(..) => AttributeKind::Interned,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        with_slots!(&self.storage, slots => slots.len())
    }

    /// Returns true if the column has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct values of an interned column.
    #[must_use]
    pub fn intern_table(&self) -> Option<&InternTable> {
        match &self.storage {
            ColumnStorage::Interned(_, table) => Some(table),
            _ => None,
        }
    }

    /// Reads one slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<AttributeValue> {
        match &self.storage {
            ColumnStorage::Numeric(v) => v.get(index).copied().flatten().map(AttributeValue::Numeric),
            ColumnStorage::Boolean(v) => v.get(index).copied().flatten().map(AttributeValue::Boolean),
            ColumnStorage::Interned(v, table) => v
                .get(index)
                .copied()
                .flatten()
                .and_then(|id| table.get(id))
                .map(|s| AttributeValue::Text(s.to_string())),
        }
    }

    fn set(&mut self, index: usize, value: Option<&AttributeValue>) -> bool {
        match (&mut self.storage, value) {
            (ColumnStorage::Numeric(v), Some(AttributeValue::Numeric(x))) => v[index] = Some(*x),
            (ColumnStorage::Boolean(v), Some(AttributeValue::Boolean(x))) => v[index] = Some(*x),
            (ColumnStorage::Interned(v, table), Some(AttributeValue::Text(x))) => {
                v[index] = Some(table.intern(x));
            }
            (storage, None) => with_slots!(storage, slots => slots[index] = None),
            _ => return false,
        }
        true
    }

    fn resize(&mut self, len: usize) {
        with_slots!(&mut self.storage, slots => slots.resize(len, None));
    }

    fn insert_slots(&mut self, index: usize, count: usize) {
        with_slots!(&mut self.storage, slots => {
            slots.splice(index..index, std::iter::repeat(None).take(count));
        });
    }

    fn remove_slots(&mut self, range: Range<usize>) {
        with_slots!(&mut self.storage, slots => {
            slots.drain(range);
        });
    }

    fn remove_ranges(&mut self, ranges: &[Range<usize>]) {
        with_slots!(&mut self.storage, slots => {
            let mut next = ranges.iter().peekable();
            let mut index = 0;
            slots.retain(|_| {
                while next.peek().is_some_and(|r| r.end <= index) {
                    next.next();
                }
                let keep = !next.peek().is_some_and(|r| r.contains(&index));
                index += 1;
                keep
            });
        });
    }

    fn insert_ranges(&mut self, ranges: &[Range<usize>]) {
        with_slots!(&mut self.storage, slots => {
            for range in ranges {
                let at = range.start.min(slots.len());
                slots.splice(at..at, std::iter::repeat(None).take(range.len()));
            }
        });
    }

    fn copy_slot(&mut self, from: usize, to: usize) {
        with_slots!(&mut self.storage, slots => {
            if from < slots.len() && to < slots.len() {
                slots[to] = slots[from];
            }
        });
    }

    fn reverse(&mut self, len: usize) {
        with_slots!(&mut self.storage, slots => slots[..len].reverse());
    }
}

/// Mapping from attribute key to column, kept in lockstep with a point count.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    columns: BTreeMap<String, AttributeColumn>,
    len: usize,
}

impl AttributeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots every column holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table tracks no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Returns a column.
    #[must_use]
    pub fn column(&self, key: &str) -> Option<&AttributeColumn> {
        self.columns.get(key)
    }

    /// Adds an empty column sized to the current point count.
    pub fn add_column(&mut self, key: &str, kind: AttributeKind) -> Result<()> {
        if self.columns.contains_key(key) {
            log::error!("attribute '{key}' already exists");
            return Err(GeoSceneError::AttributeExists(key.to_string()));
        }
        self.columns
            .insert(key.to_string(), AttributeColumn::new(kind, self.len));
        Ok(())
    }

    /// Removes a column.
    pub fn remove_column(&mut self, key: &str) -> Option<AttributeColumn> {
        self.columns.remove(key)
    }

    /// Writes one value; `None` clears the slot.
    pub fn set(&mut self, key: &str, index: usize, value: Option<AttributeValue>) -> Result<()> {
        if index >= self.len {
            log::error!("attribute index {index} out of range ({} points)", self.len);
            return Err(GeoSceneError::InvalidIndex {
                index,
                count: self.len,
            });
        }
        let column = self.columns.get_mut(key).ok_or_else(|| {
            log::error!("attribute '{key}' not found");
            GeoSceneError::AttributeNotFound(key.to_string())
        })?;
        if column.set(index, value.as_ref()) {
            Ok(())
        } else {
            let expected = column.kind().label();
            log::error!("attribute '{key}' holds {expected} values");
            Err(GeoSceneError::AttributeKindMismatch {
                key: key.to_string(),
                expected,
            })
        }
    }

    /// Reads one value.
    #[must_use]
    pub fn get(&self, key: &str, index: usize) -> Option<AttributeValue> {
        self.columns.get(key)?.get(index)
    }

    /// Grows every column to at least `len` slots.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        for column in self.columns.values_mut() {
            if column.len() < len {
                column.resize(len);
            }
        }
    }

    /// Opens `count` empty slots at `index` in every column.
    pub fn insert_slots(&mut self, index: usize, count: usize) {
        for column in self.columns.values_mut() {
            column.insert_slots(index.min(column.len()), count);
        }
        self.len += count;
    }

    /// Removes the slots in `range` from every column.
    pub fn remove_slots(&mut self, range: Range<usize>) {
        let count = range.len();
        for column in self.columns.values_mut() {
            column.remove_slots(range.clone());
        }
        self.len -= count;
    }

    /// Removes several sorted, non-overlapping slot ranges.
    pub fn remove_ranges(&mut self, ranges: &[Range<usize>]) {
        for column in self.columns.values_mut() {
            column.remove_ranges(ranges);
        }
        self.len -= ranges.iter().map(|r| r.len()).sum::<usize>();
    }

    /// Opens empty slots at sorted final positions.
    pub fn insert_ranges(&mut self, ranges: &[Range<usize>]) {
        for column in self.columns.values_mut() {
            column.insert_ranges(ranges);
        }
        self.len += ranges.iter().map(|r| r.len()).sum::<usize>();
    }

    /// Copies slot `from` over slot `to` in every column.
    pub fn copy_slot(&mut self, from: usize, to: usize) {
        for column in self.columns.values_mut() {
            column.copy_slot(from, to);
        }
    }

    /// Reverses the first `len` slots of every column.
    pub fn reverse(&mut self, len: usize) {
        for column in self.columns.values_mut() {
            column.reverse(len);
        }
    }

    /// Drops every column and slot.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(len: usize) -> AttributeTable {
        let mut t = AttributeTable::new();
        t.resize(len);
        t.add_column("depth", AttributeKind::Numeric).unwrap();
        t.add_column("lith", AttributeKind::Interned).unwrap();
        t.add_column("flag", AttributeKind::Boolean).unwrap();
        for i in 0..len {
            t.set("depth", i, Some((i as f64).into())).unwrap();
        }
        t
    }

    fn depths(t: &AttributeTable) -> Vec<Option<f64>> {
        (0..t.len())
            .map(|i| match t.get("depth", i) {
                Some(AttributeValue::Numeric(v)) => Some(v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_column_sized_to_points() {
        let t = table(4);
        assert_eq!(t.column("lith").unwrap().len(), 4);
        assert_eq!(t.get("lith", 2), None);
        assert_eq!(t.keys().collect::<Vec<_>>(), ["depth", "flag", "lith"]);
    }

    #[test]
    fn test_interned_values() {
        let mut t = table(3);
        t.set("lith", 0, Some("granite".into())).unwrap();
        t.set("lith", 1, Some("shale".into())).unwrap();
        t.set("lith", 2, Some("granite".into())).unwrap();
        let interned = t.column("lith").unwrap().intern_table().unwrap();
        assert_eq!(interned.values(), ["granite", "shale"]);
        assert_eq!(t.get("lith", 2), Some(AttributeValue::Text("granite".into())));
    }

    #[test]
    fn test_kind_mismatch_and_missing() {
        let mut t = table(2);
        assert!(matches!(
            t.set("depth", 0, Some(true.into())),
            Err(GeoSceneError::AttributeKindMismatch { .. })
        ));
        assert!(matches!(
            t.set("nope", 0, None),
            Err(GeoSceneError::AttributeNotFound(_))
        ));
        assert!(matches!(
            t.set("depth", 2, None),
            Err(GeoSceneError::InvalidIndex { index: 2, count: 2 })
        ));
        assert!(t.add_column("depth", AttributeKind::Numeric).is_err());
    }

    #[test]
    fn test_slots_follow_structural_edits() {
        let mut t = table(4);
        t.insert_slots(1, 2);
        assert_eq!(
            depths(&t),
            [Some(0.0), None, None, Some(1.0), Some(2.0), Some(3.0)]
        );
        t.remove_slots(1..3);
        assert_eq!(depths(&t), [Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
        t.reverse(4);
        assert_eq!(depths(&t), [Some(3.0), Some(2.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn test_copy_slot_keeps_interned_ids() {
        let mut t = table(3);
        t.set("lith", 0, Some("granite".into())).unwrap();
        t.copy_slot(0, 2);
        assert_eq!(t.get("lith", 2), Some(AttributeValue::Text("granite".into())));
        assert_eq!(depths(&t), [Some(0.0), Some(1.0), Some(0.0)]);
        assert_eq!(t.column("lith").unwrap().intern_table().unwrap().values(), ["granite"]);
        // out of range is ignored
        t.copy_slot(0, 9);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_range_edits() {
        let mut t = table(12);
        t.remove_ranges(&[2..5, 7..10]);
        assert_eq!(
            depths(&t),
            [0.0, 1.0, 5.0, 6.0, 10.0, 11.0].map(Some)
        );
        t.insert_ranges(&[0..1, 3..5]);
        assert_eq!(
            depths(&t),
            [None, Some(0.0), Some(1.0), None, None, Some(5.0), Some(6.0), Some(10.0), Some(11.0)]
        );
        assert_eq!(t.column("flag").unwrap().len(), 9);
    }
}
