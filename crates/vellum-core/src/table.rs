// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory sorted cell table.
use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use bytes::Bytes;

use crate::ident::ElementId;
use crate::mutation::{CellKey, Mutation};
use crate::range::RowRange;

/// Cells sorted in storage order (see [`CellKey`]).
///
/// Writing the same key twice keeps the last value, as a sorted-key store
/// would after compaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellTable {
    cells: BTreeMap<CellKey, Bytes>,
}

impl CellTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one mutation.
    pub fn insert(&mut self, mutation: Mutation) {
        let (key, value) = mutation.into_cell();
        self.cells.insert(key, value);
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no cell is stored.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells whose row falls in `range`, in storage order.
    pub fn cells(&self, range: &RowRange) -> btree_map::Range<'_, CellKey, Bytes> {
        self.cells.range(bounds(range))
    }

    /// First cell strictly after `key`, if any.
    pub fn cell_after(&self, key: &CellKey) -> Option<(&CellKey, &Bytes)> {
        self.cells
            .range((Bound::Excluded(key.clone()), Bound::Unbounded))
            .next()
    }

    /// Mutations whose row falls in `range`, in storage order.
    pub fn mutations(&self, range: &RowRange) -> impl Iterator<Item = Mutation> + '_ {
        self.cells(range)
            .map(|(k, v)| Mutation::from_cell(k.clone(), v.clone()))
    }

    /// Distinct rows in `range`, ascending.
    pub fn rows(&self, range: &RowRange) -> Vec<ElementId> {
        let mut rows: Vec<ElementId> = Vec::new();
        for (key, _) in self.cells(range) {
            if rows.last() != Some(&key.row) {
                rows.push(key.row.clone());
            }
        }
        rows
    }
}

impl Extend<Mutation> for CellTable {
    fn extend<T: IntoIterator<Item = Mutation>>(&mut self, iter: T) {
        for mutation in iter {
            self.insert(mutation);
        }
    }
}

impl FromIterator<Mutation> for CellTable {
    fn from_iter<T: IntoIterator<Item = Mutation>>(iter: T) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

fn bounds(range: &RowRange) -> (Bound<CellKey>, Bound<CellKey>) {
    let lower = range
        .start()
        .map_or(Bound::Unbounded, |s| Bound::Included(CellKey::row_start(s.clone())));
    if range.is_empty() {
        // Included(x)..Excluded(x) is a valid empty range for BTreeMap.
        let anchor = CellKey::row_start(range.start().cloned().unwrap_or_default());
        return (Bound::Included(anchor.clone()), Bound::Excluded(anchor));
    }
    let upper = range
        .end()
        .map_or(Bound::Unbounded, |e| Bound::Excluded(CellKey::row_start(e.clone())));
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::Visibility;

    fn cell(row: &str, family: &'static [u8], ts: i64) -> Mutation {
        Mutation {
            element_id: ElementId::from(row),
            family: Bytes::from_static(family),
            qualifier: Bytes::new(),
            visibility: Visibility::empty(),
            timestamp: ts,
            sequence: 0,
            value: Bytes::new(),
        }
    }

    #[test]
    fn range_scan_respects_row_bounds() {
        let table: CellTable = [
            cell("a", b"V", 1),
            cell("b", b"V", 1),
            cell("b", b"PROP", 2),
            cell("c", b"V", 1),
        ]
        .into_iter()
        .collect();
        let range = RowRange::new(Some(ElementId::from("b")), Some(ElementId::from("c")));
        let rows: Vec<_> = table.mutations(&range).map(|m| m.element_id.to_string()).collect();
        assert_eq!(rows, vec!["b", "b"]);
        assert_eq!(table.rows(&RowRange::all()).len(), 3);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let table: CellTable = [cell("a", b"V", 1)].into_iter().collect();
        let range = RowRange::new(Some(ElementId::from("z")), Some(ElementId::from("a")));
        assert_eq!(table.cells(&range).count(), 0);
    }
}
