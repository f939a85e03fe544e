// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stored mutations (cells) and their two canonical orders.
//!
//! - **Storage order** ([`CellKey`]): row, family, qualifier, visibility
//!   ascending, then timestamp and sequence descending. This is how sorted-key
//!   backends lay cells out.
//! - **Fold order** ([`Mutation::fold_order`]): timestamp and sequence
//!   descending, then family, qualifier, visibility and value ascending. This
//!   is a total order, so the fold never depends on input order.
use std::cmp::Ordering;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ident::{ElementId, Timestamp};
use crate::visibility::Visibility;

/// One immutable, append-only cell of the mutation log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutation {
    /// Row (element) the cell belongs to.
    pub element_id: ElementId,
    /// Column tag.
    pub family: Bytes,
    /// Packed qualifier parts (see [`crate::qualifier`]).
    pub qualifier: Bytes,
    /// Cell visibility label.
    pub visibility: Visibility,
    /// Write timestamp.
    pub timestamp: Timestamp,
    /// Writer sequence number, the tie-break for equal timestamps.
    pub sequence: u64,
    /// Opaque value bytes.
    pub value: Bytes,
}

impl Mutation {
    /// Total order used before folding: newest first.
    pub fn fold_order(a: &Self, b: &Self) -> Ordering {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.sequence.cmp(&a.sequence))
            .then_with(|| a.family.cmp(&b.family))
            .then_with(|| a.qualifier.cmp(&b.qualifier))
            .then_with(|| a.visibility.cmp(&b.visibility))
            .then_with(|| a.value.cmp(&b.value))
    }

    /// Splits the cell into its storage key and value.
    pub fn into_cell(self) -> (CellKey, Bytes) {
        (
            CellKey {
                row: self.element_id,
                family: self.family,
                qualifier: self.qualifier,
                visibility: self.visibility,
                timestamp: self.timestamp,
                sequence: self.sequence,
            },
            self.value,
        )
    }

    /// Rebuilds a mutation from a storage key and value.
    pub fn from_cell(key: CellKey, value: Bytes) -> Self {
        Self {
            element_id: key.row,
            family: key.family,
            qualifier: key.qualifier,
            visibility: key.visibility,
            timestamp: key.timestamp,
            sequence: key.sequence,
            value,
        }
    }
}

/// Storage key of a cell in a sorted-key backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Element id.
    pub row: ElementId,
    /// Column tag.
    pub family: Bytes,
    /// Packed qualifier.
    pub qualifier: Bytes,
    /// Cell visibility.
    pub visibility: Visibility,
    /// Write timestamp (sorted newest first).
    pub timestamp: Timestamp,
    /// Writer sequence (sorted highest first).
    pub sequence: u64,
}

impl CellKey {
    /// Smallest key of `row`; seeking to it positions at the row's first cell.
    pub fn row_start(row: ElementId) -> Self {
        Self {
            row,
            family: Bytes::new(),
            qualifier: Bytes::new(),
            visibility: Visibility::empty(),
            timestamp: Timestamp::MAX,
            sequence: u64::MAX,
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.family.cmp(&other.family))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
            .then_with(|| self.visibility.cmp(&other.visibility))
            .then_with(|| other.timestamp.cmp(&self.timestamp))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(ts: Timestamp, seq: u64, family: &'static [u8]) -> Mutation {
        Mutation {
            element_id: ElementId::from("v1"),
            family: Bytes::from_static(family),
            qualifier: Bytes::new(),
            visibility: Visibility::empty(),
            timestamp: ts,
            sequence: seq,
            value: Bytes::new(),
        }
    }

    #[test]
    fn fold_order_is_newest_first_then_highest_sequence() {
        let mut cells = vec![cell(1, 0, b"V"), cell(5, 0, b"V"), cell(5, 9, b"V")];
        cells.sort_by(Mutation::fold_order);
        assert_eq!(
            cells.iter().map(|c| (c.timestamp, c.sequence)).collect::<Vec<_>>(),
            vec![(5, 9), (5, 0), (1, 0)]
        );
    }

    #[test]
    fn fold_order_breaks_full_ties_by_column() {
        let mut cells = vec![cell(5, 0, b"PROP"), cell(5, 0, b"D")];
        cells.sort_by(Mutation::fold_order);
        assert_eq!(cells[0].family.as_ref(), b"D");
    }

    #[test]
    fn storage_order_keeps_rows_contiguous_and_versions_newest_first() {
        let mut keys = [
            cell(1, 0, b"V").into_cell().0,
            cell(9, 0, b"V").into_cell().0,
            CellKey::row_start(ElementId::from("v0")),
            cell(3, 0, b"D").into_cell().0,
        ];
        keys.sort();
        assert_eq!(keys[0].row.as_str(), "v0");
        assert_eq!(keys[1].family.as_ref(), b"D");
        assert_eq!(keys[2].timestamp, 9);
        assert_eq!(keys[3].timestamp, 1);
        assert!(CellKey::row_start(ElementId::from("v1")) < keys[1]);
    }
}
