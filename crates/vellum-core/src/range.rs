// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Row ranges over element ids.
use serde::{Deserialize, Serialize};

use crate::ident::ElementId;

/// Half-open row range `[start, end)`; a missing bound is unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    start: Option<ElementId>,
    end: Option<ElementId>,
}

impl RowRange {
    /// Every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Rows in `[start, end)`.
    pub fn new(start: Option<ElementId>, end: Option<ElementId>) -> Self {
        Self { start, end }
    }

    /// Exactly one row.
    pub fn single(id: &ElementId) -> Self {
        Self {
            start: Some(id.clone()),
            end: Some(Self::successor(id)),
        }
    }

    /// Smallest id strictly greater than `id`.
    pub fn successor(id: &ElementId) -> ElementId {
        ElementId::new(format!("{id}\0"))
    }

    /// Inclusive start, if bounded.
    pub fn start(&self) -> Option<&ElementId> {
        self.start.as_ref()
    }

    /// Exclusive end, if bounded.
    pub fn end(&self) -> Option<&ElementId> {
        self.end.as_ref()
    }

    /// True if no row can fall in the range.
    pub fn is_empty(&self) -> bool {
        matches!((&self.start, &self.end), (Some(s), Some(e)) if s >= e)
    }

    /// True if `row` falls in the range.
    pub fn contains(&self, row: &ElementId) -> bool {
        self.start.as_ref().is_none_or(|s| row >= s) && self.end.as_ref().is_none_or(|e| row < e)
    }

    /// Splits the range at `points`; points outside the range are ignored.
    ///
    /// The pieces are contiguous, ordered and cover exactly this range.
    pub fn split_at(&self, points: &[ElementId]) -> Vec<Self> {
        let mut cuts: Vec<&ElementId> = points
            .iter()
            .filter(|p| self.contains(p) && self.start.as_ref() != Some(*p))
            .collect();
        cuts.sort();
        cuts.dedup();
        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = self.start.clone();
        for cut in cuts {
            pieces.push(Self::new(start, Some(cut.clone())));
            start = Some(cut.clone());
        }
        pieces.push(Self::new(start, self.end.clone()));
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ElementId {
        ElementId::from(s)
    }

    #[test]
    fn single_contains_only_its_row() {
        let r = RowRange::single(&id("v1"));
        assert!(r.contains(&id("v1")));
        assert!(!r.contains(&id("v10")));
        assert!(!r.contains(&id("v0")));
    }

    #[test]
    fn split_covers_the_range() {
        let r = RowRange::new(Some(id("b")), Some(id("y")));
        let pieces = r.split_at(&[id("m"), id("a"), id("f"), id("m"), id("b")]);
        assert_eq!(
            pieces,
            vec![
                RowRange::new(Some(id("b")), Some(id("f"))),
                RowRange::new(Some(id("f")), Some(id("m"))),
                RowRange::new(Some(id("m")), Some(id("y"))),
            ]
        );
        assert_eq!(RowRange::all().split_at(&[]), vec![RowRange::all()]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(RowRange::new(Some(id("b")), Some(id("a"))).is_empty());
        assert!(!RowRange::all().is_empty());
    }
}
