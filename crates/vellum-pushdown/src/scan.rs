// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sorted-key scan pipeline.
//!
//! A scan is a stack of [`SortedKeyIterator`]s: the bottom one reads a
//! tablet, each layer above transforms the cells of the layer below. Every
//! layer can be deep-copied so the storage tier can run independent copies
//! of a prepared stack over different ranges.
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use vellum_core::{CellKey, CellTable, RowRange};

use crate::record::RecordError;

/// Failure inside the scan pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Push-down options could not be decoded.
    #[error("invalid push-down options: {0}")]
    Options(#[source] RecordError),
    /// A synthesized record could not be encoded.
    #[error("record encoding failed: {0}")]
    Record(#[source] RecordError),
    /// A scan worker panicked.
    #[error("scan worker for range {index} panicked")]
    WorkerPanicked {
        /// Position of the sub-range whose worker died.
        index: usize,
    },
}

/// One layer of a sorted-key scan.
///
/// After [`seek`](Self::seek) the iterator is positioned on the first cell of
/// the range, or has no top if the range is empty. [`next`](Self::next)
/// advances; keys come out in ascending [`CellKey`] order.
pub trait SortedKeyIterator: Send {
    /// Positions the iterator at the start of `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if a layer fails while finding its first cell.
    fn seek(&mut self, range: &RowRange) -> Result<(), ScanError>;

    /// True while a current cell exists.
    fn has_top(&self) -> bool;

    /// Key of the current cell.
    fn top_key(&self) -> Option<&CellKey>;

    /// Value of the current cell.
    fn top_value(&self) -> Option<&Bytes>;

    /// Advances past the current cell.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if a layer fails while finding the next cell.
    fn next(&mut self) -> Result<(), ScanError>;

    /// Independent copy of this layer and everything below it.
    ///
    /// The copy shares no mutable state with the original and must be
    /// seeked before use.
    fn deep_copy(&self) -> Box<dyn SortedKeyIterator>;
}

/// Bottom layer: an in-memory tablet.
#[derive(Clone, Debug)]
pub struct MemoryTablet {
    table: Arc<CellTable>,
    range: RowRange,
    top: Option<(CellKey, Bytes)>,
}

impl MemoryTablet {
    /// Tablet over `table`; unpositioned until seeked.
    pub fn new(table: Arc<CellTable>) -> Self {
        Self {
            table,
            range: RowRange::all(),
            top: None,
        }
    }

    fn settle(&mut self, candidate: Option<(&CellKey, &Bytes)>) {
        self.top = candidate
            .filter(|(key, _)| self.range.contains(&key.row))
            .map(|(key, value)| (key.clone(), value.clone()));
    }
}

impl SortedKeyIterator for MemoryTablet {
    fn seek(&mut self, range: &RowRange) -> Result<(), ScanError> {
        self.range = range.clone();
        let table = Arc::clone(&self.table);
        self.settle(table.cells(range).next());
        Ok(())
    }

    fn has_top(&self) -> bool {
        self.top.is_some()
    }

    fn top_key(&self) -> Option<&CellKey> {
        self.top.as_ref().map(|(k, _)| k)
    }

    fn top_value(&self) -> Option<&Bytes> {
        self.top.as_ref().map(|(_, v)| v)
    }

    fn next(&mut self) -> Result<(), ScanError> {
        if let Some((key, _)) = self.top.take() {
            let table = Arc::clone(&self.table);
            self.settle(table.cell_after(&key));
        }
        Ok(())
    }

    fn deep_copy(&self) -> Box<dyn SortedKeyIterator> {
        Box::new(Self::new(Arc::clone(&self.table)))
    }
}
