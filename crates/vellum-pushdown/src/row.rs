// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The push-down element iterator.
use bytes::Bytes;
use tracing::{debug, warn};
use vellum_core::{
    fold, CellKey, DecodeError, EdgeStrategy, Element, ElementId, ElementKind, FoldContext,
    Mutation, RowRange, VertexStrategy,
};

use crate::record::{ElementRecord, PushdownOptions};
use crate::scan::{ScanError, SortedKeyIterator};

/// Folds each row of its source into one synthesized record.
///
/// Output keys are row start keys ([`CellKey::row_start`]); output values are
/// encoded [`ElementRecord`]s. Rows that yield no element for the caller
/// produce no record at all.
pub struct ElementRowIterator {
    source: Box<dyn SortedKeyIterator>,
    options: PushdownOptions,
    row: Vec<Mutation>,
    top: Option<(CellKey, Bytes)>,
    suppressed: u64,
}

impl ElementRowIterator {
    /// Stacks the iterator on `source`.
    pub fn new(source: Box<dyn SortedKeyIterator>, options: PushdownOptions) -> Self {
        Self {
            source,
            options,
            row: Vec::new(),
            top: None,
            suppressed: 0,
        }
    }

    /// Stacks the iterator on `source` using options as shipped over the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Options`] if `encoded` is not valid options.
    pub fn from_encoded(
        source: Box<dyn SortedKeyIterator>,
        encoded: &[u8],
    ) -> Result<Self, ScanError> {
        let options = PushdownOptions::decode(encoded).map_err(ScanError::Options)?;
        Ok(Self::new(source, options))
    }

    /// Options this iterator folds with.
    pub fn options(&self) -> &PushdownOptions {
        &self.options
    }

    /// Cells buffered for the row being folded.
    pub fn buffered(&self) -> usize {
        self.row.len()
    }

    // Moves the source past one row, buffering its cells.
    fn buffer_row(&mut self) -> Result<Option<ElementId>, ScanError> {
        self.row.clear();
        let Some(row) = self.source.top_key().map(|k| k.row.clone()) else {
            return Ok(None);
        };
        while let (Some(key), Some(value)) = (self.source.top_key(), self.source.top_value()) {
            if key.row != row {
                break;
            }
            self.row.push(Mutation::from_cell(key.clone(), value.clone()));
            self.source.next()?;
        }
        Ok(Some(row))
    }

    fn fold_row(&mut self, row: &ElementId) -> Result<Option<Element>, DecodeError> {
        let ctx = FoldContext::new(&self.options.authorizations, &self.options.hints);
        let cells = std::mem::take(&mut self.row);
        match self.options.kind {
            ElementKind::Vertex => fold(&VertexStrategy, row, cells, &ctx),
            ElementKind::Edge => fold(&EdgeStrategy, row, cells, &ctx),
        }
    }

    // Advances to the next row that produces a record.
    fn find_top(&mut self) -> Result<(), ScanError> {
        self.top = None;
        while let Some(row) = self.buffer_row()? {
            let record = match self.fold_row(&row) {
                Ok(Some(element)) => ElementRecord::Live(element),
                Ok(None) => {
                    self.suppressed += 1;
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "push-down decode failed");
                    ElementRecord::failed(row.clone(), &err)
                }
            };
            let value = record.encode().map_err(ScanError::Record)?;
            self.top = Some((CellKey::row_start(row), value));
            return Ok(());
        }
        debug!(
            kind = %self.options.kind,
            suppressed = self.suppressed,
            "push-down source exhausted"
        );
        Ok(())
    }
}

impl SortedKeyIterator for ElementRowIterator {
    fn seek(&mut self, range: &RowRange) -> Result<(), ScanError> {
        self.suppressed = 0;
        self.source.seek(range)?;
        self.find_top()
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
        self.find_top()
    }

    fn deep_copy(&self) -> Box<dyn SortedKeyIterator> {
        Box::new(Self::new(self.source.deep_copy(), self.options.clone()))
    }
}
