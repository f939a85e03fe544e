// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Distributed backend: the fold runs inside the storage tier's scan.
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread;

use tracing::{debug, instrument};
use vellum_core::{
    Authorizations, CellTable, DecodeError, Element, ElementId, ElementKind, ElementReader,
    ElementStream, EmbeddedStore, FetchHints, Mutation, RowRange,
};

use crate::record::{ElementRecord, PushdownOptions};
use crate::row::ElementRowIterator;
use crate::scan::{MemoryTablet, ScanError, SortedKeyIterator};

/// Client-side reader of synthesized records.
///
/// Yields one decode result per record. A pipeline failure is reported once
/// as [`DecodeError::Remote`] and ends the stream.
pub struct RecordStream {
    stack: Box<dyn SortedKeyIterator>,
    failure: Option<ScanError>,
    done: bool,
}

impl RecordStream {
    /// Seeks `stack` to `range` and reads its records.
    pub fn new(mut stack: Box<dyn SortedKeyIterator>, range: &RowRange) -> Self {
        let failure = stack.seek(range).err();
        Self {
            stack,
            failure,
            done: false,
        }
    }
}

fn remote(err: &ScanError) -> DecodeError {
    DecodeError::Remote {
        element_id: None,
        reason: err.to_string(),
    }
}

impl Iterator for RecordStream {
    type Item = Result<Element, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.failure.take() {
            self.done = true;
            return Some(Err(remote(&err)));
        }
        if self.done {
            return None;
        }
        let (row, value) = match (self.stack.top_key(), self.stack.top_value()) {
            (Some(key), Some(value)) => (key.row.clone(), value.clone()),
            _ => {
                self.done = true;
                return None;
            }
        };
        let item = ElementRecord::decode(&value)
            .map_err(|e| DecodeError::Remote {
                element_id: Some(row),
                reason: e.to_string(),
            })
            .and_then(ElementRecord::into_result);
        if let Err(err) = self.stack.next() {
            self.failure = Some(err);
        }
        Some(item)
    }
}

// Results a split worker may run ahead of its reader.
const PIECE_BUFFER: usize = 64;

enum PieceMsg {
    Item(Result<Element, DecodeError>),
    Done,
}

/// Lazily concatenated output of a split scan.
///
/// Each sub-range is read by its own worker thread through a bounded
/// channel; pieces are drained in range order. Dropping the stream
/// disconnects the channels and the workers stop at their next send.
pub struct SplitStream {
    pieces: std::vec::IntoIter<Receiver<PieceMsg>>,
    current: Option<Receiver<PieceMsg>>,
    index: usize,
}

impl Iterator for SplitStream {
    type Item = Result<Element, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rx = self.current.as_ref()?;
            match rx.recv() {
                Ok(PieceMsg::Item(item)) => return Some(item),
                Ok(PieceMsg::Done) => {
                    self.current = self.pieces.next();
                    self.index += 1;
                }
                // sender dropped without `Done`: the worker died
                Err(_) => {
                    self.current = None;
                    self.pieces = Vec::new().into_iter();
                    let err = ScanError::WorkerPanicked { index: self.index };
                    return Some(Err(remote(&err)));
                }
            }
        }
    }
}

/// Vertex and edge tablets scanned through the push-down stack.
#[derive(Clone, Debug, Default)]
pub struct DistributedStore {
    vertices: Arc<CellTable>,
    edges: Arc<CellTable>,
    parallelism: usize,
}

impl DistributedStore {
    /// Store over existing tables, scanning serially.
    pub fn new(vertices: CellTable, edges: CellTable) -> Self {
        Self {
            vertices: Arc::new(vertices),
            edges: Arc::new(edges),
            parallelism: 1,
        }
    }

    /// Store holding the same cells as `embedded`.
    pub fn from_embedded(embedded: &EmbeddedStore) -> Self {
        Self::new(
            embedded.table(ElementKind::Vertex).clone(),
            embedded.table(ElementKind::Edge).clone(),
        )
    }

    /// Splits every [`scan`](ElementReader::scan) into up to `parallelism`
    /// sub-ranges.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Configured scan parallelism.
    pub fn parallelism(&self) -> usize {
        self.parallelism.max(1)
    }

    fn table(&self, kind: ElementKind) -> &Arc<CellTable> {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
        }
    }

    /// Writes many mutations into the `kind` tablet.
    pub fn extend(&mut self, kind: ElementKind, mutations: impl IntoIterator<Item = Mutation>) {
        let table = match kind {
            ElementKind::Vertex => &mut self.vertices,
            ElementKind::Edge => &mut self.edges,
        };
        Arc::make_mut(table).extend(mutations);
    }

    /// Unpositioned tablet source for `kind`.
    pub fn tablet(&self, kind: ElementKind) -> MemoryTablet {
        MemoryTablet::new(Arc::clone(self.table(kind)))
    }

    /// Builds the push-down stack the storage tier would run.
    ///
    /// The options make a full encode and decode trip, as they would when
    /// shipped to a tablet server.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Options`] if the options cannot be shipped.
    pub fn prepare(
        &self,
        kind: ElementKind,
        authorizations: &Authorizations,
        hints: &FetchHints,
    ) -> Result<ElementRowIterator, ScanError> {
        let options = PushdownOptions::new(kind, authorizations.clone(), hints.clone());
        let shipped = options.encode().map_err(ScanError::Options)?;
        ElementRowIterator::from_encoded(Box::new(self.tablet(kind)), &shipped)
    }

    /// Streams `range` as up to `pieces` sub-ranges read by worker threads.
    ///
    /// Output order equals a serial scan. Workers buffer a bounded number of
    /// results ahead of the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Options`] if the stack cannot be prepared.
    #[instrument(level = "debug", skip_all, fields(%kind, pieces))]
    pub fn split_stream(
        &self,
        kind: ElementKind,
        range: &RowRange,
        authorizations: &Authorizations,
        hints: &FetchHints,
        pieces: usize,
    ) -> Result<SplitStream, ScanError> {
        let prepared = self.prepare(kind, authorizations, hints)?;
        let ranges = range.split_at(&split_points(&self.table(kind).rows(range), pieces));
        debug!(pieces = ranges.len(), "split stream");

        let mut receivers = Vec::with_capacity(ranges.len());
        for piece in ranges {
            let copy = prepared.deep_copy();
            let (tx, rx) = sync_channel(PIECE_BUFFER);
            thread::spawn(move || {
                for item in RecordStream::new(copy, &piece) {
                    if tx.send(PieceMsg::Item(item)).is_err() {
                        return;
                    }
                }
                let _ = tx.send(PieceMsg::Done);
            });
            receivers.push(rx);
        }
        let mut pieces = receivers.into_iter();
        Ok(SplitStream {
            current: pieces.next(),
            pieces,
            index: 0,
        })
    }

    /// Scans `range` as up to `pieces` sub-ranges on scoped threads and
    /// collects every result.
    ///
    /// Each worker runs its own deep copy of one prepared stack. Results are
    /// concatenated in range order, so the output equals a serial scan.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the stack cannot be prepared or a worker
    /// panics. Per-element failures stay in the returned vector.
    #[instrument(level = "debug", skip_all, fields(%kind, pieces))]
    pub fn scan_split(
        &self,
        kind: ElementKind,
        range: &RowRange,
        authorizations: &Authorizations,
        hints: &FetchHints,
        pieces: usize,
    ) -> Result<Vec<Result<Element, DecodeError>>, ScanError> {
        let prepared = self.prepare(kind, authorizations, hints)?;
        let ranges = range.split_at(&split_points(&self.table(kind).rows(range), pieces));
        debug!(pieces = ranges.len(), "split scan");

        std::thread::scope(|s| {
            let handles: Vec<_> = ranges
                .iter()
                .map(|piece| {
                    let copy = prepared.deep_copy();
                    s.spawn(move || RecordStream::new(copy, piece).collect::<Vec<_>>())
                })
                .collect();

            let mut out = Vec::new();
            for (index, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(results) => out.extend(results),
                    Err(_) => return Err(ScanError::WorkerPanicked { index }),
                }
            }
            Ok(out)
        })
    }
}

// Cut points that spread `rows` evenly over `pieces` ranges.
fn split_points(rows: &[ElementId], pieces: usize) -> Vec<ElementId> {
    if pieces <= 1 || rows.len() < 2 {
        return Vec::new();
    }
    let step = rows.len().div_ceil(pieces);
    rows.iter().step_by(step).skip(1).cloned().collect()
}

impl ElementReader for DistributedStore {
    #[instrument(level = "debug", skip_all, fields(%kind))]
    fn scan<'a>(
        &'a self,
        kind: ElementKind,
        range: &RowRange,
        authorizations: &'a Authorizations,
        hints: &'a FetchHints,
    ) -> ElementStream<'a> {
        if self.parallelism() > 1 {
            return match self.split_stream(kind, range, authorizations, hints, self.parallelism()) {
                Ok(stream) => Box::new(stream),
                Err(err) => Box::new(std::iter::once(Err(remote(&err)))),
            };
        }
        match self.prepare(kind, authorizations, hints) {
            Ok(stack) => Box::new(RecordStream::new(Box::new(stack), range)),
            Err(err) => Box::new(std::iter::once(Err(remote(&err)))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ElementId> {
        names.iter().map(|n| ElementId::from(*n)).collect()
    }

    #[test]
    fn split_points_spread_rows() {
        let rows = ids(&["a", "b", "c", "d", "e"]);
        assert_eq!(split_points(&rows, 2), ids(&["d"]));
        assert_eq!(split_points(&rows, 5), ids(&["b", "c", "d", "e"]));
        assert_eq!(split_points(&rows, 9), ids(&["b", "c", "d", "e"]));
        assert!(split_points(&rows, 1).is_empty());
        assert!(split_points(&rows[..1], 4).is_empty());
    }
}
