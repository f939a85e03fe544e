// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vertex strategy: edge references, their markers and the label summary.
use std::collections::BTreeMap;

use crate::accumulator::Signal;
use crate::column::{EdgeRefColumn, HiddenMarker, VERTEX_SIGNAL};
use crate::element::{EdgeRef, Element, ElementData, LabelCounts, Vertex};
use crate::error::DecodeError;
use crate::fold::FoldContext;
use crate::ident::{Direction, ElementId, ElementKind, Timestamp};
use crate::ledger::{HiddenLedger, TombstoneLedger};
use crate::mutation::Mutation;
use crate::qualifier::{decode_id, EdgeInfo, QualifierError};
use crate::strategy::ElementStrategy;
use crate::visibility::Visibility;

type RefKey = (Direction, ElementId);

#[derive(Clone, Debug)]
struct PendingRef {
    label: String,
    // None when the ref is only counted for the label summary.
    far_vertex_id: Option<ElementId>,
    timestamp: Timestamp,
    visibility: Visibility,
}

/// Edge-reference state of a vertex fold.
///
/// A `None` entry marks an edge id whose newest readable ref was excluded by
/// the fetch hints; older refs to the same edge are ignored.
#[derive(Clone, Debug, Default)]
pub struct VertexRefs {
    out: BTreeMap<ElementId, Option<PendingRef>>,
    inbound: BTreeMap<ElementId, Option<PendingRef>>,
    tombstones: TombstoneLedger<RefKey>,
    hidden: HiddenLedger<RefKey>,
}

impl VertexRefs {
    fn refs_mut(&mut self, direction: Direction) -> &mut BTreeMap<ElementId, Option<PendingRef>> {
        match direction {
            Direction::Out => &mut self.out,
            Direction::In => &mut self.inbound,
        }
    }

    fn refs(&self, direction: Direction) -> &BTreeMap<ElementId, Option<PendingRef>> {
        match direction {
            Direction::Out => &self.out,
            Direction::In => &self.inbound,
        }
    }

    /// Number of edge ids seen in `direction`, excluded ones included.
    pub fn seen(&self, direction: Direction) -> usize {
        self.refs(direction).len()
    }

    fn accept_ref(
        &mut self,
        direction: Direction,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        if !ctx.gate.can_read(&cell.visibility) {
            return Ok(());
        }
        let edge_id = decode_edge_id(cell, EdgeRefColumn::Ref(direction))?;
        let refs = self.refs_mut(direction);
        if refs.contains_key(&edge_id) {
            return Ok(());
        }
        let label = EdgeInfo::decode_label(&cell.value).map_err(corrupt(cell))?;
        let pending = if ctx.hints.is_edge_ref_included(direction, &label) {
            let info = EdgeInfo::decode(&cell.value).map_err(corrupt(cell))?;
            Some(PendingRef {
                label: info.label,
                far_vertex_id: Some(info.far_vertex_id),
                timestamp: cell.timestamp,
                visibility: cell.visibility.clone(),
            })
        } else if ctx.hints.include_edge_labels_and_counts() {
            Some(PendingRef {
                label,
                far_vertex_id: None,
                timestamp: cell.timestamp,
                visibility: cell.visibility.clone(),
            })
        } else {
            None
        };
        refs.insert(edge_id, pending);
        Ok(())
    }

    /// Surviving refs and label counts in `direction`.
    fn resolve(
        &self,
        direction: Direction,
        ctx: &FoldContext<'_>,
    ) -> (BTreeMap<ElementId, EdgeRef>, Option<LabelCounts>) {
        let mut kept = BTreeMap::new();
        let mut counts = LabelCounts::new();
        for (edge_id, pending) in self.refs(direction) {
            let Some(pending) = pending else { continue };
            let key = (direction, edge_id.clone());
            if self.tombstones.suppresses(&key, pending.timestamp, ctx.gate) {
                continue;
            }
            if !ctx.hints.include_hidden() && self.hidden.is_hidden(&key, ctx.gate) {
                continue;
            }
            *counts.entry(pending.label.clone()).or_default() += 1;
            if let Some(far_vertex_id) = &pending.far_vertex_id {
                kept.insert(
                    edge_id.clone(),
                    EdgeRef {
                        edge_id: edge_id.clone(),
                        label: pending.label.clone(),
                        far_vertex_id: far_vertex_id.clone(),
                        timestamp: pending.timestamp,
                        visibility: pending.visibility.clone(),
                    },
                );
            }
        }
        let counts = ctx.hints.include_edge_labels_and_counts().then_some(counts);
        (kept, counts)
    }
}

fn column_name(column: EdgeRefColumn) -> &'static str {
    match column {
        EdgeRefColumn::Ref(Direction::Out) => "EOUT",
        EdgeRefColumn::Ref(Direction::In) => "EIN",
        EdgeRefColumn::SoftDelete(Direction::Out) => "EOUTD",
        EdgeRefColumn::SoftDelete(Direction::In) => "EIND",
        EdgeRefColumn::Hidden(Direction::Out) => "EOUTH",
        EdgeRefColumn::Hidden(Direction::In) => "EINH",
    }
}

fn decode_edge_id(cell: &Mutation, column: EdgeRefColumn) -> Result<ElementId, DecodeError> {
    decode_id(&cell.qualifier, "edgeId").map_err(|source| DecodeError::MalformedQualifier {
        element_id: cell.element_id.clone(),
        column: column_name(column),
        source,
    })
}

fn corrupt(cell: &Mutation) -> impl Fn(QualifierError) -> DecodeError + '_ {
    |source| DecodeError::CorruptEdgeRef {
        element_id: cell.element_id.clone(),
        source,
    }
}

/// Decodes vertex rows (signal family `V`).
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexStrategy;

impl ElementStrategy for VertexStrategy {
    type Extra = VertexRefs;

    fn kind(&self) -> ElementKind {
        ElementKind::Vertex
    }

    fn signal_family(&self) -> &'static [u8] {
        VERTEX_SIGNAL
    }

    fn decode_column(
        &self,
        extra: &mut VertexRefs,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<bool, DecodeError> {
        let Some(column) = EdgeRefColumn::classify(&cell.family) else {
            return Ok(false);
        };
        let direction = match column {
            EdgeRefColumn::Ref(d) | EdgeRefColumn::SoftDelete(d) | EdgeRefColumn::Hidden(d) => d,
        };
        if !ctx.hints.wants_edge_refs(direction) {
            return Ok(true);
        }
        match column {
            EdgeRefColumn::Ref(_) => extra.accept_ref(direction, cell, ctx)?,
            EdgeRefColumn::SoftDelete(_) => {
                let edge_id = decode_edge_id(cell, column)?;
                extra.tombstones.record(
                    (direction, edge_id),
                    cell.timestamp,
                    cell.visibility.clone(),
                );
            }
            EdgeRefColumn::Hidden(_) => {
                let edge_id = decode_edge_id(cell, column)?;
                extra.hidden.record(
                    (direction, edge_id),
                    cell.visibility.clone(),
                    HiddenMarker::from_value(&cell.value),
                );
            }
        }
        Ok(true)
    }

    fn finish(
        &self,
        data: ElementData,
        signal: Signal,
        extra: VertexRefs,
        ctx: &FoldContext<'_>,
    ) -> Result<Option<Element>, DecodeError> {
        let vertex_type = if signal.value.is_empty() {
            None
        } else {
            let text = std::str::from_utf8(&signal.value).map_err(|_| DecodeError::InvalidUtf8 {
                element_id: data.id.clone(),
                column: "V",
            })?;
            Some(text.to_owned())
        };
        let (out_refs, out_label_counts) = extra.resolve(Direction::Out, ctx);
        let (in_refs, in_label_counts) = extra.resolve(Direction::In, ctx);
        Ok(Some(Element::Vertex(Vertex {
            data,
            vertex_type,
            out_refs,
            in_refs,
            out_label_counts,
            in_label_counts,
        })))
    }
}
