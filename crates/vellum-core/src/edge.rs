// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edge strategy: endpoint vertex ids and the label.
use crate::accumulator::Signal;
use crate::column::{EDGE_IN, EDGE_OUT, EDGE_SIGNAL};
use crate::element::{Edge, Element, ElementData};
use crate::error::DecodeError;
use crate::fold::FoldContext;
use crate::ident::{Direction, ElementId, ElementKind};
use crate::mutation::Mutation;
use crate::qualifier::decode_id;
use crate::strategy::ElementStrategy;

/// Endpoint state of an edge fold; the newest readable cell per side wins.
///
/// A side whose only endpoint cells are unreadable is withheld: the edge is
/// then absent for the caller, not corrupt.
#[derive(Clone, Debug, Default)]
pub struct EdgeEndpoints {
    out: Option<ElementId>,
    inbound: Option<ElementId>,
    withheld: [bool; 2],
}

impl EdgeEndpoints {
    /// Endpoint recorded for `direction`, if any.
    pub fn get(&self, direction: Direction) -> Option<&ElementId> {
        match direction {
            Direction::Out => self.out.as_ref(),
            Direction::In => self.inbound.as_ref(),
        }
    }

    /// True when `direction` saw endpoint cells but none was readable.
    pub fn is_withheld(&self, direction: Direction) -> bool {
        self.get(direction).is_none() && self.withheld[direction as usize]
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<ElementId> {
        match direction {
            Direction::Out => &mut self.out,
            Direction::In => &mut self.inbound,
        }
    }
}

/// Decodes edge rows (signal family `E`).
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeStrategy;

impl ElementStrategy for EdgeStrategy {
    type Extra = EdgeEndpoints;

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn signal_family(&self) -> &'static [u8] {
        EDGE_SIGNAL
    }

    fn decode_column(
        &self,
        extra: &mut EdgeEndpoints,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<bool, DecodeError> {
        let (direction, column) = match cell.family.as_ref() {
            EDGE_OUT => (Direction::Out, "EOUT"),
            EDGE_IN => (Direction::In, "EIN"),
            _ => return Ok(false),
        };
        if extra.get(direction).is_some() {
            return Ok(true);
        }
        if !ctx.gate.can_read(&cell.visibility) {
            extra.withheld[direction as usize] = true;
            return Ok(true);
        }
        let vertex_id = decode_id(&cell.qualifier, "vertexId").map_err(|source| {
            DecodeError::MalformedQualifier {
                element_id: cell.element_id.clone(),
                column,
                source,
            }
        })?;
        *extra.slot(direction) = Some(vertex_id);
        Ok(true)
    }

    fn finish(
        &self,
        data: ElementData,
        signal: Signal,
        extra: EdgeEndpoints,
        _ctx: &FoldContext<'_>,
    ) -> Result<Option<Element>, DecodeError> {
        if Direction::BOTH.iter().any(|&d| extra.is_withheld(d)) {
            return Ok(None);
        }
        let label = String::from_utf8(signal.value.to_vec()).map_err(|_| {
            DecodeError::InvalidUtf8 {
                element_id: data.id.clone(),
                column: "E",
            }
        })?;
        let missing = |direction| DecodeError::MissingEndpoint {
            element_id: data.id.clone(),
            direction,
        };
        let out_vertex_id = extra.out.ok_or_else(|| missing(Direction::Out))?;
        let in_vertex_id = extra.inbound.ok_or_else(|| missing(Direction::In))?;
        Ok(Some(Element::Edge(Edge {
            data,
            label,
            out_vertex_id,
            in_vertex_id,
        })))
    }
}
