// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fluent builder for the cells of one element row.
//!
//! The builder keeps a current timestamp and visibility; every cell method
//! stamps the cell with them and bumps a per-row sequence number.
//!
//! ```
//! use vellum_core::Direction;
//! use vellum_dry_tests::RowBuilder;
//!
//! let cells = RowBuilder::vertex("v1")
//!     .at(100)
//!     .visible_to("A")
//!     .signal("person")
//!     .property("age", "", "30")
//!     .edge_ref(Direction::Out, "e1", "knows", "v2")
//!     .build();
//! assert_eq!(cells.len(), 3);
//! ```

use bytes::Bytes;
use vellum_core::column::{
    DELETE_ROW, EDGE_IN, EDGE_IN_HIDDEN, EDGE_IN_SOFT_DELETE, EDGE_OUT, EDGE_OUT_HIDDEN,
    EDGE_OUT_SOFT_DELETE, EDGE_SIGNAL, ELEMENT_HIDDEN, ELEMENT_SOFT_DELETE, EXTENDED_DATA,
    HIDDEN_VALUE, PROPERTY, PROPERTY_HIDDEN, PROPERTY_METADATA, PROPERTY_SOFT_DELETE,
    SOFT_DELETE_VALUE, UNHIDDEN_VALUE, VERTEX_SIGNAL,
};
use vellum_core::qualifier::{
    EdgeInfo, PropertyHiddenQualifier, PropertyMetadataQualifier, PropertyQualifier, QualifierError,
};
use vellum_core::{Direction, ElementId, Mutation, Timestamp, Visibility};

/// Builds the cells of one vertex or edge row.
#[derive(Clone, Debug)]
pub struct RowBuilder {
    element_id: ElementId,
    signal_family: &'static [u8],
    timestamp: Timestamp,
    visibility: Visibility,
    sequence: u64,
    cells: Vec<Mutation>,
}

// Fixture names are literals chosen by the test author.
#[allow(clippy::expect_used)]
fn fixture_qualifier(encoded: Result<Bytes, QualifierError>) -> Bytes {
    encoded.expect("fixture names must not contain the qualifier separator")
}

impl RowBuilder {
    fn new(id: &str, signal_family: &'static [u8]) -> Self {
        Self {
            element_id: ElementId::from(id),
            signal_family,
            timestamp: 1,
            visibility: Visibility::empty(),
            sequence: 0,
            cells: Vec::new(),
        }
    }

    /// A vertex row.
    pub fn vertex(id: &str) -> Self {
        Self::new(id, VERTEX_SIGNAL)
    }

    /// An edge row.
    pub fn edge(id: &str) -> Self {
        Self::new(id, EDGE_SIGNAL)
    }

    /// Timestamp for subsequent cells.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Visibility for subsequent cells.
    pub fn visible_to(mut self, visibility: &str) -> Self {
        self.visibility = Visibility::from(visibility);
        self
    }

    /// Appends an arbitrary cell.
    pub fn raw(
        mut self,
        family: &[u8],
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        self.cells.push(Mutation {
            element_id: self.element_id.clone(),
            family: Bytes::copy_from_slice(family),
            qualifier: qualifier.into(),
            visibility: self.visibility.clone(),
            timestamp: self.timestamp,
            sequence: self.sequence,
            value: value.into(),
        });
        self.sequence += 1;
        self
    }

    /// Signal cell carrying the vertex type or edge label.
    pub fn signal(self, type_or_label: &str) -> Self {
        let family = self.signal_family;
        self.raw(family, Bytes::new(), Bytes::copy_from_slice(type_or_label.as_bytes()))
    }

    /// Property value; the cell visibility is the property visibility.
    pub fn property(self, name: &str, key: &str, value: impl Into<Bytes>) -> Self {
        let q = PropertyQualifier {
            name: name.into(),
            key: key.into(),
        };
        self.raw(PROPERTY, fixture_qualifier(q.encode()), value)
    }

    /// Metadata entry on the property `(name, key, property_visibility)`.
    pub fn property_metadata(
        self,
        name: &str,
        key: &str,
        property_visibility: &str,
        metadata_key: &str,
        value: impl Into<Bytes>,
    ) -> Self {
        let q = PropertyMetadataQualifier {
            name: name.into(),
            key: key.into(),
            visibility: Visibility::from(property_visibility),
            metadata_key: metadata_key.into(),
        };
        self.raw(PROPERTY_METADATA, fixture_qualifier(q.encode()), value)
    }

    /// Soft delete of the property `(name, key, current visibility)`.
    pub fn property_soft_delete(self, name: &str, key: &str) -> Self {
        let q = PropertyQualifier {
            name: name.into(),
            key: key.into(),
        };
        self.raw(PROPERTY_SOFT_DELETE, fixture_qualifier(q.encode()), Bytes::from_static(SOFT_DELETE_VALUE))
    }

    fn property_marker(self, name: &str, key: &str, property_visibility: &str, value: &'static [u8]) -> Self {
        let q = PropertyHiddenQualifier {
            name: name.into(),
            key: key.into(),
            visibility: Visibility::from(property_visibility),
        };
        self.raw(PROPERTY_HIDDEN, fixture_qualifier(q.encode()), Bytes::from_static(value))
    }

    /// Hides a property; the current visibility is the hiding visibility.
    pub fn hide_property(self, name: &str, key: &str, property_visibility: &str) -> Self {
        self.property_marker(name, key, property_visibility, HIDDEN_VALUE)
    }

    /// Reverses a hide of a property under the current visibility.
    pub fn unhide_property(self, name: &str, key: &str, property_visibility: &str) -> Self {
        self.property_marker(name, key, property_visibility, UNHIDDEN_VALUE)
    }

    /// Element-level soft delete.
    pub fn soft_delete(self) -> Self {
        self.raw(ELEMENT_SOFT_DELETE, Bytes::new(), Bytes::from_static(SOFT_DELETE_VALUE))
    }

    /// Element-level hide under the current visibility.
    pub fn hide(self) -> Self {
        self.raw(ELEMENT_HIDDEN, Bytes::new(), Bytes::from_static(HIDDEN_VALUE))
    }

    /// Element-level unhide under the current visibility.
    pub fn unhide(self) -> Self {
        self.raw(ELEMENT_HIDDEN, Bytes::new(), Bytes::from_static(UNHIDDEN_VALUE))
    }

    /// Edge reference on a vertex row.
    pub fn edge_ref(self, direction: Direction, edge_id: &str, label: &str, far_vertex_id: &str) -> Self {
        let family = match direction {
            Direction::Out => EDGE_OUT,
            Direction::In => EDGE_IN,
        };
        let info = EdgeInfo {
            label: label.into(),
            far_vertex_id: ElementId::from(far_vertex_id),
        };
        self.raw(family, Bytes::copy_from_slice(edge_id.as_bytes()), info.encode())
    }

    /// Soft delete of an edge reference.
    pub fn edge_ref_soft_delete(self, direction: Direction, edge_id: &str) -> Self {
        let family = match direction {
            Direction::Out => EDGE_OUT_SOFT_DELETE,
            Direction::In => EDGE_IN_SOFT_DELETE,
        };
        self.raw(
            family,
            Bytes::copy_from_slice(edge_id.as_bytes()),
            Bytes::from_static(SOFT_DELETE_VALUE),
        )
    }

    fn edge_ref_marker(self, direction: Direction, edge_id: &str, value: &'static [u8]) -> Self {
        let family = match direction {
            Direction::Out => EDGE_OUT_HIDDEN,
            Direction::In => EDGE_IN_HIDDEN,
        };
        self.raw(family, Bytes::copy_from_slice(edge_id.as_bytes()), Bytes::from_static(value))
    }

    /// Hides an edge reference under the current visibility.
    pub fn hide_edge_ref(self, direction: Direction, edge_id: &str) -> Self {
        self.edge_ref_marker(direction, edge_id, HIDDEN_VALUE)
    }

    /// Reverses a hide of an edge reference.
    pub fn unhide_edge_ref(self, direction: Direction, edge_id: &str) -> Self {
        self.edge_ref_marker(direction, edge_id, UNHIDDEN_VALUE)
    }

    /// Endpoint of an edge row.
    pub fn endpoint(self, direction: Direction, vertex_id: &str) -> Self {
        let family = match direction {
            Direction::Out => EDGE_OUT,
            Direction::In => EDGE_IN,
        };
        self.raw(family, Bytes::copy_from_slice(vertex_id.as_bytes()), Bytes::new())
    }

    /// Extended-data table marker.
    pub fn extended_data(self, table: &str) -> Self {
        self.raw(EXTENDED_DATA, Bytes::copy_from_slice(table.as_bytes()), Bytes::new())
    }

    /// Hard delete of the whole row.
    pub fn delete_row(self) -> Self {
        self.raw(DELETE_ROW, Bytes::new(), Bytes::new())
    }

    /// The cells, in insertion order.
    pub fn build(self) -> Vec<Mutation> {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_carry_current_stamp_and_increasing_sequence() {
        let cells = RowBuilder::vertex("v1")
            .at(10)
            .visible_to("A")
            .signal("person")
            .at(20)
            .visible_to("")
            .property("age", "", "30")
            .build();
        assert_eq!(cells[0].timestamp, 10);
        assert_eq!(cells[0].visibility.as_str(), "A");
        assert_eq!(cells[1].timestamp, 20);
        assert!(cells[1].visibility.is_empty());
        assert!(cells[0].sequence < cells[1].sequence);
        assert_eq!(cells[0].family.as_ref(), VERTEX_SIGNAL);
    }
}
