// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Column families (tags) stored under every element row.
//!
//! The family decides how the dispatcher treats a cell. Families that neither
//! the shared dispatcher nor the element strategy recognise are skipped so
//! that readers stay forward compatible with newer writers.
use crate::ident::Direction;

/// Vertex signal: establishes a vertex; value is its optional type.
pub const VERTEX_SIGNAL: &[u8] = b"V";
/// Edge signal: establishes an edge; value is its label.
pub const EDGE_SIGNAL: &[u8] = b"E";
/// Property value.
pub const PROPERTY: &[u8] = b"PROP";
/// Property metadata entry.
pub const PROPERTY_METADATA: &[u8] = b"PROPMETA";
/// Property soft delete.
pub const PROPERTY_SOFT_DELETE: &[u8] = b"PROPD";
/// Property hide/unhide marker.
pub const PROPERTY_HIDDEN: &[u8] = b"PROPH";
/// Element soft delete.
pub const ELEMENT_SOFT_DELETE: &[u8] = b"D";
/// Element hide/unhide marker.
pub const ELEMENT_HIDDEN: &[u8] = b"H";
/// Outgoing edge reference (vertex rows) or out-vertex id (edge rows).
pub const EDGE_OUT: &[u8] = b"EOUT";
/// Incoming edge reference (vertex rows) or in-vertex id (edge rows).
pub const EDGE_IN: &[u8] = b"EIN";
/// Soft delete of an outgoing edge reference.
pub const EDGE_OUT_SOFT_DELETE: &[u8] = b"EOUTD";
/// Soft delete of an incoming edge reference.
pub const EDGE_IN_SOFT_DELETE: &[u8] = b"EIND";
/// Hide/unhide marker of an outgoing edge reference.
pub const EDGE_OUT_HIDDEN: &[u8] = b"EOUTH";
/// Hide/unhide marker of an incoming edge reference.
pub const EDGE_IN_HIDDEN: &[u8] = b"EINH";
/// Presence of an extended-data table for the element.
pub const EXTENDED_DATA: &[u8] = b"EXTDATA";
/// Hard delete of the whole row.
pub const DELETE_ROW: &[u8] = b"DELROW";

/// Marker value that hides the target.
pub const HIDDEN_VALUE: &[u8] = b"H";
/// Marker value that reverses an earlier hide.
pub const UNHIDDEN_VALUE: &[u8] = b"X";
/// Value written by soft deletes.
pub const SOFT_DELETE_VALUE: &[u8] = b"D";

/// Families handled by the shared dispatcher for every element kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// The strategy's signal family.
    Signal,
    /// [`PROPERTY`].
    Property,
    /// [`PROPERTY_METADATA`].
    PropertyMetadata,
    /// [`PROPERTY_SOFT_DELETE`].
    PropertySoftDelete,
    /// [`PROPERTY_HIDDEN`].
    PropertyHidden,
    /// [`ELEMENT_SOFT_DELETE`].
    ElementSoftDelete,
    /// [`ELEMENT_HIDDEN`].
    ElementHidden,
    /// [`EXTENDED_DATA`].
    ExtendedData,
    /// [`DELETE_ROW`].
    DeleteRow,
    /// Anything else; offered to the element strategy, then skipped.
    KindSpecific,
}

impl ColumnKind {
    /// Classifies `family` for a row whose signal family is `signal`.
    pub fn classify(family: &[u8], signal: &[u8]) -> Self {
        if family == signal {
            return Self::Signal;
        }
        match family {
            PROPERTY => Self::Property,
            PROPERTY_METADATA => Self::PropertyMetadata,
            PROPERTY_SOFT_DELETE => Self::PropertySoftDelete,
            PROPERTY_HIDDEN => Self::PropertyHidden,
            ELEMENT_SOFT_DELETE => Self::ElementSoftDelete,
            ELEMENT_HIDDEN => Self::ElementHidden,
            EXTENDED_DATA => Self::ExtendedData,
            DELETE_ROW => Self::DeleteRow,
            _ => Self::KindSpecific,
        }
    }
}

/// Edge-related families as seen from a vertex row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeRefColumn {
    /// A reference to an incident edge.
    Ref(Direction),
    /// Soft delete of a reference.
    SoftDelete(Direction),
    /// Hide/unhide marker on a reference.
    Hidden(Direction),
}

impl EdgeRefColumn {
    /// Classifies a vertex-row family; `None` for non-edge families.
    pub fn classify(family: &[u8]) -> Option<Self> {
        Some(match family {
            EDGE_OUT => Self::Ref(Direction::Out),
            EDGE_IN => Self::Ref(Direction::In),
            EDGE_OUT_SOFT_DELETE => Self::SoftDelete(Direction::Out),
            EDGE_IN_SOFT_DELETE => Self::SoftDelete(Direction::In),
            EDGE_OUT_HIDDEN => Self::Hidden(Direction::Out),
            EDGE_IN_HIDDEN => Self::Hidden(Direction::In),
            _ => return None,
        })
    }

    /// Family bytes for a reference in `direction`.
    pub fn ref_family(direction: Direction) -> &'static [u8] {
        match direction {
            Direction::Out => EDGE_OUT,
            Direction::In => EDGE_IN,
        }
    }
}

/// Interpretation of a hide/unhide marker value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HiddenMarker {
    /// The target is hidden from readers of the marker's visibility.
    Hide,
    /// A previous hide with the same key is reversed.
    Unhide,
}

impl HiddenMarker {
    /// Reads a marker value; anything other than the unhide value hides.
    pub fn from_value(value: &[u8]) -> Self {
        if value == UNHIDDEN_VALUE {
            Self::Unhide
        } else {
            Self::Hide
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_family_depends_on_the_row_kind() {
        assert_eq!(ColumnKind::classify(b"V", VERTEX_SIGNAL), ColumnKind::Signal);
        assert_eq!(ColumnKind::classify(b"V", EDGE_SIGNAL), ColumnKind::KindSpecific);
        assert_eq!(ColumnKind::classify(b"E", EDGE_SIGNAL), ColumnKind::Signal);
    }

    #[test]
    fn unknown_families_fall_through() {
        assert_eq!(ColumnKind::classify(b"ZZZ", VERTEX_SIGNAL), ColumnKind::KindSpecific);
        assert_eq!(EdgeRefColumn::classify(b"ZZZ"), None);
        assert_eq!(
            EdgeRefColumn::classify(b"EINH"),
            Some(EdgeRefColumn::Hidden(Direction::In))
        );
    }

    #[test]
    fn marker_values() {
        assert_eq!(HiddenMarker::from_value(b"H"), HiddenMarker::Hide);
        assert_eq!(HiddenMarker::from_value(b"X"), HiddenMarker::Unhide);
    }
}
