// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and small enum types shared by every layer of the read path.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical write time of a mutation (milliseconds since the Unix epoch by
/// convention; the read path only ever compares them).
pub type Timestamp = i64;

/// Row identifier of a vertex or an edge.
///
/// Ids are opaque UTF-8 strings. All cells of one element share the id as
/// their row, which is what the run segmenter groups on.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Wraps an owned id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the row bytes used as the storage key prefix.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which kind of element a row describes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ElementKind {
    /// A graph vertex (signal family `V`).
    Vertex,
    /// A graph edge (signal family `E`).
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// Direction of an edge relative to a vertex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// The edge leaves this vertex.
    Out,
    /// The edge arrives at this vertex.
    In,
}

impl Direction {
    /// Both directions in canonical order.
    pub const BOTH: [Self; 2] = [Self::Out, Self::In];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Out => f.write_str("out"),
            Self::In => f.write_str("in"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_order_by_row_bytes() {
        let a = ElementId::from("v1");
        let b = ElementId::from("v10");
        let c = ElementId::from("v2");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.as_bytes(), b"v1");
    }
}
