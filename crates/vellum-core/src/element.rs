// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable element views produced by a successful decode.
//!
//! Properties reference a per-element metadata catalogue by index, so a
//! metadata tuple shared by several properties is stored (and shipped from
//! the storage tier) once. [`PropertyView`] resolves the indices lazily.
use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::{Direction, ElementId, ElementKind, Timestamp};
use crate::visibility::Visibility;

/// Identity of one logical property slot.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Discriminator {
    /// Property name.
    pub name: String,
    /// Property key.
    pub key: String,
    /// Property visibility.
    pub visibility: Visibility,
}

/// One metadata entry of the catalogue.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata key.
    pub key: String,
    /// Opaque metadata value.
    pub value: Bytes,
    /// Visibility of the metadata cell.
    pub visibility: Visibility,
}

/// Stored form of a surviving property.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PropertyData {
    pub(crate) discriminator: Discriminator,
    pub(crate) timestamp: Timestamp,
    pub(crate) value: Bytes,
    pub(crate) metadata: Vec<u32>,
    pub(crate) hidden_visibilities: Vec<Visibility>,
}

/// Borrowed view of one property with its metadata resolved on demand.
#[derive(Clone, Copy, Debug)]
pub struct PropertyView<'a> {
    property: &'a PropertyData,
    catalogue: &'a [MetadataEntry],
}

impl<'a> PropertyView<'a> {
    /// Property key.
    pub fn key(&self) -> &'a str {
        &self.property.discriminator.key
    }

    /// Property name.
    pub fn name(&self) -> &'a str {
        &self.property.discriminator.name
    }

    /// Property visibility.
    pub fn visibility(&self) -> &'a Visibility {
        &self.property.discriminator.visibility
    }

    /// Full discriminator.
    pub fn discriminator(&self) -> &'a Discriminator {
        &self.property.discriminator
    }

    /// Timestamp of the winning value.
    pub fn timestamp(&self) -> Timestamp {
        self.property.timestamp
    }

    /// Opaque value bytes.
    pub fn value(&self) -> &'a Bytes {
        &self.property.value
    }

    /// Readable hiding visibilities; only non-empty under hidden-inclusive hints.
    pub fn hidden_visibilities(&self) -> &'a [Visibility] {
        &self.property.hidden_visibilities
    }

    /// Metadata entries attached to this property.
    pub fn metadata(&self) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
        let catalogue = self.catalogue;
        let property: &'a PropertyData = self.property;
        property
            .metadata
            .iter()
            .filter_map(move |ix| catalogue.get(*ix as usize))
    }

    /// First metadata entry with `key`.
    pub fn metadata_entry(&self, key: &str) -> Option<&'a MetadataEntry> {
        self.metadata().find(|m| m.key == key)
    }
}

/// Fields common to vertices and edges.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ElementData {
    pub(crate) id: ElementId,
    pub(crate) visibility: Visibility,
    pub(crate) timestamp: Timestamp,
    pub(crate) hidden_visibilities: Vec<Visibility>,
    pub(crate) properties: Vec<PropertyData>,
    pub(crate) metadata: Vec<MetadataEntry>,
    pub(crate) extended_data_table_names: BTreeSet<String>,
}

impl ElementData {
    /// Element id.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Visibility of the signal cell.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Timestamp of the signal cell.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Readable hiding visibilities; only non-empty under hidden-inclusive hints.
    pub fn hidden_visibilities(&self) -> &[Visibility] {
        &self.hidden_visibilities
    }

    /// Iterates surviving properties ordered by name, key, visibility.
    pub fn properties(&self) -> impl Iterator<Item = PropertyView<'_>> {
        self.properties.iter().map(|property| PropertyView {
            property,
            catalogue: &self.metadata,
        })
    }

    /// Number of surviving properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Looks up a property by name and key (any visibility).
    pub fn property(&self, name: &str, key: &str) -> Option<PropertyView<'_>> {
        self.properties()
            .find(|p| p.name() == name && p.key() == key)
    }

    /// First property named `name`; absent rather than an error when filtered.
    pub fn property_by_name(&self, name: &str) -> Option<PropertyView<'_>> {
        self.properties().find(|p| p.name() == name)
    }

    /// All values named `name` (multi-valued properties).
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = PropertyView<'a>> + 'a {
        self.properties().filter(move |p| p.name() == name)
    }

    /// The shared metadata catalogue.
    pub fn metadata_catalogue(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    /// Extended-data tables attached to the element.
    pub fn extended_data_table_names(&self) -> impl Iterator<Item = &str> {
        self.extended_data_table_names.iter().map(String::as_str)
    }
}

/// Reference from a vertex to an incident edge.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Edge id.
    pub edge_id: ElementId,
    /// Edge label.
    pub label: String,
    /// Vertex at the other end.
    pub far_vertex_id: ElementId,
    /// Timestamp of the reference cell.
    pub timestamp: Timestamp,
    /// Visibility of the reference cell.
    pub visibility: Visibility,
}

/// Surviving-ref counts per label.
pub type LabelCounts = BTreeMap<String, u64>;

/// A decoded vertex.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Vertex {
    pub(crate) data: ElementData,
    pub(crate) vertex_type: Option<String>,
    pub(crate) out_refs: BTreeMap<ElementId, EdgeRef>,
    pub(crate) in_refs: BTreeMap<ElementId, EdgeRef>,
    pub(crate) out_label_counts: Option<LabelCounts>,
    pub(crate) in_label_counts: Option<LabelCounts>,
}

impl Vertex {
    /// Common element fields.
    pub fn data(&self) -> &ElementData {
        &self.data
    }

    /// Optional vertex type from the signal cell.
    pub fn vertex_type(&self) -> Option<&str> {
        self.vertex_type.as_deref()
    }

    fn refs(&self, direction: Direction) -> &BTreeMap<ElementId, EdgeRef> {
        match direction {
            Direction::Out => &self.out_refs,
            Direction::In => &self.in_refs,
        }
    }

    /// Materialized refs in `direction`, ordered by edge id.
    pub fn edge_refs(&self, direction: Direction) -> impl Iterator<Item = &EdgeRef> {
        self.refs(direction).values()
    }

    /// The ref to `edge_id` in `direction`, if materialized.
    pub fn edge_ref(&self, direction: Direction, edge_id: &ElementId) -> Option<&EdgeRef> {
        self.refs(direction).get(edge_id)
    }

    /// Edge ids in `direction`.
    pub fn edge_ids(&self, direction: Direction) -> impl Iterator<Item = &ElementId> {
        self.refs(direction).keys()
    }

    /// Far vertex ids in `direction` (one per ref, so repeats are possible).
    pub fn vertex_ids(&self, direction: Direction) -> impl Iterator<Item = &ElementId> {
        self.refs(direction).values().map(|r| &r.far_vertex_id)
    }

    /// Label counts in `direction`, when the summary was requested.
    pub fn edge_label_counts(&self, direction: Direction) -> Option<&LabelCounts> {
        match direction {
            Direction::Out => self.out_label_counts.as_ref(),
            Direction::In => self.in_label_counts.as_ref(),
        }
    }
}

/// A decoded edge.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) data: ElementData,
    pub(crate) label: String,
    pub(crate) out_vertex_id: ElementId,
    pub(crate) in_vertex_id: ElementId,
}

impl Edge {
    /// Common element fields.
    pub fn data(&self) -> &ElementData {
        &self.data
    }

    /// Edge label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Vertex the edge leaves.
    pub fn out_vertex_id(&self) -> &ElementId {
        &self.out_vertex_id
    }

    /// Vertex the edge enters.
    pub fn in_vertex_id(&self) -> &ElementId {
        &self.in_vertex_id
    }

    /// Endpoint in `direction`.
    pub fn vertex_id(&self, direction: Direction) -> &ElementId {
        match direction {
            Direction::Out => &self.out_vertex_id,
            Direction::In => &self.in_vertex_id,
        }
    }
}

/// Failure to encode an element for hashing.
#[derive(Debug, Error)]
#[error("element encoding failed: {0}")]
pub struct DigestError(String);

/// A decoded vertex or edge.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Element {
    /// Vertex variant.
    Vertex(Vertex),
    /// Edge variant.
    Edge(Edge),
}

impl Element {
    /// Common element fields.
    pub fn data(&self) -> &ElementData {
        match self {
            Self::Vertex(v) => &v.data,
            Self::Edge(e) => &e.data,
        }
    }

    /// Element kind.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Vertex(_) => ElementKind::Vertex,
            Self::Edge(_) => ElementKind::Edge,
        }
    }

    /// Element id.
    pub fn id(&self) -> &ElementId {
        self.data().id()
    }

    /// Vertex type or edge label.
    pub fn type_or_label(&self) -> Option<&str> {
        match self {
            Self::Vertex(v) => v.vertex_type(),
            Self::Edge(e) => Some(e.label()),
        }
    }

    /// Signal visibility.
    pub fn visibility(&self) -> &Visibility {
        self.data().visibility()
    }

    /// Signal timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.data().timestamp()
    }

    /// Surviving properties.
    pub fn properties(&self) -> impl Iterator<Item = PropertyView<'_>> {
        self.data().properties()
    }

    /// First property named `name`.
    pub fn property_by_name(&self, name: &str) -> Option<PropertyView<'_>> {
        self.data().property_by_name(name)
    }

    /// The vertex variant, if any.
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Self::Vertex(v) => Some(v),
            Self::Edge(_) => None,
        }
    }

    /// The edge variant, if any.
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Self::Edge(e) => Some(e),
            Self::Vertex(_) => None,
        }
    }

    /// BLAKE3 hash of the canonical CBOR encoding.
    ///
    /// Decoded elements are fully ordered, so equal elements hash equally
    /// regardless of which backend produced them.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if CBOR serialization fails.
    pub fn digest(&self) -> Result<[u8; 32], DigestError> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vellum:element:");
        ciborium::into_writer(self, &mut hasher).map_err(|e| DigestError(e.to_string()))?;
        Ok(hasher.finalize().into())
    }
}
