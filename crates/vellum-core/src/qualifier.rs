// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Column-qualifier and edge-info codecs.
//!
//! This is the byte contract shared with the storage tier. Every backend must
//! produce and accept exactly these layouts; the encoders and decoders here
//! round-trip byte-for-byte. Encoders refuse parts containing the separator.
//!
//! # Qualifier layouts
//!
//! Parts are UTF-8 and joined by [`SEPARATOR`] (`0x1f`):
//!
//! | family | qualifier |
//! |---|---|
//! | `PROP`, `PROPD` | `name ␟ key` |
//! | `PROPH` | `name ␟ key ␟ propertyVisibility` |
//! | `PROPMETA` | `name ␟ key ␟ propertyVisibility ␟ metadataKey` |
//! | edge refs and their markers | `edgeId` |
//! | edge endpoints | `vertexId` |
//! | `EXTDATA` | `tableName` |
//!
//! # Edge info
//!
//! The value of an edge-reference cell: a big-endian `u32` label length, the
//! label bytes, then the far vertex id bytes.
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::ident::ElementId;
use crate::visibility::Visibility;

/// Separator between qualifier parts (ASCII unit separator).
pub const SEPARATOR: u8 = 0x1f;

/// Errors produced while decoding qualifiers or edge-info values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QualifierError {
    /// Wrong number of separator-delimited parts.
    #[error("expected {expected} qualifier parts, found {found}")]
    PartCount {
        /// Parts required by the layout.
        expected: usize,
        /// Parts present in the bytes.
        found: usize,
    },
    /// A part that must be non-empty was empty.
    #[error("qualifier part '{part}' is empty")]
    EmptyPart {
        /// Name of the part.
        part: &'static str,
    },
    /// A part was not valid UTF-8.
    #[error("qualifier part '{part}' is not valid UTF-8")]
    InvalidUtf8 {
        /// Name of the part.
        part: &'static str,
    },
    /// A part to encode contains [`SEPARATOR`] and would not decode back.
    #[error("qualifier part '{part}' contains the 0x1f separator")]
    SeparatorInPart {
        /// Name of the part.
        part: &'static str,
    },
    /// Edge-info value shorter than its declared label.
    #[error("edge info truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes needed.
        needed: usize,
        /// Bytes present.
        available: usize,
    },
}

fn join(parts: &[(&'static str, &[u8])]) -> Result<Bytes, QualifierError> {
    let len = parts.iter().map(|(_, p)| p.len()).sum::<usize>() + parts.len().saturating_sub(1);
    let mut out = BytesMut::with_capacity(len);
    for (i, (name, part)) in parts.iter().enumerate() {
        if part.contains(&SEPARATOR) {
            return Err(QualifierError::SeparatorInPart { part: name });
        }
        if i > 0 {
            out.put_u8(SEPARATOR);
        }
        out.put_slice(part);
    }
    Ok(out.freeze())
}

fn split<const N: usize>(bytes: &[u8]) -> Result<[&[u8]; N], QualifierError> {
    let parts: Vec<&[u8]> = bytes.split(|b| *b == SEPARATOR).collect();
    let found = parts.len();
    parts
        .try_into()
        .map_err(|_| QualifierError::PartCount { expected: N, found })
}

fn text(bytes: &[u8], part: &'static str) -> Result<String, QualifierError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| QualifierError::InvalidUtf8 { part })
}

fn non_empty(bytes: &[u8], part: &'static str) -> Result<String, QualifierError> {
    if bytes.is_empty() {
        return Err(QualifierError::EmptyPart { part });
    }
    text(bytes, part)
}

/// Qualifier of `PROP` and `PROPD` cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyQualifier {
    /// Property name.
    pub name: String,
    /// Property key (distinguishes multi-valued properties).
    pub key: String,
}

impl PropertyQualifier {
    /// Encodes `name ␟ key`.
    ///
    /// # Errors
    ///
    /// Fails if a part contains [`SEPARATOR`].
    pub fn encode(&self) -> Result<Bytes, QualifierError> {
        join(&[("name", self.name.as_bytes()), ("key", self.key.as_bytes())])
    }

    /// Decodes `name ␟ key`.
    ///
    /// # Errors
    ///
    /// Fails on a wrong part count, an empty name or invalid UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, QualifierError> {
        let [name, key] = split::<2>(bytes)?;
        Ok(Self {
            name: non_empty(name, "name")?,
            key: text(key, "key")?,
        })
    }
}

/// Qualifier of `PROPH` cells; the cell visibility is the hiding visibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyHiddenQualifier {
    /// Property name.
    pub name: String,
    /// Property key.
    pub key: String,
    /// Visibility of the property being hidden.
    pub visibility: Visibility,
}

impl PropertyHiddenQualifier {
    /// Encodes `name ␟ key ␟ propertyVisibility`.
    ///
    /// # Errors
    ///
    /// Fails if a part contains [`SEPARATOR`].
    pub fn encode(&self) -> Result<Bytes, QualifierError> {
        join(&[
            ("name", self.name.as_bytes()),
            ("key", self.key.as_bytes()),
            ("visibility", self.visibility.as_str().as_bytes()),
        ])
    }

    /// Decodes `name ␟ key ␟ propertyVisibility`.
    ///
    /// # Errors
    ///
    /// Fails on a wrong part count, an empty name or invalid UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, QualifierError> {
        let [name, key, visibility] = split::<3>(bytes)?;
        Ok(Self {
            name: non_empty(name, "name")?,
            key: text(key, "key")?,
            visibility: Visibility::new(text(visibility, "visibility")?),
        })
    }
}

/// Qualifier of `PROPMETA` cells; the cell visibility is the metadata's own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyMetadataQualifier {
    /// Owning property name.
    pub name: String,
    /// Owning property key.
    pub key: String,
    /// Owning property visibility.
    pub visibility: Visibility,
    /// Metadata entry key.
    pub metadata_key: String,
}

impl PropertyMetadataQualifier {
    /// Encodes `name ␟ key ␟ propertyVisibility ␟ metadataKey`.
    ///
    /// # Errors
    ///
    /// Fails if a part contains [`SEPARATOR`].
    pub fn encode(&self) -> Result<Bytes, QualifierError> {
        join(&[
            ("name", self.name.as_bytes()),
            ("key", self.key.as_bytes()),
            ("visibility", self.visibility.as_str().as_bytes()),
            ("metadataKey", self.metadata_key.as_bytes()),
        ])
    }

    /// Decodes `name ␟ key ␟ propertyVisibility ␟ metadataKey`.
    ///
    /// # Errors
    ///
    /// Fails on a wrong part count, an empty name or metadata key, or invalid UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, QualifierError> {
        let [name, key, visibility, metadata_key] = split::<4>(bytes)?;
        Ok(Self {
            name: non_empty(name, "name")?,
            key: text(key, "key")?,
            visibility: Visibility::new(text(visibility, "visibility")?),
            metadata_key: non_empty(metadata_key, "metadataKey")?,
        })
    }
}

/// Decodes a single-part id qualifier (edge ids, vertex ids).
///
/// # Errors
///
/// Fails on empty or non-UTF-8 input.
pub fn decode_id(bytes: &[u8], part: &'static str) -> Result<ElementId, QualifierError> {
    non_empty(bytes, part).map(ElementId::from)
}

/// Decodes a single-part name qualifier (extended-data table names).
///
/// # Errors
///
/// Fails on empty or non-UTF-8 input.
pub fn decode_name(bytes: &[u8], part: &'static str) -> Result<String, QualifierError> {
    non_empty(bytes, part)
}

/// Value of an edge-reference cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Edge label.
    pub label: String,
    /// Id of the vertex at the other end of the edge.
    pub far_vertex_id: ElementId,
}

impl EdgeInfo {
    /// Encodes the label length, the label, then the far vertex id.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // labels longer than u32::MAX are not representable anyway
    pub fn encode(&self) -> Bytes {
        let label = self.label.as_bytes();
        let far = self.far_vertex_id.as_bytes();
        let mut out = BytesMut::with_capacity(4 + label.len() + far.len());
        out.put_u32(label.len() as u32);
        out.put_slice(label);
        out.put_slice(far);
        out.freeze()
    }

    /// Reads only the label, without touching the far vertex id bytes.
    ///
    /// # Errors
    ///
    /// Fails if the value is truncated or the label is not UTF-8.
    pub fn decode_label(bytes: &[u8]) -> Result<String, QualifierError> {
        let (label, _) = Self::split_value(bytes)?;
        text(label, "label")
    }

    /// Decodes the full edge info.
    ///
    /// # Errors
    ///
    /// Fails if the value is truncated, the far vertex id is empty, or any
    /// part is not UTF-8.
    pub fn decode(bytes: &[u8]) -> Result<Self, QualifierError> {
        let (label, far) = Self::split_value(bytes)?;
        Ok(Self {
            label: text(label, "label")?,
            far_vertex_id: decode_id(far, "farVertexId")?,
        })
    }

    fn split_value(bytes: &[u8]) -> Result<(&[u8], &[u8]), QualifierError> {
        let Some((len_bytes, rest)) = bytes.split_first_chunk::<4>() else {
            return Err(QualifierError::Truncated {
                needed: 4,
                available: bytes.len(),
            });
        };
        let label_len = u32::from_be_bytes(*len_bytes) as usize;
        if rest.len() < label_len {
            return Err(QualifierError::Truncated {
                needed: 4 + label_len,
                available: bytes.len(),
            });
        }
        Ok(rest.split_at(label_len))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn property_qualifier_layout_is_name_then_key() {
        let q = PropertyQualifier {
            name: "age".into(),
            key: "k1".into(),
        };
        assert_eq!(q.encode().unwrap().as_ref(), b"age\x1fk1");
        assert_eq!(PropertyQualifier::decode(b"age\x1fk1").unwrap(), q);
    }

    #[test]
    fn empty_property_key_is_allowed_but_empty_name_is_not() {
        let q = PropertyQualifier::decode(b"age\x1f").unwrap();
        assert_eq!(q.key, "");
        assert_eq!(
            PropertyQualifier::decode(b"\x1fk"),
            Err(QualifierError::EmptyPart { part: "name" })
        );
    }

    #[test]
    fn separator_inside_a_part_is_rejected_on_encode() {
        let q = PropertyQualifier {
            name: "a\x1fb".into(),
            key: String::new(),
        };
        assert_eq!(q.encode(), Err(QualifierError::SeparatorInPart { part: "name" }));
        let h = PropertyHiddenQualifier {
            name: "age".into(),
            key: String::new(),
            visibility: Visibility::from("A\x1fB"),
        };
        assert_eq!(h.encode(), Err(QualifierError::SeparatorInPart { part: "visibility" }));
    }

    #[test]
    fn metadata_qualifier_carries_the_owning_discriminator() {
        let q = PropertyMetadataQualifier {
            name: "age".into(),
            key: "k".into(),
            visibility: Visibility::from("A&B"),
            metadata_key: "source".into(),
        };
        let bytes = q.encode().unwrap();
        assert_eq!(bytes.as_ref(), b"age\x1fk\x1fA&B\x1fsource");
        assert_eq!(PropertyMetadataQualifier::decode(&bytes).unwrap(), q);
    }

    #[test]
    fn part_count_is_checked() {
        assert_eq!(
            PropertyHiddenQualifier::decode(b"a\x1fb"),
            Err(QualifierError::PartCount {
                expected: 3,
                found: 2
            })
        );
        assert!(PropertyQualifier::decode(b"a\x1fb\x1fc").is_err());
    }

    #[test]
    fn edge_info_layout() {
        let info = EdgeInfo {
            label: "knows".into(),
            far_vertex_id: ElementId::from("v2"),
        };
        let bytes = info.encode();
        assert_eq!(bytes.as_ref(), b"\x00\x00\x00\x05knowsv2");
        assert_eq!(EdgeInfo::decode(&bytes).unwrap(), info);
        assert_eq!(EdgeInfo::decode_label(&bytes).unwrap(), "knows");
    }

    #[test]
    fn truncated_edge_info_is_rejected() {
        assert!(matches!(
            EdgeInfo::decode(b"\x00\x00"),
            Err(QualifierError::Truncated { needed: 4, .. })
        ));
        assert!(matches!(
            EdgeInfo::decode(b"\x00\x00\x00\x09knows"),
            Err(QualifierError::Truncated { needed: 13, .. })
        ));
        assert_eq!(
            EdgeInfo::decode(b"\x00\x00\x00\x05knows"),
            Err(QualifierError::EmptyPart {
                part: "farVertexId"
            })
        );
    }
}
