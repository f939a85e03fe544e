// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Synthesized element records and push-down options.
//!
//! # Record format
//!
//! ```text
//! [ "VRC" | 0x01 ][ CBOR ElementRecord ]
//! ```
//!
//! The record key is the element's row start key. The element's metadata
//! catalogue travels once inside the CBOR body; properties reference it by
//! index.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vellum_core::{
    Authorizations, DecodeError, Element, ElementId, ElementKind, FetchHints,
};

/// Magic prefix of every synthesized record (`VRC` + format version 1).
pub const RECORD_MAGIC: [u8; 4] = *b"VRC\x01";

/// Magic prefix of encoded push-down options (`VPO` + format version 1).
pub const OPTIONS_MAGIC: [u8; 4] = *b"VPO\x01";

/// Errors produced by the record and options codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Input does not start with the expected magic bytes.
    #[error("bad magic: expected {expected:?}")]
    BadMagic {
        /// Magic the decoder looked for.
        expected: [u8; 4],
    },
    /// The CBOR body could not be decoded.
    #[error("malformed body: {0}")]
    Malformed(String),
    /// The CBOR body could not be encoded.
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// What the storage tier reports for one element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementRecord {
    /// The element exists for the caller.
    Live(Element),
    /// The element's cells are corrupt.
    Failed {
        /// Row that failed to decode.
        element_id: ElementId,
        /// Rendered decode error.
        reason: String,
    },
}

impl ElementRecord {
    /// Record for a failed decode of `element_id`.
    pub fn failed(element_id: ElementId, error: &DecodeError) -> Self {
        Self::Failed {
            element_id,
            reason: error.to_string(),
        }
    }

    /// Encodes the record with its magic prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Encode`] if CBOR serialization fails.
    pub fn encode(&self) -> Result<Bytes, RecordError> {
        encode_framed(&RECORD_MAGIC, self).map(Bytes::from)
    }

    /// Decodes a record produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] on a missing magic or a malformed body.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        decode_framed(&RECORD_MAGIC, bytes)
    }

    /// Converts the record into the client-facing decode result.
    ///
    /// # Errors
    ///
    /// A `Failed` record becomes [`DecodeError::Remote`].
    pub fn into_result(self) -> Result<Element, DecodeError> {
        match self {
            Self::Live(element) => Ok(element),
            Self::Failed { element_id, reason } => Err(DecodeError::Remote {
                element_id: Some(element_id),
                reason,
            }),
        }
    }
}

/// Parameters shipped to the storage tier with a push-down scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushdownOptions {
    /// Which strategy folds the rows.
    pub kind: ElementKind,
    /// The caller's authorizations.
    pub authorizations: Authorizations,
    /// What to materialize.
    pub hints: FetchHints,
}

impl PushdownOptions {
    /// Options for a scan of `kind`.
    pub fn new(kind: ElementKind, authorizations: Authorizations, hints: FetchHints) -> Self {
        Self {
            kind,
            authorizations,
            hints,
        }
    }

    /// Encodes the options for shipping.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Encode`] if CBOR serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        encode_framed(&OPTIONS_MAGIC, self)
    }

    /// Decodes options produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] on a missing magic or a malformed body.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        decode_framed(&OPTIONS_MAGIC, bytes)
    }
}

fn encode_framed<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>, RecordError> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(magic);
    ciborium::into_writer(value, &mut buf).map_err(|e| RecordError::Encode(e.to_string()))?;
    Ok(buf)
}

fn decode_framed<T: for<'de> Deserialize<'de>>(
    magic: &[u8; 4],
    bytes: &[u8],
) -> Result<T, RecordError> {
    let body = bytes
        .strip_prefix(magic.as_slice())
        .ok_or(RecordError::BadMagic { expected: *magic })?;
    ciborium::from_reader(body).map_err(|e| RecordError::Malformed(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vellum_core::{fold, FoldContext, VertexStrategy};
    use vellum_dry_tests::scenarios;

    fn live() -> ElementRecord {
        let auths = Authorizations::none();
        let hints = FetchHints::all();
        let element = fold(
            &VertexStrategy,
            &ElementId::from("v"),
            scenarios::busy_vertex("v", 3, 4),
            &FoldContext::new(&auths, &hints),
        )
        .unwrap()
        .unwrap();
        ElementRecord::Live(element)
    }

    #[test]
    fn record_starts_with_magic_and_decodes() {
        let record = live();
        let bytes = record.encode().unwrap();
        assert_eq!(&bytes[..4], b"VRC\x01");
        assert_eq!(ElementRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = live().encode().unwrap().to_vec();
        bytes[3] = 0x02;
        assert_eq!(
            ElementRecord::decode(&bytes),
            Err(RecordError::BadMagic {
                expected: RECORD_MAGIC
            })
        );
        assert!(matches!(
            ElementRecord::decode(b"VR"),
            Err(RecordError::BadMagic { .. })
        ));
    }

    #[test]
    fn truncated_body_is_malformed() {
        let bytes = live().encode().unwrap();
        let cut = &bytes[..bytes.len() / 2];
        assert!(matches!(
            ElementRecord::decode(cut),
            Err(RecordError::Malformed(_))
        ));
    }

    #[test]
    fn failed_record_becomes_remote_error() {
        let err = ElementRecord::Failed {
            element_id: ElementId::from("bad"),
            reason: "corrupt".into(),
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.element_id().map(ElementId::as_str), Some("bad"));
        assert!(matches!(err, DecodeError::Remote { .. }));
    }

    #[test]
    fn options_survive_shipping() {
        let options = PushdownOptions::new(
            ElementKind::Edge,
            Authorizations::new(["A", "B"]),
            FetchHints::edge_labels(),
        );
        let bytes = options.encode().unwrap();
        assert_eq!(PushdownOptions::decode(&bytes).unwrap(), options);
        assert!(PushdownOptions::decode(&live().encode().unwrap()).is_err());
    }
}
