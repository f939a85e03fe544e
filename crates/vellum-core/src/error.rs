// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-element decode failures.
//!
//! A `DecodeError` fails one element only; the surrounding scan continues with
//! the next batch.
use thiserror::Error;

use crate::ident::{Direction, ElementId};
use crate::qualifier::QualifierError;

/// Structural corruption found while folding one element.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A qualifier did not match its family's layout.
    #[error("element {element_id}: malformed {column} qualifier: {source}")]
    MalformedQualifier {
        /// Element being decoded.
        element_id: ElementId,
        /// Family of the offending cell.
        column: &'static str,
        /// Underlying layout error.
        #[source]
        source: QualifierError,
    },
    /// An edge-reference value could not be decoded.
    #[error("element {element_id}: corrupt edge reference: {source}")]
    CorruptEdgeRef {
        /// Vertex being decoded.
        element_id: ElementId,
        /// Underlying layout error.
        #[source]
        source: QualifierError,
    },
    /// A signal value that must be text was not UTF-8.
    #[error("element {element_id}: {column} value is not valid UTF-8")]
    InvalidUtf8 {
        /// Element being decoded.
        element_id: ElementId,
        /// Family of the offending cell.
        column: &'static str,
    },
    /// An edge had no readable endpoint in `direction`.
    #[error("edge {element_id}: missing {direction} vertex")]
    MissingEndpoint {
        /// Edge being decoded.
        element_id: ElementId,
        /// Direction of the missing endpoint.
        direction: Direction,
    },
    /// The storage tier reported a failure for an element it decoded.
    #[error("storage tier failed to decode {}: {reason}", element_id.as_ref().map_or("<unknown>", ElementId::as_str))]
    Remote {
        /// Element the failure belongs to, when the tier knew it.
        element_id: Option<ElementId>,
        /// Failure description from the tier.
        reason: String,
    },
}

impl DecodeError {
    /// The element this error belongs to, if known.
    pub fn element_id(&self) -> Option<&ElementId> {
        match self {
            Self::MalformedQualifier { element_id, .. }
            | Self::CorruptEdgeRef { element_id, .. }
            | Self::InvalidUtf8 { element_id, .. }
            | Self::MissingEndpoint { element_id, .. } => Some(element_id),
            Self::Remote { element_id, .. } => element_id.as_ref(),
        }
    }
}
