// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Element-kind strategies plugged into the generic fold.
use std::fmt::Debug;

use crate::accumulator::{ElementAccumulator, Signal};
use crate::element::{Element, ElementData};
use crate::error::DecodeError;
use crate::fold::FoldContext;
use crate::ident::ElementKind;
use crate::mutation::Mutation;

pub use crate::edge::{EdgeEndpoints, EdgeStrategy};
pub use crate::vertex::{VertexRefs, VertexStrategy};

/// What differs between vertex and edge decoding.
///
/// The shared families (signal, properties, metadata, tombstones, hide
/// markers, extended data, delete-row) are handled by the fold itself.
pub trait ElementStrategy {
    /// Kind-specific accumulator state.
    type Extra: Clone + Debug + Default + Send;

    /// Element kind this strategy produces.
    fn kind(&self) -> ElementKind;

    /// Family of the signal cell (`V` or `E`).
    fn signal_family(&self) -> &'static [u8];

    /// Fresh, empty accumulator for one element.
    fn new_accumulator(&self) -> ElementAccumulator<Self::Extra> {
        ElementAccumulator::default()
    }

    /// Handles a family the fold does not know.
    ///
    /// Returns `Ok(false)` when the family is unknown to this strategy too,
    /// in which case the cell is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when a recognized cell is malformed.
    fn decode_column(
        &self,
        extra: &mut Self::Extra,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<bool, DecodeError>;

    /// Builds the element from resolved common data and the kind state.
    ///
    /// Returns `Ok(None)` when the kind state shows the element is not
    /// visible to this caller.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the kind state is structurally invalid.
    fn finish(
        &self,
        data: ElementData,
        signal: Signal,
        extra: Self::Extra,
        ctx: &FoldContext<'_>,
    ) -> Result<Option<Element>, DecodeError>;
}
