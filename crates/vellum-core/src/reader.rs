// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backend-neutral read port.
use crate::decoder::ElementStream;
use crate::element::Element;
use crate::error::DecodeError;
use crate::fetch_hints::FetchHints;
use crate::ident::{ElementId, ElementKind};
use crate::range::RowRange;
use crate::visibility::Authorizations;

/// A store that materializes elements for a caller.
///
/// Every implementation must return the same elements for the same stored
/// cells, authorizations and hints; only where the fold runs differs.
pub trait ElementReader {
    /// Lazily decodes every element of `kind` whose id falls in `range`.
    ///
    /// Absent elements are skipped; a corrupt element yields an `Err` item
    /// and the stream continues.
    fn scan<'a>(
        &'a self,
        kind: ElementKind,
        range: &RowRange,
        authorizations: &'a Authorizations,
        hints: &'a FetchHints,
    ) -> ElementStream<'a>;

    /// Decodes the single element `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if that element is corrupt.
    fn get(
        &self,
        kind: ElementKind,
        id: &ElementId,
        authorizations: &Authorizations,
        hints: &FetchHints,
    ) -> Result<Option<Element>, DecodeError> {
        self.scan(kind, &RowRange::single(id), authorizations, hints)
            .next()
            .transpose()
    }
}
