// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Embedded backend: raw cells are read locally and folded client side.
use tracing::instrument;

use crate::decoder::{decode_elements, ElementStream};
use crate::fetch_hints::FetchHints;
use crate::fold::FoldContext;
use crate::ident::ElementKind;
use crate::mutation::Mutation;
use crate::range::RowRange;
use crate::reader::ElementReader;
use crate::table::CellTable;
use crate::visibility::Authorizations;

/// Vertex and edge cell tables read through the client decoder.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedStore {
    vertices: CellTable,
    edges: CellTable,
}

impl EmbeddedStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store over existing tables.
    pub fn from_tables(vertices: CellTable, edges: CellTable) -> Self {
        Self { vertices, edges }
    }

    /// Table holding rows of `kind`.
    pub fn table(&self, kind: ElementKind) -> &CellTable {
        match kind {
            ElementKind::Vertex => &self.vertices,
            ElementKind::Edge => &self.edges,
        }
    }

    /// Writes one mutation into the `kind` table.
    pub fn insert(&mut self, kind: ElementKind, mutation: Mutation) {
        match kind {
            ElementKind::Vertex => self.vertices.insert(mutation),
            ElementKind::Edge => self.edges.insert(mutation),
        }
    }

    /// Writes many mutations into the `kind` table.
    pub fn extend(&mut self, kind: ElementKind, mutations: impl IntoIterator<Item = Mutation>) {
        for mutation in mutations {
            self.insert(kind, mutation);
        }
    }
}

impl ElementReader for EmbeddedStore {
    #[instrument(level = "debug", skip_all, fields(%kind))]
    fn scan<'a>(
        &'a self,
        kind: ElementKind,
        range: &RowRange,
        authorizations: &'a Authorizations,
        hints: &'a FetchHints,
    ) -> ElementStream<'a> {
        let ctx = FoldContext::new(authorizations, hints);
        decode_elements(kind, self.table(kind).mutations(range), ctx)
    }
}
