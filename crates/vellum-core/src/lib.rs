// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! vellum-core: security-filtered element materialization.
//!
//! Vertices and edges are stored as an append-only log of cells, each tagged
//! with a column family, a qualifier, a visibility expression and a
//! timestamp. Reading an element folds its cells newest first into an
//! accumulator, drops everything the caller cannot read or asked not to
//! fetch, applies tombstones and hide markers, and yields an immutable
//! [`Element`] or nothing at all.
//!
//! The fold ([`fold::fold`]) is shared by every backend. [`EmbeddedStore`]
//! runs it on the client; the push-down crate runs the same fold inside the
//! storage-tier scan.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

pub mod accumulator;
pub mod column;
pub mod decoder;
mod edge;
pub mod element;
pub mod embedded;
pub mod error;
pub mod fetch_hints;
pub mod fold;
mod ident;
pub mod ledger;
pub mod mutation;
pub mod qualifier;
pub mod range;
pub mod reader;
pub mod segment;
pub mod strategy;
pub mod table;
mod vertex;
pub mod visibility;

pub use accumulator::{ElementAccumulator, MetadataCatalogue, Signal};
pub use decoder::{decode_batch, decode_elements, ElementDecoder, ElementStream};
pub use element::{
    Discriminator, Edge, EdgeRef, Element, ElementData, LabelCounts, MetadataEntry, PropertyView,
    Vertex,
};
pub use embedded::EmbeddedStore;
pub use error::DecodeError;
pub use fetch_hints::{FetchHints, FetchHintsBuilder, FetchHintsError};
pub use fold::{fold, FoldContext};
pub use ident::{Direction, ElementId, ElementKind, Timestamp};
pub use mutation::{CellKey, Mutation};
pub use range::RowRange;
pub use reader::ElementReader;
pub use segment::{MutationBatch, RunSegmenter};
pub use strategy::{EdgeEndpoints, EdgeStrategy, ElementStrategy, VertexRefs, VertexStrategy};
pub use table::CellTable;
pub use visibility::{AuthorizationGate, Authorizations, Visibility, VisibilityError, VisibilityExpr};
