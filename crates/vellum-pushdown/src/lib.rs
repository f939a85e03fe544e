// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! vellum-pushdown: the element fold as a storage-tier scan layer.
//!
//! A [`DistributedStore`] exposes its cells as tablets read through a
//! [`SortedKeyIterator`] stack. The [`ElementRowIterator`] layer folds each
//! row with the same code the client decoder uses and emits one
//! [`ElementRecord`] per element, so both backends agree on every input.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

pub mod record;
pub mod row;
pub mod scan;
pub mod store;

pub use record::{ElementRecord, PushdownOptions, RecordError, OPTIONS_MAGIC, RECORD_MAGIC};
pub use row::ElementRowIterator;
pub use scan::{MemoryTablet, ScanError, SortedKeyIterator};
pub use store::{DistributedStore, RecordStream, SplitStream};
