// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Splits a row-ordered mutation stream into one batch per element.
use std::iter::Peekable;

use crate::ident::ElementId;
use crate::mutation::Mutation;

/// All cells of one element, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationBatch {
    /// Element the cells belong to.
    pub element_id: ElementId,
    /// The cells.
    pub mutations: Vec<Mutation>,
}

/// Groups consecutive mutations that share an element id.
///
/// The input must keep each element's cells contiguous (row order does this).
/// Cells of one element split across two runs produce two batches.
#[derive(Debug)]
pub struct RunSegmenter<I: Iterator<Item = Mutation>> {
    inner: Peekable<I>,
}

impl<I: Iterator<Item = Mutation>> RunSegmenter<I> {
    /// Wraps a row-ordered mutation stream.
    pub fn new(mutations: I) -> Self {
        Self {
            inner: mutations.peekable(),
        }
    }
}

impl<I: Iterator<Item = Mutation>> Iterator for RunSegmenter<I> {
    type Item = MutationBatch;

    fn next(&mut self) -> Option<MutationBatch> {
        let first = self.inner.next()?;
        let element_id = first.element_id.clone();
        let mut mutations = vec![first];
        while let Some(next) = self.inner.next_if(|m| m.element_id == element_id) {
            mutations.push(next);
        }
        Some(MutationBatch {
            element_id,
            mutations,
        })
    }
}
