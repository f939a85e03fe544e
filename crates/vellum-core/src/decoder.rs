// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Client-side decoding of raw mutation streams.
//!
//! [`ElementDecoder`] segments a row-ordered stream into batches and folds
//! each batch. Absent elements are skipped silently; corrupt ones surface as
//! an `Err` item and the stream carries on with the next batch.
use tracing::{debug, warn};

use crate::element::Element;
use crate::error::DecodeError;
use crate::fold::{fold, FoldContext};
use crate::ident::ElementKind;
use crate::mutation::Mutation;
use crate::segment::{MutationBatch, RunSegmenter};
use crate::strategy::{EdgeStrategy, ElementStrategy, VertexStrategy};

/// Boxed stream of decode results.
pub type ElementStream<'a> = Box<dyn Iterator<Item = Result<Element, DecodeError>> + 'a>;

#[derive(Clone, Copy, Debug, Default)]
struct DecodeStats {
    batches: u64,
    live: u64,
    absent: u64,
    failed: u64,
}

/// Folds one batch with `strategy`.
///
/// # Errors
///
/// Returns [`DecodeError`] on structural corruption.
pub fn decode_batch<S>(
    strategy: &S,
    batch: MutationBatch,
    ctx: &FoldContext<'_>,
) -> Result<Option<Element>, DecodeError>
where
    S: ElementStrategy + ?Sized,
{
    fold(strategy, &batch.element_id, batch.mutations, ctx)
}

/// Lazy decoder over a row-ordered mutation stream.
pub struct ElementDecoder<'a, I, S>
where
    I: Iterator<Item = Mutation>,
{
    batches: RunSegmenter<I>,
    strategy: S,
    ctx: FoldContext<'a>,
    stats: DecodeStats,
    reported: bool,
}

impl<'a, I, S> ElementDecoder<'a, I, S>
where
    I: Iterator<Item = Mutation>,
    S: ElementStrategy,
{
    /// Decodes `mutations` with `strategy` under `ctx`.
    pub fn new(mutations: I, strategy: S, ctx: FoldContext<'a>) -> Self {
        Self {
            batches: RunSegmenter::new(mutations),
            strategy,
            ctx,
            stats: DecodeStats::default(),
            reported: false,
        }
    }
}

impl<I, S> Iterator for ElementDecoder<'_, I, S>
where
    I: Iterator<Item = Mutation>,
    S: ElementStrategy,
{
    type Item = Result<Element, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(batch) = self.batches.next() else {
                if !self.reported {
                    self.reported = true;
                    let s = self.stats;
                    debug!(
                        kind = %self.strategy.kind(),
                        batches = s.batches,
                        live = s.live,
                        absent = s.absent,
                        failed = s.failed,
                        "decode stream exhausted"
                    );
                }
                return None;
            };
            self.stats.batches += 1;
            match decode_batch(&self.strategy, batch, &self.ctx) {
                Ok(Some(element)) => {
                    self.stats.live += 1;
                    return Some(Ok(element));
                }
                Ok(None) => self.stats.absent += 1,
                Err(err) => {
                    self.stats.failed += 1;
                    warn!(error = %err, "element decode failed");
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Decodes `mutations` as elements of `kind`.
pub fn decode_elements<'a, I>(kind: ElementKind, mutations: I, ctx: FoldContext<'a>) -> ElementStream<'a>
where
    I: IntoIterator<Item = Mutation>,
    I::IntoIter: 'a,
{
    let mutations = mutations.into_iter();
    match kind {
        ElementKind::Vertex => Box::new(ElementDecoder::new(mutations, VertexStrategy, ctx)),
        ElementKind::Edge => Box::new(ElementDecoder::new(mutations, EdgeStrategy, ctx)),
    }
}
