// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The generic fold: dispatch every cell of one element, then resolve.
//!
//! The fold is the only place the column model turns into an [`Element`].
//! Both the client decoder and the push-down iterator call [`fold`], so every
//! backend produces identical elements for identical input.
//!
//! Resolution rules, applied after all cells were dispatched:
//!
//! 1. No readable signal: absent.
//! 2. A readable element tombstone at or after the signal: absent.
//! 3. A readable element hide marker: absent unless hints include hidden data.
//! 4. Properties survive unless a readable tombstone at or after their
//!    timestamp exists, or they carry a readable hide marker and hints
//!    exclude hidden data.
use std::ops::ControlFlow;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::accumulator::ElementAccumulator;
use crate::column::ColumnKind;
use crate::element::{Element, ElementData, MetadataEntry, PropertyData};
use crate::error::DecodeError;
use crate::fetch_hints::FetchHints;
use crate::ident::ElementId;
use crate::mutation::Mutation;
use crate::strategy::ElementStrategy;
use crate::visibility::AuthorizationGate;

/// Caller policy shared read-only by every fold of a scan.
#[derive(Clone, Copy)]
pub struct FoldContext<'a> {
    /// Read-permission predicate.
    pub gate: &'a (dyn AuthorizationGate + Sync),
    /// What to materialize.
    pub hints: &'a FetchHints,
}

impl<'a> FoldContext<'a> {
    /// Bundles a gate and hints.
    pub fn new(gate: &'a (dyn AuthorizationGate + Sync), hints: &'a FetchHints) -> Self {
        Self { gate, hints }
    }
}

/// Folds all cells of one element into a decoded element.
///
/// Returns `Ok(None)` when the element is absent to this caller (no readable
/// signal, tombstoned, hidden, or removed by a delete-row marker). Callers
/// cannot tell these cases apart.
///
/// # Errors
///
/// Returns [`DecodeError`] on structural corruption of any cell.
pub fn fold<S>(
    strategy: &S,
    element_id: &ElementId,
    mut cells: Vec<Mutation>,
    ctx: &FoldContext<'_>,
) -> Result<Option<Element>, DecodeError>
where
    S: ElementStrategy + ?Sized,
{
    cells.sort_by(Mutation::fold_order);
    let mut acc = strategy.new_accumulator();
    for cell in &cells {
        if absorb(strategy, &mut acc, cell, ctx)?.is_break() {
            trace!(%element_id, "delete-row marker");
            return Ok(None);
        }
    }
    finalize(strategy, element_id, acc, ctx)
}

/// Dispatches one cell; breaks on a delete-row marker.
fn absorb<S>(
    strategy: &S,
    acc: &mut ElementAccumulator<S::Extra>,
    cell: &Mutation,
    ctx: &FoldContext<'_>,
) -> Result<ControlFlow<()>, DecodeError>
where
    S: ElementStrategy + ?Sized,
{
    match ColumnKind::classify(&cell.family, strategy.signal_family()) {
        ColumnKind::DeleteRow => return Ok(ControlFlow::Break(())),
        ColumnKind::Signal => acc.accept_signal(cell, ctx),
        ColumnKind::Property => acc.accept_property(cell, ctx)?,
        ColumnKind::PropertyMetadata => acc.accept_metadata(cell, ctx)?,
        ColumnKind::PropertySoftDelete => acc.record_property_tombstone(cell, ctx)?,
        ColumnKind::PropertyHidden => acc.record_property_hidden(cell, ctx)?,
        ColumnKind::ElementSoftDelete => acc.record_element_tombstone(cell),
        ColumnKind::ElementHidden => acc.record_element_hidden(cell),
        ColumnKind::ExtendedData => acc.accept_extended_data(cell, ctx)?,
        ColumnKind::KindSpecific => {
            if !strategy.decode_column(&mut acc.extra, cell, ctx)? {
                trace!(
                    element_id = %cell.element_id,
                    family = %String::from_utf8_lossy(&cell.family),
                    "skipping unknown column"
                );
            }
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn finalize<S>(
    strategy: &S,
    element_id: &ElementId,
    mut acc: ElementAccumulator<S::Extra>,
    ctx: &FoldContext<'_>,
) -> Result<Option<Element>, DecodeError>
where
    S: ElementStrategy + ?Sized,
{
    let Some(signal) = acc.signal.take() else {
        return Ok(None);
    };
    if acc
        .element_tombstones
        .suppresses(&(), signal.timestamp, ctx.gate)
    {
        return Ok(None);
    }
    let hidden_visibilities = acc.element_hidden.readable_hiders(&(), ctx.gate);
    if !hidden_visibilities.is_empty() && !ctx.hints.include_hidden() {
        return Ok(None);
    }
    let (properties, metadata) = resolve_properties(&mut acc, ctx);
    let data = ElementData {
        id: element_id.clone(),
        visibility: signal.visibility.clone(),
        timestamp: signal.timestamp,
        hidden_visibilities,
        properties,
        metadata,
        extended_data_table_names: std::mem::take(&mut acc.extended_data_table_names),
    };
    strategy.finish(data, signal, acc.extra, ctx)
}

/// Applies property tombstones and hide markers, orders survivors by
/// discriminator and compacts the metadata catalogue to the entries they use.
#[allow(clippy::cast_possible_truncation)]
fn resolve_properties<X>(
    acc: &mut ElementAccumulator<X>,
    ctx: &FoldContext<'_>,
) -> (Vec<PropertyData>, Vec<MetadataEntry>) {
    let mut pending: Vec<_> = acc.properties.drain().collect();
    pending.sort_by(|a, b| a.0.cmp(&b.0));

    let mut catalogue: Vec<MetadataEntry> = Vec::new();
    let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
    let mut out = Vec::with_capacity(pending.len());
    for (discriminator, property) in pending {
        if acc
            .property_tombstones
            .suppresses(&discriminator, property.timestamp, ctx.gate)
        {
            continue;
        }
        let hidden_visibilities = acc.property_hidden.readable_hiders(&discriminator, ctx.gate);
        if !hidden_visibilities.is_empty() && !ctx.hints.include_hidden() {
            continue;
        }
        let mut slots = acc
            .property_metadata
            .remove(&discriminator)
            .unwrap_or_default();
        slots.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| a.visibility.cmp(&b.visibility))
        });
        let metadata = slots
            .iter()
            .filter_map(|slot| {
                let entry = acc.catalogue.get(slot.index)?;
                Some(*remap.entry(slot.index).or_insert_with(|| {
                    catalogue.push(entry.clone());
                    (catalogue.len() - 1) as u32
                }))
            })
            .collect();
        out.push(PropertyData {
            discriminator,
            timestamp: property.timestamp,
            value: property.value,
            metadata,
            hidden_visibilities,
        });
    }
    (out, catalogue)
}
