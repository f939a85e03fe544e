// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-element fold state and the handlers for the shared column families.
//!
//! Cells arrive newest first. Every handler checks fetch-hint inclusion and
//! the authorization gate before copying a payload, and the first accepted
//! occurrence of a slot is authoritative.
use std::collections::BTreeSet;

use bytes::Bytes;
use rustc_hash::FxHashMap;

use crate::column::HiddenMarker;
use crate::element::{Discriminator, MetadataEntry};
use crate::error::DecodeError;
use crate::fold::FoldContext;
use crate::ident::{ElementId, Timestamp};
use crate::ledger::{HiddenLedger, TombstoneLedger};
use crate::mutation::Mutation;
use crate::qualifier::{
    decode_name, PropertyHiddenQualifier, PropertyMetadataQualifier, PropertyQualifier,
    QualifierError,
};
use crate::visibility::Visibility;

/// The accepted signal cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    /// Signal visibility, which becomes the element visibility.
    pub visibility: Visibility,
    /// Signal timestamp, which becomes the element timestamp.
    pub timestamp: Timestamp,
    /// Raw signal value (vertex type or edge label).
    pub value: Bytes,
}

#[derive(Clone, Debug)]
pub(crate) struct PendingProperty {
    pub(crate) timestamp: Timestamp,
    pub(crate) value: Bytes,
}

#[derive(Clone, Debug)]
pub(crate) struct MetadataSlot {
    pub(crate) key: String,
    pub(crate) visibility: Visibility,
    pub(crate) index: u32,
}

/// Deduplicating store of metadata entries; properties refer to it by index.
#[derive(Clone, Debug, Default)]
pub struct MetadataCatalogue {
    entries: Vec<MetadataEntry>,
}

impl MetadataCatalogue {
    /// Returns the index of `entry`, appending it if no equal entry exists.
    #[allow(clippy::cast_possible_truncation)]
    pub fn intern(&mut self, entry: MetadataEntry) -> u32 {
        if let Some(ix) = self.entries.iter().position(|e| *e == entry) {
            return ix as u32;
        }
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }

    /// Entry at `index`.
    pub fn get(&self, index: u32) -> Option<&MetadataEntry> {
        self.entries.get(index as usize)
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entry was interned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Working state for one element during a fold.
///
/// `X` carries the element-kind specific part (edge refs for vertices,
/// endpoints for edges). Cloning an accumulator yields an independent copy.
#[derive(Clone, Debug)]
pub struct ElementAccumulator<X> {
    pub(crate) signal: Option<Signal>,
    pub(crate) properties: FxHashMap<Discriminator, PendingProperty>,
    pub(crate) catalogue: MetadataCatalogue,
    pub(crate) property_metadata: FxHashMap<Discriminator, Vec<MetadataSlot>>,
    pub(crate) property_tombstones: TombstoneLedger<Discriminator>,
    pub(crate) property_hidden: HiddenLedger<Discriminator>,
    pub(crate) element_tombstones: TombstoneLedger<()>,
    pub(crate) element_hidden: HiddenLedger<()>,
    pub(crate) extended_data_table_names: BTreeSet<String>,
    pub(crate) extra: X,
}

impl<X: Default> Default for ElementAccumulator<X> {
    fn default() -> Self {
        Self {
            signal: None,
            properties: FxHashMap::default(),
            catalogue: MetadataCatalogue::default(),
            property_metadata: FxHashMap::default(),
            property_tombstones: TombstoneLedger::default(),
            property_hidden: HiddenLedger::default(),
            element_tombstones: TombstoneLedger::default(),
            element_hidden: HiddenLedger::default(),
            extended_data_table_names: BTreeSet::new(),
            extra: X::default(),
        }
    }
}

fn malformed<'a>(
    element_id: &'a ElementId,
    column: &'static str,
) -> impl FnOnce(QualifierError) -> DecodeError + 'a {
    move |source| DecodeError::MalformedQualifier {
        element_id: element_id.clone(),
        column,
        source,
    }
}

impl<X> ElementAccumulator<X> {
    /// The accepted signal, if any.
    pub fn signal(&self) -> Option<&Signal> {
        self.signal.as_ref()
    }

    /// Number of properties accepted so far (before tombstones and hiding).
    pub fn pending_property_count(&self) -> usize {
        self.properties.len()
    }

    /// The kind-specific state.
    pub fn extra(&self) -> &X {
        &self.extra
    }

    /// Accepts a signal cell if it is newer than the recorded one and readable.
    pub(crate) fn accept_signal(&mut self, cell: &Mutation, ctx: &FoldContext<'_>) {
        if self
            .signal
            .as_ref()
            .is_some_and(|s| cell.timestamp <= s.timestamp)
        {
            return;
        }
        if !ctx.gate.can_read(&cell.visibility) {
            return;
        }
        self.signal = Some(Signal {
            visibility: cell.visibility.clone(),
            timestamp: cell.timestamp,
            value: cell.value.clone(),
        });
    }

    pub(crate) fn accept_property(
        &mut self,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        let q = PropertyQualifier::decode(&cell.qualifier)
            .map_err(malformed(&cell.element_id, "PROP"))?;
        if !ctx.hints.is_property_included(&q.name) || !ctx.gate.can_read(&cell.visibility) {
            return Ok(());
        }
        let discriminator = Discriminator {
            name: q.name,
            key: q.key,
            visibility: cell.visibility.clone(),
        };
        self.properties
            .entry(discriminator)
            .or_insert_with(|| PendingProperty {
                timestamp: cell.timestamp,
                value: cell.value.clone(),
            });
        Ok(())
    }

    pub(crate) fn accept_metadata(
        &mut self,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        let q = PropertyMetadataQualifier::decode(&cell.qualifier)
            .map_err(malformed(&cell.element_id, "PROPMETA"))?;
        if !ctx.hints.is_property_included(&q.name)
            || !ctx.hints.is_metadata_included(&q.metadata_key)
            || !ctx.gate.can_read(&cell.visibility)
        {
            return Ok(());
        }
        let owner = Discriminator {
            name: q.name,
            key: q.key,
            visibility: q.visibility,
        };
        let slots = self.property_metadata.entry(owner).or_default();
        if slots
            .iter()
            .any(|s| s.key == q.metadata_key && s.visibility == cell.visibility)
        {
            return Ok(());
        }
        let index = self.catalogue.intern(MetadataEntry {
            key: q.metadata_key.clone(),
            value: cell.value.clone(),
            visibility: cell.visibility.clone(),
        });
        slots.push(MetadataSlot {
            key: q.metadata_key,
            visibility: cell.visibility.clone(),
            index,
        });
        Ok(())
    }

    pub(crate) fn record_property_tombstone(
        &mut self,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        let q = PropertyQualifier::decode(&cell.qualifier)
            .map_err(malformed(&cell.element_id, "PROPD"))?;
        if !ctx.hints.is_property_included(&q.name) {
            return Ok(());
        }
        let target = Discriminator {
            name: q.name,
            key: q.key,
            visibility: cell.visibility.clone(),
        };
        self.property_tombstones
            .record(target, cell.timestamp, cell.visibility.clone());
        Ok(())
    }

    pub(crate) fn record_property_hidden(
        &mut self,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        let q = PropertyHiddenQualifier::decode(&cell.qualifier)
            .map_err(malformed(&cell.element_id, "PROPH"))?;
        if !ctx.hints.is_property_included(&q.name) {
            return Ok(());
        }
        let target = Discriminator {
            name: q.name,
            key: q.key,
            visibility: q.visibility,
        };
        self.property_hidden.record(
            target,
            cell.visibility.clone(),
            HiddenMarker::from_value(&cell.value),
        );
        Ok(())
    }

    pub(crate) fn record_element_tombstone(&mut self, cell: &Mutation) {
        self.element_tombstones
            .record((), cell.timestamp, cell.visibility.clone());
    }

    pub(crate) fn record_element_hidden(&mut self, cell: &Mutation) {
        self.element_hidden.record(
            (),
            cell.visibility.clone(),
            HiddenMarker::from_value(&cell.value),
        );
    }

    pub(crate) fn accept_extended_data(
        &mut self,
        cell: &Mutation,
        ctx: &FoldContext<'_>,
    ) -> Result<(), DecodeError> {
        if !ctx.hints.include_extended_data_table_names() {
            return Ok(());
        }
        let name = decode_name(&cell.qualifier, "tableName")
            .map_err(malformed(&cell.element_id, "EXTDATA"))?;
        self.extended_data_table_names.insert(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &'static [u8]) -> MetadataEntry {
        MetadataEntry {
            key: key.into(),
            value: Bytes::from_static(value),
            visibility: Visibility::empty(),
        }
    }

    #[test]
    fn catalogue_dedupes_equal_entries() {
        let mut catalogue = MetadataCatalogue::default();
        assert_eq!(catalogue.intern(entry("source", b"sensor")), 0);
        assert_eq!(catalogue.intern(entry("confidence", b"0.9")), 1);
        assert_eq!(catalogue.intern(entry("source", b"sensor")), 0);
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.get(1).map(|e| e.key.as_str()), Some("confidence"));
    }

    #[test]
    fn clones_are_independent() {
        let mut a = ElementAccumulator::<u32>::default();
        a.extended_data_table_names.insert("t1".into());
        let mut b = a.clone();
        b.extended_data_table_names.insert("t2".into());
        b.extra = 7;
        assert_eq!(a.extended_data_table_names.len(), 1);
        assert_eq!(a.extra, 0);
    }
}
