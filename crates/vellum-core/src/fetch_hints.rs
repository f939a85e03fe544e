// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fetch hints: caller policy narrowing what a decode hydrates.
//!
//! Every inclusion predicate here is evaluated by the dispatcher *before* a
//! cell's payload is copied into the accumulator, so excluded columns are
//! never materialized.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::Direction;

/// Rejected fetch-hint combinations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchHintsError {
    /// Metadata was requested but no property can be included.
    #[error("property metadata requested without any properties")]
    MetadataWithoutProperties,
    /// An explicit empty set was given where it would silently exclude everything.
    #[error("empty {0} set; use the exclude-all form instead")]
    EmptySet(&'static str),
}

/// Which parts of an element a decode materializes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FetchHints {
    include_all_properties: bool,
    property_names: BTreeSet<String>,
    include_all_property_metadata: bool,
    metadata_keys: BTreeSet<String>,
    include_hidden: bool,
    include_all_edge_refs: bool,
    include_out_edge_refs: bool,
    include_in_edge_refs: bool,
    edge_labels: Option<BTreeSet<String>>,
    include_edge_labels_and_counts: bool,
    include_extended_data_table_names: bool,
}

impl Default for FetchHints {
    fn default() -> Self {
        Self::all()
    }
}

impl FetchHints {
    /// Everything except hidden data.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_all_properties: true,
            property_names: BTreeSet::new(),
            include_all_property_metadata: true,
            metadata_keys: BTreeSet::new(),
            include_hidden: false,
            include_all_edge_refs: true,
            include_out_edge_refs: false,
            include_in_edge_refs: false,
            edge_labels: None,
            include_edge_labels_and_counts: true,
            include_extended_data_table_names: true,
        }
    }

    /// Everything, hidden data included.
    #[must_use]
    pub fn all_including_hidden() -> Self {
        Self {
            include_hidden: true,
            ..Self::all()
        }
    }

    /// Only the element's identity (signal, visibility, timestamp).
    #[must_use]
    pub fn none() -> Self {
        Self {
            include_all_properties: false,
            include_all_property_metadata: false,
            include_all_edge_refs: false,
            include_edge_labels_and_counts: false,
            include_extended_data_table_names: false,
            ..Self::all()
        }
    }

    /// All properties, no metadata, no edge refs.
    #[must_use]
    pub fn properties() -> Self {
        Self {
            include_all_properties: true,
            ..Self::none()
        }
    }

    /// All properties with their metadata, no edge refs.
    #[must_use]
    pub fn properties_and_metadata() -> Self {
        Self {
            include_all_property_metadata: true,
            ..Self::properties()
        }
    }

    /// All edge refs, no properties.
    #[must_use]
    pub fn edge_refs() -> Self {
        Self {
            include_all_edge_refs: true,
            ..Self::none()
        }
    }

    /// Only the per-direction label/count summary.
    #[must_use]
    pub fn edge_labels() -> Self {
        Self {
            include_edge_labels_and_counts: true,
            ..Self::none()
        }
    }

    /// Starts a builder from [`FetchHints::none`].
    #[must_use]
    pub fn builder() -> FetchHintsBuilder {
        FetchHintsBuilder {
            hints: Self::none(),
        }
    }

    /// Resolves a preset by name (`all`, `all-including-hidden`, `none`,
    /// `properties`, `properties-and-metadata`, `edge-refs`, `edge-labels`).
    pub fn preset(name: &str) -> Option<Self> {
        Some(match name {
            "all" => Self::all(),
            "all-including-hidden" => Self::all_including_hidden(),
            "none" => Self::none(),
            "properties" => Self::properties(),
            "properties-and-metadata" => Self::properties_and_metadata(),
            "edge-refs" => Self::edge_refs(),
            "edge-labels" => Self::edge_labels(),
            _ => return None,
        })
    }

    /// True if a property named `name` may be materialized.
    pub fn is_property_included(&self, name: &str) -> bool {
        self.include_all_properties || self.property_names.contains(name)
    }

    /// True if metadata `key` of an included property may be materialized.
    pub fn is_metadata_included(&self, key: &str) -> bool {
        self.include_all_property_metadata || self.metadata_keys.contains(key)
    }

    /// True if hide markers are reported instead of applied.
    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// True if refs in `direction` must be inspected at all, either to
    /// materialize them or to count them for the label summary.
    pub fn wants_edge_refs(&self, direction: Direction) -> bool {
        self.include_edge_labels_and_counts || self.materializes_any_ref(direction)
    }

    /// True if a ref in `direction` with `label` is materialized in the output.
    pub fn is_edge_ref_included(&self, direction: Direction, label: &str) -> bool {
        self.include_all_edge_refs
            || self.direction_included(direction)
            || self
                .edge_labels
                .as_ref()
                .is_some_and(|labels| labels.contains(label))
    }

    /// True if per-label counts are reported.
    pub fn include_edge_labels_and_counts(&self) -> bool {
        self.include_edge_labels_and_counts
    }

    /// True if extended-data table names are reported.
    pub fn include_extended_data_table_names(&self) -> bool {
        self.include_extended_data_table_names
    }

    fn direction_included(&self, direction: Direction) -> bool {
        match direction {
            Direction::Out => self.include_out_edge_refs,
            Direction::In => self.include_in_edge_refs,
        }
    }

    fn materializes_any_ref(&self, direction: Direction) -> bool {
        self.include_all_edge_refs || self.direction_included(direction) || self.edge_labels.is_some()
    }

    /// True if no property can be included.
    fn excludes_all_properties(&self) -> bool {
        !self.include_all_properties && self.property_names.is_empty()
    }

    fn validate(&self) -> Result<(), FetchHintsError> {
        let wants_metadata = self.include_all_property_metadata || !self.metadata_keys.is_empty();
        if wants_metadata && self.excludes_all_properties() {
            return Err(FetchHintsError::MetadataWithoutProperties);
        }
        if self.edge_labels.as_ref().is_some_and(BTreeSet::is_empty) {
            return Err(FetchHintsError::EmptySet("edge label"));
        }
        Ok(())
    }
}

/// Validating builder for [`FetchHints`].
#[derive(Clone, Debug)]
pub struct FetchHintsBuilder {
    hints: FetchHints,
}

impl FetchHintsBuilder {
    /// Include every property.
    pub fn all_properties(mut self) -> Self {
        self.hints.include_all_properties = true;
        self
    }

    /// Include only the named properties.
    pub fn property_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.include_all_properties = false;
        self.hints.property_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Include all metadata of included properties.
    pub fn all_property_metadata(mut self) -> Self {
        self.hints.include_all_property_metadata = true;
        self
    }

    /// Include only the named metadata keys.
    pub fn metadata_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.include_all_property_metadata = false;
        self.hints.metadata_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Report hidden data instead of suppressing it.
    pub fn include_hidden(mut self) -> Self {
        self.hints.include_hidden = true;
        self
    }

    /// Include refs in both directions with any label.
    pub fn all_edge_refs(mut self) -> Self {
        self.hints.include_all_edge_refs = true;
        self
    }

    /// Include every outgoing ref.
    pub fn out_edge_refs(mut self) -> Self {
        self.hints.include_out_edge_refs = true;
        self
    }

    /// Include every incoming ref.
    pub fn in_edge_refs(mut self) -> Self {
        self.hints.include_in_edge_refs = true;
        self
    }

    /// Include refs (either direction) whose label is in `labels`.
    pub fn edge_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.edge_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Report per-direction label counts.
    pub fn edge_labels_and_counts(mut self) -> Self {
        self.hints.include_edge_labels_and_counts = true;
        self
    }

    /// Report extended-data table names.
    pub fn extended_data_table_names(mut self) -> Self {
        self.hints.include_extended_data_table_names = true;
        self
    }

    /// Validates and returns the hints.
    ///
    /// # Errors
    ///
    /// See [`FetchHintsError`].
    pub fn build(self) -> Result<FetchHints, FetchHintsError> {
        self.hints.validate()?;
        Ok(self.hints)
    }
}
