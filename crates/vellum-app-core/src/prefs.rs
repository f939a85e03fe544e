// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved defaults for reading elements (authorizations, hints, backend).

use std::fmt;

use serde::{Deserialize, Serialize};
use vellum_core::{Authorizations, FetchHints};

/// Config key under which [`ReaderPrefs`] are stored.
pub const READER_PREFS_KEY: &str = "reader";

/// Which backend materializes elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Raw cells folded on the client.
    #[default]
    Embedded,
    /// Folded inside the storage-tier scan.
    Pushdown,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => f.write_str("embedded"),
            Self::Pushdown => f.write_str("pushdown"),
        }
    }
}

/// Reader defaults applied when a command does not override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderPrefs {
    /// Labels held by default.
    pub authorizations: Authorizations,
    /// Default fetch hints.
    pub fetch_hints: FetchHints,
    /// Default backend.
    pub backend: BackendKind,
    /// Push-down scan threads; 1 scans the whole range on the caller's thread.
    pub parallelism: usize,
    /// Default `tracing` filter directive.
    pub log_filter: String,
}

impl Default for ReaderPrefs {
    fn default() -> Self {
        Self {
            authorizations: Authorizations::none(),
            fetch_hints: FetchHints::all(),
            backend: BackendKind::Embedded,
            parallelism: 1,
            log_filter: "info".into(),
        }
    }
}
