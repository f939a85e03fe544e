// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use vellum_app_core::config::{ConfigError, ConfigService};
use vellum_app_core::prefs::{BackendKind, ReaderPrefs, READER_PREFS_KEY};
use vellum_core::{Authorizations, FetchHints};
use vellum_dry_tests::InMemoryConfigStore;

#[test]
fn missing_prefs_fall_back_to_defaults() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let prefs: ReaderPrefs = service.load_or_default(READER_PREFS_KEY).unwrap();
    assert_eq!(prefs, ReaderPrefs::default());
    assert_eq!(store.reads(), 1);
}

#[test]
fn prefs_round_trip_through_the_store() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let prefs = ReaderPrefs {
        authorizations: Authorizations::new(["A", "B"]),
        fetch_hints: FetchHints::properties(),
        backend: BackendKind::Pushdown,
        parallelism: 4,
        log_filter: "vellum_core=debug".into(),
    };
    service.save(READER_PREFS_KEY, &prefs).unwrap();
    assert!(service.contains(READER_PREFS_KEY).unwrap());
    assert!(store.raw(READER_PREFS_KEY).is_some());
    let loaded: Option<ReaderPrefs> = service.load(READER_PREFS_KEY).unwrap();
    assert_eq!(loaded, Some(prefs));
}

#[test]
fn partial_documents_fill_in_defaults() {
    let prefs: ReaderPrefs = serde_json::from_str(r#"{"backend":"pushdown"}"#).unwrap();
    assert_eq!(prefs.backend, BackendKind::Pushdown);
    assert_eq!(prefs.parallelism, 1);
    assert_eq!(prefs.fetch_hints, FetchHints::all());
}

#[test]
fn store_failures_propagate() {
    let store = InMemoryConfigStore::new();
    store.set_offline(true);
    let service = ConfigService::new(store);
    let result: Result<Option<ReaderPrefs>, _> = service.load(READER_PREFS_KEY);
    assert!(matches!(result, Err(ConfigError::Unavailable(_))));
}

#[test]
fn corrupt_documents_are_serde_errors() {
    let service = ConfigService::new(InMemoryConfigStore::seeded(READER_PREFS_KEY, "[1, 2]"));
    let result: Result<Option<ReaderPrefs>, _> = service.load(READER_PREFS_KEY);
    assert!(matches!(result, Err(ConfigError::Serde { ref key, .. }) if key == READER_PREFS_KEY));
}

#[test]
fn empty_document_counts_as_missing() {
    let service = ConfigService::new(InMemoryConfigStore::seeded(READER_PREFS_KEY, ""));
    assert!(!service.contains(READER_PREFS_KEY).unwrap());
    let prefs: ReaderPrefs = service.load_or_default(READER_PREFS_KEY).unwrap();
    assert_eq!(prefs, ReaderPrefs::default());
}
