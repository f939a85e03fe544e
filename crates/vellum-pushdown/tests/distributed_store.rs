// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use vellum_core::{
    Authorizations, CellKey, DecodeError, ElementId, ElementKind, ElementReader, EmbeddedStore,
    FetchHints, RowRange,
};
use vellum_dry_tests::scenarios;
use vellum_pushdown::{DistributedStore, RecordStream, ScanError, SortedKeyIterator};

fn store() -> DistributedStore {
    let mut store = DistributedStore::default();
    store.extend(ElementKind::Vertex, scenarios::restricted_property());
    store.extend(ElementKind::Vertex, scenarios::tombstoned_property());
    store.extend(ElementKind::Vertex, scenarios::hidden_under_secret());
    store.extend(ElementKind::Edge, scenarios::simple_edge());
    store
}

fn many() -> DistributedStore {
    let mut embedded = EmbeddedStore::new();
    for i in 0..40 {
        embedded.extend(
            ElementKind::Vertex,
            scenarios::busy_vertex(&format!("v{i:02}"), 3, 5),
        );
    }
    DistributedStore::from_embedded(&embedded)
}

#[test]
fn scan_and_get_through_the_pushdown_stack() {
    let store = store();
    let auths = Authorizations::new(["A"]);
    let hints = FetchHints::all();
    let ids: Vec<_> = store
        .scan(ElementKind::Vertex, &RowRange::all(), &auths, &hints)
        .map(|r| r.unwrap().id().to_string())
        .collect();
    assert_eq!(ids, vec!["V", "emp", "p"]);

    let edge = store
        .get(ElementKind::Edge, &ElementId::from("e1"), &auths, &hints)
        .unwrap()
        .unwrap();
    assert_eq!(edge.as_edge().unwrap().label(), "knows");
    assert!(store
        .get(ElementKind::Edge, &ElementId::from("e2"), &auths, &hints)
        .unwrap()
        .is_none());
}

#[test]
fn secured_cells_stay_in_the_storage_tier() {
    let store = store();
    let hints = FetchHints::all();
    let emp = store
        .get(
            ElementKind::Vertex,
            &ElementId::from("emp"),
            &Authorizations::none(),
            &hints,
        )
        .unwrap()
        .unwrap();
    assert!(emp.property_by_name("ssn").is_none());
    // V's signal is labelled A
    assert!(store
        .get(
            ElementKind::Vertex,
            &ElementId::from("V"),
            &Authorizations::none(),
            &hints
        )
        .unwrap()
        .is_none());
}

#[test]
fn split_scan_matches_serial_scan_in_order() {
    let store = many();
    let auths = Authorizations::none();
    let hints = FetchHints::all();
    let serial: Vec<_> = store
        .scan(ElementKind::Vertex, &RowRange::all(), &auths, &hints)
        .map(Result::unwrap)
        .collect();
    assert_eq!(serial.len(), 40);
    for pieces in [2, 3, 7, 64] {
        let split: Vec<_> = store
            .scan_split(ElementKind::Vertex, &RowRange::all(), &auths, &hints, pieces)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(split, serial, "pieces = {pieces}");
    }
}

#[test]
fn split_stream_yields_in_order_and_can_be_abandoned() {
    let store = many();
    let auths = Authorizations::none();
    let hints = FetchHints::none();
    let first: Vec<_> = store
        .split_stream(ElementKind::Vertex, &RowRange::all(), &auths, &hints, 4)
        .unwrap()
        .take(3)
        .map(|r| r.unwrap().id().to_string())
        .collect();
    assert_eq!(first, vec!["v00", "v01", "v02"]);

    let all: Vec<_> = store
        .split_stream(ElementKind::Vertex, &RowRange::all(), &auths, &hints, 4)
        .unwrap()
        .map(|r| r.unwrap().id().to_string())
        .collect();
    let expected: Vec<_> = (0..40).map(|i| format!("v{i:02}")).collect();
    assert_eq!(all, expected);
}

#[test]
fn split_scan_honors_the_outer_range() {
    let store = many().with_parallelism(4);
    let range = RowRange::new(Some(ElementId::from("v10")), Some(ElementId::from("v20")));
    let ids: Vec<_> = store
        .scan(
            ElementKind::Vertex,
            &range,
            &Authorizations::none(),
            &FetchHints::none(),
        )
        .map(|r| r.unwrap().id().to_string())
        .collect();
    let expected: Vec<_> = (10..20).map(|i| format!("v{i}")).collect();
    assert_eq!(ids, expected);
}

/// Flips the first byte of every value produced by the layer below.
struct Scramble(Box<dyn SortedKeyIterator>, Option<Bytes>);

impl Scramble {
    fn settle(&mut self) {
        self.1 = self.0.top_value().map(|v| {
            let mut bytes = v.to_vec();
            bytes[0] ^= 0xff;
            Bytes::from(bytes)
        });
    }
}

impl SortedKeyIterator for Scramble {
    fn seek(&mut self, range: &RowRange) -> Result<(), ScanError> {
        self.0.seek(range)?;
        self.settle();
        Ok(())
    }

    fn has_top(&self) -> bool {
        self.0.has_top()
    }

    fn top_key(&self) -> Option<&CellKey> {
        self.0.top_key()
    }

    fn top_value(&self) -> Option<&Bytes> {
        self.1.as_ref()
    }

    fn next(&mut self) -> Result<(), ScanError> {
        self.0.next()?;
        self.settle();
        Ok(())
    }

    fn deep_copy(&self) -> Box<dyn SortedKeyIterator> {
        Box::new(Self(self.0.deep_copy(), None))
    }
}

#[test]
fn corrupt_records_surface_as_remote_errors() {
    let store = store();
    let stack = store
        .prepare(ElementKind::Vertex, &Authorizations::none(), &FetchHints::all())
        .unwrap();
    let results: Vec<_> =
        RecordStream::new(Box::new(Scramble(Box::new(stack), None)), &RowRange::all()).collect();
    assert_eq!(results.len(), 2);
    for (result, id) in results.iter().zip(["emp", "p"]) {
        match result {
            Err(err @ DecodeError::Remote { .. }) => {
                assert_eq!(err.element_id().map(ElementId::as_str), Some(id));
            }
            other => unreachable!("expected a remote error, got {other:?}"),
        }
    }
}
