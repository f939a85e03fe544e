// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Scan benchmarks: client fold vs push-down, serial vs split.
//!
//! ```sh
//! cargo bench --package vellum-benches --bench pushdown_scan
//! ```
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use vellum_core::{
    Authorizations, ElementKind, ElementReader, EmbeddedStore, FetchHints, RowRange,
};
use vellum_dry_tests::scenarios;
use vellum_pushdown::DistributedStore;

const ROWS: usize = 500;

fn embedded() -> EmbeddedStore {
    let mut store = EmbeddedStore::new();
    for i in 0..ROWS {
        store.extend(
            ElementKind::Vertex,
            scenarios::busy_vertex(&format!("v{i:05}"), 8, 8),
        );
    }
    store
}

fn bench_backends(c: &mut Criterion) {
    let embedded = embedded();
    let distributed = DistributedStore::from_embedded(&embedded);
    let auths = Authorizations::none();
    let hints = FetchHints::all();
    let range = RowRange::all();

    let mut group = c.benchmark_group("scan_backend");
    group.throughput(Throughput::Elements(ROWS as u64));
    group.bench_function("embedded", |b| {
        b.iter(|| {
            black_box(
                embedded
                    .scan(ElementKind::Vertex, &range, &auths, &hints)
                    .count(),
            )
        });
    });
    group.bench_function("pushdown", |b| {
        b.iter(|| {
            black_box(
                distributed
                    .scan(ElementKind::Vertex, &range, &auths, &hints)
                    .count(),
            )
        });
    });
    group.finish();
}

fn bench_split_scaling(c: &mut Criterion) {
    let distributed = DistributedStore::from_embedded(&embedded());
    let auths = Authorizations::none();
    let hints = FetchHints::all();
    let range = RowRange::all();

    let mut group = c.benchmark_group("scan_split");
    group.throughput(Throughput::Elements(ROWS as u64));
    for pieces in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(pieces), &pieces, |b, &pieces| {
            b.iter(|| {
                black_box(
                    distributed
                        .scan_split(ElementKind::Vertex, &range, &auths, &hints, pieces)
                        .map(|r| r.len()),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_backends, bench_split_scaling);
criterion_main!(benches);
