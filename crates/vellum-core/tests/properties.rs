// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Universally quantified read-path properties over random rows.

use proptest::prelude::*;
use vellum_core::{
    fold, AuthorizationGate, Authorizations, Direction, Element, ElementId, FetchHints,
    FoldContext, Mutation, VertexStrategy,
};
use vellum_dry_tests::RowBuilder;

const VISIBILITIES: [&str; 5] = ["", "A", "B", "A&B", "A|B"];
const NAMES: [&str; 3] = ["age", "name", "email"];
const LABELS: [&str; 2] = ["knows", "likes"];

#[derive(Clone, Debug)]
enum Op {
    Signal,
    Property(usize, u8),
    PropertyDelete(usize),
    HideProperty(usize, usize),
    UnhideProperty(usize, usize),
    Ref(Direction, u8, usize),
    RefDelete(Direction, u8),
    HideRef(Direction, u8),
    SoftDelete,
    Hide,
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Out), Just(Direction::In)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Signal),
        6 => (0..NAMES.len(), any::<u8>()).prop_map(|(n, v)| Op::Property(n, v)),
        2 => (0..NAMES.len()).prop_map(Op::PropertyDelete),
        2 => (0..NAMES.len(), 0..VISIBILITIES.len()).prop_map(|(n, v)| Op::HideProperty(n, v)),
        1 => (0..NAMES.len(), 0..VISIBILITIES.len()).prop_map(|(n, v)| Op::UnhideProperty(n, v)),
        4 => (direction(), 0u8..4, 0..LABELS.len()).prop_map(|(d, e, l)| Op::Ref(d, e, l)),
        1 => (direction(), 0u8..4).prop_map(|(d, e)| Op::RefDelete(d, e)),
        1 => (direction(), 0u8..4).prop_map(|(d, e)| Op::HideRef(d, e)),
        1 => Just(Op::SoftDelete),
        1 => Just(Op::Hide),
    ]
}

fn stamped_op() -> impl Strategy<Value = (Op, i64, usize)> {
    (op(), 0i64..16, 0..VISIBILITIES.len())
}

fn build(ops: &[(Op, i64, usize)]) -> Vec<Mutation> {
    let mut row = RowBuilder::vertex("v");
    for (op, ts, vis) in ops {
        row = row.at(*ts).visible_to(VISIBILITIES[*vis]);
        let edge = |e: &u8| format!("e{e}");
        row = match op {
            Op::Signal => row.signal("person"),
            Op::Property(n, v) => row.property(NAMES[*n], "", vec![*v]),
            Op::PropertyDelete(n) => row.property_soft_delete(NAMES[*n], ""),
            Op::HideProperty(n, pv) => row.hide_property(NAMES[*n], "", VISIBILITIES[*pv]),
            Op::UnhideProperty(n, pv) => row.unhide_property(NAMES[*n], "", VISIBILITIES[*pv]),
            Op::Ref(d, e, l) => row.edge_ref(*d, &edge(e), LABELS[*l], "far"),
            Op::RefDelete(d, e) => row.edge_ref_soft_delete(*d, &edge(e)),
            Op::HideRef(d, e) => row.hide_edge_ref(*d, &edge(e)),
            Op::SoftDelete => row.soft_delete(),
            Op::Hide => row.hide(),
        };
    }
    row.build()
}

fn authorizations() -> impl Strategy<Value = Authorizations> {
    prop::sample::subsequence(vec!["A", "B"], 0..=2).prop_map(Authorizations::new)
}

fn hints() -> impl Strategy<Value = FetchHints> {
    prop_oneof![
        Just(FetchHints::all()),
        Just(FetchHints::all_including_hidden()),
        Just(FetchHints::properties()),
        Just(FetchHints::edge_labels()),
    ]
}

fn decode(cells: Vec<Mutation>, auths: &Authorizations, hints: &FetchHints) -> Option<Element> {
    fold(
        &VertexStrategy,
        &ElementId::from("v"),
        cells,
        &FoldContext::new(auths, hints),
    )
    .expect("generated rows are well formed")
}

proptest! {
    #[test]
    fn unreadable_data_never_appears(
        ops in prop::collection::vec(stamped_op(), 0..24),
        auths in authorizations(),
        hints in hints(),
    ) {
        if let Some(element) = decode(build(&ops), &auths, &hints) {
            prop_assert!(auths.can_read(element.visibility()));
            for p in element.properties() {
                prop_assert!(auths.can_read(p.visibility()));
                for m in p.metadata() {
                    prop_assert!(auths.can_read(&m.visibility));
                }
            }
            let vertex = element.as_vertex().unwrap();
            for d in Direction::BOTH {
                for r in vertex.edge_refs(d) {
                    prop_assert!(auths.can_read(&r.visibility));
                }
            }
        }
    }

    #[test]
    fn fold_is_idempotent_and_order_independent(
        ops in prop::collection::vec(stamped_op(), 0..24),
        auths in authorizations(),
        hints in hints(),
    ) {
        let cells = build(&ops);
        let once = decode(cells.clone(), &auths, &hints);
        let twice = decode(cells.clone(), &auths, &hints);
        prop_assert_eq!(&once, &twice);
        let mut reversed = cells;
        reversed.reverse();
        prop_assert_eq!(once, decode(reversed, &auths, &hints));
    }

    #[test]
    fn property_tombstone_rule(value_ts in 0i64..50, tombstone_ts in 0i64..50) {
        let cells = RowBuilder::vertex("v")
            .at(0)
            .signal("")
            .at(value_ts)
            .property("age", "", "30")
            .at(tombstone_ts)
            .property_soft_delete("age", "")
            .build();
        let element = decode(cells, &Authorizations::none(), &FetchHints::all()).unwrap();
        prop_assert_eq!(element.property_by_name("age").is_none(), tombstone_ts >= value_ts);
    }

    #[test]
    fn element_tombstone_dominates(
        ops in prop::collection::vec(stamped_op(), 0..16),
        signal_ts in 0i64..16,
        extra in 0i64..4,
    ) {
        // only the appended signal may establish the element
        let mut cells = build(&ops);
        cells.retain(|m| m.family.as_ref() != b"V");
        cells.extend(
            RowBuilder::vertex("v")
                .at(signal_ts)
                .signal("person")
                .at(signal_ts + extra)
                .soft_delete()
                .build(),
        );
        let auths = Authorizations::new(["A", "B"]);
        prop_assert!(decode(cells, &auths, &FetchHints::all_including_hidden()).is_none());
    }
}
