// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical rows used across the test suites and benches.

use vellum_core::{Direction, Mutation};

use crate::rows::RowBuilder;

/// Vertex `V` whose `age` property (t=100, vis `A`) is tombstoned at t=150.
pub fn tombstoned_property() -> Vec<Mutation> {
    RowBuilder::vertex("V")
        .at(100)
        .visible_to("A")
        .signal("person")
        .property("age", "", "30")
        .at(150)
        .property_soft_delete("age", "")
        .build()
}

/// Vertex `V1` with out-ref `E100` (t=10) and an older ref tombstone (t=5).
pub fn stale_edge_ref_tombstone() -> Vec<Mutation> {
    RowBuilder::vertex("V1")
        .at(10)
        .visible_to("A")
        .signal("person")
        .edge_ref(Direction::Out, "E100", "knows", "V2")
        .at(5)
        .edge_ref_soft_delete(Direction::Out, "E100")
        .build()
}

/// Vertex `emp` with a public `name` and an `ssn` labelled `HR`.
pub fn restricted_property() -> Vec<Mutation> {
    RowBuilder::vertex("emp")
        .at(1)
        .signal("employee")
        .property("name", "", "Alice")
        .visible_to("HR")
        .property("ssn", "", "123-45-6789")
        .build()
}

/// Vertex `p` whose public `nickname` is hidden under `SECRET`.
pub fn hidden_under_secret() -> Vec<Mutation> {
    RowBuilder::vertex("p")
        .at(1)
        .signal("person")
        .property("nickname", "", "Ace")
        .at(2)
        .visible_to("SECRET")
        .hide_property("nickname", "", "")
        .build()
}

/// Edge `e1` from `v1` to `v2` labelled `knows`, with one property.
pub fn simple_edge() -> Vec<Mutation> {
    RowBuilder::edge("e1")
        .at(10)
        .signal("knows")
        .endpoint(Direction::Out, "v1")
        .endpoint(Direction::In, "v2")
        .property("since", "", "2020")
        .build()
}

/// A busy vertex: `props` properties with shared metadata and `refs` out-refs
/// spread over three labels, some tombstoned, one hidden.
pub fn busy_vertex(id: &str, props: usize, refs: usize) -> Vec<Mutation> {
    const LABELS: [&str; 3] = ["knows", "likes", "follows"];
    let mut row = RowBuilder::vertex(id).at(1_000).signal("person");
    for i in 0..props {
        let name = format!("p{i}");
        row = row
            .at(1_000 + i64::try_from(i).unwrap_or(0))
            .property(&name, "", format!("value-{i}"))
            .property_metadata(&name, "", "", "source", "import");
    }
    for i in 0..refs {
        let edge = format!("{id}-e{i}");
        let far = format!("{id}-v{i}");
        row = row
            .at(500)
            .edge_ref(Direction::Out, &edge, LABELS[i % LABELS.len()], &far);
        if i % 7 == 0 {
            row = row.at(600).edge_ref_soft_delete(Direction::Out, &edge);
        }
    }
    if refs > 1 {
        row = row.at(700).hide_edge_ref(Direction::Out, &format!("{id}-e1"));
    }
    row.build()
}
