// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rendering decode results as JSON lines or a table.
use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::{json, Map, Value};
use vellum_core::{DecodeError, Direction, EdgeRef, Element, ElementId, PropertyView};

/// Output format for decoded elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// A human-readable table.
    Table,
}

// UTF-8 values print as strings, anything else as hex.
fn bytes_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => json!(text),
        Err(_) => json!({ "hex": hex::encode(bytes) }),
    }
}

fn bytes_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => format!("0x{}", hex::encode(bytes)),
    }
}

fn property_json(p: PropertyView<'_>) -> Value {
    let metadata: Map<String, Value> = p
        .metadata()
        .map(|m| (m.key.clone(), bytes_json(&m.value)))
        .collect();
    let mut obj = json!({
        "name": p.name(),
        "key": p.key(),
        "visibility": p.visibility().as_str(),
        "timestamp": p.timestamp(),
        "value": bytes_json(p.value()),
    });
    if !metadata.is_empty() {
        obj["metadata"] = Value::Object(metadata);
    }
    if !p.hidden_visibilities().is_empty() {
        obj["hidden"] = json!(p
            .hidden_visibilities()
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>());
    }
    obj
}

fn ref_json(r: &EdgeRef) -> Value {
    json!({
        "edge": r.edge_id.as_str(),
        "label": r.label,
        "vertex": r.far_vertex_id.as_str(),
        "visibility": r.visibility.as_str(),
        "timestamp": r.timestamp,
    })
}

/// JSON form of one element.
pub fn element_json(element: &Element) -> Value {
    let data = element.data();
    let mut obj = json!({
        "kind": element.kind().to_string(),
        "id": element.id().as_str(),
        "type": element.type_or_label(),
        "visibility": element.visibility().as_str(),
        "timestamp": element.timestamp(),
        "properties": element.properties().map(property_json).collect::<Vec<_>>(),
    });
    if !data.hidden_visibilities().is_empty() {
        obj["hidden"] = json!(data
            .hidden_visibilities()
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>());
    }
    let tables: Vec<_> = data.extended_data_table_names().collect();
    if !tables.is_empty() {
        obj["extended_data"] = json!(tables);
    }
    if let Some(vertex) = element.as_vertex() {
        for d in Direction::BOTH {
            let refs: Vec<_> = vertex.edge_refs(d).map(ref_json).collect();
            if !refs.is_empty() {
                obj[format!("{d}_edges")] = Value::Array(refs);
            }
            if let Some(counts) = vertex.edge_label_counts(d) {
                obj[format!("{d}_label_counts")] = json!(counts);
            }
        }
    }
    if let Some(edge) = element.as_edge() {
        obj["out_vertex"] = json!(edge.out_vertex_id().as_str());
        obj["in_vertex"] = json!(edge.in_vertex_id().as_str());
    }
    obj
}

/// JSON form of a failed element.
pub fn error_json(err: &DecodeError) -> Value {
    json!({
        "error": err.to_string(),
        "id": err.element_id().map(ElementId::as_str),
    })
}

/// Renders results as JSON lines.
pub fn render_json(results: &[Result<Element, DecodeError>]) -> String {
    let mut out = String::new();
    for result in results {
        let value = match result {
            Ok(element) => element_json(element),
            Err(err) => error_json(err),
        };
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

fn summary_of_edges(element: &Element) -> String {
    if let Some(edge) = element.as_edge() {
        return format!("{} -> {}", edge.out_vertex_id(), edge.in_vertex_id());
    }
    let Some(vertex) = element.as_vertex() else {
        return String::new();
    };
    Direction::BOTH
        .iter()
        .filter_map(|&d| {
            let refs: Vec<_> = vertex.edge_ids(d).map(ElementId::as_str).collect();
            let counted = vertex.edge_label_counts(d).map(|c| c.values().sum::<u64>());
            match (refs.is_empty(), counted) {
                (false, _) => Some(format!("{d}: {}", refs.join(","))),
                (true, Some(n)) => Some(format!("{d}: {n} counted")),
                (true, None) => None,
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Renders results as a table.
pub fn render_table(results: &[Result<Element, DecodeError>]) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(["id", "kind", "type", "visibility", "ts", "properties", "edges"]);

    for result in results {
        match result {
            Ok(element) => {
                let props: Vec<_> = element
                    .properties()
                    .map(|p| format!("{}={}", p.name(), bytes_text(p.value())))
                    .collect();
                table.add_row(vec![
                    Cell::new(element.id()),
                    Cell::new(element.kind()),
                    Cell::new(element.type_or_label().unwrap_or("")),
                    Cell::new(element.visibility().as_str()),
                    Cell::new(element.timestamp()),
                    Cell::new(props.join("\n")),
                    Cell::new(summary_of_edges(element)),
                ]);
            }
            Err(err) => {
                let id = err.element_id().map_or("?", ElementId::as_str);
                table.add_row(vec![
                    Cell::new(id),
                    Cell::new("error"),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(err),
                    Cell::new(""),
                ]);
            }
        }
    }
    table.to_string()
}
