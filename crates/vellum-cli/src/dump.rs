// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSONL mutation dumps.
//!
//! One cell per line:
//!
//! ```json
//! {"kind":"vertex","row":"v1","family":"PROP","qualifier":["age",""],"timestamp":10,"value":"30"}
//! ```
//!
//! `qualifier` is either a packed string or a list of parts joined with the
//! qualifier separator. `value` is UTF-8 text; `value_hex` carries raw bytes.
//! A missing `sequence` defaults to the line number, so later lines win ties.
//! Blank lines and lines starting with `#` are ignored.
use std::io::BufRead;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use serde::Deserialize;
use vellum_core::qualifier::SEPARATOR;
use vellum_core::{ElementId, ElementKind, EmbeddedStore, Mutation, Visibility};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindField {
    Vertex,
    Edge,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QualifierField {
    Packed(String),
    Parts(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellLine {
    kind: KindField,
    row: String,
    family: String,
    #[serde(default)]
    qualifier: Option<QualifierField>,
    #[serde(default)]
    visibility: String,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    sequence: Option<u64>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    value_hex: Option<String>,
}

impl CellLine {
    fn into_mutation(self, line_no: u64) -> Result<(ElementKind, Mutation)> {
        if self.row.is_empty() {
            bail!("empty row id");
        }
        if self.family.is_empty() {
            bail!("empty family");
        }
        let qualifier = match self.qualifier {
            None => Bytes::new(),
            Some(QualifierField::Packed(packed)) => Bytes::from(packed),
            Some(QualifierField::Parts(parts)) => {
                Bytes::from(parts.join(&char::from(SEPARATOR).to_string()))
            }
        };
        let value = match (self.value, self.value_hex) {
            (Some(_), Some(_)) => bail!("both value and value_hex given"),
            (Some(text), None) => Bytes::from(text),
            (None, Some(hex)) => Bytes::from(hex::decode(hex.trim()).context("value_hex")?),
            (None, None) => Bytes::new(),
        };
        let kind = match self.kind {
            KindField::Vertex => ElementKind::Vertex,
            KindField::Edge => ElementKind::Edge,
        };
        let mutation = Mutation {
            element_id: ElementId::new(self.row),
            family: Bytes::from(self.family),
            qualifier,
            visibility: Visibility::new(self.visibility),
            timestamp: self.timestamp,
            sequence: self.sequence.unwrap_or(line_no),
            value,
        };
        Ok((kind, mutation))
    }
}

/// Loads a dump into an embedded store.
pub fn read_dump(reader: impl BufRead) -> Result<EmbeddedStore> {
    let mut store = EmbeddedStore::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = u64::try_from(index).map_or(u64::MAX, |i| i + 1);
        let line = line.with_context(|| format!("read line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cell: CellLine = serde_json::from_str(trimmed)
            .with_context(|| format!("line {line_no}: not a cell"))?;
        let (kind, mutation) = cell
            .into_mutation(line_no)
            .with_context(|| format!("line {line_no}"))?;
        store.insert(kind, mutation);
    }
    Ok(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vellum_core::RowRange;

    #[test]
    fn parses_parts_hex_and_defaults() {
        let dump = r#"
# a comment
{"kind":"vertex","row":"v","family":"V","value":"person"}
{"kind":"vertex","row":"v","family":"PROP","qualifier":["age",""],"timestamp":3,"value_hex":"00ff"}
"#;
        let store = read_dump(dump.as_bytes()).unwrap();
        let cells: Vec<_> = store
            .table(ElementKind::Vertex)
            .mutations(&RowRange::all())
            .collect();
        assert_eq!(cells.len(), 2);
        let prop = cells.iter().find(|m| m.family.as_ref() == b"PROP").unwrap();
        assert_eq!(prop.qualifier.as_ref(), b"age\x1f");
        assert_eq!(prop.value.as_ref(), &[0x00, 0xff]);
        assert_eq!(prop.sequence, 4);
        assert!(store.table(ElementKind::Edge).is_empty());
    }

    #[test]
    fn rejects_unknown_fields_and_ambiguous_values() {
        let err = read_dump(r#"{"kind":"vertex","row":"v","family":"V","colour":"red"}"#.as_bytes())
            .unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
        let both = r#"{"kind":"edge","row":"e","family":"E","value":"a","value_hex":"61"}"#;
        assert!(read_dump(both.as_bytes()).is_err());
    }
}
