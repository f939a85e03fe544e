// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DUMP: &str = r#"{"kind":"vertex","row":"emp","family":"V","timestamp":1,"value":"employee"}
{"kind":"vertex","row":"emp","family":"PROP","qualifier":["name",""],"timestamp":1,"value":"Alice"}
{"kind":"vertex","row":"emp","family":"PROP","qualifier":["ssn",""],"visibility":"HR","timestamp":1,"value":"123-45-6789"}
{"kind":"vertex","row":"secret","family":"V","visibility":"HR","timestamp":1}
{"kind":"edge","row":"e1","family":"E","timestamp":5,"value":"knows"}
{"kind":"edge","row":"e1","family":"EOUT","qualifier":"emp","timestamp":5}
{"kind":"edge","row":"e1","family":"EIN","qualifier":"boss","timestamp":5}
"#;

fn setup(dump: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cells.jsonl");
    fs::write(&input, dump).unwrap();
    (dir, input)
}

fn vellum(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vellum").expect("binary");
    cmd.arg("--config-dir").arg(config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn decode_hides_unreadable_cells() {
    let (dir, input) = setup(DUMP);
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\":\"emp\""))
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains("123-45-6789").not())
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn decode_with_authorizations_and_pushdown() {
    let (dir, input) = setup(DUMP);
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--backend", "pushdown", "--auths", "HR", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("123-45-6789"))
        .stdout(predicate::str::contains("\"id\":\"secret\""));
}

#[test]
fn decode_edges_as_a_table() {
    let (dir, input) = setup(DUMP);
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--kind", "edge", "--format", "table", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("knows"))
        .stdout(predicate::str::contains("emp -> boss"));
}

#[test]
fn corrupt_element_fails_decode_but_backends_still_agree() {
    let corrupt = format!(
        "{DUMP}{}\n",
        r#"{"kind":"vertex","row":"z","family":"V","timestamp":1}
{"kind":"vertex","row":"z","family":"EOUT","qualifier":"e9","timestamp":1,"value_hex":"000000ff"}"#
    );
    let (dir, input) = setup(&corrupt);
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""));
    vellum(&dir.path().join("cfg"))
        .args(["compare", "--parallelism", "2", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("elements agree"));
}

#[test]
fn unknown_hints_preset_is_rejected() {
    let (dir, input) = setup(DUMP);
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--hints", "everything", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fetch hints preset"));
}

#[test]
fn malformed_dump_names_the_line() {
    let (dir, input) = setup("{\"kind\":\"vertex\",\"row\":\"v\",\"family\":\"V\"}\nnot json\n");
    vellum(&dir.path().join("cfg"))
        .args(["decode", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn prefs_init_then_show_and_defaults_apply() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("cfg");
    vellum(&cfg).args(["prefs", "init"]).assert().success();
    assert!(cfg.join("reader.json").exists());
    vellum(&cfg)
        .args(["prefs", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    vellum(&cfg).args(["prefs", "init", "--force"]).assert().success();

    // saved authorizations become the default for decode
    fs::write(
        cfg.join("reader.json"),
        r#"{"authorizations":["HR"],"backend":"pushdown","parallelism":2}"#,
    )
    .unwrap();
    vellum(&cfg)
        .args(["prefs", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pushdown"));
    let input = dir.path().join("cells.jsonl");
    fs::write(&input, DUMP).unwrap();
    vellum(&cfg)
        .args(["decode", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("123-45-6789"));
}
