// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command implementations.
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};
use vellum_app_core::config::{ConfigService, ConfigStore};
use vellum_app_core::prefs::{BackendKind, ReaderPrefs, READER_PREFS_KEY};
use vellum_core::{
    Authorizations, DecodeError, Element, ElementId, ElementKind, ElementReader, EmbeddedStore,
    FetchHints, RowRange,
};
use vellum_pushdown::DistributedStore;

use crate::dump::read_dump;
use crate::output::{render_json, render_table, OutputFormat};

/// Read settings after applying command-line overrides to the saved prefs.
#[derive(Debug, Clone)]
pub struct ReadSettings {
    /// Element kind to decode.
    pub kind: ElementKind,
    /// Row range to scan.
    pub range: RowRange,
    /// Caller authorizations.
    pub authorizations: Authorizations,
    /// Fetch hints.
    pub hints: FetchHints,
    /// Push-down scan threads.
    pub parallelism: usize,
}

impl ReadSettings {
    /// Resolves overrides against `prefs`.
    pub fn resolve(
        prefs: &ReaderPrefs,
        kind: ElementKind,
        range: RowRange,
        auths: Option<&str>,
        hints: Option<&str>,
        parallelism: Option<usize>,
    ) -> Result<Self> {
        let hints = match hints {
            Some(name) => FetchHints::preset(name)
                .ok_or_else(|| anyhow!("unknown fetch hints preset {name:?}"))?,
            None => prefs.fetch_hints.clone(),
        };
        Ok(Self {
            kind,
            range,
            authorizations: auths.map_or_else(|| prefs.authorizations.clone(), Authorizations::from_csv),
            hints,
            parallelism: parallelism.unwrap_or(prefs.parallelism).max(1),
        })
    }
}

fn load_input(input: &Path) -> Result<EmbeddedStore> {
    if input == Path::new("-") {
        return read_dump(io::stdin().lock()).context("read dump from stdin");
    }
    let file = File::open(input).with_context(|| format!("open {}", input.display()))?;
    read_dump(BufReader::new(file)).with_context(|| format!("read dump {}", input.display()))
}

fn scan(
    reader: &dyn ElementReader,
    settings: &ReadSettings,
) -> Vec<Result<Element, DecodeError>> {
    reader
        .scan(
            settings.kind,
            &settings.range,
            &settings.authorizations,
            &settings.hints,
        )
        .collect()
}

fn write_out(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes()).context("write output")?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").context("write output")?;
    }
    Ok(())
}

/// `vellum decode`: prints every element; fails if any element failed.
pub fn decode(
    input: &Path,
    settings: &ReadSettings,
    backend: BackendKind,
    format: OutputFormat,
) -> Result<ExitCode> {
    let embedded = load_input(input)?;
    let results = match backend {
        BackendKind::Embedded => scan(&embedded, settings),
        BackendKind::Pushdown => {
            let store =
                DistributedStore::from_embedded(&embedded).with_parallelism(settings.parallelism);
            scan(&store, settings)
        }
    };
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        %backend,
        kind = %settings.kind,
        elements = results.len() - failed,
        failed,
        "decoded"
    );
    let rendered = match format {
        OutputFormat::Json => render_json(&results),
        OutputFormat::Table => render_table(&results),
    };
    write_out(&rendered)?;
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// Failures compare by element id only; the backends word them differently.
fn fingerprint(result: &Result<Element, DecodeError>) -> Result<(ElementId, Option<[u8; 32]>)> {
    match result {
        Ok(element) => Ok((element.id().clone(), Some(element.digest()?))),
        Err(err) => Ok((err.element_id().cloned().unwrap_or_default(), None)),
    }
}

/// `vellum compare`: decodes with both backends and reports disagreements.
pub fn compare(input: &Path, settings: &ReadSettings) -> Result<ExitCode> {
    let embedded = load_input(input)?;
    let pushdown =
        DistributedStore::from_embedded(&embedded).with_parallelism(settings.parallelism);
    let client = scan(&embedded, settings)
        .iter()
        .map(fingerprint)
        .collect::<Result<Vec<_>>>()?;
    let pushed = scan(&pushdown, settings)
        .iter()
        .map(fingerprint)
        .collect::<Result<Vec<_>>>()?;

    let mut report = String::new();
    let mut disagreements = 0usize;
    let longest = client.len().max(pushed.len());
    for i in 0..longest {
        match (client.get(i), pushed.get(i)) {
            (Some(a), Some(b)) if a == b => {}
            (a, b) => {
                disagreements += 1;
                let id = a.or(b).map_or("?", |(id, _)| id.as_str());
                warn!(element = id, "backends disagree");
                report.push_str(&format!("mismatch at {i}: {id}\n"));
            }
        }
    }
    if disagreements == 0 {
        report.push_str(&format!("{} elements agree\n", client.len()));
        write_out(&report)?;
        return Ok(ExitCode::SUCCESS);
    }
    report.push_str(&format!("{disagreements} disagreements\n"));
    write_out(&report)?;
    Ok(ExitCode::FAILURE)
}

/// `vellum prefs show`: prints the effective reader prefs.
pub fn prefs_show(prefs: &ReaderPrefs) -> Result<ExitCode> {
    let text = serde_json::to_string_pretty(prefs).context("render prefs")?;
    write_out(&text)?;
    Ok(ExitCode::SUCCESS)
}

/// `vellum prefs init`: writes default reader prefs.
pub fn prefs_init<S: ConfigStore>(service: &ConfigService<S>, force: bool) -> Result<ExitCode> {
    if !force && service.contains(READER_PREFS_KEY).context("check reader prefs")? {
        bail!("reader prefs already exist; pass --force to overwrite");
    }
    service
        .save(READER_PREFS_KEY, &ReaderPrefs::default())
        .context("save reader prefs")?;
    write_out("reader prefs initialized")?;
    Ok(ExitCode::SUCCESS)
}
