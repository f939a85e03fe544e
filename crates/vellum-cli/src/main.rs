// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vellum CLI
//!
//! Decodes JSONL mutation dumps into elements with either backend, compares
//! the two backends, and manages saved reader prefs.
//!
//! ```bash
//! vellum decode --input cells.jsonl --auths A,B --hints properties
//! vellum compare --input cells.jsonl --parallelism 4
//! vellum prefs init
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vellum_app_core::config::ConfigService;
use vellum_app_core::prefs::{BackendKind, ReaderPrefs, READER_PREFS_KEY};
use vellum_config_fs::FsConfigStore;
use vellum_core::{ElementId, ElementKind, RowRange};

mod commands;
mod dump;
mod output;

use commands::ReadSettings;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "vellum", author, version, about = "Security-filtered element decoding")]
struct Args {
    /// Directory holding saved prefs (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a dump and print the elements
    Decode {
        #[command(flatten)]
        read: ReadArgs,
        /// Backend that folds the cells (defaults to the saved prefs)
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Decode a dump with both backends; exits non-zero if they disagree
    Compare {
        #[command(flatten)]
        read: ReadArgs,
    },
    /// Show or initialize saved reader prefs
    Prefs {
        #[command(subcommand)]
        cmd: PrefsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Print the effective prefs
    Show,
    /// Write default prefs
    Init {
        /// Overwrite existing prefs
        #[arg(long)]
        force: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct ReadArgs {
    /// JSONL dump to read (`-` for stdin)
    #[arg(long, short, value_name = "FILE")]
    input: PathBuf,
    /// Element kind to decode
    #[arg(long, value_enum, default_value = "vertex")]
    kind: KindArg,
    /// Comma-separated authorizations (defaults to the saved prefs)
    #[arg(long)]
    auths: Option<String>,
    /// Fetch hints preset: all, all-including-hidden, none, properties,
    /// properties-and-metadata, edge-refs, edge-labels
    #[arg(long)]
    hints: Option<String>,
    /// First row to scan (inclusive)
    #[arg(long)]
    start: Option<String>,
    /// Row to stop before (exclusive)
    #[arg(long)]
    end: Option<String>,
    /// Push-down scan threads (defaults to the saved prefs)
    #[arg(long)]
    parallelism: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Vertex,
    Edge,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Embedded,
    Pushdown,
}

impl ReadArgs {
    fn settings(&self, prefs: &ReaderPrefs) -> Result<ReadSettings> {
        let kind = match self.kind {
            KindArg::Vertex => ElementKind::Vertex,
            KindArg::Edge => ElementKind::Edge,
        };
        let range = RowRange::new(
            self.start.clone().map(ElementId::new),
            self.end.clone().map(ElementId::new),
        );
        ReadSettings::resolve(
            prefs,
            kind,
            range,
            self.auths.as_deref(),
            self.hints.as_deref(),
            self.parallelism,
        )
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    }
    .context("open config store")?;
    let service = ConfigService::new(store);
    let prefs = service.load_or_default::<ReaderPrefs>(READER_PREFS_KEY);

    let directive = prefs.as_ref().map_or("info", |p| p.log_filter.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.cmd {
        Command::Decode {
            read,
            backend,
            format,
        } => {
            let prefs = prefs.context("load reader prefs")?;
            let backend = match backend {
                Some(BackendArg::Embedded) => BackendKind::Embedded,
                Some(BackendArg::Pushdown) => BackendKind::Pushdown,
                None => prefs.backend,
            };
            commands::decode(&read.input, &read.settings(&prefs)?, backend, format)
        }
        Command::Compare { read } => {
            let prefs = prefs.context("load reader prefs")?;
            commands::compare(&read.input, &read.settings(&prefs)?)
        }
        Command::Prefs {
            cmd: PrefsCommand::Show,
        } => commands::prefs_show(&prefs.context("load reader prefs")?),
        Command::Prefs {
            cmd: PrefsCommand::Init { force },
        } => commands::prefs_init(&service, force),
    }
}
