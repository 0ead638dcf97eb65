// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! sdkgraph
//!
//! Loads a JSON module manifest, runs the SDK membership pipeline over it and
//! prints the diagnostics, the rewired graph and the planned snapshots.
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sdkgraph_core::{ConfigService, Context, MemberListRegistry, PipelineConfig};

mod config_fs;
mod manifest;
mod output;

use config_fs::FsConfigStore;
use manifest::Manifest;
use output::RunOutput;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Module manifest (JSON)
    manifest: PathBuf,

    /// Directory holding `sdkgraph.json` (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Worker threads for parallel mutators
    #[arg(short, long)]
    workers: Option<usize>,

    /// Run every mutator on the calling thread
    #[arg(long)]
    serial: bool,

    /// Root of snapshot outputs
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Stop after the first mutator that records an error
    #[arg(long)]
    fail_fast: bool,

    /// Persist the effective configuration before running
    #[arg(long)]
    save_config: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Stored configuration with command-line overrides applied.
    fn effective_config(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.serial {
            config.parallel = false;
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir.clone_from(out_dir);
        }
        config.fail_fast |= self.fail_fast;
        config
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("opening config store")?;
    info!(dir = %store.dir().display(), "config store");
    let service = ConfigService::new(store);
    let config = args.effective_config(service.pipeline_config()?);
    if args.save_config {
        service.save_pipeline_config(&config)?;
    }

    let manifest = Manifest::load(&args.manifest)?;
    let lists = MemberListRegistry::shared_standard();
    let mut ctx = Context::with_sdk_pipeline(manifest.to_builder()?.build(), config, &lists);
    let report = ctx.run()?;
    let graph = ctx.into_graph();

    let rendered = RunOutput::new(&report, &graph);
    let mut stdout = io::stdout().lock();
    match args.format {
        Format::Json => rendered.write_json(&mut stdout)?,
        Format::Table => rendered.write_table(&mut stdout)?,
    }
    stdout.flush()?;

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
