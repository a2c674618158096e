//! CDB completeness audit.
//!
//! Walks the GS and/or GT feature tiles of a CDB, resolves the models and
//! textures they reference and logs everything that is missing.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cdbaudit::config::LEGACY_GS_SAMPLE_LIMIT;
use cdbaudit::features::{DbfSource, FeatureDataDictionary, ShapefileSource};
use cdbaudit::resolve::OpenFlightSource;
use cdbaudit::scanner::is_cdb;
use cdbaudit::tiles::TileAddress;
use cdbaudit::{
    AuditConfig, DatasetFamily, Finding, FindingSink, GeoBounds, MissingDataReporter, Report,
    TracingSink,
};

#[derive(Parser, Debug)]
#[command(name = "cdbinfo")]
#[command(about = "Report missing models and textures referenced by CDB feature tiles")]
struct Args {
    /// CDB root directory
    root: PathBuf,

    /// Restrict the audit to a bounding box
    #[arg(
        long,
        num_args = 4,
        value_names = ["SOUTH", "WEST", "NORTH", "EAST"],
        allow_hyphen_values = true
    )]
    bounds: Option<Vec<f64>>,

    /// Audit geospecific (GS) feature data
    #[arg(long)]
    gs_features: bool,

    /// Audit geotypical (GT) feature data
    #[arg(long)]
    gt_features: bool,

    /// Also write the log to this file
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// TOML audit configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop the GS scan once more unique models than this are collected
    #[arg(long)]
    gs_sample_limit: Option<usize>,

    /// Use the legacy GS sample limit of 10 models
    #[arg(long, conflicts_with = "gs_sample_limit")]
    legacy_sample: bool,

    /// Stop after this many findings
    #[arg(long)]
    max_findings: Option<usize>,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Tiles resolved per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// CSV (code,name) extending the feature-class dictionary
    #[arg(long)]
    feature_dictionary: Option<PathBuf>,

    /// Write the reports as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Logs through [`TracingSink`] while ticking a spinner.
struct ProgressSink {
    inner: TracingSink,
    progress: ProgressBar,
}

impl ProgressSink {
    fn new() -> Result<Self> {
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} tiles {msg}")?,
        );
        progress.enable_steady_tick(Duration::from_millis(120));
        Ok(Self {
            inner: TracingSink,
            progress,
        })
    }
}

impl FindingSink for ProgressSink {
    fn tile_resolved(&self, family: DatasetFamily, tile: &TileAddress, model_references: usize) {
        self.progress.inc(1);
        self.progress.set_message(tile.to_string());
        self.progress
            .suspend(|| self.inner.tile_resolved(family, tile, model_references));
    }

    fn finding(&self, finding: &Finding) {
        self.progress.suspend(|| self.inner.finding(finding));
    }
}

fn init_logging(verbose: bool, logfile: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let file_layer = match logfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

fn load_config(args: &Args) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => AuditConfig::default(),
    };

    if args.legacy_sample {
        config.gs_sample_limit = Some(LEGACY_GS_SAMPLE_LIMIT);
    }
    if args.gs_sample_limit.is_some() {
        config.gs_sample_limit = args.gs_sample_limit;
    }
    if args.max_findings.is_some() {
        config.max_findings = args.max_findings;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.feature_dictionary.is_some() {
        config.feature_dictionary = args.feature_dictionary.clone();
    }

    config.validate()?;
    Ok(config)
}

fn parse_bounds(args: &Args) -> Option<GeoBounds> {
    match args.bounds.as_deref() {
        Some(&[south, west, north, east]) => Some(GeoBounds::new(south, west, north, east)),
        _ => None,
    }
}

fn write_json(path: &Path, reports: &[Report]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports)
        .context("Failed to write JSON report")?;
    info!("Wrote {} report(s) to {}", reports.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.logfile.as_deref())?;

    let config = load_config(&args)?;
    let bounds = parse_bounds(&args);

    info!("CDB: {}", args.root.display());
    if !is_cdb(&args.root) {
        warn!(
            "{} has no Metadata/Version.xml; continuing anyway",
            args.root.display()
        );
    }
    if let Some(b) = &bounds {
        info!("Bounds: {}", b);
    }

    let mut dictionary = FeatureDataDictionary::builtin();
    if let Some(path) = &config.feature_dictionary {
        dictionary.load_csv(path)?;
    }

    let mut families = Vec::new();
    if args.gs_features {
        families.push(DatasetFamily::Gs);
    }
    if args.gt_features {
        families.push(DatasetFamily::Gt);
    }
    if families.is_empty() {
        families = vec![DatasetFamily::Gs, DatasetFamily::Gt];
    }

    let reporter = MissingDataReporter::new(
        &args.root,
        config,
        &ShapefileSource,
        &DbfSource,
        &OpenFlightSource,
        &dictionary,
    );
    let sink = ProgressSink::new()?;

    let start = Instant::now();
    let mut reports = Vec::new();
    for family in families {
        match reporter.run(family, bounds.as_ref(), &sink) {
            Ok(report) => {
                info!(
                    "{}: {} tiles, {} models, {} textures, {} missing models, {} missing textures{}",
                    family,
                    report.tiles.len(),
                    report.models,
                    report.textures,
                    report.missing_models().count(),
                    report.missing_textures().count(),
                    if report.truncated { " (truncated)" } else { "" }
                );
                reports.push(report);
            }
            Err(e) => error!("{} audit failed: {}", family, e),
        }
    }
    sink.progress.finish_and_clear();
    info!("ReportMissingFeatureData: {:.3}s", start.elapsed().as_secs_f64());

    if let Some(path) = &args.json {
        write_json(path, &reports)?;
    }

    Ok(())
}
