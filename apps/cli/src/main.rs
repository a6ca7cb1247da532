// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening-Lite CLI - wall opening audits on JSON model snapshots.
//!
//! # Commands
//!
//! - `audit` - report missing, undersized and unneeded openings
//! - `apply` - same, then create and grow openings and save the snapshot
//! - `list` - openings of the opening family, by level then id
//! - `delete` - remove one opening
//! - `demo` - write a small sample snapshot
//!
//! Tolerances default to `OPENING_*_MM` environment variables and can be
//! overridden per invocation in millimetres.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use opening_lite_engine::{
    mm, to_mm, AuditReport, CancelToken, ElementId, EngineConfig, MemoryDocument, OpeningEngine,
    OpeningRecord, RunMode,
};
use tracing_subscriber::EnvFilter;

mod demo;

#[derive(Parser)]
#[command(name = "opening-lite")]
#[command(about = "Detect MEP wall penetrations and reconcile openings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report findings without changing the snapshot
    Audit(RunArgs),
    /// Create and grow openings, then save the snapshot
    Apply(ApplyArgs),
    /// List openings of the opening family
    List(ModelArgs),
    /// Delete one opening from the snapshot
    Delete(DeleteArgs),
    /// Write a sample snapshot
    Demo(DemoArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Model snapshot (JSON)
    model: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    tolerances: Tolerances,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ApplyArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Where to save the updated snapshot (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DeleteArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Id of the opening to delete
    #[arg(long)]
    id: i64,

    /// Where to save the updated snapshot (default: overwrite the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DemoArgs {
    /// Output path for the sample snapshot
    #[arg(default_value = "opening-demo.json")]
    output: PathBuf,
}

/// Per-invocation tolerance overrides, in millimetres.
#[derive(Args, Debug, Default)]
struct Tolerances {
    /// Clearance added to each run dimension (mm)
    #[arg(long)]
    clearance: Option<f64>,

    /// Max distance between footprints sharing one opening (mm)
    #[arg(long)]
    gap: Option<f64>,

    /// Max distance for matching an existing opening (mm)
    #[arg(long)]
    search_tol: Option<f64>,

    /// Bounding-box prefilter tolerance (mm)
    #[arg(long)]
    bbox_tol: Option<f64>,

    /// Extra opening depth beyond the wall thickness (mm)
    #[arg(long)]
    depth_margin: Option<f64>,
}

impl Tolerances {
    fn apply_to(&self, mut config: EngineConfig) -> EngineConfig {
        let overrides = [
            (self.clearance, &mut config.clearance),
            (self.gap, &mut config.cluster_gap),
            (self.search_tol, &mut config.search_tolerance),
            (self.bbox_tol, &mut config.bbox_tolerance),
            (self.depth_margin, &mut config.depth_margin),
        ];
        for (value, field) in overrides {
            if let Some(v) = value {
                *field = mm(v);
            }
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Audit(args) => run(&args, RunMode::Audit, None),
        Commands::Apply(args) => run(&args.run, RunMode::Apply, args.output.as_deref()),
        Commands::List(args) => list(&args),
        Commands::Delete(args) => delete(&args),
        Commands::Demo(args) => demo(&args.output),
    }
}

fn load(path: &Path) -> Result<MemoryDocument> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    MemoryDocument::from_json(&json).with_context(|| format!("invalid snapshot {}", path.display()))
}

fn save(doc: &MemoryDocument, path: &Path) -> Result<()> {
    let json = doc.to_json().context("failed to serialize snapshot")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn run(args: &RunArgs, mode: RunMode, output: Option<&Path>) -> Result<()> {
    let config = args.tolerances.apply_to(EngineConfig::from_env());
    tracing::info!(
        model = %args.model.model.display(),
        ?mode,
        clearance_mm = to_mm(config.clearance),
        gap_mm = to_mm(config.cluster_gap),
        search_tol_mm = to_mm(config.search_tolerance),
        "Starting opening run"
    );

    let mut doc = load(&args.model.model)?;
    let engine = OpeningEngine::new(config);
    let report = engine
        .run(&mut doc, mode, &CancelToken::new())
        .context("opening run failed")?;

    if mode == RunMode::Apply && !(report.created.is_empty() && report.updated.is_empty()) {
        let target = output.unwrap_or(&args.model.model);
        save(&doc, target)?;
        tracing::info!(path = %target.display(), "Snapshot saved");
    }

    print_report(&report, args.json)?;
    tracing::info!(summary = %report.summary_line(), "Opening run finished");
    Ok(())
}

fn print_report(report: &AuditReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn list_row(op: &OpeningRecord) -> String {
    format!(
        "Id {} | Level: {} | {:.0} x {:.0} x {:.0} mm",
        op.id,
        op.level.as_deref().unwrap_or("-"),
        to_mm(op.width),
        to_mm(op.height),
        to_mm(op.depth)
    )
}

fn list(args: &ModelArgs) -> Result<()> {
    let doc = load(&args.model)?;
    let Some(family) = &doc.opening_family else {
        bail!("snapshot has no opening family");
    };
    let openings = doc.sorted_openings();
    println!("## Openings ({}): {}", family.name, openings.len());
    for op in openings {
        println!("- {}", list_row(op));
    }
    Ok(())
}

fn delete(args: &DeleteArgs) -> Result<()> {
    let mut doc = load(&args.model.model)?;
    let removed = doc
        .delete_opening(ElementId(args.id))
        .with_context(|| format!("cannot delete opening {}", args.id))?;
    let target = args.output.as_deref().unwrap_or(&args.model.model);
    save(&doc, target)?;
    println!("Deleted {}", list_row(&removed));
    Ok(())
}

fn demo(output: &Path) -> Result<()> {
    save(&demo::sample_document(), output)?;
    println!("Sample snapshot written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opening_lite_engine::{OpeningFlags, SourceId, WallKey};
    use opening_lite_geometry::Point3;

    #[test]
    fn tolerance_flags_override_in_millimetres() {
        let cli = Cli::try_parse_from([
            "opening-lite",
            "audit",
            "model.json",
            "--clearance",
            "50",
            "--gap",
            "0",
            "--json",
        ])
        .unwrap();
        let Commands::Audit(args) = cli.command else {
            panic!("expected audit");
        };
        assert!(args.json);
        let config = args.tolerances.apply_to(EngineConfig::default());
        assert_eq!(config.clearance, 0.05);
        assert_eq!(config.cluster_gap, 0.0);
        assert_eq!(config.search_tolerance, EngineConfig::default().search_tolerance);
    }

    #[test]
    fn delete_requires_an_id() {
        assert!(Cli::try_parse_from(["opening-lite", "delete", "model.json"]).is_err());
        let cli =
            Cli::try_parse_from(["opening-lite", "delete", "model.json", "--id", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete(DeleteArgs { id: 7, .. })));
    }

    #[test]
    fn list_row_format() {
        let op = OpeningRecord {
            id: ElementId(12),
            family: ElementId(9000),
            host: Some(WallKey::new(SourceId(1), ElementId(100))),
            position: Point3::origin(),
            width: 0.25,
            height: 0.2,
            depth: 0.25,
            level: Some("01 First".into()),
            flags: OpeningFlags::default(),
        };
        assert_eq!(list_row(&op), "Id 12 | Level: 01 First | 250 x 200 x 250 mm");
    }

    #[test]
    fn demo_snapshot_yields_openings() {
        let mut doc = demo::sample_document();
        let report = OpeningEngine::new(EngineConfig::default())
            .apply(&mut doc, &CancelToken::new())
            .unwrap();
        assert!(!report.created.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.empty, vec![demo::STALE_OPENING]);
    }
}
