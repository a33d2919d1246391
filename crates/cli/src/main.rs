//! Downtown CLI - batch delineation of downtown cores

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use downtown_algorithms::density::BandwidthRule;
use downtown_algorithms::pipeline::{delineate_town_traced, DowntownParams, ParamsProfile};
use downtown_core::io::{read_pois, read_towns, write_feature_collection, write_json_atomic};
use downtown_core::town::{Poi, Town};
use downtown_core::vector::Feature;
use downtown_core::{CorrectionTable, CRS};
use downtown_parallel::{num_cpus, BatchRunner, ProcessingMode};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "downtown")]
#[command(author, version, about = "Delineate downtown cores from point-of-interest density", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delineate every town and write the combined artifact
    Run {
        #[command(flatten)]
        inputs: InputArgs,
        /// Output GeoJSON with one downtown polygon per town
        #[arg(short, long)]
        output: PathBuf,
        /// Failure log (default: <output stem>.failures.json next to the output)
        #[arg(long)]
        failures: Option<PathBuf>,
        /// Worker threads (0 = all cores, 1 = sequential)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Delineate one town and write every grid cell for inspection
    Inspect {
        #[command(flatten)]
        inputs: InputArgs,
        /// Town to inspect
        #[arg(short, long)]
        town: String,
        /// Output GeoJSON with the scored cells and the final polygon
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// List the named parameter profiles
    Profiles,
}

#[derive(Args)]
struct InputArgs {
    /// Town boundaries (GeoJSON Polygon/MultiPolygon features)
    #[arg(long)]
    towns: PathBuf,
    /// Points of interest (GeoJSON Point features)
    #[arg(long)]
    pois: PathBuf,
    /// Property holding the town id
    #[arg(long, default_value = "town_id")]
    id_property: String,
    /// Correction table applied to the towns before processing
    #[arg(long)]
    corrections: Option<PathBuf>,
}

#[derive(Args)]
struct ParamArgs {
    /// Parameter profile: v1/baseline, v2/stabilized
    #[arg(short, long, default_value = "v2")]
    profile: String,
    /// JSON parameter file (replaces the profile)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Hexagon width in projected units
    #[arg(long)]
    cell_size: Option<f64>,
    /// Fixed kernel bandwidth instead of the Scott rule
    #[arg(long)]
    bandwidth: Option<f64>,
    /// Min-max threshold for retained cells
    #[arg(long)]
    threshold: Option<f64>,
    /// First buffer distance
    #[arg(long)]
    buffer: Option<f64>,
    /// Smoothing bandwidth multiplier (0 disables smoothing)
    #[arg(long)]
    smoothness: Option<f64>,
    /// Second buffer distance
    #[arg(long, conflicts_with = "no_second_buffer")]
    second_buffer: Option<f64>,
    /// Skip the second buffer
    #[arg(long)]
    no_second_buffer: bool,
}

impl ParamArgs {
    /// Resolve profile or config file, then apply the individual overrides
    fn resolve(&self) -> Result<DowntownParams> {
        let mut params = match &self.config {
            Some(path) => DowntownParams::read(path)
                .with_context(|| format!("Failed to read parameters from {}", path.display()))?,
            None => ParamsProfile::from_name(&self.profile)?.params(),
        };
        if let Some(v) = self.cell_size {
            params.density.cell_size = v;
        }
        if let Some(h) = self.bandwidth {
            params.density.bandwidth = BandwidthRule::Fixed(h);
        }
        if let Some(v) = self.threshold {
            params.threshold.threshold = v;
        }
        if let Some(v) = self.buffer {
            params.finish.buffer_distance = v;
        }
        if let Some(v) = self.smoothness {
            params.finish.smoothness = v;
        }
        if let Some(v) = self.second_buffer {
            params.finish.second_buffer = Some(v);
        }
        if self.no_second_buffer {
            params.finish.second_buffer = None;
        }
        params.validate()?;
        Ok(params)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} towns ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Read towns and POIs, apply corrections, and check their CRS tags
fn read_inputs(inputs: &InputArgs) -> Result<(Vec<Town>, Vec<Poi>, Option<CRS>)> {
    let pb = spinner("Reading inputs...");
    let mut towns = read_towns(&inputs.towns, &inputs.id_property)
        .with_context(|| format!("Failed to read towns from {}", inputs.towns.display()))?;
    let (pois, poi_crs) =
        read_pois(&inputs.pois).with_context(|| format!("Failed to read POIs from {}", inputs.pois.display()))?;
    pb.finish_and_clear();

    if let Some(path) = &inputs.corrections {
        let table = CorrectionTable::read(path)
            .with_context(|| format!("Failed to read corrections from {}", path.display()))?;
        let report = table.apply(&mut towns);
        info!(
            "Corrections: {} applied, {} skipped",
            report.applied,
            report.skipped.len()
        );
    }

    let town_crs = towns.first().and_then(|t| t.crs.clone());
    match (&town_crs, &poi_crs) {
        (Some(a), Some(b)) if !a.is_equivalent(b) => {
            bail!("Towns are in {} but POIs are in {}", a, b)
        }
        _ => {}
    }
    if let Some(crs) = town_crs.as_ref().or(poi_crs.as_ref()) {
        if crs.is_geographic() {
            warn!("Inputs are in geographic {}; distances will be in degrees", crs);
        }
    }

    info!("Read {} towns and {} POIs", towns.len(), pois.len());
    Ok((towns, pois, town_crs.or(poi_crs)))
}

/// `<dir>/<stem>.failures.json` next to the output
fn default_failures_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "downtowns".to_string());
    output.with_file_name(format!("{}.failures.json", stem))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run(inputs: &InputArgs, output: &Path, failures: Option<PathBuf>, threads: Option<usize>, params: &ParamArgs) -> Result<()> {
    let params = params.resolve()?;
    let (towns, pois, crs) = read_inputs(inputs)?;
    let mode = ProcessingMode::from_threads(threads);
    info!("Processing mode: {:?} ({} cores available)", mode, num_cpus());

    let pb = progress_bar(towns.len());
    let start = Instant::now();
    let report = BatchRunner::new(params)?
        .with_mode(mode)
        .with_progress(|town_id, outcome| {
            if outcome.is_err() {
                pb.set_message(format!("last failure: {}", town_id));
            }
            pb.inc(1);
        })
        .run(&towns, &pois);
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    write_feature_collection(&report.to_feature_collection(crs), output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    let failures = failures.unwrap_or_else(|| default_failures_path(output));
    write_json_atomic(&report.failures, &failures)
        .with_context(|| format!("Failed to write {}", failures.display()))?;

    println!(
        "Towns: {} delineated, {} failed, {} skipped",
        report.successes.len(),
        report.failures.len(),
        report.skipped.len()
    );
    done("Downtowns", output, elapsed);
    println!("  Failure log: {}", failures.display());
    Ok(())
}

fn inspect(inputs: &InputArgs, town_id: &str, output: &Path, params: &ParamArgs) -> Result<()> {
    let params = params.resolve()?;
    let (towns, pois, _) = read_inputs(inputs)?;
    let town = towns
        .iter()
        .find(|t| t.id.as_str() == town_id)
        .with_context(|| format!("Town {} not found in {}", town_id, inputs.towns.display()))?;

    let start = Instant::now();
    let trace = delineate_town_traced(town, &pois, &params).with_context(|| format!("Town {} failed", town_id))?;
    let elapsed = start.elapsed();

    let retained = trace.cells.iter().filter(|c| c.retained).count();
    let best = trace.best_blob();
    println!("Town: {}", town.id);
    println!(
        "  Points: {} in part {} of {}",
        trace.filtered.points.len(),
        trace.filtered.part_index,
        town.part_count()
    );
    println!(
        "  Grid: {} cells of width {}, bandwidth {:.2}",
        trace.density.grid.len(),
        trace.density.grid.lattice().cell_size(),
        trace.density.bandwidth
    );
    println!("  Retained: {} cells in {} blobs", retained, trace.blobs.len());
    for blob in &trace.blobs {
        let marker = if blob.id == best.id { "*" } else { " " };
        println!(
            "  {} blob {:>3}: {:>4} cells, mean z {:>7.3}, score {:>9.3}",
            marker, blob.id, blob.n_hexes, blob.mean_z, blob.score
        );
    }

    let mut collection = trace.cell_features();
    collection.push(trace.downtown.to_feature().with_property("layer", "downtown"));
    let best_geometry = Feature::new(best.geometry.clone())
        .with_property("layer", "blob")
        .with_property("blob_id", best.id);
    collection.push(best_geometry);
    write_feature_collection(&collection, output).with_context(|| format!("Failed to write {}", output.display()))?;
    done("Inspection", output, elapsed);
    Ok(())
}

fn profiles() -> Result<()> {
    for profile in ParamsProfile::ALL {
        println!("{} ({}): {}", profile.version(), profile.name(), profile.description());
        let json = serde_json::to_string_pretty(&profile.params())?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            inputs,
            output,
            failures,
            threads,
            params,
        } => run(&inputs, &output, failures, threads, &params),
        Commands::Inspect {
            inputs,
            town,
            output,
            params,
        } => inspect(&inputs, &town, &output, &params),
        Commands::Profiles => profiles(),
    }
}
