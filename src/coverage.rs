use clap::Args;
use tracing::{info, warn};
use walkcover_core::loading::load_sites;
use walkcover_core::output::{
    ArtifactWriter, ScenarioKey, SummaryRecord, coverage_layer, flag_records,
};
use walkcover_core::{CoverageScenario, SiteKind};

use crate::{CliResult, RunArgs, WeightArgs};

#[derive(Args, Debug)]
pub struct CoverageArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Sites to evaluate (GeoJSON points)
    #[arg(long)]
    pub sites: std::path::PathBuf,

    #[command(flatten)]
    pub weights: WeightArgs,
}

pub fn run(args: &CoverageArgs) -> CliResult<()> {
    let config = args.run.analysis_config()?;
    let demand = args.run.demand(&args.weights)?;
    let sites = load_sites(&args.sites, SiteKind::Existing)?;

    let writer = ArtifactWriter::new(&args.run.out, args.run.overwrite);
    let key = ScenarioKey::coverage(config.isochrone.minutes);
    writer.ensure_writable(&key.artifact_names())?;

    let source = args.run.network_source()?;
    let outcome = CoverageScenario {
        demand: &demand,
        sites: &sites,
        weights: args.weights.builder()?,
        config,
    }
    .run(source.as_ref())?;

    for failure in &outcome.coverage.summary.skipped {
        warn!("{failure}");
    }

    let summary = &outcome.coverage.summary;
    writer.write_geojson(
        &key.coverage_layer(),
        &coverage_layer(&outcome.coverage.region, key, summary)?,
    )?;
    writer.write_csv(
        &key.flags_table(),
        &flag_records(&demand, &outcome.weights, &outcome.coverage.covered),
    )?;
    let record = SummaryRecord::new(key, sites.len(), summary);
    writer.write_csv(&key.summary_table(), std::slice::from_ref(&record))?;

    info!(
        covered = summary.covered_count,
        demand = summary.demand_count,
        "Weighted coverage {:.1}% at {} min",
        summary.weighted_pct,
        key.minutes
    );
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
