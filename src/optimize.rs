use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::{info, warn};
use walkcover_core::loading::load_sites;
use walkcover_core::output::{
    ArtifactWriter, ScenarioKey, SummaryRecord, coverage_layer, flag_records, selected_sites_layer,
};
use walkcover_core::{OptimizationScenario, SiteKind};

use crate::{CliResult, RunArgs, WeightArgs};

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Candidate locations (GeoJSON points)
    #[arg(long)]
    pub candidates: PathBuf,

    /// Existing facilities whose coverage is already in place
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Number of candidates to select
    #[arg(long)]
    pub k: usize,

    #[command(flatten)]
    pub weights: WeightArgs,
}

#[derive(Serialize)]
struct PickReport<'a> {
    rank: usize,
    site_id: &'a str,
    marginal_gain: f64,
}

#[derive(Serialize)]
struct Report<'a> {
    before: SummaryRecord,
    after: SummaryRecord,
    picks: Vec<PickReport<'a>>,
    degenerate: bool,
}

pub fn run(args: &OptimizeArgs) -> CliResult<()> {
    let config = args.run.analysis_config()?;
    let demand = args.run.demand(&args.weights)?;
    let candidates = load_sites(&args.candidates, SiteKind::Candidate)?;
    let existing = match &args.existing {
        Some(path) => load_sites(path, SiteKind::Existing)?,
        None => Vec::new(),
    };

    let writer = ArtifactWriter::new(&args.run.out, args.run.overwrite);
    let key = ScenarioKey::selection(args.k, config.isochrone.minutes);
    writer.ensure_writable(&key.artifact_names())?;

    let source = args.run.network_source()?;
    let outcome = OptimizationScenario {
        demand: &demand,
        candidates: &candidates,
        existing: &existing,
        weights: args.weights.builder()?,
        config,
        k: args.k,
    }
    .run(source.as_ref())?;

    for failure in &outcome.after.summary.skipped {
        warn!("{failure}");
    }
    if let Some(degenerate) = &outcome.selection.degenerate {
        warn!(
            requested = degenerate.requested,
            selected = degenerate.selected,
            "Selection stopped early: {}",
            degenerate.reason
        );
    }

    if let Some(name) = key.selected_layer() {
        writer.write_geojson(&name, &selected_sites_layer(&candidates, &outcome.selection)?)?;
    }
    writer.write_geojson(
        &key.coverage_layer(),
        &coverage_layer(&outcome.after.region, key, &outcome.after.summary)?,
    )?;
    writer.write_csv(
        &key.flags_table(),
        &flag_records(&demand, &outcome.weights, &outcome.after.covered),
    )?;

    let before = SummaryRecord::new(
        ScenarioKey::coverage(key.minutes),
        existing.len(),
        &outcome.before.summary,
    );
    let after = SummaryRecord::new(
        key,
        existing.len() + outcome.selection.picks.len(),
        &outcome.after.summary,
    );
    writer.write_csv(&key.summary_table(), &[before.clone(), after.clone()])?;

    let picks: Vec<PickReport<'_>> = outcome
        .selection
        .picks
        .iter()
        .enumerate()
        .filter_map(|(rank, pick)| {
            let site = candidates.get(pick.candidate)?;
            info!(
                rank = rank + 1,
                site = site.id.as_str(),
                gain = pick.marginal_gain,
                "Selected candidate"
            );
            Some(PickReport {
                rank: rank + 1,
                site_id: &site.id,
                marginal_gain: pick.marginal_gain,
            })
        })
        .collect();

    let report = Report {
        before,
        after,
        picks,
        degenerate: outcome.selection.degenerate.is_some(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
