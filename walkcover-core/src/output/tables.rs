use fixedbitset::FixedBitSet;
use serde::Serialize;

use super::ScenarioKey;
use crate::algo::coverage::CoverageSummary;
use crate::algo::weights::WeightVector;
use crate::model::DemandPoint;

/// One row of the per-demand coverage flag table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRecord {
    pub id: String,
    pub weight: f64,
    pub weight_origin: String,
    pub equity_flagged: bool,
    pub covered: bool,
}

/// Flag rows in demand order
pub fn flag_records(
    demand: &[DemandPoint],
    weights: &WeightVector,
    covered: &FixedBitSet,
) -> Vec<FlagRecord> {
    demand
        .iter()
        .enumerate()
        .map(|(idx, point)| FlagRecord {
            id: point.id.clone(),
            weight: weights.values.get(idx).copied().unwrap_or_default(),
            weight_origin: weights
                .origins
                .get(idx)
                .map(ToString::to_string)
                .unwrap_or_default(),
            equity_flagged: weights.equity_flagged.get(idx).copied().unwrap_or(false),
            covered: covered.contains(idx),
        })
        .collect()
}

/// Single-row scenario summary table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub minutes: u32,
    pub k: Option<usize>,
    pub sites: usize,
    pub skipped_sites: usize,
    pub demand_count: usize,
    pub covered_count: usize,
    pub pct_covered: f64,
    pub weighted_pct: f64,
}

impl SummaryRecord {
    pub fn new(key: ScenarioKey, sites: usize, summary: &CoverageSummary) -> Self {
        Self {
            minutes: key.minutes,
            k: key.k,
            sites,
            skipped_sites: summary.skipped.len(),
            demand_count: summary.demand_count,
            covered_count: summary.covered_count,
            pct_covered: summary.pct_covered,
            weighted_pct: summary.weighted_pct,
        }
    }
}
