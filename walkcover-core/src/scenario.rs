//! End-to-end analysis runs.
//!
//! A scenario takes demand, sites and a network source through the
//! area of interest, the walk network, the isochrone sweep and coverage.
//! Nothing is written here; callers persist outcomes once a run succeeds.

use fixedbitset::FixedBitSet;
use geo::{MultiPolygon, Point};
use log::info;

use crate::algo::aoi::area_of_interest;
use crate::algo::coverage::{CoverageMatrix, CoverageSummary, coverage_region};
use crate::algo::greedy::{GreedySelector, SelectionResult};
use crate::algo::isochrone::{Isochrone, bulk_isochrones, failures, regions};
use crate::algo::weights::{WeightBuilder, WeightVector};
use crate::loading::{AnalysisConfig, NetworkSource, create_street_graph, study_boundary};
use crate::model::{DemandPoint, Site, StreetGraph, demand::demand_locations};
use crate::output::ScenarioKey;
use crate::{Error, SiteFailure};

/// Coverage state of one site set
#[derive(Debug, Clone)]
pub struct CoverageState {
    /// Demand points reachable from at least one site
    pub covered: FixedBitSet,
    /// Dissolved reachable region (lon/lat)
    pub region: MultiPolygon<f64>,
    pub summary: CoverageSummary,
}

impl CoverageState {
    fn new(
        isochrones: &[&Isochrone],
        covered: FixedBitSet,
        weights: &WeightVector,
        skipped: Vec<SiteFailure>,
    ) -> Self {
        let geometries: Vec<&MultiPolygon<f64>> = isochrones.iter().map(|i| &i.geometry).collect();
        Self {
            summary: CoverageSummary::new(&covered, weights, skipped),
            region: coverage_region(&geometries),
            covered,
        }
    }
}

/// Baseline coverage of a fixed site set
#[derive(Debug, Clone)]
pub struct CoverageScenario<'a> {
    pub demand: &'a [DemandPoint],
    pub sites: &'a [Site],
    pub weights: WeightBuilder,
    pub config: AnalysisConfig,
}

#[derive(Debug, Clone)]
pub struct CoverageOutcome {
    pub key: ScenarioKey,
    pub isochrones: Vec<Result<Isochrone, SiteFailure>>,
    pub matrix: CoverageMatrix,
    pub weights: WeightVector,
    pub coverage: CoverageState,
}

impl CoverageScenario<'_> {
    /// # Errors
    ///
    /// Fails on invalid configuration or input, on an empty network, and
    /// when no site yields an isochrone.
    pub fn run(&self, source: &dyn NetworkSource) -> Result<CoverageOutcome, Error> {
        let key = ScenarioKey::coverage(self.config.isochrone.minutes);
        check_inputs(&self.config, self.demand, self.sites, "site")?;
        let weights = self.weights.build(self.demand)?;

        let graph = walk_network(&self.config, self.demand, &[self.sites], source)?;
        let isochrones = sweep(&graph, self.sites, &self.config)?;

        let matrix = CoverageMatrix::build(&regions(&isochrones), &demand_locations(self.demand));
        let reached: Vec<&Isochrone> = isochrones.iter().filter_map(|r| r.as_ref().ok()).collect();
        let coverage = CoverageState::new(
            &reached,
            matrix.covered_all(),
            &weights,
            failures(&isochrones),
        );

        log_summary("Coverage", &coverage.summary);

        Ok(CoverageOutcome {
            key,
            isochrones,
            matrix,
            weights,
            coverage,
        })
    }
}

/// Greedy selection of `k` candidates on top of existing sites
#[derive(Debug, Clone)]
pub struct OptimizationScenario<'a> {
    pub demand: &'a [DemandPoint],
    pub candidates: &'a [Site],
    /// Sites whose coverage is already in place
    pub existing: &'a [Site],
    pub weights: WeightBuilder,
    pub config: AnalysisConfig,
    pub k: usize,
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub key: ScenarioKey,
    /// One entry per candidate, in candidate order
    pub candidate_isochrones: Vec<Result<Isochrone, SiteFailure>>,
    /// One entry per existing site, in input order
    pub existing_isochrones: Vec<Result<Isochrone, SiteFailure>>,
    /// Candidate rows only
    pub matrix: CoverageMatrix,
    pub weights: WeightVector,
    pub selection: SelectionResult,
    /// Coverage of the existing sites alone
    pub before: CoverageState,
    /// Coverage of the existing sites plus the selected candidates
    pub after: CoverageState,
}

impl OptimizationScenario<'_> {
    /// # Errors
    ///
    /// Fails on invalid configuration or input, on an empty network, and
    /// when no candidate yields an isochrone.
    pub fn run(&self, source: &dyn NetworkSource) -> Result<OptimizationOutcome, Error> {
        let key = ScenarioKey::selection(self.k, self.config.isochrone.minutes);
        check_inputs(&self.config, self.demand, self.candidates, "candidate")?;
        let weights = self.weights.build(self.demand)?;

        let graph = walk_network(
            &self.config,
            self.demand,
            &[self.candidates, self.existing],
            source,
        )?;
        let candidate_isochrones = sweep(&graph, self.candidates, &self.config)?;
        let existing_isochrones = bulk_isochrones(&graph, self.existing, &self.config.isochrone);

        let locations = demand_locations(self.demand);
        let matrix = CoverageMatrix::build(&regions(&candidate_isochrones), &locations);
        let existing_matrix = CoverageMatrix::build(&regions(&existing_isochrones), &locations);
        let baseline = existing_matrix.covered_all();

        let selection = GreedySelector::new(&matrix, &weights)?
            .with_baseline(&baseline)
            .select(self.k);

        let existing_reached: Vec<&Isochrone> = existing_isochrones
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .collect();
        let before = CoverageState::new(
            &existing_reached,
            baseline.clone(),
            &weights,
            failures(&existing_isochrones),
        );

        let mut after_reached = existing_reached;
        after_reached.extend(
            selection
                .chosen()
                .into_iter()
                .filter_map(|idx| candidate_isochrones.get(idx)?.as_ref().ok()),
        );
        let mut after_covered = baseline;
        after_covered.union_with(&matrix.covered_by_any(&selection.chosen()));

        let mut skipped = failures(&existing_isochrones);
        skipped.extend(failures(&candidate_isochrones));
        let after = CoverageState::new(&after_reached, after_covered, &weights, skipped);

        log_summary("Before selection", &before.summary);
        log_summary("After selection", &after.summary);

        Ok(OptimizationOutcome {
            key,
            candidate_isochrones,
            existing_isochrones,
            matrix,
            weights,
            selection,
            before,
            after,
        })
    }
}

fn check_inputs(
    config: &AnalysisConfig,
    demand: &[DemandPoint],
    sites: &[Site],
    label: &str,
) -> Result<(), Error> {
    config.validate()?;
    if demand.is_empty() {
        return Err(Error::InvalidInput("no demand points given".to_string()));
    }
    if sites.is_empty() {
        return Err(Error::InvalidInput(format!("no {label} sites given")));
    }
    Ok(())
}

fn walk_network(
    config: &AnalysisConfig,
    demand: &[DemandPoint],
    site_sets: &[&[Site]],
    source: &dyn NetworkSource,
) -> Result<StreetGraph, Error> {
    let points: Vec<Point<f64>> = site_sets
        .iter()
        .flat_map(|sites| sites.iter().map(|s| s.geometry))
        .collect();
    let boundary = study_boundary(demand);

    let aoi = area_of_interest(&points, boundary.as_ref(), config.aoi_radius_m())?;
    info!(
        "Building walk network around {} sites ({:.0} m radius)",
        points.len(),
        config.aoi_radius_m()
    );
    create_street_graph(source, &aoi, &config.network)
}

fn sweep(
    graph: &StreetGraph,
    sites: &[Site],
    config: &AnalysisConfig,
) -> Result<Vec<Result<Isochrone, SiteFailure>>, Error> {
    let isochrones = bulk_isochrones(graph, sites, &config.isochrone);
    if !isochrones.is_empty() && isochrones.iter().all(Result::is_err) {
        return Err(Error::IsochroneError(format!(
            "none of {} sites could be reached on the walk network",
            sites.len()
        )));
    }
    Ok(isochrones)
}

fn log_summary(stage: &str, summary: &CoverageSummary) {
    info!(
        "{stage}: {}/{} demand points covered ({:.1}%), weighted {:.1}%",
        summary.covered_count, summary.demand_count, summary.pct_covered, summary.weighted_pct
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::weights::WeightSource;
    use crate::loading::{RawEdge, RawNetwork, RawNode};

    /// Five nodes on a line along the equator, 0.001 deg apart
    fn line_network() -> RawNetwork {
        let nodes = (0..5_i32)
            .map(|i| RawNode {
                id: i64::from(i),
                lon: f64::from(i) * 0.001,
                lat: 0.0,
            })
            .collect();
        let edges = (0..4)
            .map(|i| RawEdge {
                source: i,
                target: i + 1,
                length_m: Some(400.0),
            })
            .collect();
        RawNetwork { nodes, edges }
    }

    fn demand() -> Vec<DemandPoint> {
        (0..5_i32)
            .map(|i| {
                DemandPoint::new(format!("d{i}"), Point::new(f64::from(i) * 0.001, 0.0))
                    .with_vulnerability(0.5)
            })
            .collect()
    }

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        // one hop of 400 m at 80 m/min
        config.isochrone.minutes = 5;
        config
    }

    #[test]
    fn coverage_of_one_site() {
        let demand = demand();
        let sites = vec![Site::existing("s", Point::new(0.0, 0.0))];
        let outcome = CoverageScenario {
            demand: &demand,
            sites: &sites,
            weights: WeightBuilder::new(WeightSource::Vulnerability),
            config: config(),
        }
        .run(&line_network())
        .unwrap();

        assert_eq!(outcome.key, ScenarioKey::coverage(5));
        assert_eq!(outcome.coverage.summary.covered_count, 2);
        assert!((outcome.coverage.summary.weighted_pct - 40.0).abs() < 1e-9);
        assert!(!outcome.coverage.region.0.is_empty());
    }

    #[test]
    fn selection_fills_gaps_left_by_existing_sites() {
        let demand = demand();
        let existing = vec![Site::existing("e", Point::new(0.0, 0.0))];
        let candidates = vec![
            Site::candidate("overlap", Point::new(0.001, 0.0)),
            Site::candidate("east", Point::new(0.004, 0.0)),
        ];
        let outcome = OptimizationScenario {
            demand: &demand,
            candidates: &candidates,
            existing: &existing,
            weights: WeightBuilder::new(WeightSource::Vulnerability),
            config: config(),
            k: 1,
        }
        .run(&line_network())
        .unwrap();

        // overlap adds only d2, east adds d3 and d4
        assert_eq!(outcome.selection.chosen(), vec![1]);
        assert_eq!(outcome.before.summary.covered_count, 2);
        assert_eq!(outcome.after.summary.covered_count, 4);
        assert_eq!(outcome.matrix.site_count(), 2);
    }

    #[test]
    fn empty_sites_fail_fast() {
        let demand = demand();
        let result = CoverageScenario {
            demand: &demand,
            sites: &[],
            weights: WeightBuilder::default(),
            config: config(),
        }
        .run(&line_network());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn network_without_streets_is_reported() {
        let demand = demand();
        let sites = vec![Site::existing("s", Point::new(0.0, 0.0))];
        let mut network = line_network();
        network.edges.clear();

        let result = CoverageScenario {
            demand: &demand,
            sites: &sites,
            weights: WeightBuilder::default(),
            config: config(),
        }
        .run(&network);
        assert!(matches!(result, Err(Error::NetworkEmpty { .. })));
    }
}
