//! Membership of demand points in site isochrones.

use fixedbitset::FixedBitSet;
use geo::{Intersects, MultiPolygon, Point};
use rayon::prelude::*;

use crate::algo::weights::WeightVector;
use crate::{Error, SiteFailure};

/// Boolean relation between sites (rows) and demand points (columns)
///
/// Rows follow the site order of the isochrone sweep. A site without an
/// isochrone has an empty row, so row indices stay aligned with the site
/// list. The matrix is always built whole from its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMatrix {
    rows: Vec<FixedBitSet>,
    demand_count: usize,
}

impl CoverageMatrix {
    /// Test every demand location against every region
    ///
    /// Membership is boundary-inclusive and evaluated in lon/lat, the frame
    /// both operands share.
    pub fn build(regions: &[Option<&MultiPolygon<f64>>], demand: &[Point<f64>]) -> Self {
        let demand_count = demand.len();
        let rows = regions
            .par_iter()
            .map(|region| {
                let mut row = FixedBitSet::with_capacity(demand_count);
                if let Some(region) = region {
                    for (idx, location) in demand.iter().enumerate() {
                        if region.intersects(location) {
                            row.insert(idx);
                        }
                    }
                }
                row
            })
            .collect();

        Self { rows, demand_count }
    }

    /// Matrix from explicit rows, e.g. for synthetic selections
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a row is longer than `demand_count`.
    pub fn from_rows(rows: Vec<FixedBitSet>, demand_count: usize) -> Result<Self, Error> {
        let mut rows = rows;
        for (idx, row) in rows.iter_mut().enumerate() {
            if row.ones().any(|bit| bit >= demand_count) {
                return Err(Error::InvalidInput(format!(
                    "coverage row {idx} references demand point beyond {demand_count}"
                )));
            }
            row.grow(demand_count);
        }
        Ok(Self { rows, demand_count })
    }

    pub fn site_count(&self) -> usize {
        self.rows.len()
    }

    pub fn demand_count(&self) -> usize {
        self.demand_count
    }

    pub fn covers(&self, site: usize, demand: usize) -> bool {
        self.rows.get(site).is_some_and(|row| row.contains(demand))
    }

    pub fn row(&self, site: usize) -> Option<&FixedBitSet> {
        self.rows.get(site)
    }

    /// Demand points reachable from at least one of `sites`
    ///
    /// Unknown site indices contribute nothing.
    pub fn covered_by_any(&self, sites: &[usize]) -> FixedBitSet {
        let mut covered = FixedBitSet::with_capacity(self.demand_count);
        for row in sites.iter().filter_map(|&site| self.rows.get(site)) {
            covered.union_with(row);
        }
        covered
    }

    /// Demand points reachable from any site of the matrix
    pub fn covered_all(&self) -> FixedBitSet {
        let mut covered = FixedBitSet::with_capacity(self.demand_count);
        for row in &self.rows {
            covered.union_with(row);
        }
        covered
    }
}

/// Single dissolved region of a set of isochrones
pub fn coverage_region(regions: &[&MultiPolygon<f64>]) -> MultiPolygon<f64> {
    geo::unary_union(regions.iter().copied())
}

/// Headline figures of one coverage state
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSummary {
    pub demand_count: usize,
    pub covered_count: usize,
    /// Share of demand points covered, in percent
    pub pct_covered: f64,
    /// Share of total weight covered, in percent
    pub weighted_pct: f64,
    /// Sites without an isochrone
    pub skipped: Vec<SiteFailure>,
}

impl CoverageSummary {
    /// Summarize `covered` against `weights`
    ///
    /// The weighted share is 0 when the total weight is 0.
    pub fn new(covered: &FixedBitSet, weights: &WeightVector, skipped: Vec<SiteFailure>) -> Self {
        let demand_count = weights.len();
        let covered_count = covered.ones().filter(|&idx| idx < demand_count).count();

        let total: f64 = weights.values.iter().sum();
        let covered_weight: f64 = covered
            .ones()
            .filter_map(|idx| weights.values.get(idx))
            .sum();

        let pct_covered = if demand_count == 0 {
            0.0
        } else {
            100.0 * covered_count as f64 / demand_count as f64
        };
        let weighted_pct = if total > 0.0 {
            100.0 * covered_weight / total
        } else {
            0.0
        };

        Self {
            demand_count,
            covered_count,
            pct_covered,
            weighted_pct,
            skipped,
        }
    }
}
