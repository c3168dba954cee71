//! Greedy weighted maximum coverage.
//!
//! Every round picks the candidate whose row adds the most uncovered weight.
//! The objective is monotone submodular, so the sequence of marginal gains
//! never increases and the result is within (1 - 1/e) of the optimum.

use std::fmt;

use fixedbitset::FixedBitSet;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::algo::coverage::CoverageMatrix;
use crate::algo::weights::WeightVector;
use crate::Error;

/// One selection round
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    /// Row of the chosen candidate in the coverage matrix
    pub candidate: usize,
    /// Weight of demand first covered by this pick
    pub marginal_gain: f64,
    /// Number of demand points first covered by this pick
    pub newly_covered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Fewer candidates than requested
    CandidatesExhausted,
    /// Remaining candidates add no weight
    NoPositiveGain,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateReason::CandidatesExhausted => f.write_str("candidates exhausted"),
            DegenerateReason::NoPositiveGain => f.write_str("no candidate adds coverage"),
        }
    }
}

/// Selection stopped before reaching the requested count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegenerateObjective {
    pub requested: usize,
    pub selected: usize,
    pub reason: DegenerateReason,
}

/// Ordered outcome of a greedy run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionResult {
    pub picks: Vec<Pick>,
    /// Set when fewer than the requested number of picks were made
    pub degenerate: Option<DegenerateObjective>,
}

impl SelectionResult {
    /// Chosen candidate rows in pick order
    pub fn chosen(&self) -> Vec<usize> {
        self.picks.iter().map(|p| p.candidate).collect()
    }

    pub fn gains(&self) -> Vec<f64> {
        self.picks.iter().map(|p| p.marginal_gain).collect()
    }

    /// Running total of gains after each pick
    pub fn cumulative_gains(&self) -> Vec<f64> {
        self.picks
            .iter()
            .scan(0.0, |total, pick| {
                *total += pick.marginal_gain;
                Some(*total)
            })
            .collect()
    }

    pub fn total_gain(&self) -> f64 {
        self.picks.iter().map(|p| p.marginal_gain).sum()
    }
}

/// Greedy selector over a fixed matrix and weight vector
///
/// Holds no state between runs: every call to [`GreedySelector::select`]
/// starts from the baseline.
#[derive(Debug)]
pub struct GreedySelector<'a> {
    matrix: &'a CoverageMatrix,
    weights: &'a [f64],
    baseline: FixedBitSet,
}

impl<'a> GreedySelector<'a> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the weight vector does not match
    /// the matrix columns or holds a negative or non-finite weight.
    pub fn new(matrix: &'a CoverageMatrix, weights: &'a WeightVector) -> Result<Self, Error> {
        if weights.len() != matrix.demand_count() {
            return Err(Error::InvalidInput(format!(
                "{} weights for {} demand points",
                weights.len(),
                matrix.demand_count()
            )));
        }
        if let Some((idx, w)) = weights
            .values
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(Error::InvalidInput(format!(
                "weight {w} of demand point #{idx} is negative or not finite"
            )));
        }

        Ok(Self {
            matrix,
            weights: &weights.values,
            baseline: FixedBitSet::with_capacity(matrix.demand_count()),
        })
    }

    /// Treat `covered` as already served, e.g. by existing sites
    #[must_use]
    pub fn with_baseline(mut self, covered: &FixedBitSet) -> Self {
        self.baseline.clear();
        self.baseline.union_with(covered);
        self.baseline.grow(self.matrix.demand_count());
        self
    }

    /// Pick up to `k` candidates
    ///
    /// Ties go to the lowest candidate index. Selection ends early when
    /// candidates run out or no remaining candidate adds positive weight;
    /// the result is then flagged as degenerate.
    pub fn select(&self, k: usize) -> SelectionResult {
        let site_count = self.matrix.site_count();
        let mut covered = self.baseline.clone();
        let mut chosen = vec![false; site_count];
        let mut picks = Vec::with_capacity(k.min(site_count));
        let mut stop = None;

        while picks.len() < k {
            if picks.len() == site_count {
                stop = Some(DegenerateReason::CandidatesExhausted);
                break;
            }

            let gains: Vec<Option<f64>> = (0..site_count)
                .into_par_iter()
                .map(|site| (!chosen[site]).then(|| self.marginal_gain(site, &covered)))
                .collect();

            let best = gains
                .iter()
                .enumerate()
                .filter_map(|(site, gain)| gain.map(|g| (site, g)))
                .fold(None, |best: Option<(usize, f64)>, (site, gain)| match best {
                    Some((_, best_gain)) if gain <= best_gain => best,
                    _ => Some((site, gain)),
                });

            let Some((site, gain)) = best.filter(|(_, gain)| *gain > 0.0) else {
                stop = Some(DegenerateReason::NoPositiveGain);
                break;
            };

            let newly_covered = match self.matrix.row(site) {
                Some(row) => {
                    let before = covered.count_ones(..);
                    covered.union_with(row);
                    covered.count_ones(..) - before
                }
                None => 0,
            };
            chosen[site] = true;

            debug!(
                "Round {}: candidate {site} adds {gain:.4} ({newly_covered} demand points)",
                picks.len() + 1
            );
            picks.push(Pick {
                candidate: site,
                marginal_gain: gain,
                newly_covered,
            });
        }

        let degenerate = stop.map(|reason| DegenerateObjective {
            requested: k,
            selected: picks.len(),
            reason,
        });

        match &degenerate {
            Some(d) => warn!(
                "Selected {} of {} requested candidates: {}",
                d.selected, d.requested, d.reason
            ),
            None => info!("Selected {} candidates", picks.len()),
        }

        SelectionResult { picks, degenerate }
    }

    fn marginal_gain(&self, site: usize, covered: &FixedBitSet) -> f64 {
        self.matrix.row(site).map_or(0.0, |row| {
            row.difference(covered)
                .filter_map(|idx| self.weights.get(idx))
                .sum()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::weights::WeightOrigin;

    fn matrix(rows: &[&[usize]], demand: usize) -> CoverageMatrix {
        let rows = rows
            .iter()
            .map(|cols| {
                let mut row = FixedBitSet::with_capacity(demand);
                for &c in *cols {
                    row.insert(c);
                }
                row
            })
            .collect();
        CoverageMatrix::from_rows(rows, demand).unwrap()
    }

    fn weights(values: &[f64]) -> WeightVector {
        WeightVector {
            values: values.to_vec(),
            origins: vec![WeightOrigin::Vulnerability; values.len()],
            equity_flagged: vec![false; values.len()],
        }
    }

    #[test]
    fn picks_highest_gain_first() {
        let m = matrix(&[&[0], &[1, 2], &[2, 3]], 4);
        let w = weights(&[0.2, 0.4, 0.4, 0.3]);
        let result = GreedySelector::new(&m, &w).unwrap().select(2);

        assert_eq!(result.chosen(), vec![1, 2]);
        let gains = result.gains();
        assert!((gains[0] - 0.8).abs() < 1e-12);
        // demand 2 already covered
        assert!((gains[1] - 0.3).abs() < 1e-12);
        assert_eq!(result.picks[1].newly_covered, 1);
        assert!(result.degenerate.is_none());
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let m = matrix(&[&[0], &[1], &[2]], 3);
        let w = weights(&[0.5, 0.5, 0.5]);
        let result = GreedySelector::new(&m, &w).unwrap().select(3);
        assert_eq!(result.chosen(), vec![0, 1, 2]);
    }

    #[test]
    fn gains_are_non_increasing() {
        let m = matrix(
            &[&[0, 1, 2], &[2, 3], &[3, 4, 5], &[0, 5], &[1, 4], &[6]],
            7,
        );
        let w = weights(&[0.9, 0.1, 0.4, 0.7, 0.2, 0.3, 0.05]);
        let result = GreedySelector::new(&m, &w).unwrap().select(6);

        let gains = result.gains();
        assert!(gains.windows(2).all(|g| g[1] <= g[0] + 1e-12));
        let cumulative = result.cumulative_gains();
        assert!(cumulative.windows(2).all(|c| c[1] >= c[0]));
        assert!((result.total_gain() - w.total()).abs() < 1e-9);
    }

    #[test]
    fn stops_without_positive_gain() {
        let m = matrix(&[&[0], &[0], &[]], 2);
        let w = weights(&[1.0, 1.0]);
        let result = GreedySelector::new(&m, &w).unwrap().select(3);

        assert_eq!(result.chosen(), vec![0]);
        assert_eq!(
            result.degenerate,
            Some(DegenerateObjective {
                requested: 3,
                selected: 1,
                reason: DegenerateReason::NoPositiveGain,
            })
        );
    }

    #[test]
    fn k_beyond_candidates_selects_all() {
        let m = matrix(&[&[0], &[1]], 2);
        let w = weights(&[1.0, 1.0]);
        let result = GreedySelector::new(&m, &w).unwrap().select(5);

        assert_eq!(result.chosen(), vec![0, 1]);
        assert_eq!(
            result.degenerate.map(|d| d.reason),
            Some(DegenerateReason::CandidatesExhausted)
        );
    }

    #[test]
    fn zero_k_is_empty_and_not_degenerate() {
        let m = matrix(&[&[0]], 1);
        let w = weights(&[1.0]);
        let result = GreedySelector::new(&m, &w).unwrap().select(0);
        assert!(result.picks.is_empty());
        assert!(result.degenerate.is_none());
    }

    #[test]
    fn baseline_demand_counts_for_nothing() {
        let m = matrix(&[&[0, 1], &[2]], 3);
        let w = weights(&[0.5, 0.5, 0.6]);
        let mut baseline = FixedBitSet::with_capacity(3);
        baseline.insert(0);
        baseline.insert(1);

        let result = GreedySelector::new(&m, &w)
            .unwrap()
            .with_baseline(&baseline)
            .select(2);
        assert_eq!(result.chosen(), vec![1]);
        assert_eq!(
            result.degenerate.map(|d| d.reason),
            Some(DegenerateReason::NoPositiveGain)
        );
    }

    #[test]
    fn same_inputs_same_selection() {
        let m = matrix(&[&[0, 1], &[1, 2], &[2, 3], &[3, 0]], 4);
        let w = weights(&[0.25, 0.25, 0.25, 0.25]);
        let selector = GreedySelector::new(&m, &w).unwrap();
        let first = selector.select(4);
        let second = selector.select(4);
        assert_eq!(first, second);
        assert_eq!(first.chosen(), vec![0, 2]);
    }

    #[test]
    fn rejects_mismatched_or_negative_weights() {
        let m = matrix(&[&[0]], 2);
        assert!(matches!(
            GreedySelector::new(&m, &weights(&[1.0])),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            GreedySelector::new(&m, &weights(&[1.0, -0.1])),
            Err(Error::InvalidInput(_))
        ));
    }
}
