//! Per-demand-point priority weights.

use std::fmt;

use hashbrown::HashSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::model::DemandPoint;
use crate::Error;

/// Weight assigned when a demand point carries no usable indicator
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// Indicator the weights are derived from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    /// Primary heat vulnerability index
    #[default]
    #[serde(alias = "hvi")]
    Vulnerability,
    /// Modeled risk, falling back to vulnerability where risk is missing
    Risk,
}

/// Where a weight value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOrigin {
    Risk,
    Vulnerability,
    NeutralFallback,
}

impl fmt::Display for WeightOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WeightOrigin::Risk => "risk",
            WeightOrigin::Vulnerability => "vulnerability",
            WeightOrigin::NeutralFallback => "neutral_fallback",
        };
        f.write_str(label)
    }
}

/// Weights aligned to the demand order, with their provenance
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    pub values: Vec<f64>,
    pub origins: Vec<WeightOrigin>,
    pub equity_flagged: Vec<bool>,
}

impl WeightVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn fallback_count(&self) -> usize {
        self.origins
            .iter()
            .filter(|o| **o == WeightOrigin::NeutralFallback)
            .count()
    }
}

/// Builds a [`WeightVector`] from demand indicators
///
/// Indicator values are clipped to [0, 1]. Flagged points are then
/// multiplied by the equity factor and may exceed 1.
#[derive(Debug, Clone, Default)]
pub struct WeightBuilder {
    source: WeightSource,
    equity: Option<(HashSet<String>, f64)>,
}

impl WeightBuilder {
    pub fn new(source: WeightSource) -> Self {
        Self {
            source,
            equity: None,
        }
    }

    /// Multiply the weight of every demand point in `flagged` by `multiplier`
    #[must_use]
    pub fn with_equity(mut self, flagged: HashSet<String>, multiplier: f64) -> Self {
        self.equity = Some((flagged, multiplier));
        self
    }

    pub fn build(&self, demand: &[DemandPoint]) -> Result<WeightVector, Error> {
        if let Some((_, multiplier)) = &self.equity
            && (!multiplier.is_finite() || *multiplier < 1.0)
        {
            return Err(Error::InvalidInput(format!(
                "equity multiplier must be a finite number >= 1, got {multiplier}"
            )));
        }

        let mut values = Vec::with_capacity(demand.len());
        let mut origins = Vec::with_capacity(demand.len());
        let mut equity_flagged = Vec::with_capacity(demand.len());

        for point in demand {
            let (base, origin) = self.base_weight(point);
            let (value, flagged) = match &self.equity {
                Some((flags, multiplier)) if flags.contains(&point.id) => {
                    (base * multiplier, true)
                }
                _ => (base, false),
            };

            if !value.is_finite() {
                return Err(Error::InvalidData(format!(
                    "weight of demand point {} is not finite",
                    point.id
                )));
            }

            values.push(value);
            origins.push(origin);
            equity_flagged.push(flagged);
        }

        let weights = WeightVector {
            values,
            origins,
            equity_flagged,
        };

        let fallbacks = weights.fallback_count();
        if fallbacks > 0 {
            warn!(
                "{fallbacks} of {} demand points have no {:?} value, using neutral weight {NEUTRAL_WEIGHT}",
                weights.len(),
                self.source
            );
        }
        info!(
            "Built {} weights from {:?} ({} equity flagged), total {:.3}",
            weights.len(),
            self.source,
            weights.equity_flagged.iter().filter(|f| **f).count(),
            weights.total()
        );

        Ok(weights)
    }

    fn base_weight(&self, point: &DemandPoint) -> (f64, WeightOrigin) {
        let risk = usable(point.risk).map(|v| (v, WeightOrigin::Risk));
        let vulnerability = usable(point.vulnerability).map(|v| (v, WeightOrigin::Vulnerability));

        let picked = match self.source {
            WeightSource::Risk => risk.or(vulnerability),
            WeightSource::Vulnerability => vulnerability,
        };

        match picked {
            Some((value, origin)) => (value.clamp(0.0, 1.0), origin),
            None => (NEUTRAL_WEIGHT, WeightOrigin::NeutralFallback),
        }
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
