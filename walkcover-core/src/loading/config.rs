use serde::{Deserialize, Serialize};

use crate::Error;

/// Parameters of the pedestrian network build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Assumed walking speed used to derive edge crossing times
    pub walking_speed_m_per_min: f64,
    /// Keep every connected component instead of only the largest one
    pub retain_all: bool,
    /// Return freed heap memory to the OS after OSM parsing (glibc only)
    pub trim_memory: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            walking_speed_m_per_min: 80.0,
            retain_all: false,
            trim_memory: true,
        }
    }
}

/// Parameters of the per-site reachability polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    /// Walking time budget
    pub minutes: u32,
    /// Buffer radius around every reached node, in meters
    pub node_buffer_m: f64,
    /// Sites farther than this from any street node are skipped
    pub max_snap_distance_m: f64,
}

impl IsochroneConfig {
    /// Walking time budget in milliseconds
    pub fn cutoff_ms(&self) -> crate::WalkingTime {
        self.minutes.saturating_mul(60_000)
    }
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            minutes: 15,
            node_buffer_m: 35.0,
            max_snap_distance_m: 500.0,
        }
    }
}

/// Full configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub network: NetworkConfig,
    pub isochrone: IsochroneConfig,
    /// Area of interest radius as a multiple of the walkable distance
    pub aoi_radius_factor: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            isochrone: IsochroneConfig::default(),
            aoi_radius_factor: 2.0,
        }
    }
}

impl AnalysisConfig {
    /// Radius around each site that the network must cover, in meters
    pub fn aoi_radius_m(&self) -> f64 {
        self.aoi_radius_factor
            * f64::from(self.isochrone.minutes)
            * self.network.walking_speed_m_per_min
    }

    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("walking_speed_m_per_min", self.network.walking_speed_m_per_min),
            ("node_buffer_m", self.isochrone.node_buffer_m),
            ("max_snap_distance_m", self.isochrone.max_snap_distance_m),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.isochrone.minutes == 0 {
            return Err(Error::InvalidInput(
                "minutes must be at least 1".to_string(),
            ));
        }

        if !self.aoi_radius_factor.is_finite() || self.aoi_radius_factor < 1.0 {
            return Err(Error::InvalidInput(format!(
                "aoi_radius_factor must be at least 1, got {}",
                self.aoi_radius_factor
            )));
        }

        Ok(())
    }
}
