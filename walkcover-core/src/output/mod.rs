//! Persisted scenario artifacts: GeoJSON layers and CSV tables.

mod tables;
mod to_geojson;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use log::info;

use crate::Error;

pub use tables::{FlagRecord, SummaryRecord, flag_records};
pub use to_geojson::{coverage_layer, selected_sites_layer};

/// Identity of a scenario in artifact names
///
/// Different minute budgets or selection sizes never share a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioKey {
    pub minutes: u32,
    /// Selection size, `None` for plain coverage of a site set
    pub k: Option<usize>,
}

impl ScenarioKey {
    pub fn coverage(minutes: u32) -> Self {
        Self { minutes, k: None }
    }

    pub fn selection(k: usize, minutes: u32) -> Self {
        Self {
            minutes,
            k: Some(k),
        }
    }

    fn suffix(&self) -> String {
        match self.k {
            Some(k) => format!("after_k{k}_m{}", self.minutes),
            None => format!("m{}", self.minutes),
        }
    }

    pub fn coverage_layer(&self) -> String {
        format!("coverage_{}.geojson", self.suffix())
    }

    pub fn flags_table(&self) -> String {
        format!("coverage_flags_{}.csv", self.suffix())
    }

    pub fn summary_table(&self) -> String {
        format!("coverage_summary_{}.csv", self.suffix())
    }

    pub fn selected_layer(&self) -> Option<String> {
        self.k
            .map(|k| format!("selected_k{k}_m{}.geojson", self.minutes))
    }

    /// Every artifact written for this scenario
    pub fn artifact_names(&self) -> Vec<String> {
        let mut names = vec![self.coverage_layer(), self.flags_table(), self.summary_table()];
        names.extend(self.selected_layer());
        names
    }
}

/// Writes artifacts into one output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    overwrite: bool,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fail before any work is done if an artifact would be overwritten
    pub fn ensure_writable(&self, names: &[String]) -> Result<(), Error> {
        for name in names {
            self.target(name)?;
        }
        Ok(())
    }

    fn target(&self, name: &str) -> Result<PathBuf, Error> {
        let path = self.dir.join(name);
        if path.exists() && !self.overwrite {
            return Err(Error::InvalidInput(format!(
                "{} already exists, pass overwrite to replace it",
                path.display()
            )));
        }
        Ok(path)
    }

    fn create(&self, name: &str) -> Result<(PathBuf, BufWriter<File>), Error> {
        let path = self.target(name)?;
        std::fs::create_dir_all(&self.dir)?;
        let file = File::create(&path)?;
        Ok((path, BufWriter::new(file)))
    }

    pub fn write_geojson(&self, name: &str, layer: &FeatureCollection) -> Result<PathBuf, Error> {
        let (path, writer) = self.create(name)?;
        serde_json::to_writer(writer, layer).map_err(|e| Error::GeoJsonError(e.to_string()))?;
        info!("Wrote {} features to {}", layer.features.len(), path.display());
        Ok(path)
    }

    /// Write rows of any serializable record as CSV with a header
    pub fn write_csv<T: serde::Serialize>(&self, name: &str, rows: &[T]) -> Result<PathBuf, Error> {
        let (path, writer) = self.create(name)?;
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }
}
