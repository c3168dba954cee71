//! Equity membership table

use std::fs::File;
use std::path::Path;

use hashbrown::HashSet;
use log::{info, warn};
use serde::Deserialize;

use crate::Error;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct EquityRecord {
    #[serde(alias = "geoid", alias = "GEOID20", alias = "tract_id")]
    #[serde(rename = "GEOID")]
    geoid: String,
    #[serde(alias = "EJ")]
    ej: String,
}

impl EquityRecord {
    fn is_flagged(&self) -> bool {
        match self.ej.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" => true,
            other => other.parse::<f64>().is_ok_and(|v| v >= 0.5),
        }
    }
}

/// Identifiers of demand units flagged for equity prioritization
///
/// Reads a CSV with a `GEOID` column and a binary `ej` column.
pub fn load_equity_flags(path: &Path) -> Result<HashSet<String>, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    read_equity_flags(file, path)
}

fn read_equity_flags<R: std::io::Read>(reader: R, source: &Path) -> Result<HashSet<String>, Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h.eq_ignore_ascii_case("ej")) {
        return Err(Error::InvalidInput(format!(
            "{}: equity table has no 'ej' column",
            source.display()
        )));
    }

    let mut flagged = HashSet::new();
    let mut malformed = 0usize;
    for record in reader.deserialize::<EquityRecord>() {
        match record {
            Ok(record) if record.geoid.trim().is_empty() => malformed += 1,
            Ok(record) => {
                if record.is_flagged() {
                    flagged.insert(record.geoid.trim().to_string());
                }
            }
            Err(_) => malformed += 1,
        }
    }

    if malformed > 0 {
        warn!("{}: skipped {malformed} malformed equity rows", source.display());
    }
    info!(
        "{} demand units flagged for equity from {}",
        flagged.len(),
        source.display()
    );
    Ok(flagged)
}
