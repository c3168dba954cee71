use std::path::Path;

use serde::Deserialize;
use walkcover_core::AnalysisConfig;

use crate::CliResult;

/// Contents of a `--config` TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub analysis: AnalysisConfig,
}

pub fn load(path: Option<&Path>) -> CliResult<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    let config: FileConfig =
        toml::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))?;
    tracing::debug!(?config, "Loaded configuration from {}", path.display());
    Ok(config)
}
