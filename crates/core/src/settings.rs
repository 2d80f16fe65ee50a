use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{RunConfig, TargetSpec};

/// Persisted form state. Numbers are kept as typed so a bad value
/// survives a restart and is reported again instead of silently reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: String,
    pub start_row: String,
    pub end_row: String,
    pub key_delay: String,
    pub row_delay: String,
    pub start_delay: String,
    pub wait_for_ready: bool,
    pub target: TargetSpec,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: String::new(),
            start_row: "2".into(),
            end_row: "2".into(),
            key_delay: "0.25".into(),
            row_delay: "0.25".into(),
            start_delay: "3.0".into(),
            wait_for_ready: true,
            target: TargetSpec::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Validate the form into run parameters.
    pub fn to_run_config(&self) -> Result<RunConfig, ConfigError> {
        let source = self.source.trim();
        if source.is_empty() {
            return Err(ConfigError::MissingSource);
        }
        let config = RunConfig {
            source: PathBuf::from(source),
            start_row: parse_row("start row", &self.start_row)?,
            end_row: parse_row("end row", &self.end_row)?,
            key_delay: parse_delay("key delay", &self.key_delay)?,
            row_delay: parse_delay("row delay", &self.row_delay)?,
            start_delay: parse_delay("start countdown", &self.start_delay)?,
            wait_for_ready: self.wait_for_ready,
            target: self.target.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_row(field: &'static str, raw: &str) -> Result<usize, ConfigError> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber { field, value: raw.to_string() })?;
    usize::try_from(n)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or(ConfigError::RowOutOfRange { field, value: n.max(0) as usize })
}

fn parse_delay(field: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber { field, value: raw.to_string() })?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::BadDelay { field, value: secs });
    }
    Ok(Duration::from_secs_f64(secs))
}
