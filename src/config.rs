use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::{MentcareError, Result};

/// Output format for monthly reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

/// Runtime settings for a registry process.
///
/// Loaded from JSON; every field is optional and falls back to [`Settings::default`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// A `tracing_subscriber::EnvFilter` directive, e.g. `info` or `mentcare_events=debug`.
    pub log_filter: String,
    pub alert_recipient: String,
    pub report_dir: PathBuf,
    pub report_format: ReportFormat,
    /// CSV file holding patients; patients are kept in memory only when unset.
    pub data_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            alert_recipient: "alerts@hospital.local".to_string(),
            report_dir: PathBuf::from("out"),
            report_format: ReportFormat::Json,
            data_file: None,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| MentcareError::Config(err.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            MentcareError::Config(format!("failed to read `{}`: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}
