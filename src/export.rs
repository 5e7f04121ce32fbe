use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::config::Settings;
use crate::session::SessionResult;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to serialize export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to write csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Everything the player can take with them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub history: Vec<SessionResult>,
    pub settings: Settings,
    /// ISO-8601
    pub export_date: String,
}

impl ExportDocument {
    pub fn new(history: Vec<SessionResult>, settings: Settings, exported_at: DateTime<Utc>) -> Self {
        Self {
            history,
            settings,
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Suggested file name, e.g. `color-match-export-2024-05-01.json`
pub fn export_file_name(exported_at: DateTime<Utc>) -> String {
    format!("color-match-export-{}.json", exported_at.format("%Y-%m-%d"))
}

/// Column names of the csv export, same as the persisted field names
pub const CSV_HEADER: [&str; 8] = [
    "id",
    "score",
    "totalQuestions",
    "percentage",
    "date",
    "time",
    "mode",
    "durationSeconds",
];

/// One row per session. The header is written even for an empty history.
pub fn write_history_csv<W: Write>(writer: W, history: &[SessionResult]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for result in history {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}
