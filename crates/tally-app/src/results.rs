//! Results file written by `process` and read back by `combine`/`export`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tally_types::{Result, SummaryRow};

use crate::app::{BatchReport, ImageOutcome, Session};

/// Image that produced no row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedImage {
    pub name: String,
    pub reason: String,
}

/// Serialized session rows with batch metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub rows: Vec<SummaryRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedImage>,
}

impl ResultsFile {
    pub fn from_session(session: &Session, report: &BatchReport) -> Self {
        let failures = report
            .images
            .iter()
            .filter_map(|image| match &image.outcome {
                ImageOutcome::Skipped { reason } => Some(FailedImage {
                    name: image.name.clone(),
                    reason: reason.clone(),
                }),
                ImageOutcome::Added { .. } => None,
            })
            .collect();

        Self {
            started_at: report.started_at,
            completed_at: report.completed_at,
            rows: session.rows().to_vec(),
            failures,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Rebuild a session (without images) from the saved rows
    pub fn into_session(self) -> Session {
        Session::from_rows(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ImageReport;

    #[test]
    fn test_save_and_load_keeps_rows_and_failures() {
        let mut session = Session::new();
        let seq = session.add_row(
            SummaryRow {
                vessel: "KM TEST".into(),
                total_boxes: 12,
                ..Default::default()
            },
            None,
        );
        let now = Utc::now();
        let report = BatchReport {
            started_at: now,
            completed_at: now,
            images: vec![
                ImageReport {
                    name: "a.jpg".into(),
                    outcome: ImageOutcome::Added {
                        seq,
                        model: "gemini-1.5-flash".into(),
                    },
                },
                ImageReport::skipped("b.jpg", "invalid image"),
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let results = ResultsFile::from_session(&session, &report);
        results.save(&path).unwrap();

        let loaded = ResultsFile::load(&path).unwrap();
        assert_eq!(loaded, results);
        assert_eq!(loaded.failures[0].name, "b.jpg");

        let mut resumed = loaded.into_session();
        assert_eq!(resumed.rows()[0].seq, Some(seq));
        assert_eq!(resumed.add_row(SummaryRow::default(), None), seq + 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ResultsFile::load(&dir.path().join("none.json")).is_err());
    }
}
