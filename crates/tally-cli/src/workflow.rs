//! Steps of the commands that touch files and configuration

use std::path::{Path, PathBuf};
use tracing::debug;

use tally_app::export::{export_to_excel, export_to_tsv, ExportOptions};
use tally_app::results::ResultsFile;
use tally_app::{BatchReport, Config, Session};
use tally_types::{Result, SummaryRow};

use crate::cli::Cli;

/// Apply the global flags that override the loaded config
pub fn apply_overrides(cli: &Cli, config: &mut Config) {
    let models: Vec<String> = cli
        .model
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if !models.is_empty() {
        config.models = models;
    }
}

/// `--api-key`, then the environment value, then the config file
pub fn api_key(cli: &Cli, config: &Config, from_env: Option<String>) -> Result<String> {
    config.resolve_api_key_with(cli.api_key.as_deref(), from_env)
}

/// Rows shown by `combine`: the selected rows in table order followed by
/// their sum. An empty selection takes every row.
pub fn combine_selection(session: &Session, select: &[u64]) -> Result<Vec<SummaryRow>> {
    let (mut rows, combined) = if select.is_empty() {
        (session.rows().to_vec(), session.table().combine_all())
    } else {
        let combined = session.combine(select)?;
        let rows: Vec<SummaryRow> = session
            .rows()
            .iter()
            .filter(|row| row.seq.is_some_and(|seq| select.contains(&seq)))
            .cloned()
            .collect();
        (rows, combined)
    };
    debug!(rows = rows.len(), "combined selection");
    rows.push(combined);
    Ok(rows)
}

/// Workbook path used by `export` without `-o`: next to the results file
pub fn default_export_path(results_path: &Path) -> PathBuf {
    let stem = results_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    results_path.with_file_name(format!("{}.xlsx", stem))
}

/// Files requested by `process`
#[derive(Debug, Clone, Default)]
pub struct ProcessOutputs {
    pub xlsx: Option<PathBuf>,
    pub tsv: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// What `finish_batch` produced
#[derive(Debug)]
pub struct FinishedBatch {
    /// Files written, in the order xlsx, tsv, json
    pub written: Vec<PathBuf>,
    /// Sum of the requested rows; `None` when none were requested
    pub combined: Option<Result<SummaryRow>>,
}

/// Write the session outputs, then sum the requested rows.
///
/// Files are written before the selection is checked; a bad row number in
/// `combine` comes back in `combined` and leaves them in place.
pub fn finish_batch(
    session: &Session,
    report: &BatchReport,
    outputs: &ProcessOutputs,
    combine: &[u64],
    options: ExportOptions,
) -> Result<FinishedBatch> {
    let mut written = Vec::new();

    if let Some(path) = &outputs.xlsx {
        export_to_excel(session.rows(), options, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &outputs.tsv {
        export_to_tsv(session.rows(), options, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &outputs.json {
        ResultsFile::from_session(session, report).save(path)?;
        written.push(path.clone());
    }

    let combined = (!combine.is_empty()).then(|| session.combine(combine));
    Ok(FinishedBatch { written, combined })
}
