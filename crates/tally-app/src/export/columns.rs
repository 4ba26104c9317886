//! Column layout shared by the xlsx and TSV exports

use std::collections::BTreeSet;

use tally_types::{ContainerSize, Direction, SummaryRow};

/// Trade directions exported with a laden/empty breakdown, with their prefix
const BREAKDOWN: [(Direction, &str); 3] = [
    (Direction::Import, "IMP"),
    (Direction::Export, "EXP"),
    (Direction::Transhipment, "TS"),
];

/// Export options
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Append one column per granular raw field
    pub include_recon: bool,
}

/// One exported cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn count(value: u32) -> Self {
        Cell::Number(value as f64)
    }

    /// Plain-text rendering (TSV, terminal)
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Empty => String::new(),
        }
    }
}

/// Integers without a fraction, everything else with up to two decimals
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Sorted union of the recon keys of `rows`
pub fn recon_keys(rows: &[SummaryRow]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.recon.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Summary column names in export order
pub fn summary_headers() -> Vec<String> {
    let mut headers = vec![
        "NO".to_string(),
        "Vessel".to_string(),
        "Service Name".to_string(),
    ];

    for (direction, prefix) in BREAKDOWN {
        for kind in ["LADEN", "EMPTY"] {
            for size in ContainerSize::ALL {
                headers.push(format!("{}_{}_{}", prefix, kind, size));
            }
        }
        headers.push(format!("TOTAL BOX {}", direction.label()));
        headers.push(format!("TEUS {}", direction.label()));
    }

    headers.extend(
        [
            "TOTAL BOX SHIFTING",
            "TEUS SHIFTING",
            "HATCH COVER",
            "Total (Boxes)",
            "Total Teus",
            "Source File",
        ]
        .map(String::from),
    );
    headers
}

/// Header row, optionally followed by the recon columns
pub fn headers(recon: &[String]) -> Vec<String> {
    let mut headers = summary_headers();
    headers.extend(recon.iter().cloned());
    headers
}

/// Cells of one row, aligned with [`headers`]
pub fn row_cells(row: &SummaryRow, recon: &[String]) -> Vec<Cell> {
    let mut cells = vec![
        row.seq.map(|seq| Cell::Number(seq as f64)).unwrap_or(Cell::Empty),
        Cell::Text(row.vessel.clone()),
        Cell::Text(row.service.clone()),
    ];

    for (direction, _) in BREAKDOWN {
        let Some(summary) = row.direction(direction) else {
            continue;
        };
        for counts in [&summary.laden, &summary.empty] {
            for size in ContainerSize::ALL {
                cells.push(Cell::count(counts.get(size)));
            }
        }
        cells.push(Cell::count(summary.boxes));
        cells.push(Cell::Number(summary.teu));
    }

    cells.push(Cell::count(row.shifting.boxes));
    cells.push(Cell::Number(row.shifting.teu));
    cells.push(Cell::count(row.hatch_cover));
    cells.push(Cell::count(row.total_boxes));
    cells.push(Cell::Number(row.total_teu));
    cells.push(
        row.source
            .as_ref()
            .map(|s| Cell::Text(s.clone()))
            .unwrap_or(Cell::Empty),
    );

    for key in recon {
        cells.push(row.recon.get(key).map(|v| Cell::Number(*v)).unwrap_or(Cell::Empty));
    }
    cells
}

/// Recon columns to export under `options`
pub fn recon_columns(rows: &[SummaryRow], options: ExportOptions) -> Vec<String> {
    if options.include_recon {
        recon_keys(rows)
    } else {
        Vec::new()
    }
}
