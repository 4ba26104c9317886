//! Output formatting module

use tally_app::export::{columns::format_number, export_to_tsv_string, ExportOptions};
use tally_types::{OutputFormat, Result, SummaryRow};

const TABLE_HEADERS: [&str; 10] = [
    "NO", "Vessel", "Service", "IMP", "EXP", "T/S", "SHIFT", "HATCH", "Boxes", "TEUs",
];

pub fn output_rows(output_format: OutputFormat, rows: &[SummaryRow], options: ExportOptions) -> Result<()> {
    match output_format {
        OutputFormat::Json => {
            let content = serde_json::to_string_pretty(rows)?;
            println!("{}", content);
        }
        OutputFormat::Tsv => {
            print!("{}", export_to_tsv_string(rows, options)?);
        }
        OutputFormat::Table => print_table(rows),
    }
    Ok(())
}

/// Boxes/TEU pair as shown in the table
fn pair(boxes: u32, teu: f64) -> String {
    format!("{}/{}", boxes, format_number(teu))
}

fn table_cells(row: &SummaryRow) -> Vec<String> {
    vec![
        row.seq.map(|s| s.to_string()).unwrap_or_default(),
        row.vessel.clone(),
        row.service.clone(),
        pair(row.import.boxes, row.import.teu),
        pair(row.export.boxes, row.export.teu),
        pair(row.transhipment.boxes, row.transhipment.teu),
        pair(row.shifting.boxes, row.shifting.teu),
        row.hatch_cover.to_string(),
        row.total_boxes.to_string(),
        format_number(row.total_teu),
    ]
}

fn print_table(rows: &[SummaryRow]) {
    if rows.is_empty() {
        println!("(no rows)");
        return;
    }

    let body: Vec<Vec<String>> = rows.iter().map(table_cells).collect();
    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!();
    println!("{}", line(TABLE_HEADERS.iter().map(|h| h.to_string()).collect()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for cells in body {
        println!("{}", line(cells));
    }
    println!("  (IMP/EXP/T/S/SHIFT shown as boxes/TEU)");
}
