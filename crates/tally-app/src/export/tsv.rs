//! Tab-delimited text export

use std::io::Write;
use std::path::Path;

use tally_types::{Error, Result, SummaryRow};

use super::columns::{headers, recon_columns, row_cells, ExportOptions};

/// Write the table as tab-separated text
pub fn write_tsv<W: Write>(rows: &[SummaryRow], options: ExportOptions, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    let recon = recon_columns(rows, options);
    wtr.write_record(headers(&recon))
        .map_err(|e| Error::Export(e.to_string()))?;

    for row in rows {
        let record: Vec<String> = row_cells(row, &recon).iter().map(|c| c.render()).collect();
        wtr.write_record(&record)
            .map_err(|e| Error::Export(e.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_to_tsv_string(rows: &[SummaryRow], options: ExportOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_tsv(rows, options, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::Export(e.to_string()))
}

pub fn export_to_tsv(rows: &[SummaryRow], options: ExportOptions, output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_tsv(rows, options, file)
}
