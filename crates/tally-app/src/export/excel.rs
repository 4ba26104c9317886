//! Excel export functionality

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use tally_types::{Error, Result, SummaryRow};

use super::columns::{headers, recon_columns, row_cells, Cell, ExportOptions};

const SHEET_NAME: &str = "Rekapitulasi";

/// Export rows to an .xlsx file
pub fn export_to_excel(rows: &[SummaryRow], options: ExportOptions, output_path: &Path) -> Result<()> {
    let mut workbook = build_workbook(rows, options)?;
    workbook
        .save(output_path)
        .map_err(|e| Error::Excel(e.to_string()))?;
    Ok(())
}

/// Export rows to in-memory .xlsx bytes
pub fn export_to_xlsx_buffer(rows: &[SummaryRow], options: ExportOptions) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(rows, options)?;
    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(e.to_string()))
}

fn build_workbook(rows: &[SummaryRow], options: ExportOptions) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_summary_sheet(sheet, rows, options)?;
    Ok(workbook)
}

fn write_summary_sheet(sheet: &mut Worksheet, rows: &[SummaryRow], options: ExportOptions) -> Result<()> {
    sheet
        .set_name(SHEET_NAME)
        .map_err(|e| Error::Excel(e.to_string()))?;

    let header_format = Format::new().set_bold();
    let recon = recon_columns(rows, options);
    let headers = headers(&recon);

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| Error::Excel(e.to_string()))?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col, cell) in row_cells(row, &recon).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => sheet.write_string(excel_row, col, text),
                Cell::Number(n) => sheet.write_number(excel_row, col, n),
                Cell::Empty => continue,
            }
            .map_err(|e| Error::Excel(e.to_string()))?;
        }
    }

    sheet
        .set_freeze_panes(1, 0)
        .map_err(|e| Error::Excel(e.to_string()))?;

    // Approximate widths: identity columns wide, counts narrow
    sheet
        .set_column_width(0, 6)
        .map_err(|e| Error::Excel(e.to_string()))?;
    sheet
        .set_column_width(1, 28)
        .map_err(|e| Error::Excel(e.to_string()))?;
    sheet
        .set_column_width(2, 18)
        .map_err(|e| Error::Excel(e.to_string()))?;
    for (col, header) in headers.iter().enumerate().skip(3) {
        let width = if header == "Source File" { 30 } else { 14 };
        sheet
            .set_column_width(col as u16, width)
            .map_err(|e| Error::Excel(e.to_string()))?;
    }

    Ok(())
}
