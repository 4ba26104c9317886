//! Table exports: xlsx workbook and tab-separated text

pub mod columns;
pub mod excel;
pub mod tsv;

pub use columns::{headers, recon_keys, row_cells, summary_headers, Cell, ExportOptions};
pub use excel::{export_to_excel, export_to_xlsx_buffer};
pub use tsv::{export_to_tsv, export_to_tsv_string, write_tsv};
