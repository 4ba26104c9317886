//! One interactive session: the summary table and the source images
//!
//! Both live exactly as long as the session and are cleared together.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use tally_domain::SessionTable;
use tally_types::{Result, SummaryRow};

/// Original upload kept for side-by-side review
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Session {
    table: SessionTable,
    images: BTreeMap<u64, SourceImage>,
    started_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            table: SessionTable::new(),
            images: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Resume from exported rows (no images)
    pub fn from_rows(rows: Vec<SummaryRow>) -> Self {
        Self {
            table: SessionTable::from_rows(rows),
            ..Self::new()
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    pub fn rows(&self) -> &[SummaryRow] {
        self.table.rows()
    }

    /// Append a row and keep its source image under the same number
    pub fn add_row(&mut self, row: SummaryRow, image: Option<SourceImage>) -> u64 {
        let seq = self.table.push(row);
        if let Some(image) = image {
            self.images.insert(seq, image);
        }
        seq
    }

    /// Insert a hand-made row at a display position
    pub fn insert_row(&mut self, index: usize, row: SummaryRow) -> u64 {
        self.table.insert(index, row)
    }

    pub fn edit_row<F>(&mut self, seq: u64, edit: F) -> Result<()>
    where
        F: FnOnce(&mut SummaryRow),
    {
        self.table.update(seq, edit)
    }

    /// Delete a row together with its source image
    pub fn remove_row(&mut self, seq: u64) -> Result<SummaryRow> {
        let row = self.table.remove(seq)?;
        self.images.remove(&seq);
        Ok(row)
    }

    pub fn combine(&self, selection: &[u64]) -> Result<SummaryRow> {
        self.table.combine(selection)
    }

    pub fn source_image(&self, seq: u64) -> Option<&SourceImage> {
        self.images.get(&seq)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Reset the table and the image cache
    pub fn clear(&mut self) {
        self.table.clear();
        self.images.clear();
        self.started_at = Utc::now();
    }
}
