//! Ordered table of summary rows for one session

use serde::{Deserialize, Serialize};
use tally_types::{Error, Result, SummaryRow};

use crate::service::aggregator::sum_rows;

/// Rows in display order plus the sequence counter.
///
/// Sequence numbers start at 1, are assigned on insertion and are never
/// reused or renumbered while the table lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTable {
    rows: Vec<SummaryRow>,
    next_seq: u64,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_seq: 1,
        }
    }

    /// Rebuild a table from previously exported rows.
    ///
    /// Rows without a sequence number get fresh ones; the counter continues
    /// after the largest number seen.
    pub fn from_rows(rows: Vec<SummaryRow>) -> Self {
        let mut table = Self::new();
        table.next_seq = rows.iter().filter_map(|r| r.seq).max().unwrap_or(0) + 1;
        for mut row in rows {
            if row.seq.is_none() {
                row.seq = Some(table.take_seq());
            }
            table.rows.push(row);
        }
        table
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Append a row, returning its sequence number
    pub fn push(&mut self, mut row: SummaryRow) -> u64 {
        let seq = self.take_seq();
        row.seq = Some(seq);
        self.rows.push(row);
        seq
    }

    /// Insert a row at a display position (clamped to the end)
    pub fn insert(&mut self, index: usize, mut row: SummaryRow) -> u64 {
        let seq = self.take_seq();
        row.seq = Some(seq);
        let index = index.min(self.rows.len());
        self.rows.insert(index, row);
        seq
    }

    pub fn get(&self, seq: u64) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.seq == Some(seq))
    }

    pub fn get_mut(&mut self, seq: u64) -> Option<&mut SummaryRow> {
        self.rows.iter_mut().find(|r| r.seq == Some(seq))
    }

    /// Apply an interactive correction to a row. Totals are left as edited.
    pub fn update<F>(&mut self, seq: u64, edit: F) -> Result<()>
    where
        F: FnOnce(&mut SummaryRow),
    {
        let row = self.get_mut(seq).ok_or(Error::UnknownRow(seq))?;
        edit(&mut *row);
        // the sequence number is immutable once assigned
        row.seq = Some(seq);
        Ok(())
    }

    pub fn remove(&mut self, seq: u64) -> Result<SummaryRow> {
        let index = self
            .rows
            .iter()
            .position(|r| r.seq == Some(seq))
            .ok_or(Error::UnknownRow(seq))?;
        Ok(self.rows.remove(index))
    }

    /// Drop every row and start numbering from 1 again
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<SummaryRow> {
        self.rows
    }

    /// Sum the rows with the given sequence numbers into one combined row.
    ///
    /// Source rows stay in the table. Duplicates in `selection` count once.
    pub fn combine(&self, selection: &[u64]) -> Result<SummaryRow> {
        if selection.is_empty() {
            return Err(Error::EmptySelection);
        }
        let mut wanted: Vec<u64> = selection.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let mut selected = Vec::with_capacity(wanted.len());
        for seq in wanted {
            selected.push(self.get(seq).ok_or(Error::UnknownRow(seq))?);
        }
        Ok(sum_rows(selected))
    }

    /// Combined row over the whole table
    pub fn combine_all(&self) -> SummaryRow {
        sum_rows(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(boxes: u32) -> SummaryRow {
        let mut row = SummaryRow::default();
        row.export.laden.forty = boxes;
        row.recompute_totals();
        row
    }

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let mut table = SessionTable::new();
        assert_eq!(table.push(row(1)), 1);
        assert_eq!(table.push(row(2)), 2);
        table.remove(2).unwrap();
        assert_eq!(table.push(row(3)), 3);
        assert_eq!(table.insert(0, row(4)), 4);

        let seqs: Vec<_> = table.iter().map(|r| r.seq.unwrap()).collect();
        assert_eq!(seqs, vec![4, 1, 3]);
    }

    #[test]
    fn test_update_does_not_recompute() {
        let mut table = SessionTable::new();
        let seq = table.push(row(2));
        table
            .update(seq, |r| {
                r.export.laden.forty = 10;
                r.seq = Some(99);
            })
            .unwrap();

        let edited = table.get(seq).unwrap();
        assert_eq!(edited.export.laden.forty, 10);
        assert_eq!(edited.total_boxes, 2);
        assert_eq!(edited.seq, Some(seq));
    }

    #[test]
    fn test_unknown_rows() {
        let mut table = SessionTable::new();
        table.push(row(1));
        assert!(matches!(table.remove(7), Err(Error::UnknownRow(7))));
        assert!(matches!(table.combine(&[1, 7]), Err(Error::UnknownRow(7))));
        assert!(matches!(table.combine(&[]), Err(Error::EmptySelection)));
    }

    #[test]
    fn test_combine_is_non_destructive() {
        let mut table = SessionTable::new();
        table.push(row(1));
        table.push(row(2));
        table.push(row(4));

        let combined = table.combine(&[1, 3, 3]).unwrap();
        assert_eq!(combined.export.laden.forty, 5);
        assert_eq!(combined.service, "2 vessels");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut table = SessionTable::new();
        table.push(row(1));
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.push(row(1)), 1);
    }

    #[test]
    fn test_from_rows_continues_counter() {
        let mut first = row(1);
        first.seq = Some(5);
        let table_rows = vec![first, row(2)];
        let mut table = SessionTable::from_rows(table_rows);
        let seqs: Vec<_> = table.iter().map(|r| r.seq.unwrap()).collect();
        assert_eq!(seqs, vec![5, 6]);
        assert_eq!(table.push(row(3)), 7);
    }
}
