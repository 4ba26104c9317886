//! Selection-sum of summary rows ("combine N vessels")

use tally_types::SummaryRow;

/// Vessel label of a synthetic combined row
pub const COMBINED_VESSEL_LABEL: &str = "COMBINED";

/// Sum every numeric column of `rows` into one synthetic row.
///
/// Stored subtotals are summed as they are (not re-derived), so hand-edited
/// rows keep their edits in the combined figure. The result has no sequence
/// number and carries sentinel identity labels. A combined input counts as
/// the vessels it was built from, so regrouped sums keep the same label.
pub fn sum_rows<'a, I>(rows: I) -> SummaryRow
where
    I: IntoIterator<Item = &'a SummaryRow>,
{
    let mut combined = SummaryRow::default();
    let mut count = 0u32;

    for row in rows {
        count = count.saturating_add(row.vessel_count());
        combined.import.accumulate(&row.import);
        combined.export.accumulate(&row.export);
        combined.transhipment.accumulate(&row.transhipment);
        combined.shifting.boxes = combined.shifting.boxes.saturating_add(row.shifting.boxes);
        combined.shifting.teu += row.shifting.teu;
        combined.hatch_cover = combined.hatch_cover.saturating_add(row.hatch_cover);
        combined.total_boxes = combined.total_boxes.saturating_add(row.total_boxes);
        combined.total_teu += row.total_teu;
        for (key, value) in &row.recon {
            *combined.recon.entry(key.clone()).or_insert(0.0) += value;
        }
    }

    combined.seq = None;
    combined.combined_from = Some(count);
    combined.vessel = COMBINED_VESSEL_LABEL.to_string();
    combined.service = format!("{} vessels", count);
    combined
}
