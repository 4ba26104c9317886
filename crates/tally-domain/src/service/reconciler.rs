//! Reconciliation of raw matrix cells into the summary schema
//!
//! Per size and direction:
//! - laden = full + reefer + oog + dg
//! - empty = the `empty` cell
//! - TEU = boxes x {20: 1.0, 40: 2.0, 45: 2.25}
//!
//! Transhipment comes from the standalone `ts_*` cells when the report has
//! them, otherwise from the `ts_*` sub-rows nested under import and export.

use tally_types::{ContainerSize, Direction, DirectionSummary, ShiftingSummary, SizeCounts, SummaryRow};

use crate::model::vocabulary::{
    field_key, EMPTY_SUBTYPE, HATCH_COVER_KEY, LADEN_SUBTYPES, NESTED_TS_EMPTY_SUBTYPE,
    NESTED_TS_LADEN_SUBTYPES, SERVICE_NAME_KEY, TOTAL_SHIFT_BOX_KEY, TOTAL_SHIFT_TEUS_KEY,
    VESSEL_NAME_KEY,
};
use crate::model::RawExtraction;

/// Largest plausible hatch-cover count; anything above is a misread total
pub const HATCH_COVER_MAX: u32 = 200;

const UNKNOWN_LABEL: &str = "-";

/// Identity fields supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct RowIdentity {
    pub vessel: Option<String>,
    pub service: Option<String>,
    pub source: Option<String>,
}

impl RowIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vessel(mut self, vessel: impl Into<String>) -> Self {
        self.vessel = Some(vessel.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Reconcile with identity taken from the extraction itself
pub fn reconcile(raw: &RawExtraction) -> SummaryRow {
    reconcile_with_identity(raw, &RowIdentity::default())
}

/// Reconcile a raw extraction into a summary row (without a sequence number).
///
/// Never fails: unreadable or missing cells count as zero.
pub fn reconcile_with_identity(raw: &RawExtraction, identity: &RowIdentity) -> SummaryRow {
    let import = direction_summary(raw, Direction::Import);
    let export = direction_summary(raw, Direction::Export);
    let transhipment = transhipment_summary(raw);
    let shifting = shifting_summary(raw);

    let mut row = SummaryRow {
        seq: None,
        vessel: pick_label(identity.vessel.as_deref(), raw.text(VESSEL_NAME_KEY)),
        service: pick_label(identity.service.as_deref(), raw.text(SERVICE_NAME_KEY)),
        source: identity.source.clone(),
        combined_from: None,
        import,
        export,
        transhipment,
        shifting,
        hatch_cover: clamp_hatch_cover(raw.count(HATCH_COVER_KEY)),
        total_boxes: 0,
        total_teu: 0.0,
        recon: raw.numeric_fields(),
    };
    row.total_boxes = row.subtotal_boxes();
    row.total_teu = row.subtotal_teu();
    row
}

/// Values above [`HATCH_COVER_MAX`] are treated as misreads and dropped to 0
pub fn clamp_hatch_cover(value: u32) -> u32 {
    if value > HATCH_COVER_MAX {
        0
    } else {
        value
    }
}

fn pick_label(supplied: Option<&str>, extracted: Option<&str>) -> String {
    supplied
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(extracted)
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}

/// Laden/empty counts for `direction` using the given subtype sets
fn counts_for(
    raw: &RawExtraction,
    direction: Direction,
    laden_subtypes: &[&str],
    empty_subtype: &str,
) -> (SizeCounts, SizeCounts) {
    let mut laden = SizeCounts::default();
    let mut empty = SizeCounts::default();
    for size in ContainerSize::ALL {
        let laden_keys: Vec<String> = laden_subtypes
            .iter()
            .map(|subtype| field_key(direction, size, subtype))
            .collect();
        *laden.get_mut(size) = raw.count_sum(&laden_keys);
        *empty.get_mut(size) = raw.count(&field_key(direction, size, empty_subtype));
    }
    (laden, empty)
}

fn direction_summary(raw: &RawExtraction, direction: Direction) -> DirectionSummary {
    let (laden, empty) = counts_for(raw, direction, &LADEN_SUBTYPES, EMPTY_SUBTYPE);
    DirectionSummary::from_counts(laden, empty)
}

fn transhipment_summary(raw: &RawExtraction) -> DirectionSummary {
    let (laden, empty) = counts_for(raw, Direction::Transhipment, &LADEN_SUBTYPES, EMPTY_SUBTYPE);
    if laden.total() > 0 || empty.total() > 0 {
        return DirectionSummary::from_counts(laden, empty);
    }

    let mut laden = SizeCounts::default();
    let mut empty = SizeCounts::default();
    for direction in [Direction::Import, Direction::Export] {
        let (nested_laden, nested_empty) =
            counts_for(raw, direction, &NESTED_TS_LADEN_SUBTYPES, NESTED_TS_EMPTY_SUBTYPE);
        laden += nested_laden;
        empty += nested_empty;
    }
    DirectionSummary::from_counts(laden, empty)
}

fn shifting_summary(raw: &RawExtraction) -> ShiftingSummary {
    let (laden, empty) = counts_for(raw, Direction::Shifting, &LADEN_SUBTYPES, EMPTY_SUBTYPE);
    let per_size = DirectionSummary::from_counts(laden, empty);

    let reported_boxes = raw.count(TOTAL_SHIFT_BOX_KEY);
    let reported_teu = raw.number(TOTAL_SHIFT_TEUS_KEY);

    ShiftingSummary {
        boxes: if reported_boxes > 0 { reported_boxes } else { per_size.boxes },
        teu: if reported_teu > 0.0 { reported_teu } else { per_size.teu },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, serde_json::Value)]) -> RawExtraction {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_import_laden_and_empty() {
        let row = reconcile(&raw(&[
            ("imp_20_full", json!(3)),
            ("imp_20_reefer", json!(1)),
            ("imp_20_empty", json!(2)),
        ]));
        assert_eq!(row.import.laden.twenty, 4);
        assert_eq!(row.import.empty.twenty, 2);
        assert_eq!(row.import.teu, 6.0);
        assert_eq!(row.total_boxes, 6);
        assert_eq!(row.total_teu, 6.0);
    }

    #[test]
    fn test_export_dg_merged_into_laden() {
        let row = reconcile(&raw(&[
            ("exp_40_full", json!(2)),
            ("exp_40_dg", json!(1)),
            ("exp_40_empty", json!(0)),
        ]));
        assert_eq!(row.export.laden.forty, 3);
        assert_eq!(row.export.empty.forty, 0);
        assert_eq!(row.export.teu, 6.0);
    }

    #[test]
    fn test_oog_counts_as_laden() {
        let row = reconcile(&raw(&[("imp_45_oog", json!(2)), ("imp_45_full", json!(2))]));
        assert_eq!(row.import.laden.forty_five, 4);
        assert_eq!(row.import.teu, 9.0);
    }

    #[test]
    fn test_transhipment_reconstructed_from_nested_rows() {
        let row = reconcile(&raw(&[
            ("imp_20_ts_full", json!(2)),
            ("exp_20_ts_full", json!(1)),
            ("exp_20_ts_dg", json!(1)),
            ("imp_40_ts_empty", json!(3)),
        ]));
        assert_eq!(row.transhipment.laden.twenty, 4);
        assert_eq!(row.transhipment.empty.forty, 3);
        assert_eq!(row.transhipment.boxes, 7);
        assert_eq!(row.transhipment.teu, 4.0 + 6.0);
        // nested rows never leak into the import/export laden counts
        assert_eq!(row.import.boxes, 0);
        assert_eq!(row.export.boxes, 0);
    }

    #[test]
    fn test_standalone_transhipment_wins_over_nested() {
        let row = reconcile(&raw(&[
            ("ts_40_full", json!(5)),
            ("imp_40_ts_full", json!(9)),
        ]));
        assert_eq!(row.transhipment.laden.forty, 5);
        assert_eq!(row.transhipment.teu, 10.0);
    }

    #[test]
    fn test_shifting_prefers_reported_aggregate() {
        let row = reconcile(&raw(&[
            ("total_shift_box", json!(12)),
            ("total_shift_teus", json!(18.5)),
            ("shift_20_full", json!(1)),
        ]));
        assert_eq!(row.shifting.boxes, 12);
        assert_eq!(row.shifting.teu, 18.5);
    }

    #[test]
    fn test_shifting_falls_back_to_cells() {
        let row = reconcile(&raw(&[
            ("total_shift_box", json!(0)),
            ("shift_20_full", json!(2)),
            ("shift_40_empty", json!(1)),
            ("shift_45_reefer", json!(1)),
        ]));
        assert_eq!(row.shifting.boxes, 4);
        assert_eq!(row.shifting.teu, 2.0 + 2.0 + 2.25);
        assert_eq!(row.total_boxes, 4);
    }

    #[test]
    fn test_hatch_cover_clamp() {
        assert_eq!(clamp_hatch_cover(201), 0);
        assert_eq!(clamp_hatch_cover(200), 200);
        assert_eq!(clamp_hatch_cover(0), 0);

        let row = reconcile(&raw(&[("hatch_cover", json!(1450))]));
        assert_eq!(row.hatch_cover, 0);
        assert_eq!(row.recon["hatch_cover"], 1450.0);
    }

    #[test]
    fn test_hatch_cover_not_in_box_totals() {
        let row = reconcile(&raw(&[("hatch_cover", json!(14))]));
        assert_eq!(row.hatch_cover, 14);
        assert_eq!(row.total_boxes, 0);
    }

    #[test]
    fn test_identity_precedence() {
        let extracted = raw(&[("vessel_name", json!("KM LEUSER")), ("service_name", json!("JKT-SBY"))]);

        let row = reconcile(&extracted);
        assert_eq!(row.vessel, "KM LEUSER");
        assert_eq!(row.service, "JKT-SBY");

        let identity = RowIdentity::new().with_vessel("MV OVERRIDE").with_source("a.png");
        let row = reconcile_with_identity(&extracted, &identity);
        assert_eq!(row.vessel, "MV OVERRIDE");
        assert_eq!(row.service, "JKT-SBY");
        assert_eq!(row.source.as_deref(), Some("a.png"));

        let row = reconcile(&RawExtraction::new());
        assert_eq!(row.vessel, "-");
        assert_eq!(row.service, "-");
    }

    #[test]
    fn test_huge_misread_cells_saturate() {
        let row = reconcile(&raw(&[
            ("imp_20_full", json!("3000000000")),
            ("exp_20_full", json!("3000000000")),
        ]));
        assert_eq!(row.import.boxes, 3_000_000_000);
        assert_eq!(row.export.boxes, 3_000_000_000);
        assert_eq!(row.total_boxes, u32::MAX);
        assert_eq!(row.total_teu, 6e9);

        let row = reconcile(&raw(&[("imp_20_full", json!(4294967295u64)), ("imp_20_reefer", json!(1))]));
        assert_eq!(row.import.laden.twenty, u32::MAX);
        assert_eq!(row.total_boxes, u32::MAX);
    }
}
