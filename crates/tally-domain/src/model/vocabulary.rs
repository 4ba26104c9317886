//! Field vocabulary of the raw extraction
//!
//! Keys are `{direction}_{size}_{subtype}`, e.g. `imp_20_full`, `exp_40_ts_empty`,
//! `shift_45_reefer`. Transhipment sub-rows nested under import/export carry a
//! `ts_` subtype prefix.

use tally_types::{ContainerSize, Direction};

/// Subtypes counted as laden boxes
pub const LADEN_SUBTYPES: [&str; 4] = ["full", "reefer", "oog", "dg"];

pub const EMPTY_SUBTYPE: &str = "empty";

/// Transhipment sub-rows found under the import and export groups
pub const NESTED_TS_LADEN_SUBTYPES: [&str; 4] = ["ts_full", "ts_reefer", "ts_oog", "ts_dg"];

pub const NESTED_TS_EMPTY_SUBTYPE: &str = "ts_empty";

pub const HATCH_COVER_KEY: &str = "hatch_cover";
pub const TOTAL_SHIFT_BOX_KEY: &str = "total_shift_box";
pub const TOTAL_SHIFT_TEUS_KEY: &str = "total_shift_teus";

pub const VESSEL_NAME_KEY: &str = "vessel_name";
pub const SERVICE_NAME_KEY: &str = "service_name";

/// Build a matrix field key
pub fn field_key(direction: Direction, size: ContainerSize, subtype: &str) -> String {
    format!("{}_{}_{}", direction.key_prefix(), size.feet(), subtype)
}

/// Subtypes valid for a direction's matrix cells
pub fn subtypes_for(direction: Direction) -> Vec<&'static str> {
    let mut subtypes: Vec<&'static str> = LADEN_SUBTYPES.to_vec();
    subtypes.push(EMPTY_SUBTYPE);
    if matches!(direction, Direction::Import | Direction::Export) {
        subtypes.extend(NESTED_TS_LADEN_SUBTYPES);
        subtypes.push(NESTED_TS_EMPTY_SUBTYPE);
    }
    subtypes
}

/// Every numeric key the extraction may report
pub fn numeric_keys() -> Vec<String> {
    let mut keys = Vec::new();
    for direction in Direction::ALL {
        for size in ContainerSize::ALL {
            for subtype in subtypes_for(direction) {
                keys.push(field_key(direction, size, subtype));
            }
        }
    }
    keys.push(TOTAL_SHIFT_BOX_KEY.to_string());
    keys.push(TOTAL_SHIFT_TEUS_KEY.to_string());
    keys.push(HATCH_COVER_KEY.to_string());
    keys
}

/// Full vocabulary requested from the model, identity keys first
pub fn field_vocabulary() -> Vec<String> {
    let mut keys = vec![VESSEL_NAME_KEY.to_string(), SERVICE_NAME_KEY.to_string()];
    keys.extend(numeric_keys());
    keys
}

pub fn is_identity_key(key: &str) -> bool {
    key == VESSEL_NAME_KEY || key == SERVICE_NAME_KEY
}

pub fn is_known_key(key: &str) -> bool {
    is_identity_key(key) || numeric_keys().iter().any(|k| k == key)
}
