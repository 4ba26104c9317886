//! Extraction instruction sent alongside each report image
//!
//! The model only transcribes cells; all summing and TEU conversion happens
//! on our side in the reconciler.

use tally_domain::model::vocabulary::field_vocabulary;

const ROLE: &str = "You are a port data-entry clerk. The image is a cropped \
Vessel Operation Report table from a container terminal.";

const LAYOUT_GUIDE: &str = "\
Table layout:
- Column groups are DISCHARGE (import, prefix `imp`), LOADING (export, prefix `exp`), \
TRANSHIPMENT (prefix `ts`, only when the table has its own T/S column) and \
SHIFTING / RESTOW (prefix `shift`).
- Each group is split by container size 20, 40 and 45.
- Rows are FULL, REEFER, OOG, DG and EMPTY.
- T/S sub-rows printed inside DISCHARGE or LOADING (T/S FULL, T/S REEFER, T/S OOG, \
T/S DG, T/S EMPTY) go under that group with a `ts_` subtype, e.g. `imp_20_ts_full`.
- `hatch_cover` is the number of hatch covers moved (a small number, not a box total).
- `total_shift_box` and `total_shift_teus` are the shifting totals if printed.";

const OUTPUT_RULES: &str = "\
Output rules:
- Respond with ONE raw JSON object only. No markdown, no comments.
- Use exactly the keys listed below. Values are integers except `total_shift_teus` \
(a number) and `vessel_name` / `service_name` (text).
- Copy the numbers you can read. Do not add rows together.
- If a cell is blank, a dash or unreadable, use 0.";

/// Build the full instruction with the requested key vocabulary
pub fn build_extraction_prompt() -> String {
    build_extraction_prompt_for(&field_vocabulary())
}

/// Build the instruction for an explicit key list
pub fn build_extraction_prompt_for(keys: &[String]) -> String {
    let template = keys
        .iter()
        .map(|key| format!("  \"{}\": {}", key, placeholder(key)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{}\n\n{}\n\n{}\n\nKeys:\n{{\n{}\n}}\n",
        ROLE, LAYOUT_GUIDE, OUTPUT_RULES, template
    )
}

fn placeholder(key: &str) -> &'static str {
    match key {
        "vessel_name" | "service_name" => "\"<text>\"",
        "total_shift_teus" => "<number>",
        _ => "<integer>",
    }
}
