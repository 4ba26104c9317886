//! Domain services

pub mod aggregator;
pub mod reconciler;

pub use aggregator::{sum_rows, COMBINED_VESSEL_LABEL};
pub use reconciler::{clamp_hatch_cover, reconcile, reconcile_with_identity, RowIdentity, HATCH_COVER_MAX};
