//! Domain layer - raw extraction model, reconciliation and session table

pub mod model;
pub mod service;

pub use model::{RawExtraction, SessionTable};
pub use service::{reconcile, reconcile_with_identity, sum_rows, RowIdentity};
