//! Use cases: the session object and the batch pipeline

pub mod batch_service;
pub mod session;

pub use batch_service::{BatchOptions, BatchReport, BatchService, ImageInput, ImageOutcome, ImageReport};
pub use session::{Session, SourceImage};
