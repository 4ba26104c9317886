//! Application service layer - config, scanning, session, batch, export

pub mod app;
pub mod config;
pub mod export;
pub mod results;
pub mod scanner;

pub use app::{BatchOptions, BatchReport, BatchService, ImageInput, ImageOutcome, ImageReport, Session, SourceImage};
pub use config::Config;
