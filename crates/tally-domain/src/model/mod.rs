//! Domain model types

pub mod raw_extraction;
pub mod session_table;
pub mod vocabulary;

pub use raw_extraction::RawExtraction;
pub use session_table::SessionTable;
