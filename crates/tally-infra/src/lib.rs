//! Infrastructure layer - hosted model backends

pub mod gemini;

pub use gemini::{GeminiBackend, GeminiOptions, DEFAULT_API_BASE};
