//! Vision module - image normalization and AI-powered table extraction
//!
//! This module provides:
//! - Image normalization (RGB coercion, JPEG re-encoding)
//! - Candidate model discovery and ranking
//! - The extraction client that walks the candidates until one answers
//! - Parsing of the model's JSON answer into a raw extraction

pub mod ai;
pub mod client;
pub mod normalizer;

pub use ai::{BackendError, GenerationRequest, ModelBackend, ModelInfo};
pub use client::{AttemptFailure, ClientOptions, Extraction, ExtractionClient, ExtractionError, FailureReason};
pub use normalizer::{normalize_image, NormalizedImage, DEFAULT_JPEG_QUALITY};

use serde_json::Value;
use tally_domain::RawExtraction;

/// Parse the model's answer into a raw extraction.
///
/// The answer must hold a JSON object sharing at least one key with the
/// field vocabulary; anything else means the instruction was not followed.
pub fn parse_extraction(response: &str) -> std::result::Result<RawExtraction, String> {
    let json_str = extract_json_from_response(response);

    let value: Value = serde_json::from_str(&json_str).map_err(|e| {
        let truncated: String = response.chars().take(200).collect();
        format!("response is not JSON ({}): {}", e, truncated)
    })?;

    let raw = RawExtraction::from_value(value)
        .ok_or_else(|| "response JSON is not an object".to_string())?;

    if raw.known_key_count() == 0 {
        return Err(format!(
            "response object has none of the expected keys ({} keys)",
            raw.len()
        ));
    }

    Ok(raw)
}

/// Extract JSON from response (handles markdown code blocks)
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    // Check for markdown code block
    if response.starts_with("```") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').map(|i| i + 1).unwrap_or(3);
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    // Try to find JSON object directly
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if start < end {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}
