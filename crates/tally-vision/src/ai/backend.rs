//! Seam between the extraction client and a hosted model provider

use thiserror::Error;

use crate::normalizer::NormalizedImage;

/// A model identifier as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    /// Whether the model accepts content generation requests
    pub supports_generation: bool,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            supports_generation: true,
        }
    }
}

/// One inference request: instruction plus inline image, JSON-only answer
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub image: &'a NormalizedImage,
}

/// Provider failure, classified by what the caller should do next
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl BackendError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => BackendError::RateLimited(message),
            500..=599 => BackendError::Server { status, message },
            _ => BackendError::Rejected { status, message },
        }
    }

    /// Whether the next candidate model may succeed where this one failed
    pub fn is_retriable(&self) -> bool {
        !matches!(self, BackendError::Rejected { .. })
    }
}

/// Hosted multimodal model provider
pub trait ModelBackend {
    /// Models usable with the caller's credentials
    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError>;

    /// Run one request and return the model's text answer
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, BackendError>;
}

impl<B: ModelBackend + ?Sized> ModelBackend for Box<B> {
    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        (**self).list_models()
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, BackendError> {
        (**self).generate(request)
    }
}
