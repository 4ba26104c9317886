//! Extraction client - walks the candidate models until one answers

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use tally_domain::RawExtraction;

use crate::ai::backend::{BackendError, GenerationRequest, ModelBackend};
use crate::ai::candidates::{CandidateList, DEFAULT_DISCOVERY_TTL};
use crate::ai::prompts::build_extraction_prompt;
use crate::normalizer::NormalizedImage;
use crate::parse_extraction;

/// Why a single candidate did not produce a result
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Backend(BackendError),
    /// Answer arrived but was not the requested JSON object
    Malformed(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Backend(e) => write!(f, "{}", e),
            FailureReason::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

/// A failed attempt against one candidate model
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub model: String,
    pub reason: FailureReason,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.model, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no candidate models available")]
    NoCandidates,

    #[error("model discovery rejected: {0}")]
    Discovery(BackendError),

    #[error("{model} rejected the request: {source}")]
    Aborted {
        model: String,
        source: BackendError,
        attempts: Vec<AttemptFailure>,
    },

    #[error(
        "all {} candidate models failed (last: {})",
        .attempts.len(),
        .attempts.last().map(ToString::to_string).unwrap_or_default()
    )]
    Exhausted { attempts: Vec<AttemptFailure> },
}

impl From<ExtractionError> for tally_types::Error {
    fn from(err: ExtractionError) -> Self {
        tally_types::Error::ExtractionFailed(err.to_string())
    }
}

/// Successful extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Model that produced the answer
    pub model: String,
    pub raw: RawExtraction,
    /// Candidates tried before this one
    pub failed_attempts: Vec<AttemptFailure>,
}

/// Extraction client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Fixed candidate list; skips discovery when non-empty
    pub pinned_models: Vec<String>,
    /// Used when discovery is unavailable; empty means built-in defaults
    pub fallback_models: Vec<String>,
    pub discovery_ttl: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            pinned_models: Vec::new(),
            fallback_models: Vec::new(),
            discovery_ttl: DEFAULT_DISCOVERY_TTL,
        }
    }
}

impl ClientOptions {
    pub fn with_pinned_models(mut self, models: Vec<String>) -> Self {
        self.pinned_models = models;
        self
    }

    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    pub fn with_discovery_ttl(mut self, ttl: Duration) -> Self {
        self.discovery_ttl = ttl;
        self
    }
}

/// Sends one image at a time to the candidate models in priority order.
///
/// Rate limits, server errors, network failures and malformed answers move
/// on to the next candidate; any other rejection stops immediately.
/// Responses are never cached.
pub struct ExtractionClient<B> {
    backend: B,
    candidates: CandidateList,
    prompt: String,
}

impl<B: ModelBackend> ExtractionClient<B> {
    pub fn new(backend: B, options: ClientOptions) -> Self {
        Self {
            backend,
            candidates: CandidateList::new(
                options.pinned_models,
                options.fallback_models,
                options.discovery_ttl,
            ),
            prompt: build_extraction_prompt(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current prioritized candidate list (refreshing it when stale)
    pub fn candidates(&mut self) -> Result<Vec<String>, ExtractionError> {
        self.candidates
            .current(&self.backend)
            .map_err(ExtractionError::Discovery)
    }

    /// Extract the raw cell values from one normalized image
    pub fn extract(&mut self, image: &NormalizedImage) -> Result<Extraction, ExtractionError> {
        let candidates = self.candidates()?;
        if candidates.is_empty() {
            return Err(ExtractionError::NoCandidates);
        }

        let mut attempts: Vec<AttemptFailure> = Vec::new();

        for model in candidates {
            let request = GenerationRequest {
                model: &model,
                prompt: &self.prompt,
                image,
            };
            debug!(model = %model, "sending extraction request");

            let reason = match self.backend.generate(&request) {
                Ok(text) => match parse_extraction(&text) {
                    Ok(raw) => {
                        info!(model = %model, fields = raw.len(), "extraction succeeded");
                        return Ok(Extraction {
                            model,
                            raw,
                            failed_attempts: attempts,
                        });
                    }
                    Err(msg) => FailureReason::Malformed(msg),
                },
                Err(e) if e.is_retriable() => FailureReason::Backend(e),
                Err(e) => {
                    warn!(model = %model, error = %e, "request rejected, not trying other models");
                    return Err(ExtractionError::Aborted {
                        model,
                        source: e,
                        attempts,
                    });
                }
            };

            warn!(model = %model, reason = %reason, "candidate failed, trying next");
            attempts.push(AttemptFailure { model, reason });
        }

        Err(ExtractionError::Exhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend::ModelInfo;
    use std::cell::RefCell;

    /// Answers generation requests from a script, keyed by model
    struct Scripted {
        models: Vec<&'static str>,
        answers: RefCell<Vec<(&'static str, Result<String, BackendError>)>>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(models: Vec<&'static str>, answers: Vec<(&'static str, Result<String, BackendError>)>) -> Self {
            Self {
                models,
                answers: RefCell::new(answers),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelBackend for Scripted {
        fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
            Ok(self.models.iter().map(|m| ModelInfo::new(*m)).collect())
        }

        fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, BackendError> {
            self.calls.borrow_mut().push(request.model.to_string());
            let mut answers = self.answers.borrow_mut();
            let index = answers
                .iter()
                .position(|(model, _)| *model == request.model)
                .expect("unscripted model");
            answers.remove(index).1
        }
    }

    fn image() -> NormalizedImage {
        NormalizedImage {
            bytes: vec![1, 2, 3],
            mime_type: "image/jpeg",
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_first_success_short_circuits() {
        let backend = Scripted::new(
            vec!["gemini-1.5-flash", "gemini-1.5-pro"],
            vec![("gemini-1.5-flash", Ok("{\"imp_20_full\": 2}".to_string()))],
        );
        let mut client = ExtractionClient::new(backend, ClientOptions::default());

        let extraction = client.extract(&image()).unwrap();
        assert_eq!(extraction.model, "gemini-1.5-flash");
        assert_eq!(extraction.raw.count("imp_20_full"), 2);
        assert!(extraction.failed_attempts.is_empty());
        assert_eq!(client.backend().calls.borrow().len(), 1);
    }

    #[test]
    fn test_malformed_server_and_network_advance() {
        let backend = Scripted::new(
            vec!["a-flash", "b-flash", "c-flash", "d-pro"],
            vec![
                ("a-flash", Ok("Sorry, I can't help with that.".to_string())),
                ("b-flash", Err(BackendError::from_status(503, "overloaded"))),
                ("c-flash", Err(BackendError::Network("connection reset".into()))),
                ("d-pro", Ok("{\"exp_40_full\": 1}".to_string())),
            ],
        );
        let mut client = ExtractionClient::new(backend, ClientOptions::default());

        let extraction = client.extract(&image()).unwrap();
        assert_eq!(extraction.model, "d-pro");
        assert_eq!(extraction.failed_attempts.len(), 3);
        assert!(matches!(extraction.failed_attempts[0].reason, FailureReason::Malformed(_)));
    }

    #[test]
    fn test_rejection_aborts() {
        let backend = Scripted::new(
            vec!["a-flash", "b-pro"],
            vec![("a-flash", Err(BackendError::from_status(401, "API key not valid")))],
        );
        let mut client = ExtractionClient::new(backend, ClientOptions::default());

        let err = client.extract(&image()).unwrap_err();
        assert!(matches!(err, ExtractionError::Aborted { ref model, .. } if model == "a-flash"));
        assert_eq!(*client.backend().calls.borrow(), vec!["a-flash"]);
    }

    #[test]
    fn test_exhausted_names_last_reason() {
        let backend = Scripted::new(
            vec!["a-flash", "b-pro"],
            vec![
                ("a-flash", Err(BackendError::RateLimited("quota".into()))),
                ("b-pro", Err(BackendError::from_status(500, "internal"))),
            ],
        );
        let mut client = ExtractionClient::new(backend, ClientOptions::default());

        let err = client.extract(&image()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("all 2 candidate models failed"), "{}", message);
        assert!(message.contains("b-pro: server error 500"), "{}", message);
    }

    #[test]
    fn test_pinned_models_in_given_order() {
        let backend = Scripted::new(
            vec![],
            vec![
                ("custom-pro", Err(BackendError::RateLimited("quota".into()))),
                ("custom-flash", Ok("{\"hatch_cover\": 4}".to_string())),
            ],
        );
        let options = ClientOptions::default()
            .with_pinned_models(vec!["custom-pro".into(), "custom-flash".into()]);
        let mut client = ExtractionClient::new(backend, options);

        let extraction = client.extract(&image()).unwrap();
        assert_eq!(extraction.model, "custom-flash");
        assert_eq!(*client.backend().calls.borrow(), vec!["custom-pro", "custom-flash"]);
    }
}
