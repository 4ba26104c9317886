//! Model backends, candidate selection and prompts

pub mod backend;
pub mod candidates;
pub mod prompts;

pub use backend::{BackendError, GenerationRequest, ModelBackend, ModelInfo};
pub use candidates::{rank_candidates, CandidateList, ModelTier, DEFAULT_CANDIDATES};
pub use prompts::build_extraction_prompt;
