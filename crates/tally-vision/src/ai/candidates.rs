//! Prioritized list of candidate model identifiers
//!
//! Discovery asks the provider which models the credential may use, drops
//! experimental ones, and orders the rest: fast tier, general tier, others.
//! The result is reused until it is older than the refresh interval.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::backend::{BackendError, ModelBackend, ModelInfo};

/// Used when discovery is unavailable
pub const DEFAULT_CANDIDATES: [&str; 2] = ["gemini-1.5-flash", "gemini-1.5-pro"];

pub const DEFAULT_DISCOVERY_TTL: Duration = Duration::from_secs(300);

/// Preference tier of a model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelTier {
    /// Cheap/fast models (`flash`)
    Fast,
    /// General-purpose models (`pro`)
    General,
    Other,
}

impl ModelTier {
    pub fn of(id: &str) -> Self {
        let id = id.to_lowercase();
        if id.contains("flash") {
            ModelTier::Fast
        } else if segments(&id).any(|segment| segment == "pro") {
            ModelTier::General
        } else {
            ModelTier::Other
        }
    }
}

fn segments(id: &str) -> impl Iterator<Item = &str> {
    id.split(|c: char| c == '-' || c == '.' || c == '_')
}

/// `gemini-2.0-flash-exp`, `gemini-exp-1206`, `...-experimental`
pub fn is_experimental(id: &str) -> bool {
    segments(&id.to_lowercase()).any(|segment| {
        segment == "exp"
            || segment.starts_with("experimental")
            || (segment.starts_with("exp")
                && segment.len() > 3
                && segment[3..].chars().all(|c| c.is_ascii_digit()))
    })
}

/// Order usable, non-experimental models by tier (stable within a tier)
pub fn rank_candidates(models: &[ModelInfo]) -> Vec<String> {
    let mut usable: Vec<&ModelInfo> = models
        .iter()
        .filter(|m| m.supports_generation && !is_experimental(&m.id))
        .collect();
    usable.sort_by_key(|m| ModelTier::of(&m.id));

    let mut ids: Vec<String> = Vec::with_capacity(usable.len());
    for model in usable {
        if !ids.contains(&model.id) {
            ids.push(model.id.clone());
        }
    }
    ids
}

/// Cached candidate list with a refresh interval
#[derive(Debug, Clone)]
pub struct CandidateList {
    pinned: Vec<String>,
    fallback: Vec<String>,
    ttl: Duration,
    cached: Vec<String>,
    fetched_at: Option<Instant>,
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), DEFAULT_DISCOVERY_TTL)
    }
}

impl CandidateList {
    /// `pinned` skips discovery entirely; an empty `fallback` means the
    /// built-in defaults.
    pub fn new(pinned: Vec<String>, fallback: Vec<String>, ttl: Duration) -> Self {
        let fallback = if fallback.is_empty() {
            DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
        } else {
            fallback
        };
        Self {
            pinned,
            fallback,
            ttl,
            cached: Vec::new(),
            fetched_at: None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        !self.pinned.is_empty()
    }

    pub fn needs_refresh(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.duration_since(at) >= self.ttl,
            None => true,
        }
    }

    /// Forget the cached discovery result
    pub fn invalidate(&mut self) {
        self.fetched_at = None;
        self.cached.clear();
    }

    /// Current candidates, refreshing from the provider when stale.
    ///
    /// Retriable discovery failures fall back to the default list; a
    /// rejected discovery request (bad credentials) is returned as an error.
    pub fn current<B: ModelBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<Vec<String>, BackendError> {
        if self.is_pinned() {
            return Ok(self.pinned.clone());
        }

        let now = Instant::now();
        if !self.needs_refresh(now) {
            return Ok(self.cached.clone());
        }

        let ranked = match backend.list_models() {
            Ok(models) => {
                let ranked = rank_candidates(&models);
                debug!(discovered = models.len(), usable = ranked.len(), "refreshed candidate models");
                if ranked.is_empty() {
                    warn!("no usable models discovered, using fallback list");
                    self.fallback.clone()
                } else {
                    ranked
                }
            }
            Err(e) if e.is_retriable() => {
                warn!(error = %e, "model discovery failed, using fallback list");
                self.fallback.clone()
            }
            Err(e) => return Err(e),
        };

        self.cached = ranked;
        self.fetched_at = Some(now);
        Ok(self.cached.clone())
    }
}
