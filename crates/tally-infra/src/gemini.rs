//! Gemini REST backend (`v1beta/models`, `models/{id}:generateContent`)

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use tally_vision::{BackendError, GenerationRequest, ModelBackend, ModelInfo};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const GENERATE_METHOD: &str = "generateContent";
const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_MODEL_PAGES: usize = 10;

/// Connection options
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking Gemini API client
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    api_base: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, options: GeminiOptions) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: options.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(BackendError::from_status(status.as_u16(), error_message(&body)))
    }
}

impl ModelBackend for GeminiBackend {
    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        let url = format!("{}/models", self.api_base);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let mut request = self.client.get(&url).query(&[("pageSize", "1000")]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListModelsResponse = self
                .send(request)?
                .json()
                .map_err(|e| envelope_error("models.list", e))?;
            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = models.len(), "listed models");
        Ok(models)
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, BackendError> {
        let url = format!("{}/models/{}:{}", self.api_base, request.model, GENERATE_METHOD);
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": request.prompt },
                    {
                        "inline_data": {
                            "mime_type": request.image.mime_type,
                            "data": request.image.to_base64(),
                        }
                    }
                ]
            }],
            "generationConfig": {
                "temperature": 0,
                "responseMimeType": "application/json",
            }
        });

        let response: GenerateContentResponse = self
            .send(self.client.post(&url).json(&body))?
            .json()
            .map_err(|e| envelope_error("generateContent", e))?;

        Ok(response.text())
    }
}

fn envelope_error(call: &str, e: reqwest::Error) -> BackendError {
    BackendError::Server {
        status: 200,
        message: format!("unreadable {} response: {}", call, e),
    }
}

/// `{"error": {"message": ...}}` when present, else the (truncated) body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(300).collect())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ModelEntry> for ModelInfo {
    fn from(entry: ModelEntry) -> Self {
        let id = entry
            .name
            .strip_prefix("models/")
            .unwrap_or(&entry.name)
            .to_string();
        ModelInfo {
            id,
            supports_generation: entry
                .supported_generation_methods
                .iter()
                .any(|m| m == GENERATE_METHOD),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
