//! HTTP classifier backed by a hosted generative model.
//!
//! Titles and descriptions are sent to the configured endpoint but never
//! logged locally.

use log::warn;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{parse_classifier_reply, Classifier, ClassifierError, ClassifierReply};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClassifierConfig {
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl HttpClassifierConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

pub struct HttpClassifier {
    client: Client,
    config: HttpClassifierConfig,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl HttpClassifier {
    pub fn new(config: HttpClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn request(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<ClassifierReply, ClassifierError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(title, description) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.2
            }
        });

        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&body)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        interpret_response(status, &text)
    }
}

/// Maps a finished HTTP exchange to a reply. 429 and quota bodies become
/// `Quota`, other non-2xx statuses `Http`.
fn interpret_response(
    status: StatusCode,
    body: &str,
) -> Result<ClassifierReply, ClassifierError> {
    if !status.is_success() {
        let snippet = truncate(body, MAX_ERROR_BODY_CHARS);
        if status == StatusCode::TOO_MANY_REQUESTS || mentions_quota(body) {
            return Err(ClassifierError::Quota(snippet));
        }
        return Err(ClassifierError::Http {
            status: status.as_u16(),
            body: snippet,
        });
    }

    let envelope: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| ClassifierError::InvalidReply(err.to_string()))?;
    let reply_text = envelope
        .candidates
        .into_iter()
        .flat_map(|candidate| candidate.content.parts)
        .find_map(|part| part.text)
        .ok_or_else(|| ClassifierError::InvalidReply("empty candidates".to_string()))?;
    parse_classifier_reply(&reply_text)
}

impl Classifier for HttpClassifier {
    fn classify(&self, title: &str, description: Option<&str>) -> ClassifierReply {
        match self.request(title, description) {
            Ok(reply) => reply,
            Err(err) => {
                let failure = err.failure();
                warn!(
                    "event=classify_http module=classify status=error error_kind={} error={err}",
                    failure.as_str()
                );
                ClassifierReply::failed(failure)
            }
        }
    }
}

pub(crate) fn build_prompt(title: &str, description: Option<&str>) -> String {
    let mut prompt = String::from(
        "Classify this personal task into the Eisenhower matrix.\n\
         q1 = urgent and important, q2 = important but not urgent,\n\
         q3 = urgent but not important, q4 = neither.\n\
         Also estimate how long it takes as a number followed by m, h or d.\n\
         Answer with JSON only: {\"category\": \"q1\", \"duration\": \"30m\"}.\n\n",
    );
    prompt.push_str("Task: ");
    prompt.push_str(title.trim());
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        prompt.push_str("\nDetails: ");
        prompt.push_str(description);
    }
    prompt
}

fn mentions_quota(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("resource_exhausted") || lowered.contains("quota")
}

fn truncate(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated: String = normalized.chars().take(max_chars).collect();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
