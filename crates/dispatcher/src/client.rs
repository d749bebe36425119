use lingopane_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const TEMPERATURE: f32 = 0.2;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Client for a Gemini-style `generateContent` endpoint. The API key is
/// carried as a query parameter; one POST per request, no retries.
pub struct EndpointClient {
    client: Client,
    api_base: String,
    model: String,
}

impl EndpointClient {
    pub fn new(api_base: Option<&str>, model: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base
                .unwrap_or(GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }

    /// Issue a single generation call and return the first candidate's text.
    pub async fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, api_key
        );

        let request = serde_json::json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "topK": TOP_K,
                "topP": TOP_P,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        info!(model = %self.model, prompt_len = prompt.len(), "Calling translation endpoint");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Endpoint(format!("request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(status = %status, body = %raw_body, "Endpoint returned error status");
            return Err(Error::Endpoint(format!(
                "HTTP {}: {}",
                status,
                excerpt(&raw_body)
            )));
        }

        debug!(body_len = raw_body.len(), "Endpoint raw response");

        let resp: GenerateResponse = serde_json::from_str(&raw_body).map_err(|e| {
            Error::Parse(format!(
                "malformed endpoint response: {}. Body: {}",
                e,
                excerpt(&raw_body)
            ))
        })?;

        resp.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| Error::Parse("no candidate text in response".to_string()))
    }
}

/// First 200 chars of a body, kept on a char boundary.
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((i, _)) => &body[..i],
        None => body,
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
