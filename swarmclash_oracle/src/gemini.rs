//! Production judge backed by the Gemini text-generation API.

use crate::error::JudgeError;
use crate::judge::{Judge, moderation_prompt, winner_prompt};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// Environment variable holding the oracle credential. When it is
/// absent the oracle is disabled and the game runs on random fallbacks.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Judge that asks Gemini's `generateContent` endpoint.
pub struct GeminiJudge {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiJudge {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{MODEL}:generateContent"
            ),
        }
    }

    /// Builds the judge from `GEMINI_API_KEY`, or `None` when the
    /// credential is missing.
    pub fn from_env() -> Option<Self> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Some(Self::new(key)),
            _ => {
                info!("no {API_KEY_VAR} set; oracle disabled, using random fallbacks");
                None
            }
        }
    }

    async fn generate(&self, prompt: String) -> Result<String, JudgeError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let payload: GenerateResponse = response.json().await?;
        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(JudgeError::EmptyReply)
    }
}

#[async_trait]
impl Judge for GeminiJudge {
    async fn pick_winner(&self, a: &str, b: &str) -> Result<String, JudgeError> {
        self.generate(winner_prompt(a, b)).await
    }

    async fn screen_name(&self, name: &str) -> Result<String, JudgeError> {
        self.generate(moderation_prompt(name)).await
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}
