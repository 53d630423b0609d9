//! Generative-language API client used by the chat endpoint.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::services::{check_status, UpstreamError};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "assistant")]
    Model,
}

/// One prior message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Everything the model needs to produce the next reply.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: &'static str,
    pub history: Vec<ChatTurn>,
    pub prompt: String,
}

/// Produces a reply for a conversation.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Result<String, UpstreamError>>;
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<ChatRole>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContent<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate; empty when there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

fn build_body(request: &GenerationRequest, temperature: f32) -> GenerateContent<'_> {
    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(turn.role),
            parts: [Part { text: &turn.content }],
        })
        .collect();
    contents.push(Content {
        role: Some(ChatRole::User),
        parts: [Part { text: &request.prompt }],
    });

    GenerateContent {
        contents,
        system_instruction: Content {
            role: None,
            parts: [Part {
                text: request.system_instruction,
            }],
        },
        generation_config: GenerationConfig { temperature },
    }
}

/// Client for the Gemini `generateContent` REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    temperature: f32,
}

impl GeminiClient {
    pub fn from_config(config: &ChatConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            temperature: config.temperature,
        }
    }
}

impl TextGenerator for GeminiClient {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Result<String, UpstreamError>> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;
            let response = self
                .client
                .post(&self.endpoint)
                .header("x-goog-api-key", api_key)
                .json(&build_body(request, self.temperature))
                .send()
                .await?;
            let body: GenerateContentResponse = check_status(response).await?.json().await?;
            Ok(body.text())
        })
    }
}
