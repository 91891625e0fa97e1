//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{GeminiHttp, PROVIDER_NAME};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProviderConfig;
use crate::domain::ports::GenerationClient;

#[derive(Debug, Clone)]
pub struct GeminiGenerationConfig {
    /// Default: `gemini-2.5-flash`.
    pub model: String,
    /// Default: 0.1; low so answers stay close to the retrieved context.
    pub temperature: f32,
}

impl Default for GeminiGenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
        }
    }
}

impl From<&ProviderConfig> for GeminiGenerationConfig {
    fn from(provider: &ProviderConfig) -> Self {
        Self {
            model: provider.generation_model.clone(),
            temperature: provider.temperature,
        }
    }
}

pub struct GeminiGenerationClient {
    config: GeminiGenerationConfig,
    http: Arc<GeminiHttp>,
    endpoint: String,
}

impl GeminiGenerationClient {
    pub fn new(config: GeminiGenerationConfig, http: Arc<GeminiHttp>) -> Self {
        let endpoint = format!("{}:generateContent", GeminiHttp::model_path(&config.model));
        Self {
            config,
            http,
            endpoint,
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiGenerationClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> DomainResult<String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response: GenerateContentResponse = self.http.post_json(&self.endpoint, &request).await?;
        response.text().ok_or_else(|| DomainError::Provider {
            provider: PROVIDER_NAME.to_string(),
            endpoint: self.endpoint.clone(),
            status: None,
            message: match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "response contained no text".to_string(),
            },
            transient: false,
        })
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, `None` if it has none.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
