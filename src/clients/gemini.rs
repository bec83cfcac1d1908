//! Google Gemini generateContent 后端

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_http_client, empty_completion, send_json};
use super::{BackendSettings, ScoringBackend, ScoringRequest};
use crate::error::{ConfigurationError, EvaluationError};
use crate::models::{ProviderConfig, ProviderKind};
use crate::services::RawResult;

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
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

impl GenerateResponse {
    /// 拼接第一个 candidate 的所有文本片段
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiBackend {
    pub fn new(config: &ProviderConfig, settings: &BackendSettings) -> Result<Self, ConfigurationError> {
        if !config.has_api_key() {
            return Err(ConfigurationError::MissingApiKey {
                provider: ProviderKind::Gemini,
            });
        }

        Ok(Self {
            client: build_http_client(settings.request_timeout)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: settings.gemini_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ScoringBackend for GeminiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn evaluate(&self, input: &ScoringRequest<'_>) -> Result<RawResult, EvaluationError> {
        info!("🤖 调用 Gemini 评分，模型: {}", self.model);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: input.prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        };

        // key 放在 query 中，URL 不写日志
        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body);

        let response: GenerateResponse = send_json(request, ProviderKind::Gemini, &self.model).await?;
        let text = response.into_text();

        if text.trim().is_empty() {
            return Err(empty_completion(ProviderKind::Gemini, &self.model).into());
        }

        debug!("✓ Gemini 返回 {} 字符", text.chars().count());
        Ok(RawResult::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let config = ProviderConfig::new(ProviderKind::Gemini, "");
        assert!(GeminiBackend::new(&config, &BackendSettings::default()).is_err());
    }

    #[test]
    fn test_request_body_uses_camel_case() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "prompt" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 100,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 100);
    }

    #[test]
    fn test_parts_are_concatenated() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"scores\": "}, {"text": "{}}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "{\"scores\": {}}");

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(empty.into_text(), "");
    }
}
