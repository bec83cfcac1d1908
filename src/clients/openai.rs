//! OpenAI 兼容的 chat completions 后端
//!
//! `POST {base}/chat/completions`，system message 为评审角色说明，
//! user message 为去掉角色说明后的 prompt，结果取 `choices[0].message.content`。

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{build_http_client, empty_completion, send_json};
use super::{BackendSettings, ScoringBackend, ScoringRequest};
use crate::error::{ConfigurationError, EvaluationError};
use crate::models::{ProviderConfig, ProviderKind};
use crate::services::{RawResult, EVALUATOR_PERSONA};

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiBackend {
    /// 创建后端，缺少 API key 时直接返回配置错误
    pub fn new(config: &ProviderConfig, settings: &BackendSettings) -> Result<Self, ConfigurationError> {
        if !config.has_api_key() {
            return Err(ConfigurationError::MissingApiKey {
                provider: ProviderKind::OpenAi,
            });
        }

        Ok(Self {
            client: build_http_client(settings.request_timeout)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ScoringBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn evaluate(&self, input: &ScoringRequest<'_>) -> Result<RawResult, EvaluationError> {
        info!("🤖 调用 OpenAI 评分，模型: {}", self.model);
        debug!("prompt 长度: {} 字符", input.prompt.chars().count());

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: EVALUATOR_PERSONA,
                },
                ChatMessage {
                    role: "user",
                    content: user_message(input.prompt),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(request, ProviderKind::OpenAi, &self.model).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| empty_completion(ProviderKind::OpenAi, &self.model))?;

        debug!("✓ OpenAI 返回 {} 字符", content.chars().count());
        Ok(RawResult::Text(content))
    }
}

/// prompt 以角色说明开头，已放进 system message 的部分不再重复发送
fn user_message(prompt: &str) -> &str {
    prompt
        .strip_prefix(EVALUATOR_PERSONA)
        .map(str::trim_start)
        .unwrap_or(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "  ");
        let result = OpenAiBackend::new(&config, &BackendSettings::default());
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingApiKey {
                provider: ProviderKind::OpenAi
            })
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.3,
            max_tokens: 2000,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 2000);
    }

    #[test]
    fn test_persona_only_in_system_message() {
        let prompt = format!("{}\n\n## Project\nTitle: Solar Roof", EVALUATOR_PERSONA);
        assert_eq!(user_message(&prompt), "## Project\nTitle: Solar Roof");
        assert!(!user_message(&prompt).contains(EVALUATOR_PERSONA));

        // 没有角色说明的 prompt 原样发送
        assert_eq!(user_message("score this"), "score this");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ProviderConfig::new(ProviderKind::OpenAi, "sk-test");
        let settings = BackendSettings {
            openai_base_url: "http://localhost:9999/v1/".to_string(),
            ..Default::default()
        };
        let backend = OpenAiBackend::new(&config, &settings).unwrap();
        assert_eq!(backend.base_url, "http://localhost:9999/v1");
        assert_eq!(backend.model(), "gpt-4o-mini");
    }
}
