//! 评分后端（Clients Layer）
//!
//! 所有后端实现同一个 [`ScoringBackend`] trait，由 [`BackendRegistry`] 按后端类型创建：
//!
//! - `mock`：本地启发式评分，不联网
//! - `openai`：OpenAI 兼容的 chat completions 接口
//! - `gemini`：Google Gemini generateContent 接口
//!
//! 后端只负责"拿到原始结果"，解析和校验交给 `services::response_parser`。

pub mod gemini;
pub mod http;
pub mod mock;
pub mod openai;
pub mod registry;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EvaluationError;
use crate::models::{EvaluationRequest, FileContent, ProviderKind};
use crate::services::RawResult;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use registry::{BackendFactory, BackendRegistry};

/// 一次评分调用的输入
#[derive(Debug, Clone, Copy)]
pub struct ScoringRequest<'a> {
    /// 已组装好的 prompt
    pub prompt: &'a str,
    /// 原始请求，本地后端直接读取字段
    pub request: &'a EvaluationRequest,
    /// 附件提取结果（未要求附件时为空）
    pub files: &'a [FileContent],
}

/// 评分后端
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// 当前使用的模型名称
    fn model(&self) -> &str;

    /// 执行一次评分，不重试
    async fn evaluate(&self, input: &ScoringRequest<'_>) -> Result<RawResult, EvaluationError>;
}

/// HTTP 后端共用的参数
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            request_timeout: Duration::from_secs(60),
        }
    }
}
