//! 评估编排器 - 编排层
//!
//! ## 职责
//!
//! 持有当前的后端配置，把一次评估串成完整流程：
//!
//! 1. **校验请求**：criterion id 不重复、max_score 为正数
//! 2. **创建后端**：调用开始时快照配置，缺 key 在此失败
//! 3. **提取附件**：仅在 `include_file_contents` 且有文件时
//! 4. **组装 prompt**
//! 5. **调用后端**，再 **解析校验** 结果
//!
//! 任何一步失败都返回唯一的 `EvaluationError`，不返回部分结果。
//! 附件读取失败不算失败，只记录在对应的 FileContent 中。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::clients::{BackendRegistry, BackendSettings, ScoringRequest};
use crate::config::Config;
use crate::error::{ConfigError, EvalResult, EvaluationError};
use crate::extraction::{extract_files, render_file_contents, DEFAULT_FILE_CONTENT_CAP};
use crate::infrastructure::StorageReader;
use crate::models::{EvaluationRequest, EvaluationResponse, ProviderConfig, ProviderKind};
use crate::services::{build_evaluation_prompt, parse_response, ScoreThresholds};
use crate::utils::logging::{log_evaluation_complete, log_evaluation_start};

/// 评估编排器
///
/// 配置只能通过 `configure` / `set_provider` / `set_model` 修改，
/// 这些方法需要 `&mut self`，因此评估进行中不会被改动。
#[derive(Clone)]
pub struct Evaluator {
    config: ProviderConfig,
    registry: BackendRegistry,
    storage: Arc<dyn StorageReader>,
    settings: BackendSettings,
    thresholds: ScoreThresholds,
    file_content_cap: usize,
    /// 批量评估时的最大并发数
    max_concurrent: usize,
}

/// 批量评估的默认并发数
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

impl Evaluator {
    /// 使用 mock 后端和默认参数创建
    pub fn new(storage: Arc<dyn StorageReader>) -> Self {
        Self {
            config: ProviderConfig::default(),
            registry: BackendRegistry::default(),
            storage,
            settings: BackendSettings::default(),
            thresholds: ScoreThresholds::default(),
            file_content_cap: DEFAULT_FILE_CONTENT_CAP,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// 按程序配置创建
    pub fn from_config(config: &Config, storage: Arc<dyn StorageReader>) -> Result<Self, ConfigError> {
        let mut evaluator = Self::new(storage)
            .with_settings(config.backend_settings())
            .with_thresholds(config.thresholds()?)
            .with_file_content_cap(config.file_content_cap)
            .with_max_concurrent(config.max_concurrent_evaluations);
        evaluator.config = config.provider_config();
        Ok(evaluator)
    }

    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_settings(mut self, settings: BackendSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_thresholds(mut self, thresholds: ScoreThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_file_content_cap(mut self, cap: usize) -> Self {
        self.file_content_cap = cap;
        self
    }

    /// 0 按 1 处理
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// 当前后端配置
    pub fn provider_config(&self) -> &ProviderConfig {
        &self.config
    }

    /// 整体替换后端配置，`model` 为空时使用后端默认模型
    pub fn configure(&mut self, provider: ProviderKind, api_key: impl Into<String>, model: Option<String>) {
        let mut config = ProviderConfig::new(provider, api_key);
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        info!("🔧 评分后端已配置: {} (模型: {})", config.provider, config.model);
        self.config = config;
    }

    /// 切换后端，模型重置为默认值；只有传入 key 时才替换 key
    pub fn set_provider(&mut self, provider: ProviderKind, api_key: Option<String>) {
        self.config.provider = provider;
        self.config.model = provider.default_model().to_string();
        if let Some(key) = api_key {
            self.config.api_key = key;
        }
        info!("🔧 切换评分后端: {} (模型: {})", provider, self.config.model);
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
        info!("🔧 切换模型: {}", self.config.model);
    }

    /// 评估一个项目
    ///
    /// # 参数
    /// - `request`: 评估请求
    ///
    /// # 返回
    /// 校验后的评估结果，或标明失败阶段的 `EvaluationError`
    pub async fn evaluate_project(&self, request: &EvaluationRequest) -> EvalResult<EvaluationResponse> {
        validate_request(request)?;

        let config = self.config.clone();
        log_evaluation_start(request, &config);

        let backend = self.registry.build(&config, &self.settings).map_err(|e| {
            error!("❌ {}", e);
            e
        })?;

        let files = if request.wants_file_contents() {
            extract_files(self.storage.as_ref(), &request.files).await
        } else {
            Vec::new()
        };
        let file_block = render_file_contents(&files, self.file_content_cap);

        let prompt = build_evaluation_prompt(request, &file_block);
        debug!("prompt 组装完成: {} 字符", prompt.chars().count());

        let raw = backend
            .evaluate(&ScoringRequest {
                prompt: &prompt,
                request,
                files: &files,
            })
            .await
            .map_err(|e| {
                error!("❌ 评分后端调用失败: {}", e);
                e
            })?;

        let response = parse_response(&raw, &request.evaluation_criteria, &self.thresholds).map_err(|e| {
            error!("❌ {}", e);
            debug!("原始响应: {}", crate::utils::truncate_text(&e.raw_text, 500));
            e
        })?;

        let max_total: f64 = request.evaluation_criteria.iter().map(|c| c.max_score).sum();
        log_evaluation_complete(&response, max_total);

        Ok(response)
    }
}

/// 请求校验：criterion id 不能重复，max_score 必须是正的有限数
pub fn validate_request(request: &EvaluationRequest) -> Result<(), EvaluationError> {
    let mut seen = HashSet::new();
    for criterion in &request.evaluation_criteria {
        if !seen.insert(criterion.id.as_str()) {
            return Err(EvaluationError::InvalidRequest(format!(
                "评分项 id 重复: '{}'",
                criterion.id
            )));
        }
        if !criterion.has_valid_max_score() {
            return Err(EvaluationError::InvalidRequest(format!(
                "评分项 '{}' 的 maxScore 必须为正数: {}",
                criterion.id, criterion.max_score
            )));
        }
    }
    Ok(())
}
