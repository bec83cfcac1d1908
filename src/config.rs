use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::clients::BackendSettings;
use crate::error::ConfigError;
use crate::extraction::DEFAULT_FILE_CONTENT_CAP;
use crate::models::{ProviderConfig, ProviderKind};
use crate::services::ScoreThresholds;

/// 程序配置
///
/// 所有字段都可以从 TOML 文件读取，再由环境变量覆盖。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 评分后端 ---
    pub provider: ProviderKind,
    pub api_key: String,
    /// 为空时使用后端默认模型
    pub model: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    // --- 评估 ---
    /// 单个文件在 prompt 中的最大字符数
    pub file_content_cap: usize,
    pub pre_selected_threshold: f64,
    pub selected_threshold: f64,
    /// 同时进行的评估数量（批量模式）
    pub max_concurrent_evaluations: usize,
    // --- 存储 ---
    /// 本地存储根目录
    pub storage_root: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        let thresholds = ScoreThresholds::default();
        Self {
            provider: ProviderKind::Mock,
            api_key: String::new(),
            model: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            request_timeout_secs: 60,
            file_content_cap: DEFAULT_FILE_CONTENT_CAP,
            pre_selected_threshold: thresholds.pre_selected,
            selected_threshold: thresholds.selected,
            max_concurrent_evaluations: 4,
            storage_root: "uploads".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量覆盖默认配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 先读 `EVAL_CONFIG_FILE` 指向的 TOML 文件（如果有），再应用环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("EVAL_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(path)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let provider = match std::env::var("EVAL_PROVIDER") {
            Ok(value) => ProviderKind::from_str(&value).ok_or(ConfigError::EnvVarParseFailed {
                var_name: "EVAL_PROVIDER".to_string(),
                value,
                expected_type: "mock | openai | gemini".to_string(),
            })?,
            Err(_) => self.provider,
        };

        Ok(Self {
            provider,
            api_key: std::env::var("EVAL_API_KEY").unwrap_or(self.api_key),
            model: std::env::var("EVAL_MODEL").ok().or(self.model),
            openai_base_url: std::env::var("EVAL_OPENAI_BASE_URL").unwrap_or(self.openai_base_url),
            gemini_base_url: std::env::var("EVAL_GEMINI_BASE_URL").unwrap_or(self.gemini_base_url),
            temperature: env_parse("EVAL_TEMPERATURE", "f32")?.unwrap_or(self.temperature),
            max_tokens: env_parse("EVAL_MAX_TOKENS", "u32")?.unwrap_or(self.max_tokens),
            request_timeout_secs: env_parse("EVAL_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            file_content_cap: env_parse("EVAL_FILE_CONTENT_CAP", "usize")?
                .unwrap_or(self.file_content_cap),
            pre_selected_threshold: env_parse("EVAL_PRESELECT_THRESHOLD", "f64")?
                .unwrap_or(self.pre_selected_threshold),
            selected_threshold: env_parse("EVAL_SELECT_THRESHOLD", "f64")?
                .unwrap_or(self.selected_threshold),
            max_concurrent_evaluations: env_parse("EVAL_MAX_CONCURRENT", "usize")?
                .unwrap_or(self.max_concurrent_evaluations),
            storage_root: std::env::var("EVAL_STORAGE_ROOT").unwrap_or(self.storage_root),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 检查阈值：0 <= pre_selected <= selected <= 1
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds().map(|_| ())
    }

    pub fn thresholds(&self) -> Result<ScoreThresholds, ConfigError> {
        ScoreThresholds::new(self.pre_selected_threshold, self.selected_threshold).ok_or(
            ConfigError::InvalidThresholds {
                pre_selected: self.pre_selected_threshold,
                selected: self.selected_threshold,
            },
        )
    }

    /// 初始的后端配置
    pub fn provider_config(&self) -> ProviderConfig {
        let config = ProviderConfig::new(self.provider, self.api_key.clone());
        match &self.model {
            Some(model) if !model.trim().is_empty() => config.with_model(model.clone()),
            _ => config,
        }
    }

    /// HTTP 后端共用的参数
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            openai_base_url: self.openai_base_url.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
