use thiserror::Error;

use crate::models::ProviderKind;

/// 评估流程的统一错误类型
///
/// 编排器只会返回这一种错误，调用方通过 [`EvaluationError::stage`] 判断失败阶段。
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// 请求本身不合法
    #[error("请求不合法: {0}")]
    InvalidRequest(String),
    /// 后端配置错误
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// 后端 HTTP 调用错误
    #[error(transparent)]
    Provider(#[from] ProviderHttpError),
    /// 后端返回内容无法解析
    #[error(transparent)]
    ResponseParse(#[from] ResponseParseError),
}

/// 评估流程的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStage {
    Request,
    Scoring,
    Parsing,
}

impl EvaluationStage {
    pub fn name(self) -> &'static str {
        match self {
            EvaluationStage::Request => "request",
            EvaluationStage::Scoring => "scoring",
            EvaluationStage::Parsing => "parsing",
        }
    }
}

impl std::fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl EvaluationError {
    /// 出错的阶段
    pub fn stage(&self) -> EvaluationStage {
        match self {
            EvaluationError::InvalidRequest(_) => EvaluationStage::Request,
            EvaluationError::Configuration(_) | EvaluationError::Provider(_) => {
                EvaluationStage::Scoring
            }
            EvaluationError::ResponseParse(_) => EvaluationStage::Parsing,
        }
    }
}

/// 后端配置错误（不会重试）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// 缺少 API key
    #[error("配置错误: {provider} 需要 API key")]
    MissingApiKey { provider: ProviderKind },
    /// 没有注册对应的后端
    #[error("配置错误: 未注册的评分后端 {provider}")]
    UnregisteredProvider { provider: ProviderKind },
    /// HTTP 客户端构建失败
    #[error("配置错误: 无法创建 HTTP 客户端: {message}")]
    HttpClient { message: String },
}

/// HTTP 错误的大类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Unauthorized,
    RateLimited,
    BadRequest,
    Generic,
}

/// 评分后端 HTTP 调用错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderHttpError {
    /// API key 无效 (HTTP 401)
    #[error("{provider} API key 无效或未授权 (HTTP 401, 模型: {model}): {message}")]
    Unauthorized {
        provider: ProviderKind,
        model: String,
        message: String,
    },
    /// 请求频率限制 (HTTP 429)
    #[error("{provider} 请求频率超限 (HTTP 429, 模型: {model}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        provider: ProviderKind,
        model: String,
        retry_after: Option<u64>,
    },
    /// 请求格式错误 (HTTP 400)，常见原因是模型名称无效
    #[error("{provider} 请求无效 (HTTP 400)，请检查模型名称 '{model}' 是否正确: {message}")]
    BadRequest {
        provider: ProviderKind,
        model: String,
        message: String,
    },
    /// 其他错误（包括网络错误，status 为 None）
    #[error("{provider} 调用失败 (status: {status:?}, 模型: {model}): {message}")]
    Provider {
        provider: ProviderKind,
        model: String,
        status: Option<u16>,
        message: String,
    },
}

impl ProviderHttpError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderHttpError::Unauthorized { .. } => ProviderErrorKind::Unauthorized,
            ProviderHttpError::RateLimited { .. } => ProviderErrorKind::RateLimited,
            ProviderHttpError::BadRequest { .. } => ProviderErrorKind::BadRequest,
            ProviderHttpError::Provider { .. } => ProviderErrorKind::Generic,
        }
    }

    /// 创建网络层错误
    pub fn network(provider: ProviderKind, model: impl Into<String>, source: impl std::fmt::Display) -> Self {
        ProviderHttpError::Provider {
            provider,
            model: model.into(),
            status: None,
            message: source.to_string(),
        }
    }
}

/// 解析失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// 找不到 JSON 对象
    NoJsonObject,
    /// JSON 语法错误
    InvalidJson(String),
    /// 顶层结构不对
    InvalidShape(String),
    /// 缺少某个 criterion 的分数
    MissingScore(String),
    /// 分数不是数字
    InvalidScore(String),
    /// detailedAnalysis 结构不对
    InvalidAnalysis(String),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::NoJsonObject => write!(f, "响应中没有 JSON 对象"),
            ParseFailure::InvalidJson(e) => write!(f, "JSON 解析失败: {}", e),
            ParseFailure::InvalidShape(e) => write!(f, "响应结构不正确: {}", e),
            ParseFailure::MissingScore(id) => write!(f, "缺少评分项 '{}' 的分数", id),
            ParseFailure::InvalidScore(id) => write!(f, "评分项 '{}' 的分数不是数字", id),
            ParseFailure::InvalidAnalysis(e) => write!(f, "detailedAnalysis 结构不正确: {}", e),
        }
    }
}

/// 后端返回内容不合法，保留原始文本用于诊断
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("响应解析失败: {reason}")]
pub struct ResponseParseError {
    pub reason: ParseFailure,
    pub raw_text: String,
}

impl ResponseParseError {
    pub fn new(reason: ParseFailure, raw_text: impl Into<String>) -> Self {
        Self {
            reason,
            raw_text: raw_text.into(),
        }
    }
}

/// 存储读取错误，只记录在对应文件的 FileContent 中
#[derive(Debug, Error)]
pub enum StorageReadError {
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    #[error("非法路径: {path}")]
    InvalidPath { path: String },
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    #[error("阈值配置不合法: pre_selected={pre_selected}, selected={selected}")]
    InvalidThresholds { pre_selected: f64, selected: f64 },
}

/// 评估结果类型
pub type EvalResult<T> = Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let config: EvaluationError = ConfigurationError::MissingApiKey {
            provider: ProviderKind::OpenAi,
        }
        .into();
        assert_eq!(config.stage(), EvaluationStage::Scoring);

        let parse: EvaluationError =
            ResponseParseError::new(ParseFailure::NoJsonObject, "hello").into();
        assert_eq!(parse.stage(), EvaluationStage::Parsing);

        let invalid = EvaluationError::InvalidRequest("dup".to_string());
        assert_eq!(invalid.stage(), EvaluationStage::Request);
    }

    #[test]
    fn test_bad_request_message_contains_model() {
        let err = ProviderHttpError::BadRequest {
            provider: ProviderKind::Gemini,
            model: "gemini-9-ultra".to_string(),
            message: "model not found".to_string(),
        };
        assert!(err.to_string().contains("gemini-9-ultra"));
        assert_eq!(err.kind(), ProviderErrorKind::BadRequest);
    }
}
