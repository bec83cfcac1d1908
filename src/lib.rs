//! # Project Evaluator
//!
//! 按评分标准评估项目申报材料，输出逐项分数、评语和推荐等级
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 存储读取能力（本地目录 / 内存）
//!
//! ### ② 内容提取（Extraction）
//! - `extraction/` - 文件类型识别、按类型提取文本、PDF 字面量扫描、并发汇总
//!
//! ### ③ 业务能力层（Services / Clients）
//! - `services/prompt_builder` - 组装评估 prompt
//! - `services/response_parser` - 解析、校验后端结果，推导推荐等级
//! - `clients/` - 评分后端（mock / openai / gemini）与注册表
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/evaluator` - 单个评估的完整流程
//! - `orchestrator/batch` - 批量评估，控制并发
//! - `orchestrator/self_test` - 后端自检
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod extraction;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{BackendRegistry, BackendSettings, ScoringBackend, ScoringRequest};
pub use config::Config;
pub use error::{
    ConfigError, ConfigurationError, EvalResult, EvaluationError, EvaluationStage,
    ProviderHttpError, ResponseParseError, StorageReadError,
};
pub use infrastructure::{LocalStorage, MemoryStorage, StorageReader};
pub use models::{
    Criterion, EvaluationRequest, EvaluationResponse, FileContent, FileRef, FileType,
    ProviderConfig, ProviderKind, Recommendation,
};
pub use orchestrator::{evaluate_batch, verify_provider, Evaluator};
pub use services::{RawResult, ScoreThresholds};
