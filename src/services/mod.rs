//! 业务能力层（Services Layer）
//!
//! - `prompt_builder`：把请求和附件文本组装成 prompt
//! - `response_parser`：把后端原始结果解析、校验为 `EvaluationResponse`
//!
//! 两者都是纯函数，不做 I/O。

pub mod prompt_builder;
pub mod response_parser;

pub use prompt_builder::{build_evaluation_prompt, EVALUATOR_PERSONA};
pub use response_parser::{
    extract_json_object, parse_response, score_ratio, validate_payload, RawResult,
    ScoreThresholds,
};
