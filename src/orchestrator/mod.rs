//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层把能力层串成完整的评估流程，是调用方唯一需要直接使用的入口。
//!
//! ## 模块划分
//!
//! ### `evaluator` - 评估编排器
//! - 持有后端配置（configure / set_provider / set_model）
//! - 校验请求 → 提取附件 → 组装 prompt → 调用后端 → 解析结果
//! - 任何阶段失败都返回带阶段信息的 `EvaluationError`
//!
//! ### `batch` - 批量评估
//! - Semaphore 控制并发数量
//! - 每个评估独立运行，失败只记录不传播
//! - 输出全局统计信息
//!
//! ### `self_test` - 后端自检
//! - 用固定请求试用新配置，失败时恢复原配置
//!
//! ## 层次关系
//!
//! ```text
//! batch / self_test
//!     ↓
//! evaluator (处理单个 EvaluationRequest)
//!     ↓
//! extraction (附件) / services (prompt, 解析) / clients (评分后端)
//!     ↓
//! infrastructure (StorageReader)
//! ```

pub mod batch;
pub mod evaluator;

pub use batch::{evaluate_batch, BatchFailure, BatchOutcome, BatchReport};
pub use evaluator::{validate_request, Evaluator};
pub use self_test::{self_test_request, verify_provider};
