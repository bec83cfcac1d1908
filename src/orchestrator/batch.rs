//! 批量评估 - 编排层
//!
//! 用 Semaphore 限制同时进行的评估数量，每个评估在自己的任务中运行。
//! 单个评估失败只记录在它的结果中，不影响其他评估。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::Evaluator;
use crate::error::EvaluationError;
use crate::models::{EvaluationRequest, EvaluationResponse};
use crate::utils::logging::{log_batch_startup, print_batch_stats};

/// 单个批量任务的失败原因
#[derive(Debug, Error)]
pub enum BatchFailure {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("评估任务异常退出: {0}")]
    TaskAborted(String),
}

/// 单个请求的结果，`index` 为它在输入中的位置（从 0 开始）
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub title: String,
    pub result: Result<EvaluationResponse, BatchFailure>,
}

/// 批量评估统计
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub success: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// 并发评估一批请求，结果顺序与输入一致
///
/// # 参数
/// - `evaluator`: 共享的编排器（配置和并发数在批量期间不变）
/// - `requests`: 评估请求
pub async fn evaluate_batch(evaluator: Arc<Evaluator>, requests: Vec<EvaluationRequest>) -> BatchReport {
    let max_concurrent = evaluator.max_concurrent();
    let total = requests.len();
    log_batch_startup(total, max_concurrent);

    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(total);

    for (index, request) in requests.into_iter().enumerate() {
        let title = request.project_data.title.clone();
        let evaluator = evaluator.clone();
        let semaphore = semaphore.clone();

        let handle = tokio::spawn(async move {
            // Semaphore 不会被关闭
            let _permit = semaphore.acquire_owned().await.ok();
            evaluator.evaluate_project(&request).await
        });
        handles.push((index, title, handle));
    }

    let mut report = BatchReport::default();

    for (index, title, handle) in handles {
        let result = match handle.await {
            Ok(Ok(response)) => {
                report.success += 1;
                Ok(response)
            }
            Ok(Err(e)) => {
                error!("[项目 {}] ❌ 评估失败 ({}): {}", index + 1, e.stage(), e);
                report.failed += 1;
                Err(BatchFailure::Evaluation(e))
            }
            Err(e) => {
                error!("[项目 {}] 任务执行失败: {}", index + 1, e);
                report.failed += 1;
                Err(BatchFailure::TaskAborted(e.to_string()))
            }
        };
        report.outcomes.push(BatchOutcome {
            index,
            title,
            result,
        });
    }

    info!("✓ 批量评估结束");
    print_batch_stats(report.success, report.failed, total);

    report
}
