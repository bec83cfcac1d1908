/// 日志工具模块
///
/// 评估开始/结束的横幅和日志预览用的文本截断
use tracing::info;

use crate::models::{EvaluationRequest, EvaluationResponse, ProviderConfig};

/// 记录单次评估开始
///
/// # 参数
/// - `request`: 评估请求
/// - `config`: 本次调用使用的后端配置（不输出 API key）
pub fn log_evaluation_start(request: &EvaluationRequest, config: &ProviderConfig) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 开始评估: {}",
        truncate_text(request.project_data.title.trim(), 60)
    );
    info!("🔧 评分后端: {} (模型: {})", config.provider, config.model);
    info!(
        "📋 评分项: {} 个, 附件: {} 个 (读取附件: {})",
        request.evaluation_criteria.len(),
        request.files.len(),
        if request.include_file_contents { "是" } else { "否" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录单次评估结果
pub fn log_evaluation_complete(response: &EvaluationResponse, max_total: f64) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 评估完成: 总分 {:.1}/{:.1}, 推荐: {}",
        response.total_score(),
        max_total,
        response.recommendation
    );
    if !response.notes.is_empty() {
        info!("📝 {}", truncate_text(&response.notes, 120));
    }
    info!("{}", "─".repeat(60));
}

/// 记录批量评估启动信息
///
/// # 参数
/// - `total`: 请求总数
/// - `max_concurrent`: 最大并发数
pub fn log_batch_startup(total: usize, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 批量评估启动 - 共 {} 个项目", total);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 打印批量评估统计
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
pub fn print_batch_stats(success: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量评估完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
