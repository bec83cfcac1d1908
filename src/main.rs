use std::sync::Arc;

use anyhow::{Context, Result};
use project_evaluator::{logger, Config, EvaluationRequest, Evaluator, LocalStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let request_path = std::env::args()
        .nth(1)
        .context("用法: project-evaluator <request.json>")?;

    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logger::init(config.verbose_logging);

    let content = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("读取请求文件失败: {}", request_path))?;
    let request: EvaluationRequest = serde_json::from_str(&content)
        .with_context(|| format!("请求文件不是合法的评估请求: {}", request_path))?;

    let storage = Arc::new(LocalStorage::new(&config.storage_root));
    let evaluator = Evaluator::from_config(&config, storage)?;

    let response = evaluator.evaluate_project(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
