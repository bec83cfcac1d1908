//! 本地启发式评分后端
//!
//! 不联网，也不需要 API key。分数只取决于请求内容，同样的输入总是得到同样的结果：
//!
//! ```text
//! c = 0.10 (有标题) + 0.25 × min(描述长度 / 600, 1) + 0.15 (有预算) + 0.15 (有周期)
//!   + min(0.05 × 标签数, 0.15) + 0.20 (至少一个附件提取成功)
//! r = 0.30 + 0.60 × c
//! 每个 criterion：名称中 >= 4 个字符的词出现在描述里则 r + 0.10（上限 1.0）
//! score = round(max_score × r, 1)
//! ```
//!
//! 结果中不给推荐等级，由解析器按得分率推导。

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{ScoringBackend, ScoringRequest};
use crate::error::EvaluationError;
use crate::models::{Criterion, FileContent, ProjectData, ProviderKind};
use crate::services::RawResult;

const DESCRIPTION_FULL_LENGTH: f64 = 600.0;
const BASE_RATIO: f64 = 0.30;
const COMPLETENESS_WEIGHT: f64 = 0.60;
const KEYWORD_BONUS: f64 = 0.10;
const MIN_KEYWORD_LEN: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    model: String,
}

impl MockBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// 项目信息完整度，范围 [0, 1]
pub fn completeness(project: &ProjectData, files: &[FileContent]) -> f64 {
    let mut c = 0.0;

    if !project.title.trim().is_empty() {
        c += 0.10;
    }
    let description_len = project.description.trim().chars().count() as f64;
    c += 0.25 * (description_len / DESCRIPTION_FULL_LENGTH).min(1.0);
    if !project.budget.trim().is_empty() {
        c += 0.15;
    }
    if !project.timeline.trim().is_empty() {
        c += 0.15;
    }
    let tags = project.tags.iter().filter(|t| !t.trim().is_empty()).count();
    c += (0.05 * tags as f64).min(0.15);
    if files.iter().any(|f| f.extracted_successfully) {
        c += 0.20;
    }

    c.min(1.0)
}

fn mentions_criterion(criterion: &Criterion, description_lower: &str) -> bool {
    criterion
        .name
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LEN)
        .any(|word| description_lower.contains(&word.to_lowercase()))
}

/// 单个 criterion 的启发式分数，保留一位小数
pub fn heuristic_score(criterion: &Criterion, base_ratio: f64, description_lower: &str) -> f64 {
    let mut ratio = base_ratio;
    if mentions_criterion(criterion, description_lower) {
        ratio += KEYWORD_BONUS;
    }
    let ratio = ratio.min(1.0);
    let score = (criterion.max_score * ratio * 10.0).round() / 10.0;
    criterion.clamp_score(score)
}

fn build_analysis(project: &ProjectData, files: &[FileContent], observations: Map<String, Value>) -> Value {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut opportunities = Vec::new();
    let mut risks = Vec::new();

    let fields = [
        ("title", &project.title),
        ("description", &project.description),
        ("budget", &project.budget),
        ("timeline", &project.timeline),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            weaknesses.push(format!("No {} provided", label));
        } else {
            strengths.push(format!("Submission includes a {}", label));
        }
    }

    if project.tags.is_empty() {
        opportunities.push("Add tags to clarify the project's focus areas".to_string());
    }

    let extracted = files.iter().filter(|f| f.extracted_successfully).count();
    let failed = files.len() - extracted;
    if extracted > 0 {
        strengths.push(format!("{} supporting document(s) attached", extracted));
    } else {
        opportunities.push("Attach supporting documents".to_string());
    }
    if failed > 0 {
        risks.push(format!("{} attached file(s) could not be read", failed));
    }

    json!({
        "strengths": strengths,
        "weaknesses": weaknesses,
        "opportunities": opportunities,
        "risks": risks,
        "observations": observations,
    })
}

#[async_trait]
impl ScoringBackend for MockBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn evaluate(&self, input: &ScoringRequest<'_>) -> Result<RawResult, EvaluationError> {
        let project = &input.request.project_data;
        let c = completeness(project, input.files);
        let base_ratio = BASE_RATIO + COMPLETENESS_WEIGHT * c;
        let description_lower = project.description.to_lowercase();

        let mut scores = Map::new();
        let mut observations = Map::new();
        for criterion in &input.request.evaluation_criteria {
            let score = heuristic_score(criterion, base_ratio, &description_lower);
            scores.insert(criterion.id.clone(), json!(score));
            observations.insert(
                criterion.id.clone(),
                json!(format!("Heuristic score {} of {}", score, criterion.max_score)),
            );
        }

        info!(
            "🧮 启发式评分完成: 完整度 {:.2}, {} 个评分项",
            c,
            scores.len()
        );

        Ok(RawResult::Structured(json!({
            "scores": scores,
            "notes": format!(
                "Heuristic evaluation based on submission completeness ({:.0}%).",
                c * 100.0
            ),
            "detailedAnalysis": build_analysis(project, input.files, observations),
        })))
    }
}
