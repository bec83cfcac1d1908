//! 评估请求与评估结果

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Criterion, FileRef, ProgramContext, ProjectData};

/// 提交给编排器的一次评估任务
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub project_data: ProjectData,
    pub evaluation_criteria: Vec<Criterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_context: Option<ProgramContext>,
    #[serde(default)]
    pub include_file_contents: bool,
    /// 附件列表，仅在 `include_file_contents` 为 true 时读取
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRef>,
}

impl EvaluationRequest {
    pub fn new(project_data: ProjectData, evaluation_criteria: Vec<Criterion>) -> Self {
        Self {
            project_data,
            evaluation_criteria,
            ..Default::default()
        }
    }

    /// 是否需要走文件提取流程
    pub fn wants_file_contents(&self) -> bool {
        self.include_file_contents && !self.files.is_empty()
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.evaluation_criteria.iter().find(|c| c.id == id)
    }
}

/// 推荐等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    PreSelected,
    Selected,
    Rejected,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::PreSelected => "pre_selected",
            Recommendation::Selected => "selected",
            Recommendation::Rejected => "rejected",
        }
    }

    /// 解析枚举值，未知值返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pre_selected" => Some(Recommendation::PreSelected),
            "selected" => Some(Recommendation::Selected),
            "rejected" => Some(Recommendation::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 结构化分析
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    /// criterion id -> 评语
    pub observations: BTreeMap<String, String>,
}

/// 评估结果
///
/// `scores` 的每个 key 都对应请求中的一个 criterion id，
/// 且分数位于 [0, max_score] 区间内。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub scores: BTreeMap<String, f64>,
    pub notes: String,
    pub recommendation: Recommendation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
}

impl EvaluationResponse {
    /// 总分
    pub fn total_score(&self) -> f64 {
        self.scores.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_wire_format() {
        assert_eq!(
            serde_json::to_string(&Recommendation::PreSelected).unwrap(),
            "\"pre_selected\""
        );
        assert_eq!(Recommendation::parse("selected"), Some(Recommendation::Selected));
        assert_eq!(Recommendation::parse(" rejected "), Some(Recommendation::Rejected));
        assert_eq!(Recommendation::parse("maybe"), None);
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let json = r#"{
            "projectData": {"title": "Solar roofs", "description": "d", "budget": 1000, "timeline": "6 months", "tags": ["energy"]},
            "evaluationCriteria": [{"id": "c1", "name": "Impact", "description": "", "maxScore": 10, "weight": 50}],
            "includeFileContents": true,
            "files": [{"path": "uploads/a.txt", "name": "a.txt"}]
        }"#;

        let request: EvaluationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.evaluation_criteria[0].max_score, 10.0);
        assert!(request.wants_file_contents());
        assert!(request.criterion("c1").is_some());
        assert!(request.criterion("c2").is_none());
    }
}
