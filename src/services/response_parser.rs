//! 响应解析与校验 - 业务能力层
//!
//! 后端返回的内容一律视为不可信输入：
//! 1. 从文本中定位 JSON 对象（允许前后有说明文字或代码块）
//! 2. 每个 criterion 都必须有分数，缺失即失败，不补 0
//! 3. 分数夹到 [0, max_score]
//! 4. 推荐等级优先取返回值，否则按得分率和阈值推导

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ParseFailure, ResponseParseError};
use crate::models::{Criterion, DetailedAnalysis, EvaluationResponse, Recommendation};

/// 后端的原始结果
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// 外部服务返回的文本
    Text(String),
    /// 本地后端直接给出的结构化结果
    Structured(Value),
}

/// 推荐等级阈值（得分率）
///
/// - ratio < pre_selected → rejected
/// - pre_selected <= ratio < selected → pre_selected
/// - ratio >= selected → selected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreThresholds {
    pub pre_selected: f64,
    pub selected: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            pre_selected: 0.5,
            selected: 0.75,
        }
    }
}

impl ScoreThresholds {
    /// 需满足 0 <= pre_selected <= selected <= 1
    pub fn new(pre_selected: f64, selected: f64) -> Option<Self> {
        let valid = (0.0..=1.0).contains(&pre_selected)
            && (0.0..=1.0).contains(&selected)
            && pre_selected <= selected;
        valid.then_some(Self {
            pre_selected,
            selected,
        })
    }

    pub fn recommend(&self, ratio: f64) -> Recommendation {
        if ratio >= self.selected {
            Recommendation::Selected
        } else if ratio >= self.pre_selected {
            Recommendation::PreSelected
        } else {
            Recommendation::Rejected
        }
    }
}

/// 得分率：总分 / 满分，满分为 0 时返回 0
pub fn score_ratio(scores: &BTreeMap<String, f64>, criteria: &[Criterion]) -> f64 {
    let max_total: f64 = criteria.iter().map(|c| c.max_score).sum();
    if max_total <= 0.0 {
        return 0.0;
    }
    let total: f64 = criteria
        .iter()
        .filter_map(|c| scores.get(&c.id))
        .sum();
    total / max_total
}

fn fenced_block_regex() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

/// 从文本中定位 JSON 对象
///
/// 优先取 ```json 代码块，其次依次尝试每个括号平衡的 `{...}`，
/// 取第一个能解析为 JSON 对象的；都不行时退化为第一个 `{` 到最后一个 `}`。
pub fn extract_json_object(raw: &str) -> Option<&str> {
    if let Some(captures) = fenced_block_regex().and_then(|re| re.captures(raw)) {
        if let Some(body) = captures.get(1) {
            return Some(body.as_str());
        }
    }

    let first = raw.find('{')?;

    // 说明文字里可能有 `{criterionId}` 之类的片段
    let mut offset = first;
    while let Some(pos) = raw[offset..].find('{') {
        let start = offset + pos;
        if let Some(end) = balanced_object_end(&raw[start..]) {
            let candidate = &raw[start..start + end];
            if is_json_object(candidate) {
                return Some(candidate);
            }
        }
        offset = start + 1;
    }

    let end = raw.rfind('}')?;
    (end > first).then(|| &raw[first..=end])
}

fn is_json_object(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate)
        .map(|value| value.is_object())
        .unwrap_or(false)
}

/// 返回平衡对象结束位置（不含），字符串中的括号不计数
fn balanced_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// 解析后端结果
///
/// # 参数
/// - `raw`: 后端原始结果
/// - `criteria`: 请求中的评分标准
/// - `thresholds`: 推导推荐等级时使用的阈值
///
/// # 返回
/// 校验后的评估结果；任何结构问题都返回带原始文本的 `ResponseParseError`
pub fn parse_response(
    raw: &RawResult,
    criteria: &[Criterion],
    thresholds: &ScoreThresholds,
) -> Result<EvaluationResponse, ResponseParseError> {
    match raw {
        RawResult::Text(text) => {
            let json = extract_json_object(text)
                .ok_or_else(|| ResponseParseError::new(ParseFailure::NoJsonObject, text.as_str()))?;
            let value: Value = serde_json::from_str(json).map_err(|e| {
                ResponseParseError::new(ParseFailure::InvalidJson(e.to_string()), text.as_str())
            })?;
            validate_payload(&value, criteria, thresholds)
                .map_err(|reason| ResponseParseError::new(reason, text.as_str()))
        }
        RawResult::Structured(value) => validate_payload(value, criteria, thresholds)
            .map_err(|reason| ResponseParseError::new(reason, value.to_string())),
    }
}

/// 校验已解析的 JSON
pub fn validate_payload(
    value: &Value,
    criteria: &[Criterion],
    thresholds: &ScoreThresholds,
) -> Result<EvaluationResponse, ParseFailure> {
    let payload = value
        .as_object()
        .ok_or_else(|| ParseFailure::InvalidShape("top-level value is not an object".to_string()))?;

    let scores = parse_scores(payload, criteria)?;

    let notes = match payload.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ParseFailure::InvalidShape(
                "\"notes\" is not a string".to_string(),
            ))
        }
    };

    let explicit = match payload.get("recommendation").and_then(Value::as_str) {
        Some(value) => {
            let parsed = Recommendation::parse(value);
            if parsed.is_none() {
                warn!("⚠️ 无法识别的推荐等级 '{}'，改为按得分推导", value);
            }
            parsed
        }
        None => None,
    };
    let recommendation = match explicit {
        Some(recommendation) => recommendation,
        None => {
            let ratio = score_ratio(&scores, criteria);
            let derived = thresholds.recommend(ratio);
            debug!("按得分率 {:.3} 推导推荐等级: {}", ratio, derived);
            derived
        }
    };

    let analysis_value = payload
        .get("detailedAnalysis")
        .or_else(|| payload.get("detailed_analysis"));
    let detailed_analysis = match analysis_value {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_analysis(value, criteria)?),
    };

    Ok(EvaluationResponse {
        scores,
        notes,
        recommendation,
        detailed_analysis,
    })
}

fn parse_scores(
    payload: &Map<String, Value>,
    criteria: &[Criterion],
) -> Result<BTreeMap<String, f64>, ParseFailure> {
    let raw_scores = payload
        .get("scores")
        .and_then(Value::as_object)
        .ok_or_else(|| ParseFailure::InvalidShape("missing \"scores\" object".to_string()))?;

    let mut scores = BTreeMap::new();
    for criterion in criteria {
        if !criterion.has_valid_max_score() {
            return Err(ParseFailure::InvalidShape(format!(
                "criterion '{}' has invalid maxScore {}",
                criterion.id, criterion.max_score
            )));
        }

        let value = match raw_scores.get(&criterion.id) {
            None | Some(Value::Null) => return Err(ParseFailure::MissingScore(criterion.id.clone())),
            Some(value) => value,
        };

        let score = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|s| s.is_finite())
        .ok_or_else(|| ParseFailure::InvalidScore(criterion.id.clone()))?;

        let clamped = criterion.clamp_score(score);
        if clamped != score {
            debug!(
                "评分项 {} 的分数 {} 超出范围 [0, {}]，已截断为 {}",
                criterion.id, score, criterion.max_score, clamped
            );
        }
        scores.insert(criterion.id.clone(), clamped);
    }

    let extra = raw_scores
        .keys()
        .filter(|key| !criteria.iter().any(|c| &c.id == *key))
        .count();
    if extra > 0 {
        debug!("忽略 {} 个未知评分项", extra);
    }

    Ok(scores)
}

fn parse_analysis(value: &Value, criteria: &[Criterion]) -> Result<DetailedAnalysis, ParseFailure> {
    let section = value
        .as_object()
        .ok_or_else(|| ParseFailure::InvalidAnalysis("not an object".to_string()))?;

    let mut observations = BTreeMap::new();
    match section.get("observations") {
        None | Some(Value::Null) => {}
        Some(Value::Object(entries)) => {
            for (id, text) in entries {
                let text = text.as_str().ok_or_else(|| {
                    ParseFailure::InvalidAnalysis(format!("observation '{}' is not a string", id))
                })?;
                if criteria.iter().any(|c| &c.id == id) {
                    observations.insert(id.clone(), text.to_string());
                } else {
                    debug!("忽略未知评分项 '{}' 的评语", id);
                }
            }
        }
        Some(_) => {
            return Err(ParseFailure::InvalidAnalysis(
                "\"observations\" is not an object".to_string(),
            ))
        }
    }

    Ok(DetailedAnalysis {
        strengths: string_list(section, "strengths")?,
        weaknesses: string_list(section, "weaknesses")?,
        opportunities: string_list(section, "opportunities")?,
        risks: string_list(section, "risks")?,
        observations,
    })
}

fn string_list(section: &Map<String, Value>, key: &str) -> Result<Vec<String>, ParseFailure> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ParseFailure::InvalidAnalysis(format!("\"{}\" must contain only strings", key))
                })
            })
            .collect(),
        Some(_) => Err(ParseFailure::InvalidAnalysis(format!(
            "\"{}\" is not an array",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criteria() -> Vec<Criterion> {
        vec![
            Criterion::new("impact", "Impact", 10.0, 50.0),
            Criterion::new("team", "Team", 5.0, 50.0),
        ]
    }

    fn parse_text(text: &str) -> Result<EvaluationResponse, ResponseParseError> {
        parse_response(
            &RawResult::Text(text.to_string()),
            &criteria(),
            &ScoreThresholds::default(),
        )
    }

    #[test]
    fn test_plain_json() {
        let response = parse_text(
            r#"{"scores": {"impact": 8, "team": 4}, "notes": "Good", "recommendation": "selected"}"#,
        )
        .unwrap();

        assert_eq!(response.scores["impact"], 8.0);
        assert_eq!(response.scores["team"], 4.0);
        assert_eq!(response.notes, "Good");
        assert_eq!(response.recommendation, Recommendation::Selected);
        assert!(response.detailed_analysis.is_none());
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let text = "Here is my evaluation:\n```json\n{\"scores\": {\"impact\": 6, \"team\": 3}, \"notes\": \"ok\"}\n```\nThanks!";
        let response = parse_text(text).unwrap();
        assert_eq!(response.scores["impact"], 6.0);
    }

    #[test]
    fn test_json_surrounded_by_prose() {
        let text = "Sure! {\"scores\": {\"impact\": 2, \"team\": 1}, \"notes\": \"needs {work}\"} Let me know.";
        let response = parse_text(text).unwrap();
        assert_eq!(response.notes, "needs {work}");
    }

    #[test]
    fn test_extract_json_object_variants() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("a {\"x\": 1} b {\"y\": 2}"), Some("{\"x\": 1}"));
        assert_eq!(
            extract_json_object("{\"s\": \"brace } in string\"}"),
            Some("{\"s\": \"brace } in string\"}")
        );
        // 不平衡时退化为首尾括号
        assert_eq!(extract_json_object("{ { }"), Some("{ { }"));
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn test_braces_in_prose_before_payload() {
        let text = "I scored each {criterionId} as requested:\n{\"scores\": {\"impact\": 7, \"team\": 3}, \"notes\": \"ok\"}";
        assert_eq!(
            extract_json_object(text),
            Some("{\"scores\": {\"impact\": 7, \"team\": 3}, \"notes\": \"ok\"}")
        );

        let response = parse_text(text).unwrap();
        assert_eq!(response.scores["impact"], 7.0);
        assert_eq!(response.notes, "ok");
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let raw = "{\"scores\": {\"impact\": 8,, }";
        let err = parse_text(raw).unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidJson(_)));
        assert_eq!(err.raw_text, raw);
    }

    #[test]
    fn test_no_json_object() {
        let err = parse_text("I cannot evaluate this project.").unwrap_err();
        assert_eq!(err.reason, ParseFailure::NoJsonObject);
        assert_eq!(err.raw_text, "I cannot evaluate this project.");
    }

    #[test]
    fn test_missing_score_is_failure_not_zero() {
        let err = parse_text(r#"{"scores": {"impact": 8}, "notes": ""}"#).unwrap_err();
        assert_eq!(err.reason, ParseFailure::MissingScore("team".to_string()));

        let err = parse_text(r#"{"scores": {"impact": 8, "team": null}}"#).unwrap_err();
        assert_eq!(err.reason, ParseFailure::MissingScore("team".to_string()));
    }

    #[test]
    fn test_missing_scores_object() {
        let err = parse_text(r#"{"notes": "no scores"}"#).unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidShape(_)));
    }

    #[test]
    fn test_scores_are_clamped_and_coerced() {
        let response =
            parse_text(r#"{"scores": {"impact": 14.5, "team": "-2"}, "notes": ""}"#).unwrap();
        assert_eq!(response.scores["impact"], 10.0);
        assert_eq!(response.scores["team"], 0.0);
    }

    #[test]
    fn test_invalid_max_score_is_parse_error() {
        let criteria = vec![Criterion::new("impact", "Impact", -1.0, 1.0)];
        let err = parse_response(
            &RawResult::Text(r#"{"scores": {"impact": 5}}"#.to_string()),
            &criteria,
            &ScoreThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidShape(_)));

        let criteria = vec![Criterion::new("impact", "Impact", f64::NAN, 1.0)];
        let err = validate_payload(
            &serde_json::json!({"scores": {"impact": 5}}),
            &criteria,
            &ScoreThresholds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseFailure::InvalidShape(_)));
    }

    #[test]
    fn test_non_numeric_score_rejected() {
        let err = parse_text(r#"{"scores": {"impact": "high", "team": 3}}"#).unwrap_err();
        assert_eq!(err.reason, ParseFailure::InvalidScore("impact".to_string()));

        let err = parse_text(r#"{"scores": {"impact": [1], "team": 3}}"#).unwrap_err();
        assert_eq!(err.reason, ParseFailure::InvalidScore("impact".to_string()));
    }

    #[test]
    fn test_unknown_score_keys_dropped() {
        let response =
            parse_text(r#"{"scores": {"impact": 5, "team": 2, "bogus": 99}}"#).unwrap();
        assert_eq!(response.scores.len(), 2);
        assert!(!response.scores.contains_key("bogus"));
    }

    #[test]
    fn test_recommendation_derived_from_ratio() {
        // 13/15 = 0.87
        let high = parse_text(r#"{"scores": {"impact": 9, "team": 4}}"#).unwrap();
        assert_eq!(high.recommendation, Recommendation::Selected);

        // 9/15 = 0.6
        let mid = parse_text(r#"{"scores": {"impact": 6, "team": 3}}"#).unwrap();
        assert_eq!(mid.recommendation, Recommendation::PreSelected);

        // 3/15 = 0.2
        let low = parse_text(r#"{"scores": {"impact": 2, "team": 1}}"#).unwrap();
        assert_eq!(low.recommendation, Recommendation::Rejected);
    }

    #[test]
    fn test_unrecognized_recommendation_falls_back_to_derived() {
        let response = parse_text(
            r#"{"scores": {"impact": 2, "team": 1}, "recommendation": "strongly_recommended"}"#,
        )
        .unwrap();
        assert_eq!(response.recommendation, Recommendation::Rejected);
    }

    #[test]
    fn test_explicit_recommendation_wins() {
        let response =
            parse_text(r#"{"scores": {"impact": 1, "team": 1}, "recommendation": "selected"}"#)
                .unwrap();
        assert_eq!(response.recommendation, Recommendation::Selected);
    }

    #[test]
    fn test_threshold_boundaries() {
        let thresholds = ScoreThresholds::default();
        assert_eq!(thresholds.recommend(0.4999), Recommendation::Rejected);
        assert_eq!(thresholds.recommend(0.5), Recommendation::PreSelected);
        assert_eq!(thresholds.recommend(0.7499), Recommendation::PreSelected);
        assert_eq!(thresholds.recommend(0.75), Recommendation::Selected);
        assert_eq!(thresholds.recommend(1.0), Recommendation::Selected);

        assert!(ScoreThresholds::new(0.8, 0.6).is_none());
        assert!(ScoreThresholds::new(-0.1, 0.6).is_none());
        assert!(ScoreThresholds::new(0.6, 0.6).is_some());
    }

    #[test]
    fn test_empty_rubric_ratio_is_zero() {
        assert_eq!(score_ratio(&BTreeMap::new(), &[]), 0.0);
    }

    #[test]
    fn test_detailed_analysis_passthrough() {
        let response = parse_text(
            r#"{
                "scores": {"impact": 7, "team": 4},
                "notes": "n",
                "detailedAnalysis": {
                    "strengths": ["clear goals"],
                    "risks": ["weather"],
                    "observations": {"impact": "strong", "ghost": "dropped"}
                }
            }"#,
        )
        .unwrap();

        let analysis = response.detailed_analysis.unwrap();
        assert_eq!(analysis.strengths, vec!["clear goals"]);
        assert!(analysis.weaknesses.is_empty());
        assert!(analysis.opportunities.is_empty());
        assert_eq!(analysis.risks, vec!["weather"]);
        assert_eq!(analysis.observations.len(), 1);
        assert_eq!(analysis.observations["impact"], "strong");
    }

    #[test]
    fn test_detailed_analysis_wrong_shape() {
        let err = parse_text(
            r#"{"scores": {"impact": 7, "team": 4}, "detailedAnalysis": {"strengths": "many"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidAnalysis(_)));

        let err = parse_text(
            r#"{"scores": {"impact": 7, "team": 4}, "detailedAnalysis": {"risks": [1, 2]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidAnalysis(_)));

        let err = parse_text(r#"{"scores": {"impact": 7, "team": 4}, "detailedAnalysis": []}"#)
            .unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidAnalysis(_)));
    }

    #[test]
    fn test_notes_must_be_string() {
        let err = parse_text(r#"{"scores": {"impact": 7, "team": 4}, "notes": 42}"#).unwrap_err();
        assert!(matches!(err.reason, ParseFailure::InvalidShape(_)));
    }

    #[test]
    fn test_structured_result() {
        let value = json!({"scores": {"impact": 10, "team": 5}, "notes": "local"});
        let response = parse_response(
            &RawResult::Structured(value),
            &criteria(),
            &ScoreThresholds::default(),
        )
        .unwrap();
        assert_eq!(response.recommendation, Recommendation::Selected);

        let err = parse_response(
            &RawResult::Structured(json!(["not", "an", "object"])),
            &criteria(),
            &ScoreThresholds::default(),
        )
        .unwrap_err();
        assert!(err.raw_text.contains("not"));
    }
}
