use serde::{Deserialize, Serialize};

/// 评分标准中的一项
///
/// 权重由调用方给出，不要求总和为 100。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_score: f64,
    #[serde(default)]
    pub weight: f64,
}

impl Criterion {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_score: f64, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            max_score,
            weight,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// max_score 必须是正的有限数
    pub fn has_valid_max_score(&self) -> bool {
        self.max_score.is_finite() && self.max_score > 0.0
    }

    /// 把分数夹到 [0, max_score]，max_score 不合法时按 0 处理
    pub fn clamp_score(&self, score: f64) -> f64 {
        let upper = if self.has_valid_max_score() {
            self.max_score
        } else {
            0.0
        };
        score.max(0.0).min(upper)
    }
}
