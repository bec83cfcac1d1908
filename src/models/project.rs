use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 项目申报数据
///
/// 核心不做任何校验，原样写入 prompt。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_budget")]
    pub budget: String,
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// 项目所属计划（program）的上下文
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramContext {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
}

impl ProgramContext {
    /// 预算区间的可读形式，两端都缺失时返回 None
    pub fn budget_range(&self) -> Option<String> {
        match (self.budget_min, self.budget_max) {
            (Some(min), Some(max)) => Some(format!("{} - {}", min, max)),
            (Some(min), None) => Some(format!("from {}", min)),
            (None, Some(max)) => Some(format!("up to {}", max)),
            (None, None) => None,
        }
    }
}

// 预算既可能是字符串也可能是数字
fn deserialize_budget<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct BudgetVisitor;

    impl<'de> Visitor<'de> for BudgetVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number representing a budget")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(BudgetVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_accepts_number_and_string() {
        let numeric: ProjectData =
            serde_json::from_str(r#"{"title": "A", "budget": 15000}"#).unwrap();
        assert_eq!(numeric.budget, "15000");

        let text: ProjectData =
            serde_json::from_str(r#"{"title": "A", "budget": "15k EUR"}"#).unwrap();
        assert_eq!(text.budget, "15k EUR");

        let null: ProjectData = serde_json::from_str(r#"{"budget": null}"#).unwrap();
        assert_eq!(null.budget, "");
    }

    #[test]
    fn test_budget_range() {
        let ctx = ProgramContext {
            name: "Green".to_string(),
            budget_min: Some(1000.0),
            budget_max: Some(5000.0),
            ..Default::default()
        };
        assert_eq!(ctx.budget_range().as_deref(), Some("1000 - 5000"));

        let open = ProgramContext {
            name: "Open".to_string(),
            ..Default::default()
        };
        assert!(open.budget_range().is_none());
    }
}
