use project_evaluator::models::Criterion;
use project_evaluator::services::{parse_response, RawResult, ScoreThresholds};
use proptest::prelude::*;

proptest! {
    #[test]
    fn parsed_scores_stay_within_bounds(
        max_a in 0.5f64..100.0,
        max_b in 0.5f64..100.0,
        raw_a in -1000.0f64..1000.0,
        raw_b in -1000.0f64..1000.0,
        as_string in any::<bool>(),
    ) {
        let criteria = vec![
            Criterion::new("a", "A", max_a, 1.0),
            Criterion::new("b", "B", max_b, 1.0),
        ];
        let b_value = if as_string {
            serde_json::json!(raw_b.to_string())
        } else {
            serde_json::json!(raw_b)
        };
        let text = format!(
            "Evaluation:\n{}",
            serde_json::json!({"scores": {"a": raw_a, "b": b_value}, "notes": "n"})
        );

        let response = parse_response(&RawResult::Text(text), &criteria, &ScoreThresholds::default())
            .unwrap();

        prop_assert!(response.scores["a"] >= 0.0 && response.scores["a"] <= max_a);
        prop_assert!(response.scores["b"] >= 0.0 && response.scores["b"] <= max_b);
        if (0.0..=max_a).contains(&raw_a) {
            prop_assert!((response.scores["a"] - raw_a).abs() < 1e-9);
        }
    }

    #[test]
    fn omitted_score_never_defaults_to_zero(max in 1.0f64..50.0, score in 0.0f64..50.0) {
        let criteria = vec![
            Criterion::new("kept", "Kept", max, 1.0),
            Criterion::new("dropped", "Dropped", max, 1.0),
        ];
        let text = serde_json::json!({"scores": {"kept": score}}).to_string();

        let result = parse_response(&RawResult::Text(text), &criteria, &ScoreThresholds::default());
        prop_assert!(result.is_err());
    }
}
