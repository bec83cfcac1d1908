//! Prompt 组装 - 业务能力层
//!
//! 只负责把项目、评分标准、计划上下文和附件文本拼成一个 prompt，
//! 不调用后端，不解析结果。

use std::fmt::Write as _;

use crate::models::{Criterion, EvaluationRequest, ProgramContext, ProjectData};

/// 固定的评审角色说明，也作为 OpenAI 的 system message
pub const EVALUATOR_PERSONA: &str = "You are an experienced evaluator of project proposals for \
funding and acceleration programs. You assess each proposal strictly against the rubric \
provided, justify your judgement with concrete evidence from the submission and its \
attachments, and always answer in the exact JSON format requested.";

const NOT_SPECIFIED: &str = "not specified";

/// 组装评估 prompt
///
/// # 参数
/// - `request`: 评估请求
/// - `file_block`: 已渲染的附件文本块（可能为空）
///
/// # 返回
/// 完整的 prompt；附件只在 `include_file_contents` 为 true 时写入
pub fn build_evaluation_prompt(request: &EvaluationRequest, file_block: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(EVALUATOR_PERSONA);
    prompt.push_str("\n\n");

    write_project(&mut prompt, &request.project_data);

    if let Some(program) = &request.program_context {
        write_program(&mut prompt, program);
    }

    write_criteria(&mut prompt, &request.evaluation_criteria);

    if let Some(custom) = request.custom_prompt.as_deref() {
        if !custom.trim().is_empty() {
            prompt.push_str("## ADDITIONAL EVALUATOR INSTRUCTIONS\n");
            prompt.push_str(custom.trim());
            prompt.push_str("\n\n");
        }
    }

    if request.include_file_contents && !file_block.trim().is_empty() {
        prompt.push_str(file_block.trim_end());
        prompt.push_str("\n\n");
    }

    write_response_format(&mut prompt, &request.evaluation_criteria);

    prompt
}

fn or_not_specified(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        value.trim()
    }
}

fn write_project(prompt: &mut String, project: &ProjectData) {
    prompt.push_str("## PROJECT\n");
    let _ = writeln!(prompt, "Title: {}", or_not_specified(&project.title));
    let _ = writeln!(prompt, "Description: {}", or_not_specified(&project.description));
    let _ = writeln!(prompt, "Budget: {}", or_not_specified(&project.budget));
    let _ = writeln!(prompt, "Timeline: {}", or_not_specified(&project.timeline));

    let tags = if project.tags.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        project.tags.join(", ")
    };
    let _ = writeln!(prompt, "Tags: {}", tags);

    if let Some(date) = &project.submission_date {
        let _ = writeln!(prompt, "Submission date: {}", date.format("%Y-%m-%d"));
    }

    if let Some(form_data) = &project.form_data {
        if !form_data.is_empty() {
            prompt.push_str("Additional form data:\n");
            for (key, value) in form_data {
                let rendered = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let _ = writeln!(prompt, "- {}: {}", key, rendered);
            }
        }
    }
    prompt.push('\n');
}

fn write_program(prompt: &mut String, program: &ProgramContext) {
    prompt.push_str("## PROGRAM CONTEXT\n");
    let _ = writeln!(prompt, "Program: {}", or_not_specified(&program.name));
    if let Some(description) = &program.description {
        let _ = writeln!(prompt, "Description: {}", or_not_specified(description));
    }
    if let Some(partner) = &program.partner {
        let _ = writeln!(prompt, "Partner: {}", or_not_specified(partner));
    }
    if let Some(range) = program.budget_range() {
        let _ = writeln!(prompt, "Budget range: {}", range);
    }
    prompt.push('\n');
}

fn write_criteria(prompt: &mut String, criteria: &[Criterion]) {
    prompt.push_str("## EVALUATION CRITERIA\n");
    for (idx, criterion) in criteria.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. [id: {}] {} (max score: {}, weight: {})",
            idx + 1,
            criterion.id,
            criterion.name,
            criterion.max_score,
            criterion.weight
        );
        if !criterion.description.trim().is_empty() {
            let _ = writeln!(prompt, "   {}", criterion.description.trim());
        }
    }
    prompt.push('\n');
}

fn write_response_format(prompt: &mut String, criteria: &[Criterion]) {
    prompt.push_str("## RESPONSE FORMAT\n");
    prompt.push_str(
        "Respond ONLY with a single JSON object, without any text before or after it, \
         using exactly this structure:\n",
    );

    prompt.push_str("{\n  \"scores\": {\n");
    let score_lines: Vec<String> = criteria
        .iter()
        .map(|c| {
            format!(
                "    \"{}\": <number between 0 and {}>",
                c.id, c.max_score
            )
        })
        .collect();
    prompt.push_str(&score_lines.join(",\n"));
    prompt.push_str("\n  },\n");
    prompt.push_str("  \"notes\": \"<overall assessment of the project>\",\n");
    prompt.push_str("  \"recommendation\": \"pre_selected\" | \"selected\" | \"rejected\",\n");
    prompt.push_str("  \"detailedAnalysis\": {\n");
    prompt.push_str("    \"strengths\": [\"...\"],\n");
    prompt.push_str("    \"weaknesses\": [\"...\"],\n");
    prompt.push_str("    \"opportunities\": [\"...\"],\n");
    prompt.push_str("    \"risks\": [\"...\"],\n");
    prompt.push_str("    \"observations\": { \"<criterion id>\": \"<comment>\" }\n");
    prompt.push_str("  }\n}\n\n");

    prompt.push_str("Rules:\n");
    prompt.push_str("- Every criterion id listed above must appear in \"scores\".\n");
    prompt.push_str("- Each score must be a number between 0 and that criterion's max score.\n");
    prompt.push_str(
        "- \"recommendation\" must be exactly one of \"pre_selected\", \"selected\" or \"rejected\".\n",
    );
}
