//! Post-interview report assembly.
//!
//! Each section is its own prompt/call so a long interview stays inside the
//! per-call token caps; [`build_report`] runs them all and combines the
//! results. The per-question breakdown is computed locally from the stored
//! evaluations, with no LLM involved.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::persona::{self, CoachingMode};
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSummary {
    pub score: i64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
    pub evaluation: EvaluationSummary,
}

#[derive(Debug, Deserialize)]
pub struct ReportInput {
    pub answers: Vec<AnsweredQuestion>,
    pub quinn_mode: CoachingMode,
    pub role: String,
    pub track: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: String,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct BreakdownEntry {
    pub question: String,
    pub score: i64,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct InterviewReport {
    pub summary: String,
    pub skill_matrix: Vec<SkillScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub breakdown: Vec<BreakdownEntry>,
    pub improvement_plan: Vec<String>,
}

fn average_score(answers: &[AnsweredQuestion]) -> i64 {
    let sum: i64 = answers.iter().map(|a| a.evaluation.score).sum();
    (sum as f64 / answers.len() as f64).round() as i64
}

pub async fn generate_summary(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<String, AppError> {
    let avg = average_score(&input.answers);
    let observations = input
        .answers
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "Q{}: {}",
                i + 1,
                a.evaluation.strengths.first().map_or("N/A", |s| s.as_str())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Role: Post-Interview Reporter.\n\
         Task: Summarize performance.\n\
         Context: Role {role}, Avg Score {avg}/100.\n\
         Observations:\n{observations}\n\n\
         Output JSON: {{ \"summary\": \"<2-3 sentence personalized summary>\" }}",
        role = input.role,
    );

    #[derive(Deserialize)]
    struct SummaryOutput {
        summary: String,
    }

    let options = GenerationOptions::default().with_temperature(0.5);
    let output: SummaryOutput = generate_json_as(provider, &prompt, &options).await?;
    if output.summary.trim().is_empty() {
        return Err(AppError::OutputValidation("report summary is empty".to_string()));
    }
    Ok(output.summary)
}

pub async fn generate_skill_matrix(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<Vec<SkillScore>, AppError> {
    let digest = input
        .answers
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let snippet: String = a.answer.chars().take(50).collect();
            format!("Q{} ({}): {snippet}...", i + 1, a.evaluation.score)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Role: HR Analyst.\n\
         Task: Create skill matrix (5 skills) based on answers for {role}.\n\
         Scores 0-100.\n\n\
         Output JSON: {{ \"skill_matrix\": [{{ \"skill\": \"<name>\", \"score\": <number> }}] }}\n\
         Answers:\n{digest}",
        role = input.role,
    );

    #[derive(Deserialize)]
    struct MatrixOutput {
        skill_matrix: Vec<SkillScore>,
    }

    let options = GenerationOptions::default().with_temperature(0.4);
    let output: MatrixOutput = generate_json_as(provider, &prompt, &options).await?;
    for entry in &output.skill_matrix {
        if !(0..=100).contains(&entry.score) {
            return Err(AppError::OutputValidation(format!(
                "skill '{}' scored {} outside 0-100",
                entry.skill, entry.score
            )));
        }
    }
    Ok(output.skill_matrix)
}

pub async fn generate_strengths(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<Vec<String>, AppError> {
    let all: Vec<&str> = input
        .answers
        .iter()
        .flat_map(|a| a.evaluation.strengths.iter().map(String::as_str))
        .take(10)
        .collect();

    let prompt = format!(
        "Task: Consolidate strengths into 3-4 bullet points.\n\
         Input: {}\n\
         Output JSON: {{ \"strengths\": [\"<str1>\", \"<str2>\", \"<str3>\"] }}",
        all.join(", ")
    );

    #[derive(Deserialize)]
    struct StrengthsOutput {
        strengths: Vec<String>,
    }

    let options = GenerationOptions::default().with_temperature(0.4);
    let output: StrengthsOutput = generate_json_as(provider, &prompt, &options).await?;
    Ok(output.strengths)
}

pub async fn generate_weaknesses(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<Vec<String>, AppError> {
    let all: Vec<&str> = input
        .answers
        .iter()
        .flat_map(|a| a.evaluation.weaknesses.iter().map(String::as_str))
        .take(10)
        .collect();

    let prompt = format!(
        "Task: Consolidate improvements into 3-4 constructive bullet points.\n\
         Input: {}\n\
         Output JSON: {{ \"weaknesses\": [\"<wk1>\", \"<wk2>\", \"<wk3>\"] }}",
        all.join(", ")
    );

    #[derive(Deserialize)]
    struct WeaknessesOutput {
        weaknesses: Vec<String>,
    }

    let options = GenerationOptions::default().with_temperature(0.4);
    let output: WeaknessesOutput = generate_json_as(provider, &prompt, &options).await?;
    Ok(output.weaknesses)
}

/// Per-question breakdown from stored evaluations, opened with Quinn's
/// score-band intro. No LLM call.
pub fn build_breakdown(answers: &[AnsweredQuestion], mode: CoachingMode) -> Vec<BreakdownEntry> {
    answers
        .iter()
        .map(|a| BreakdownEntry {
            question: a.question.clone(),
            score: a.evaluation.score,
            feedback: match a.evaluation.strengths.first() {
                Some(strength) => format!(
                    "{}{strength}. {}",
                    persona::feedback_intro(mode, a.evaluation.score),
                    a.evaluation.weaknesses.first().map_or("", |w| w.as_str())
                ),
                None => "No detailed feedback available.".to_string(),
            },
        })
        .collect()
}

pub async fn generate_improvement_plan(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<Vec<String>, AppError> {
    let weaknesses: Vec<&str> = input
        .answers
        .iter()
        .flat_map(|a| a.evaluation.weaknesses.iter().map(String::as_str))
        .take(5)
        .collect();

    let prompt = format!(
        "Task: Create 4-step improvement plan for {role}.\n\
         Weaknesses: {}\n\
         Output JSON: {{ \"improvement_plan\": [\"Step 1:...\", \"Step 2:...\", ...] }}",
        weaknesses.join(", "),
        role = input.role,
    );

    #[derive(Deserialize)]
    struct PlanOutput {
        improvement_plan: Vec<String>,
    }

    let options = GenerationOptions::default().with_temperature(0.5);
    let output: PlanOutput = generate_json_as(provider, &prompt, &options).await?;
    if output.improvement_plan.is_empty() {
        return Err(AppError::OutputValidation(
            "improvement plan is empty".to_string(),
        ));
    }
    Ok(output.improvement_plan)
}

/// Runs every report section. An empty answer set is a caller error; no
/// fictional scores are generated for answers that don't exist.
pub async fn build_report(
    provider: &dyn LlmProvider,
    input: &ReportInput,
) -> Result<InterviewReport, AppError> {
    if input.answers.is_empty() {
        return Err(AppError::Validation(
            "at least one answered question is required".to_string(),
        ));
    }

    let summary = generate_summary(provider, input).await?;
    let skill_matrix = generate_skill_matrix(provider, input).await?;
    let strengths = generate_strengths(provider, input).await?;
    let weaknesses = generate_weaknesses(provider, input).await?;
    let improvement_plan = generate_improvement_plan(provider, input).await?;

    Ok(InterviewReport {
        summary,
        skill_matrix,
        strengths,
        weaknesses,
        breakdown: build_breakdown(&input.answers, input.quinn_mode),
        improvement_plan,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::testing::StubProvider;

    fn answered(score: i64) -> AnsweredQuestion {
        AnsweredQuestion {
            question: "Tell me about yourself".to_string(),
            answer: "I build backend systems.".to_string(),
            evaluation: EvaluationSummary {
                score,
                strengths: vec!["Concise".to_string()],
                weaknesses: vec!["No metrics".to_string()],
            },
        }
    }

    fn input() -> ReportInput {
        ReportInput {
            answers: vec![answered(80), answered(60)],
            quinn_mode: CoachingMode::Direct,
            role: "Backend Engineer".to_string(),
            track: "Tech".to_string(),
        }
    }

    #[test]
    fn test_average_score_rounds() {
        assert_eq!(average_score(&input().answers), 70);
        assert_eq!(average_score(&[answered(1), answered(2)]), 2);
    }

    #[test]
    fn test_breakdown_is_pure_and_per_question() {
        let breakdown = build_breakdown(&input().answers, CoachingMode::Direct);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].score, 80);
        assert!(breakdown[0].feedback.starts_with("Not bad. "));
        assert!(breakdown[0].feedback.contains("Concise"));
        assert!(breakdown[0].feedback.contains("No metrics"));
        assert!(breakdown[1].feedback.starts_with("Decent. "));
    }

    #[tokio::test]
    async fn test_skill_matrix_rejects_out_of_range_scores() {
        let stub = StubProvider::json(json!({
            "skill_matrix": [{"skill": "Communication", "score": 120}]
        }));
        let err = generate_skill_matrix(&stub, &input()).await.unwrap_err();
        assert!(matches!(err, AppError::OutputValidation(_)));
    }

    #[tokio::test]
    async fn test_build_report_rejects_empty_answers() {
        let stub = StubProvider::json(json!({}));
        let empty = ReportInput {
            answers: vec![],
            ..input()
        };
        let err = build_report(&stub, &empty).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_failure_propagates() {
        let stub = StubProvider::failing("down");
        let err = build_report(&stub, &input()).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
