//! Per-answer scoring and critique.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::persona::CoachingMode;
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

#[derive(Debug, Deserialize)]
pub struct EvaluationInput {
    pub question: String,
    pub answer: String,
    pub quinn_mode: CoachingMode,
    pub role: String,
    pub competency_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub score: i64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub missing_elements: Vec<String>,
    pub suggested_structure: String,
    pub improved_sample_answer: String,
}

pub async fn evaluate_answer(
    provider: &dyn LlmProvider,
    input: &EvaluationInput,
) -> Result<EvaluationOutput, AppError> {
    if input.question.trim().is_empty() || input.answer.trim().is_empty() {
        return Err(AppError::Validation(
            "question and answer are required".to_string(),
        ));
    }

    let tone = match input.quinn_mode {
        CoachingMode::Supportive => "Constructive",
        CoachingMode::Direct => "Strict",
    };

    let prompt = format!(
        "Role: Evaluator for {role}.\n\
         Task: Score and critique answer.\n\
         Context:\n\
         Q: \"{question}\"\n\
         Type: {competency}\n\
         A: \"{answer}\"\n\
         Tone: {tone}.\n\n\
         Required JSON Output:\n\
         {{\n\
           \"score\": <0-100>,\n\
           \"strengths\": [\"<str1>\", \"<str2>\"],\n\
           \"weaknesses\": [\"<wk1>\", \"<wk2>\"],\n\
           \"missing_elements\": [\"<missing>\"],\n\
           \"suggested_structure\": \"<structure>\",\n\
           \"improved_sample_answer\": \"<brief sample>\"\n\
         }}",
        role = input.role,
        question = input.question,
        competency = input.competency_type,
        answer = input.answer,
    );

    let options = GenerationOptions::default()
        .with_temperature(0.4)
        .with_max_output_tokens(1024);

    let output: EvaluationOutput = generate_json_as(provider, &prompt, &options).await?;

    // An out-of-range score means the model ignored the rubric. Fail loudly
    // instead of clamping: a fabricated score is worse than a visible error.
    if !(0..=100).contains(&output.score) {
        return Err(AppError::OutputValidation(format!(
            "evaluation score {} outside 0-100",
            output.score
        )));
    }
    if output.suggested_structure.trim().is_empty() {
        return Err(AppError::OutputValidation(
            "suggested_structure is empty".to_string(),
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::testing::StubProvider;

    fn input() -> EvaluationInput {
        EvaluationInput {
            question: "Describe a conflict you resolved".to_string(),
            answer: "I talked to my teammate and we agreed on a process.".to_string(),
            quinn_mode: CoachingMode::Supportive,
            role: "Backend Engineer".to_string(),
            competency_type: "behavioral".to_string(),
        }
    }

    fn evaluation_json(score: i64) -> serde_json::Value {
        json!({
            "score": score,
            "strengths": ["Clear"],
            "weaknesses": ["No metrics"],
            "missing_elements": ["Outcome"],
            "suggested_structure": "STAR",
            "improved_sample_answer": "In my last role..."
        })
    }

    #[tokio::test]
    async fn test_maps_valid_evaluation() {
        let stub = StubProvider::json(evaluation_json(72));
        let output = evaluate_answer(&stub, &input()).await.unwrap();
        assert_eq!(output.score, 72);
        assert_eq!(output.strengths, vec!["Clear"]);
    }

    #[tokio::test]
    async fn test_score_150_fails_validation_not_clamped() {
        let stub = StubProvider::json(evaluation_json(150));
        let err = evaluate_answer(&stub, &input()).await.unwrap_err();
        match err {
            AppError::OutputValidation(msg) => assert!(msg.contains("150")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_negative_score_fails_validation() {
        let stub = StubProvider::json(evaluation_json(-5));
        assert!(matches!(
            evaluate_answer(&stub, &input()).await.unwrap_err(),
            AppError::OutputValidation(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_is_parse_error() {
        let stub = StubProvider::json(json!({"score": 50}));
        let err = evaluate_answer(&stub, &input()).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(crate::llm::LlmError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_empty_answer_rejected_before_llm_call() {
        let stub = StubProvider::json(evaluation_json(50));
        let err = evaluate_answer(
            &stub,
            &EvaluationInput {
                answer: "".to_string(),
                ..input()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stub.call_count(), 0);
    }
}
