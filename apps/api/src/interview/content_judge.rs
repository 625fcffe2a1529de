//! Fast content judging for a single spoken answer.
//!
//! The prompt is deliberately compressed (schema plus rules, no persona
//! preamble) so it stays quick and cheap on the rate-limited Groq tier.
//! Answers under five words are scored locally without a model call.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::errors::AppError;
use crate::interview::persona::CoachingMode;
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

const JUDGE_SYSTEM_PROMPT: &str = "Role: Interview Judge. Task: Evaluate answer.\n\
Output JSON ONLY:\n\
{\n\
  \"content_score\": <0-100>,\n\
  \"content_strength\": \"<positive, max 15 words>\",\n\
  \"content_fix\": \"<constructive fix, max 15 words>\",\n\
  \"content_label\": \"<STRUCTURE|DEPTH|METRICS|CLARITY|EXAMPLES|RELEVANCE>\",\n\
  \"key_evidence\": \"<quote max 10 words or null>\",\n\
  \"suggested_rewrite\": \"<rewrite max 30 words or null>\",\n\
  \"explainability\": [{\"signal\": \"<metric>\", \"value\": <0-3>}],\n\
  \"resource_ids\": []\n\
}\n\
\n\
Rules:\n\
1. Penalize missing metrics/examples.\n\
2. Be strict but constructive.\n\
3. No hallucination.\n";

const MIN_WORDS_FOR_LLM: usize = 5;

#[derive(Debug, Deserialize)]
pub struct ContentJudgeInput {
    pub question_id: String,
    pub question_text: String,
    pub transcript: String,
    pub role: String,
    #[serde(default)]
    pub company: Option<String>,
    pub track: String,
    #[serde(default)]
    pub experience_level: Option<String>,
    pub quinn_mode: CoachingMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainabilitySignal {
    pub signal: String,
    pub value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentJudgeOutput {
    pub content_score: i64,
    pub content_strength: String,
    pub content_fix: String,
    pub content_label: String,
    pub key_evidence: Option<String>,
    pub suggested_rewrite: Option<String>,
    #[serde(default)]
    pub explainability: Vec<ExplainabilitySignal>,
    #[serde(default)]
    pub resource_ids: Vec<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

fn short_answer_result(mode: CoachingMode) -> ContentJudgeOutput {
    let strength = match mode {
        CoachingMode::Supportive => "Good start.",
        CoachingMode::Direct => "Too brief.",
    };
    ContentJudgeOutput {
        content_score: 15,
        content_strength: strength.to_string(),
        content_fix: "Add specific examples and context.".to_string(),
        content_label: "DEPTH".to_string(),
        key_evidence: None,
        suggested_rewrite: None,
        explainability: vec![ExplainabilitySignal {
            signal: "too_short".to_string(),
            value: 1,
        }],
        resource_ids: vec![],
        latency_ms: 0,
    }
}

pub async fn judge_content(
    provider: &dyn LlmProvider,
    input: &ContentJudgeInput,
) -> Result<ContentJudgeOutput, AppError> {
    let started = Instant::now();

    if input.question_id.trim().is_empty()
        || input.question_text.trim().is_empty()
        || input.transcript.trim().is_empty()
    {
        return Err(AppError::Validation(
            "question_id, question_text and transcript are required".to_string(),
        ));
    }

    let word_count = input.transcript.split_whitespace().count();
    if word_count < MIN_WORDS_FOR_LLM {
        let mut result = short_answer_result(input.quinn_mode);
        result.latency_ms = started.elapsed().as_millis() as u64;
        return Ok(result);
    }

    let context = format!(
        "Ctx: {} / {} / {}",
        input.role,
        input.experience_level.as_deref().unwrap_or("Mid"),
        input.company.as_deref().unwrap_or("Generic"),
    );
    let prompt = format!(
        "{JUDGE_SYSTEM_PROMPT}\nTone: {tone}\n{context}\nQ: \"{question}\"\nA: \"{transcript}\"",
        tone = input.quinn_mode.tone_marker(),
        question = input.question_text,
        transcript = input.transcript,
    );

    let options = GenerationOptions::default()
        .with_temperature(0.1)
        .with_max_output_tokens(512);

    let mut output: ContentJudgeOutput = generate_json_as(provider, &prompt, &options).await?;
    if !(0..=100).contains(&output.content_score) {
        return Err(AppError::OutputValidation(format!(
            "content_score {} outside 0-100",
            output.content_score
        )));
    }
    output.latency_ms = started.elapsed().as_millis() as u64;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::testing::StubProvider;

    fn input(transcript: &str) -> ContentJudgeInput {
        ContentJudgeInput {
            question_id: "q1".to_string(),
            question_text: "Tell me about a project you led.".to_string(),
            transcript: transcript.to_string(),
            role: "Backend Engineer".to_string(),
            company: None,
            track: "Tech".to_string(),
            experience_level: None,
            quinn_mode: CoachingMode::Direct,
        }
    }

    fn judge_json(score: i64) -> serde_json::Value {
        json!({
            "content_score": score,
            "content_strength": "Good metrics",
            "content_fix": "Tighten the opening",
            "content_label": "METRICS",
            "key_evidence": "cut latency by 40%",
            "suggested_rewrite": null,
            "explainability": [{"signal": "metrics", "value": 2}],
            "resource_ids": []
        })
    }

    #[tokio::test]
    async fn test_short_transcript_judged_locally() {
        let stub = StubProvider::json(judge_json(90));
        let output = judge_content(&stub, &input("I led it.")).await.unwrap();
        assert_eq!(output.content_score, 15);
        assert_eq!(output.content_strength, "Too brief.");
        assert_eq!(output.content_label, "DEPTH");
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_full_transcript_goes_to_model() {
        let stub = StubProvider::json(judge_json(78));
        let output = judge_content(
            &stub,
            &input("I led a migration of our payment service and cut latency by forty percent."),
        )
        .await
        .unwrap();
        assert_eq!(output.content_score, 78);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let stub = StubProvider::json(judge_json(50));
        let mut bad = input("a perfectly reasonable answer with enough words");
        bad.question_text = "".to_string();
        let err = judge_content(&stub, &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_score_fails() {
        let stub = StubProvider::json(judge_json(130));
        let err = judge_content(
            &stub,
            &input("This answer has more than five words in it for sure."),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::OutputValidation(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let stub = StubProvider::failing("overloaded");
        let err = judge_content(
            &stub,
            &input("This answer has more than five words in it for sure."),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
