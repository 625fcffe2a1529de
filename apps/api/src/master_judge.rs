//! Whole-interview evaluation across text, voice, and video.
//!
//! Voice and video metrics are precomputed by the client and passed through
//! verbatim; the judge interprets them but never invents numbers. The final
//! weighted score is computed by the caller, not here.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};
use crate::state::AppState;

const MASTER_JUDGE_SYSTEM_PROMPT: &str = "YOU ARE THE HRPREP MASTER JUDGE.\n\
\n\
You evaluate a full HR interview based on:\n\
- All user answers (text)\n\
- Precomputed voice metrics for each answer\n\
- Precomputed video metrics for each answer\n\
- The role\n\
- The industry/company\n\
- The resume summary\n\
\n\
Your judgment must be strictly HR/behavioral and must NEVER include technical evaluation.\n\
Your output MUST be a strict JSON object conforming EXACTLY to the schema provided later.\n\
No extra text. No explanations outside JSON. No conversational prose.\n\
\n\
JUDGING PRINCIPLES:\n\
You act as an HR interviewer, behavioral psychologist, and communication coach.\n\
You evaluate what the candidate said (content), HOW they said it (voice), and HOW \
they behaved (video).\n\
\n\
TEXT JUDGE DIMENSIONS (0-5 scale each):\n\
- Clarity: Is the communication coherent and structured?\n\
- Relevance: Did they answer the question?\n\
- Specificity: Did they give concrete examples?\n\
- Ownership: Did they show personal responsibility?\n\
- Reflection: Do they demonstrate learning & awareness?\n\
- Role Alignment: Does this response fit expectations for the role/industry?\n\
\n\
VOICE METRICS (interpret only what's provided):\n\
- pace, fillers, confidence_score, volume_stability, silence_duration\n\
- Judge: Confidence, Vocal control, Energy, Calmness\n\
\n\
VIDEO METRICS (interpret only what's provided):\n\
- eye_contact_score, posture_score, expressiveness_score, engagement_score\n\
- Judge: Non-verbal confidence, Stability, Engagement, Professional presence\n\
\n\
AGGREGATED SCORES:\n\
Output three global scores (0-100 integers): text_score, voice_score, video_score.\n\
Do NOT calculate a weighted final score.\n\
\n\
BEHAVIORAL PATTERNS:\n\
Analyze the entire interview: 3 strengths, 3 weaknesses, pattern description.\n\
\n\
IMPROVEMENT PLAN:\n\
Summary paragraph + exactly 7 bullet points (7-day plan). Must be exactly 7 items.\n\
\n\
OUTPUT FORMAT - STRICT JSON ONLY:\n\
{\n\
  \"text_score\": 0,\n\
  \"voice_score\": 0,\n\
  \"video_score\": 0,\n\
  \"question_breakdown\": [\n\
    {\n\
      \"question_number\": 1,\n\
      \"question\": \"\",\n\
      \"user_answer\": \"\",\n\
      \"text_judge\": {\n\
        \"clarity\": 0,\n\
        \"relevance\": 0,\n\
        \"specificity\": 0,\n\
        \"ownership\": 0,\n\
        \"reflection\": 0,\n\
        \"alignment\": 0,\n\
        \"explanation\": \"\"\n\
      },\n\
      \"voice_metrics_used\": {},\n\
      \"video_metrics_used\": {}\n\
    }\n\
  ],\n\
  \"strengths\": [],\n\
  \"weaknesses\": [],\n\
  \"behavioral_patterns\": \"\",\n\
  \"improvement_plan\": {\n\
    \"summary\": \"\",\n\
    \"seven_day_plan\": [\"\", \"\", \"\", \"\", \"\", \"\", \"\"]\n\
  }\n\
}\n\
\n\
HARD RULES:\n\
- Never invent voice/video metric numbers\n\
- Never evaluate technical skills\n\
- Keep explanations tight";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub voice_metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub video_metrics: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct MasterJudgeInput {
    pub answers: Vec<InterviewAnswer>,
    pub role: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub resume_summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TextJudge {
    pub clarity: i64,
    pub relevance: i64,
    pub specificity: i64,
    pub ownership: i64,
    pub reflection: i64,
    pub alignment: i64,
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionBreakdown {
    pub question_number: u32,
    pub question: String,
    pub user_answer: String,
    pub text_judge: TextJudge,
    #[serde(default)]
    pub voice_metrics_used: BTreeMap<String, Value>,
    #[serde(default)]
    pub video_metrics_used: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImprovementPlan {
    pub summary: String,
    pub seven_day_plan: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MasterJudgeVerdict {
    pub text_score: i64,
    pub voice_score: i64,
    pub video_score: i64,
    pub question_breakdown: Vec<QuestionBreakdown>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub behavioral_patterns: String,
    pub improvement_plan: ImprovementPlan,
}

#[derive(Debug, Serialize)]
pub struct MasterJudgeDiagnostic {
    pub model_used: String,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct MasterJudgeOutput {
    #[serde(flatten)]
    pub verdict: MasterJudgeVerdict,
    pub diagnostic: MasterJudgeDiagnostic,
}

fn build_user_prompt(input: &MasterJudgeInput) -> Result<String, AppError> {
    let mut context = vec![format!("Role: {}", input.role)];
    match (&input.company, &input.industry) {
        (Some(company), _) => context.push(format!("Company: {company}")),
        (None, Some(industry)) => context.push(format!("Industry: {industry}")),
        (None, None) => {}
    }
    if let Some(resume) = &input.resume_summary {
        context.push(format!("Resume Summary: {resume}"));
    }

    #[derive(Serialize)]
    struct AnswerRecord<'a> {
        question_number: usize,
        question: &'a str,
        answer: &'a str,
        voice_metrics: &'a BTreeMap<String, Value>,
        video_metrics: &'a BTreeMap<String, Value>,
    }

    let records: Vec<AnswerRecord> = input
        .answers
        .iter()
        .enumerate()
        .map(|(i, a)| AnswerRecord {
            question_number: i + 1,
            question: &a.question,
            answer: &a.answer,
            voice_metrics: &a.voice_metrics,
            video_metrics: &a.video_metrics,
        })
        .collect();

    let answers_json = serde_json::to_string_pretty(&records)
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(format!(
        "CONTEXT:\n{}\n\nINTERVIEW DATA:\n{answers_json}\n\n\
         Evaluate this interview and return the JSON response.",
        context.join("\n"),
    ))
}

fn validate_verdict(verdict: &MasterJudgeVerdict) -> Result<(), AppError> {
    for (name, score) in [
        ("text_score", verdict.text_score),
        ("voice_score", verdict.voice_score),
        ("video_score", verdict.video_score),
    ] {
        if !(0..=100).contains(&score) {
            return Err(AppError::OutputValidation(format!(
                "{name} {score} outside 0-100"
            )));
        }
    }

    for entry in &verdict.question_breakdown {
        let judge = &entry.text_judge;
        for (name, score) in [
            ("clarity", judge.clarity),
            ("relevance", judge.relevance),
            ("specificity", judge.specificity),
            ("ownership", judge.ownership),
            ("reflection", judge.reflection),
            ("alignment", judge.alignment),
        ] {
            if !(0..=5).contains(&score) {
                return Err(AppError::OutputValidation(format!(
                    "question {} dimension {name} scored {score} outside 0-5",
                    entry.question_number
                )));
            }
        }
    }

    if verdict.improvement_plan.seven_day_plan.len() != 7 {
        return Err(AppError::OutputValidation(format!(
            "seven_day_plan has {} items, expected exactly 7",
            verdict.improvement_plan.seven_day_plan.len()
        )));
    }
    Ok(())
}

pub async fn evaluate_interview(
    provider: &dyn LlmProvider,
    input: &MasterJudgeInput,
) -> Result<MasterJudgeOutput, AppError> {
    let started = Instant::now();

    if input.answers.is_empty() {
        return Err(AppError::Validation("no answers provided".to_string()));
    }

    let user_prompt = build_user_prompt(input)?;
    let prompt = format!("{MASTER_JUDGE_SYSTEM_PROMPT}\n\n{user_prompt}");
    let options = GenerationOptions::default()
        .with_temperature(0.2)
        .with_max_output_tokens(2048);

    let verdict: MasterJudgeVerdict = generate_json_as(provider, &prompt, &options).await?;
    validate_verdict(&verdict)?;

    info!(
        provider = provider.provider_name(),
        answers = input.answers.len(),
        text_score = verdict.text_score,
        latency_ms = started.elapsed().as_millis() as u64,
        "master judge verdict"
    );

    Ok(MasterJudgeOutput {
        verdict,
        diagnostic: MasterJudgeDiagnostic {
            model_used: provider.provider_name().to_string(),
            latency_ms: started.elapsed().as_millis() as u64,
        },
    })
}

/// POST /api/judge/master
pub async fn master_judge_handler(
    State(state): State<AppState>,
    Json(input): Json<MasterJudgeInput>,
) -> Result<Json<MasterJudgeOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = evaluate_interview(provider.as_ref(), &input).await?;
    Ok(Json(output))
}
