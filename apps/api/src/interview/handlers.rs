//! Axum route handlers for the interview API.
//!
//! All routes are stateless: the client sends the full typed state of the
//! session with every request, and gets a typed result back. The handlers
//! only resolve the provider and delegate to the service functions.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::interview::content_judge::{judge_content, ContentJudgeInput, ContentJudgeOutput};
use crate::interview::evaluation::{evaluate_answer, EvaluationInput, EvaluationOutput};
use crate::interview::hint::{generate_hint, HintInput, HintOutput};
use crate::interview::question::{
    generate_question, generate_reply, InterviewerInput, InterviewerOutput, QuestionGenInput,
    QuestionOutput,
};
use crate::interview::report::{build_report, InterviewReport, ReportInput};
use crate::state::AppState;

/// POST /api/interview/reply
pub async fn interviewer_reply(
    State(state): State<AppState>,
    Json(input): Json<InterviewerInput>,
) -> Result<Json<InterviewerOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = generate_reply(provider.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/interview/question
pub async fn next_question(
    State(state): State<AppState>,
    Json(input): Json<QuestionGenInput>,
) -> Result<Json<QuestionOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = generate_question(provider.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/interview/hint
pub async fn question_hint(
    State(state): State<AppState>,
    Json(input): Json<HintInput>,
) -> Result<Json<HintOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = generate_hint(provider.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/interview/evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    Json(input): Json<EvaluationInput>,
) -> Result<Json<EvaluationOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = evaluate_answer(provider.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/interview/report
pub async fn final_report(
    State(state): State<AppState>,
    Json(input): Json<ReportInput>,
) -> Result<Json<InterviewReport>, AppError> {
    let provider = state.llm.provider()?;
    let output = build_report(provider.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/judge/content
pub async fn judge(
    State(state): State<AppState>,
    Json(input): Json<ContentJudgeInput>,
) -> Result<Json<ContentJudgeOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = judge_content(provider.as_ref(), &input).await?;
    Ok(Json(output))
}
