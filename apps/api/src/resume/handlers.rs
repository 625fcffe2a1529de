//! Resume upload and analysis handlers.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::resume::judge::{judge_resume, ResumeJudgeInput, ResumeJudgeOutput};
use crate::state::AppState;

/// Uploads larger than this are rejected.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Text shorter than this is treated as a partial extraction and not judged.
const MIN_EXTRACTED_CHARS: usize = 100;

/// Extracted text is truncated to this length in the response body.
const RESPONSE_TEXT_CHARS: usize = 2000;

const KEYWORD_DICTIONARY: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "Python",
    "Java",
    "React",
    "Node.js",
    "AWS",
    "Docker",
    "Kubernetes",
    "SQL",
    "MongoDB",
    "Git",
    "Agile",
    "Scrum",
    "CI/CD",
    "Machine Learning",
    "Data Science",
    "Product Management",
    "Leadership",
    "Communication",
    "Problem Solving",
];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Extracted text, truncated for the response body.
    pub text: String,
    pub keywords: Vec<String>,
    /// "success" when enough text was extracted, "partial" otherwise.
    pub status: String,
    pub ats_score: Option<i64>,
    pub ats_analysis: Option<ResumeJudgeOutput>,
}

fn scan_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORD_DICTIONARY
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect()
}

fn extract_text(content_type: &str, data: &[u8]) -> Result<String, AppError> {
    match content_type {
        "text/plain" => Ok(String::from_utf8_lossy(data).into_owned()),
        "application/pdf" => pdf_extract::extract_text_from_mem(data)
            .map_err(|err| AppError::Validation(format!("could not parse PDF: {err}"))),
        other => Err(AppError::Validation(format!(
            "unsupported file type '{other}', only PDF and TXT are accepted"
        ))),
    }
}

/// POST /api/resume/upload
///
/// Multipart form: a `resume` file part (PDF or TXT) plus optional `role_id`,
/// `company_name` and `industry_id` text parts. When `role_id` is present and
/// enough text was extracted, the resume is also judged. The file is never
/// written to disk.
pub async fn upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut role_id: Option<String> = None;
    let mut company_name: Option<String> = None;
    let mut industry_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(format!("failed to read upload: {err}")))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation(format!(
                        "file exceeds {MAX_UPLOAD_BYTES} byte limit"
                    )));
                }
                file = Some((content_type, data));
            }
            "role_id" => role_id = read_text_field(field).await?,
            "company_name" => company_name = read_text_field(field).await?,
            "industry_id" => industry_id = read_text_field(field).await?,
            other => warn!(field = other, "ignoring unknown multipart field"),
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::Validation("no resume file uploaded".to_string()))?;

    let text = extract_text(&content_type, &data)?;
    let enough_text = text.trim().len() >= MIN_EXTRACTED_CHARS;
    let keywords = if enough_text { scan_keywords(&text) } else { vec![] };

    let ats_analysis = match (&role_id, enough_text) {
        (Some(role_id), true) => {
            let provider = state.llm.provider()?;
            let verdict = judge_resume(
                provider.as_ref(),
                &ResumeJudgeInput {
                    resume_text: text.clone(),
                    role_id: role_id.clone(),
                    company_name,
                    industry_id,
                },
            )
            .await?;
            Some(verdict)
        }
        _ => None,
    };

    info!(
        content_type = %content_type,
        bytes = data.len(),
        extracted_chars = text.len(),
        judged = ats_analysis.is_some(),
        "resume upload processed"
    );

    Ok(Json(UploadResponse {
        text: text.chars().take(RESPONSE_TEXT_CHARS).collect(),
        keywords,
        status: if enough_text { "success" } else { "partial" }.to_string(),
        ats_score: ats_analysis.as_ref().map(|a| a.resume_score),
        ats_analysis,
    }))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<Option<String>, AppError> {
    let value = field
        .text()
        .await
        .map_err(|err| AppError::Validation(format!("malformed multipart field: {err}")))?;
    Ok(if value.trim().is_empty() { None } else { Some(value) })
}

/// POST /api/resume/analyze, judging already-extracted resume text.
pub async fn analyze_resume(
    State(state): State<AppState>,
    Json(input): Json<ResumeJudgeInput>,
) -> Result<Json<ResumeJudgeOutput>, AppError> {
    let provider = state.llm.provider()?;
    let output = judge_resume(provider.as_ref(), &input).await?;
    Ok(Json(output))
}
