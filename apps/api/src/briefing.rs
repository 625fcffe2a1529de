//! Pre-interview company briefing.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::persona::CoachingMode;
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BriefingInput {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry_id: Option<String>,
    #[serde(default)]
    pub company_size_id: Option<String>,
    pub role_id: String,
    pub quinn_mode: CoachingMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Briefing {
    pub overview: String,
    pub market_position: String,
    pub recent_news: String,
    pub culture: String,
    pub role_expectations: String,
    pub quinn_perspective: String,
}

pub async fn generate_briefing(
    provider: &dyn LlmProvider,
    input: &BriefingInput,
) -> Result<Briefing, AppError> {
    if input.role_id.trim().is_empty() {
        return Err(AppError::Validation("role_id is required".to_string()));
    }

    let context = match &input.company_name {
        Some(company) => format!("Company: {company}"),
        None => format!(
            "Industry: {}, Size: {}",
            input.industry_id.as_deref().unwrap_or("General"),
            input.company_size_id.as_deref().unwrap_or("Unspecified"),
        ),
    };

    info!(role_id = %input.role_id, context = %context, "generating briefing");

    let prompt = format!(
        "Role: Corporate Strategy Analyst.\n\
         Task: Briefing for {role}.\n\
         Context: {context}.\n\
         Output JSON:\n\
         {{\n\
           \"overview\": \"<2-3 sentences>\",\n\
           \"market_position\": \"<position/competitors>\",\n\
           \"recent_news\": \"<trends>\",\n\
           \"culture\": \"<environment>\",\n\
           \"role_expectations\": \"<expectations>\",\n\
           \"quinn_perspective\": \"<insight>\"\n\
         }}",
        role = input.role_id,
    );

    let options = GenerationOptions::default().with_temperature(0.6);
    let briefing: Briefing = generate_json_as(provider, &prompt, &options).await?;
    if briefing.overview.trim().is_empty() {
        return Err(AppError::OutputValidation(
            "briefing overview is empty".to_string(),
        ));
    }
    Ok(briefing)
}

/// POST /api/briefing
pub async fn briefing_handler(
    State(state): State<AppState>,
    Json(input): Json<BriefingInput>,
) -> Result<Json<Briefing>, AppError> {
    let provider = state.llm.provider()?;
    let briefing = generate_briefing(provider.as_ref(), &input).await?;
    Ok(Json(briefing))
}
