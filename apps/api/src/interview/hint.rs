//! Structural hints for the current question. Frameworks and cues only,
//! never a direct answer.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::persona::{self, CoachingMode};
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

#[derive(Debug, Deserialize)]
pub struct HintInput {
    pub question: String,
    pub quinn_mode: CoachingMode,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HintOutput {
    pub hint: String,
}

pub async fn generate_hint(
    provider: &dyn LlmProvider,
    input: &HintInput,
) -> Result<HintOutput, AppError> {
    if input.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".to_string()));
    }

    let tone = match input.quinn_mode {
        CoachingMode::Supportive => "Helpful",
        CoachingMode::Direct => "Direct",
    };

    let prompt = format!(
        "Role: Interview Coach.\n\
         Task: Provide a structural hint for this question (do not answer it).\n\
         Question: \"{question}\" (Role: {role})\n\
         Tone: {tone}.\n\
         Rules: No direct answers. Only frameworks/cues.\n\n\
         Required JSON Output:\n\
         {{\n  \"hint\": \"<short structural hint>\"\n}}",
        question = input.question,
        role = input.role,
    );

    let options = GenerationOptions::default()
        .with_temperature(0.3)
        .with_max_output_tokens(128);

    let mut output: HintOutput = generate_json_as(provider, &prompt, &options).await?;
    if output.hint.trim().is_empty() {
        return Err(AppError::OutputValidation(
            "generated hint is empty".to_string(),
        ));
    }
    // Quinn delivers the hint in her own voice.
    output.hint = format!(
        "{} {}",
        persona::hint_intro(input.quinn_mode),
        output.hint.trim()
    );
    Ok(output)
}
