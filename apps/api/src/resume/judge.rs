//! Harsh resume evaluation across five weighted pillars.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

/// Resumes shorter than this cannot be meaningfully judged.
pub const MIN_RESUME_CHARS: usize = 50;

/// Resume text is truncated to this length before prompting.
const MAX_RESUME_CHARS: usize = 4000;

const RESUME_JUDGE_PROMPT: &str = "YOU ARE THE HRPREP RESUME JUDGE.\n\
\n\
You evaluate resumes with the strict, unforgiving standards used by top-tier HR \
interviewers at competitive companies.\n\
\n\
Your judgment must be:\n\
- Harshly realistic\n\
- Bluntly honest\n\
- Zero sugar-coating\n\
- No polite encouragement\n\
- No motivational tone\n\
- No softening of criticism\n\
\n\
Your goal is to give the candidate the raw truth about where their resume fails, \
so they can improve. Never try to protect their feelings.\n\
\n\
I. WHAT YOU ARE JUDGING\n\
\n\
Evaluate the resume ONLY on content quality, based on:\n\
- The selected Job Role\n\
- The Company/Industry\n\
- The Resume Text\n\
\n\
You judge strictly across five pillars:\n\
\n\
1. Role Relevance (35%): does this resume actually qualify for the job? If \
skills/projects are missing, call it out plainly. If experience is irrelevant, say so.\n\
2. Industry/Company Fit (25%): does the resume reflect understanding of the \
company's style and values? If not, say it bluntly.\n\
3. Achievements & Impact (20%): if the resume lists tasks instead of results, \
criticize it directly. If metrics are missing, point it out.\n\
4. Communication Quality (10%): if writing is messy, vague, or generic, state that clearly.\n\
5. Professionalism & Polish (10%): flag formatting inconsistencies or unclear sections.\n\
\n\
II. OUTPUT RULES\n\
\n\
Return strict JSON in this structure:\n\
\n\
{\n\
  \"resume_score\": 0,\n\
  \"role_relevance\": 0,\n\
  \"industry_fit\": 0,\n\
  \"achievements_impact\": 0,\n\
  \"communication_quality\": 0,\n\
  \"professionalism_polish\": 0,\n\
  \"strengths\": [],\n\
  \"weaknesses\": [],\n\
  \"role_fit_summary\": \"\",\n\
  \"company_fit_summary\": \"\",\n\
  \"improvement_suggestions\": []\n\
}\n\
\n\
Where:\n\
- Each score is an integer 0-100.\n\
- Strengths = 2-4 items, but ONLY if they are genuinely strong.\n\
- Weaknesses = 4-7 highly specific, blunt criticisms.\n\
- improvement_suggestions = 5-10 concrete, actionable steps (no compliments).\n\
\n\
If the resume is extremely weak it is allowed to output 0 in multiple categories \
and to say: \"This resume would likely be rejected instantly.\"\n\
\n\
III. HARSHNESS RULES\n\
\n\
- Always prioritize weaknesses over strengths.\n\
- If the resume is generic, call it out.\n\
- If the resume has NO relevance, score Role Relevance extremely low.\n\
- If the selected company is very demanding, raise the evaluation bar.\n\
- Sound like a strict HR analyst evaluating hundreds of resumes daily.\n\
\n\
IV. PROHIBITIONS\n\
\n\
Do NOT: be encouraging, soften the language, use therapy tone, insert emojis, \
give emotional support, guess or invent missing information, or alter the JSON structure.";

#[derive(Debug, Deserialize)]
pub struct ResumeJudgeInput {
    pub resume_text: String,
    pub role_id: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeJudgeOutput {
    pub resume_score: i64,
    pub role_relevance: i64,
    pub industry_fit: i64,
    pub achievements_impact: i64,
    pub communication_quality: i64,
    pub professionalism_polish: i64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub role_fit_summary: String,
    pub company_fit_summary: String,
    pub improvement_suggestions: Vec<String>,
}

impl ResumeJudgeOutput {
    fn scores(&self) -> [(&'static str, i64); 6] {
        [
            ("resume_score", self.resume_score),
            ("role_relevance", self.role_relevance),
            ("industry_fit", self.industry_fit),
            ("achievements_impact", self.achievements_impact),
            ("communication_quality", self.communication_quality),
            ("professionalism_polish", self.professionalism_polish),
        ]
    }
}

pub async fn judge_resume(
    provider: &dyn LlmProvider,
    input: &ResumeJudgeInput,
) -> Result<ResumeJudgeOutput, AppError> {
    if input.resume_text.trim().len() < MIN_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "resume text must be at least {MIN_RESUME_CHARS} characters"
        )));
    }

    let context = match (&input.company_name, &input.industry_id) {
        (Some(company), _) => format!("Target Company: {company}"),
        (None, Some(industry)) => format!("Target Industry: {industry}"),
        (None, None) => "General job market".to_string(),
    };

    let resume: String = input.resume_text.chars().take(MAX_RESUME_CHARS).collect();
    let prompt = format!(
        "{RESUME_JUDGE_PROMPT}\n\n---\n\n\
         JOB ROLE: {role}\n\
         {context}\n\n\
         RESUME TEXT:\n\"\"\"\n{resume}\n\"\"\"\n\n\
         Evaluate this resume NOW. Return ONLY valid JSON.",
        role = input.role_id,
    );

    let options = GenerationOptions::default()
        .with_temperature(0.3)
        .with_max_output_tokens(1024);

    let output: ResumeJudgeOutput = generate_json_as(provider, &prompt, &options).await?;
    for (name, score) in output.scores() {
        if !(0..=100).contains(&score) {
            return Err(AppError::OutputValidation(format!(
                "{name} {score} outside 0-100"
            )));
        }
    }

    info!(
        provider = provider.provider_name(),
        score = output.resume_score,
        role_id = %input.role_id,
        "resume judged"
    );
    Ok(output)
}
