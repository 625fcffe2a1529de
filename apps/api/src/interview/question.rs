//! Quinn's question services.
//!
//! Two entry points:
//! - [`generate_reply`]: the realtime interviewer turn for the 12-question
//!   HR interview (single LLM call, no chained summarization).
//! - [`generate_question`]: stateless question generation from an explicit
//!   history of previously asked questions.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::persona::{self, CoachingMode};
use crate::llm::{generate_json_as, GenerationOptions, LlmProvider};

/// Total number of questions in a Quinn interview.
pub const TOTAL_QUESTIONS: u32 = 12;

pub const EMPTY_TRANSCRIPT_MESSAGE: &str =
    "I didn't catch that — could you repeat that briefly?";

const INTERVIEWER_SYSTEM_PROMPT: &str = "\
ROLE: QUINN, HRprep's HR interviewer.
TASK: 12-question HR interview (Soft skills only. NO technical questions).
STRUCTURE:
Q1-2: Intro/Motivations
Q3-7: Behavioral (Challenge, Collaboration, Conflict, Ownership, Fit)
Q8-10: Role Aware (Strengths, Pressure, 90-Day Plan)
Q11: Deep Dive (Follow-up)
Q12: Closing

MANDATORY OUTPUT FORMAT (Per Turn):
1. Acknowledge (Short)
2. Micro-reflect (Short, shows listening)
3. Transition (Segue)
4. Next Question (Unambiguous, <30 words)

RULES:
- Tone: Match user's Coaching Mode (Supportive=Warm, Direct=Concise).
- Length: Short & conversational. Max 2-3 sentences before the question.
- Safety: No personal identifiers. Use resume only for role stability.
- End interview after Q12.";

// ────────────────────────────────────────────────────────────────────────────
// Realtime interviewer reply
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ClientState {
    /// 0-based index of the question being answered.
    pub current_question_index: u32,
    pub coaching_mode: CoachingMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewTarget {
    pub track: String,
    pub role: String,
    pub company: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct InterviewerInput {
    pub session_id: String,
    pub request_id: String,
    pub client_state: ClientState,
    pub target: InterviewTarget,
    /// Short precomputed resume summary (max ~100 words).
    pub resume_context: String,
    /// Raw transcript of the user's last answer, un-summarized.
    pub last_user_message: String,
    /// Previous Q&A pairs for context/tone memory.
    #[serde(default)]
    pub conversation_history: Vec<QaPair>,
}

#[derive(Debug, Serialize)]
pub struct InterviewerDiagnostic {
    pub model_used: String,
    pub latency_ms: u64,
    pub token_estimate: u32,
}

#[derive(Debug, Serialize)]
pub struct InterviewerOutput {
    /// Full conversational reply (acknowledge + reflect + transition + question).
    pub text: String,
    /// True only when the interview loop must end (after question 12).
    pub is_interview_complete: bool,
    pub diagnostic: InterviewerDiagnostic,
}

/// Generates Quinn's next utterance in the interview.
///
/// Guards (not errors): the post-Q12 completion message, the first-turn
/// greeting, and the empty-transcript recovery message short-circuit without
/// an LLM call. Provider failures propagate to the caller; no canned
/// question is substituted.
pub async fn generate_reply(
    provider: &dyn LlmProvider,
    input: &InterviewerInput,
) -> Result<InterviewerOutput, AppError> {
    let start = Instant::now();
    let index = input.client_state.current_question_index;
    let mode = input.client_state.coaching_mode;

    let diagnostic = |model: &str, start: Instant| InterviewerDiagnostic {
        model_used: model.to_string(),
        latency_ms: start.elapsed().as_millis() as u64,
        token_estimate: ((input.resume_context.len()
            + input.last_user_message.len()
            + INTERVIEWER_SYSTEM_PROMPT.len())
            / 4) as u32,
    };

    if index >= TOTAL_QUESTIONS {
        log_turn(input, "none", start, "early-end-guard");
        return Ok(InterviewerOutput {
            text: persona::completion_message(mode).to_string(),
            is_interview_complete: true,
            diagnostic: diagnostic("none", start),
        });
    }

    if input.last_user_message.trim().is_empty() {
        // First turn of a fresh session opens with the greeting; anywhere
        // else a missing transcript gets the recovery prompt.
        let (text, outcome) = if index == 0 && input.conversation_history.is_empty() {
            (persona::greeting(mode, TOTAL_QUESTIONS), "greeting")
        } else {
            (EMPTY_TRANSCRIPT_MESSAGE.to_string(), "empty-transcript")
        };
        log_turn(input, "none", start, outcome);
        return Ok(InterviewerOutput {
            text,
            is_interview_complete: false,
            diagnostic: diagnostic("none", start),
        });
    }

    let prompt = build_reply_prompt(input);
    let system_prompt = format!("{}\n{INTERVIEWER_SYSTEM_PROMPT}", persona::core_prompt(mode));
    let options = GenerationOptions::default()
        .with_temperature(0.7)
        .with_max_output_tokens(300)
        .with_system_prompt(system_prompt);

    let text = provider.generate_text(&prompt, &options).await?;
    let text = text.trim().to_string();
    if text.len() < 10 {
        return Err(AppError::OutputValidation(
            "interviewer reply too short or malformed".to_string(),
        ));
    }

    log_turn(input, provider.provider_name(), start, "ok");
    Ok(InterviewerOutput {
        text,
        is_interview_complete: false,
        diagnostic: diagnostic(provider.provider_name(), start),
    })
}

fn log_turn(input: &InterviewerInput, model: &str, start: Instant, outcome: &str) {
    info!(
        session_id = %input.session_id,
        request_id = %input.request_id,
        question_index = input.client_state.current_question_index,
        role = %input.target.role,
        model,
        latency_ms = start.elapsed().as_millis() as u64,
        outcome,
        "interviewer turn"
    );
}

fn build_reply_prompt(input: &InterviewerInput) -> String {
    let target = &input.target;
    let question_number = input.client_state.current_question_index + 1;

    let company_context = match (&target.company, &target.industry) {
        (Some(company), _) => format!("- Target Company: {company}\n"),
        (None, Some(industry)) => format!("- Industry: {industry}\n"),
        (None, None) => String::new(),
    };

    let resume = if input.resume_context.is_empty() {
        "Not provided"
    } else {
        &input.resume_context
    };

    // Last 3 Q&As for tone/context memory.
    let mut conversation_summary = String::new();
    if !input.conversation_history.is_empty() {
        let total = input.conversation_history.len();
        let recent = &input.conversation_history[total.saturating_sub(3)..];
        let offset = total - recent.len();
        conversation_summary.push_str("\nPrevious Conversation (for context and tone awareness):\n");
        for (i, qa) in recent.iter().enumerate() {
            let n = offset + i + 1;
            let question: String = qa.question.chars().take(100).collect();
            conversation_summary.push_str(&format!("Q{n}: {question}...\nA{n}: \"{}\"\n", qa.answer));
        }
        conversation_summary.push_str(
            "\nIMPORTANT: Adapt your tone and questions based on the candidate's \
             communication style shown above.\n",
        );
    }

    format!(
        "Context:\n\
         - Role: {role}\n\
         - Track: {track}\n\
         {company_context}\
         - Resume Summary: {resume}\n\
         - Coaching Mode: {mode:?}\n\
         - Current Question Number: {question_number} of {TOTAL_QUESTIONS}\n\n\
         IMPORTANT: {guidance}\n\
         {conversation_summary}\n\
         User's Last Answer:\n\"{answer}\"\n\n\
         Generate your response following the per-turn conversational behavior \
         (Acknowledge → Micro-reflect → Transition → Next Question).",
        role = target.role,
        track = target.track,
        mode = input.client_state.coaching_mode,
        guidance = phase_guidance(question_number),
        answer = input.last_user_message,
    )
}

/// Explicit guidance for what each question should focus on.
fn phase_guidance(question_number: u32) -> &'static str {
    match question_number {
        1 => "Q1 is INTRO. Ask them to tell you about themselves and their background.",
        2 => "Q2 is MOTIVATION. Ask what motivates them in their career.",
        3 => "Q3 is CHALLENGE. Ask about a challenging situation they handled.",
        4 => "Q4 is COLLABORATION. Ask about teamwork or collaboration.",
        5 => "Q5 is CONFLICT. Ask how they handle disagreements or conflicts.",
        6 => "Q6 is OWNERSHIP. Ask about taking ownership of a project.",
        7 => "Q7 is INDUSTRY FIT. Ask about their connection to the industry.",
        8 => "Q8 is ROLE STRENGTHS. Ask what strengths they bring to this role.",
        9 => "Q9 is PRESSURE. Ask how they handle pressure or deadlines.",
        10 => "Q10 is 90-DAY PLAN. Ask what their first 90 days would look like.",
        11 => "Q11 is DEEP DIVE. Probe a weakness or gap from earlier answers.",
        12 => "Q12 is CLOSING. Ask what sets them apart from others.",
        _ => "Follow the interview structure as defined.",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless question generation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompetencyType {
    Behavioral,
    Technical,
    Communication,
    RoleSpecific,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Deserialize)]
pub struct QuestionGenInput {
    pub track: String,
    pub role: String,
    pub quinn_mode: CoachingMode,
    pub resume_text: Option<String>,
    pub company_name: Option<String>,
    pub industry_id: Option<String>,
    /// 1-based number of the question being generated.
    pub question_number: u32,
    pub previous_questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionOutput {
    pub question: String,
    pub competency_type: CompetencyType,
    pub difficulty: Difficulty,
    pub hints_available: bool,
}

/// Builds the question-generation prompt. Pure; exercised directly in tests.
///
/// Previously asked questions are listed with a do-not-repeat instruction,
/// a best-effort signal to the model, not an enforced invariant.
pub fn build_question_prompt(input: &QuestionGenInput) -> String {
    let context = match (&input.company_name, &input.industry_id) {
        (Some(company), _) => format!("Target Company: {company}"),
        (None, Some(industry)) => format!("Industry: {industry}"),
        (None, None) => "General job market".to_string(),
    };

    let resume = input
        .resume_text
        .as_deref()
        .map(|text| {
            let summary: String = text.chars().take(400).collect();
            format!("Resume Summary: {summary}\n")
        })
        .unwrap_or_default();

    let previous = if input.previous_questions.is_empty() {
        String::new()
    } else {
        let listed = input
            .previous_questions
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Already asked (do NOT repeat or rephrase these):\n{listed}\n")
    };

    format!(
        "Role: HR Interviewer for {role} ({track} track).\n\
         Task: Generate interview question {question_number} of {TOTAL_QUESTIONS}.\n\
         Context: {context}.\n\
         {resume}\
         Tone: {tone}.\n\
         {previous}\
         Required JSON Output:\n\
         {{\n\
           \"question\": \"<the question, <30 words>\",\n\
           \"competency_type\": \"<behavioral|technical|communication|role-specific>\",\n\
           \"difficulty\": \"<easy|medium|hard>\",\n\
           \"hints_available\": true\n\
         }}",
        role = input.role,
        track = input.track,
        question_number = input.question_number,
        tone = input.quinn_mode.tone_marker(),
    )
}

pub async fn generate_question(
    provider: &dyn LlmProvider,
    input: &QuestionGenInput,
) -> Result<QuestionOutput, AppError> {
    if input.role.trim().is_empty() {
        return Err(AppError::Validation("role is required".to_string()));
    }

    let prompt = build_question_prompt(input);
    let options = GenerationOptions::default()
        .with_temperature(0.7)
        .with_max_output_tokens(256);

    let output: QuestionOutput = generate_json_as(provider, &prompt, &options).await?;
    if output.question.trim().is_empty() {
        return Err(AppError::OutputValidation(
            "generated question is empty".to_string(),
        ));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm::testing::StubProvider;

    fn interviewer_input(index: u32, last_message: &str) -> InterviewerInput {
        InterviewerInput {
            session_id: "s-1".to_string(),
            request_id: "r-1".to_string(),
            client_state: ClientState {
                current_question_index: index,
                coaching_mode: CoachingMode::Supportive,
            },
            target: InterviewTarget {
                track: "Tech".to_string(),
                role: "Backend Engineer".to_string(),
                company: None,
                industry: Some("Fintech".to_string()),
            },
            resume_context: "Five years of API work.".to_string(),
            last_user_message: last_message.to_string(),
            conversation_history: vec![],
        }
    }

    #[tokio::test]
    async fn test_reply_ends_interview_after_question_12() {
        let stub = StubProvider::text("should not be called");
        let output = generate_reply(&stub, &interviewer_input(12, "my answer"))
            .await
            .unwrap();
        assert!(output.is_interview_complete);
        assert_eq!(output.text, persona::completion_message(CoachingMode::Supportive));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_turn_greets_without_llm_call() {
        let stub = StubProvider::text("should not be called");
        let output = generate_reply(&stub, &interviewer_input(0, ""))
            .await
            .unwrap();
        assert!(!output.is_interview_complete);
        assert_eq!(
            output.text,
            persona::greeting(CoachingMode::Supportive, TOTAL_QUESTIONS)
        );
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_recovers_from_empty_transcript_without_llm_call() {
        let stub = StubProvider::text("should not be called");
        let output = generate_reply(&stub, &interviewer_input(3, "   "))
            .await
            .unwrap();
        assert!(!output.is_interview_complete);
        assert_eq!(output.text, EMPTY_TRANSCRIPT_MESSAGE);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_happy_path_reports_provider_in_diagnostic() {
        let stub = StubProvider::text("Thanks for sharing. Next: what motivates you?");
        let output = generate_reply(&stub, &interviewer_input(1, "I like building things."))
            .await
            .unwrap();
        assert!(!output.is_interview_complete);
        assert_eq!(output.diagnostic.model_used, "stub");
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reply_too_short_fails_output_validation() {
        let stub = StubProvider::text("ok");
        let err = generate_reply(&stub, &interviewer_input(1, "answer"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OutputValidation(_)));
    }

    #[tokio::test]
    async fn test_reply_provider_failure_propagates() {
        let stub = StubProvider::failing("boom");
        let err = generate_reply(&stub, &interviewer_input(1, "answer"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[test]
    fn test_reply_prompt_digests_last_three_answers_only() {
        let mut input = interviewer_input(5, "latest answer");
        input.conversation_history = (1..=5)
            .map(|n| QaPair {
                question: format!("Question {n}"),
                answer: format!("Answer {n}"),
            })
            .collect();

        let prompt = build_reply_prompt(&input);
        assert!(!prompt.contains("Answer 2"));
        assert!(prompt.contains("Q3: Question 3"));
        assert!(prompt.contains("Q5: Question 5"));
        assert!(prompt.contains("latest answer"));
    }

    #[test]
    fn test_question_prompt_round_trip() {
        let input = QuestionGenInput {
            track: "Tech".to_string(),
            role: "Backend Engineer".to_string(),
            quinn_mode: CoachingMode::Direct,
            resume_text: None,
            company_name: None,
            industry_id: None,
            question_number: 3,
            previous_questions: vec!["Q1".to_string(), "Q2".to_string()],
        };

        let prompt = build_question_prompt(&input);
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Tone: Concise"));
        assert!(prompt.contains("do NOT repeat"));
        assert!(prompt.contains("- Q1"));
        assert!(prompt.contains("- Q2"));
        assert!(prompt.contains("question 3 of 12"));
    }

    #[tokio::test]
    async fn test_generate_question_maps_typed_output() {
        let stub = StubProvider::json(json!({
            "question": "Describe a conflict you resolved.",
            "competency_type": "behavioral",
            "difficulty": "medium",
            "hints_available": true
        }));

        let input = QuestionGenInput {
            track: "Tech".to_string(),
            role: "Backend Engineer".to_string(),
            quinn_mode: CoachingMode::Supportive,
            resume_text: None,
            company_name: None,
            industry_id: None,
            question_number: 5,
            previous_questions: vec![],
        };

        let output = generate_question(&stub, &input).await.unwrap();
        assert_eq!(output.competency_type, CompetencyType::Behavioral);
        assert_eq!(output.difficulty, Difficulty::Medium);
    }
}
