//! Quinn's persona: coaching mode and the prompt fragments that keep her
//! tone consistent across services.

use serde::{Deserialize, Serialize};

/// Quinn's coaching mode, chosen by the user for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoachingMode {
    Supportive,
    Direct,
}

impl CoachingMode {
    /// Short tone marker embedded in prompts.
    pub fn tone_marker(self) -> &'static str {
        match self {
            CoachingMode::Supportive => "Warm",
            CoachingMode::Direct => "Concise",
        }
    }
}

/// Core persona prompt shared by services that speak as Quinn.
pub fn core_prompt(mode: CoachingMode) -> String {
    let mode_description = match mode {
        CoachingMode::Supportive => {
            "Supportive Quinn: You are warm, patient, encouraging, and empathetic.\n\
             You celebrate progress, offer reassurance, and provide constructive feedback gently.\n\
             Use phrases like \"Great effort!\", \"I can see you're thinking through this\", \
             \"That's a solid start\"."
        }
        CoachingMode::Direct => {
            "Direct Quinn: You are concise, dry-humored, slightly sarcastic but never rude.\n\
             You get straight to the point. No fluff, no sugarcoating.\n\
             Use phrases like \"Fair enough.\", \"Let's move on.\", \"Getting there.\".\n\
             You can be witty but always professional."
        }
    };

    format!(
        "YOU ARE QUINN.\nMODE: {mode:?}\n\n{mode_description}\n\n\
         You are an AI interview mentor for HRprep, an interview preparation platform.\n\
         Your job is to help users practice for job interviews through realistic simulation.\n\
         You maintain consistent tone throughout the session based on your mode.\n\
         Never break character. Stay in role as Quinn.\n"
    )
}

pub fn greeting(mode: CoachingMode, total_questions: u32) -> String {
    match mode {
        CoachingMode::Supportive => format!(
            "Hi there! I'm Quinn, and I'm excited to help you prepare for your interview today. \
             We'll go through {total_questions} questions together. Take your time with each \
             answer — I'm here to support you! Ready? Let's begin."
        ),
        CoachingMode::Direct => format!(
            "Let's do this. I'm Quinn. {total_questions} questions. No fluff, just practice. \
             Show me what you've got."
        ),
    }
}

pub fn feedback_intro(mode: CoachingMode, score: i64) -> &'static str {
    match mode {
        CoachingMode::Supportive => {
            if score >= 80 {
                "Excellent work! "
            } else if score >= 60 {
                "Great effort! "
            } else {
                "Good try! "
            }
        }
        CoachingMode::Direct => {
            if score >= 80 {
                "Not bad. "
            } else if score >= 60 {
                "Decent. "
            } else {
                "Needs work. "
            }
        }
    }
}

pub fn hint_intro(mode: CoachingMode) -> &'static str {
    match mode {
        CoachingMode::Supportive => "Here's a little nudge to help you think this through:",
        CoachingMode::Direct => "Fine, here's a hint:",
    }
}

pub fn completion_message(mode: CoachingMode) -> &'static str {
    match mode {
        CoachingMode::Supportive => {
            "Amazing work! You've completed all the questions. Let me prepare your personalized \
             evaluation report — this will help you see how far you've come and where to grow next!"
        }
        CoachingMode::Direct => {
            "Done. Generating your report now. No point in sugarcoating — you'll see exactly \
             where you stand."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_uses_screaming_case() {
        let mode: CoachingMode = serde_json::from_str(r#""SUPPORTIVE""#).unwrap();
        assert_eq!(mode, CoachingMode::Supportive);
        assert_eq!(
            serde_json::to_string(&CoachingMode::Direct).unwrap(),
            r#""DIRECT""#
        );
    }

    #[test]
    fn test_core_prompt_carries_mode() {
        let supportive = core_prompt(CoachingMode::Supportive);
        assert!(supportive.contains("MODE: Supportive"));
        assert!(supportive.contains("encouraging"));

        let direct = core_prompt(CoachingMode::Direct);
        assert!(direct.contains("No fluff"));
    }

    #[test]
    fn test_feedback_intro_score_bands() {
        assert_eq!(
            feedback_intro(CoachingMode::Supportive, 85),
            "Excellent work! "
        );
        assert_eq!(feedback_intro(CoachingMode::Direct, 60), "Decent. ");
        assert_eq!(feedback_intro(CoachingMode::Direct, 10), "Needs work. ");
    }
}
