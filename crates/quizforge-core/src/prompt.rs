//! Generation-request composition.
//!
//! Turns a question context plus difficulty into the two prompt strings the
//! engine dispatches to the generation provider: a fixed instruction block
//! and a per-call context block. The output contract is enforced only by
//! convention and by defensive parsing on return.

use std::fmt::Write as _;

use crate::model::{CognitiveSkill, QuestionContext, MAX_SESSION_QUESTIONS};
use crate::profile::SkillProfile;

/// The two halves of a generation request.
#[derive(Debug, Clone)]
pub struct PromptParts {
    /// Fixed instruction block (the output contract).
    pub system: String,
    /// Per-call context block.
    pub user: String,
}

/// Fixed instructions the generator must honor.
pub const GENERATION_CONTRACT: &str = r#"You are a quiz question generator for an adaptive tutoring system.

Rules you MUST follow:
- Return EXACTLY ONE question as a single JSON object. Never return a batch or an array.
- Cycle across the three cognitive skills (recall, conceptual, reasoning), weighting toward skills with a low historical correct-rate.
- Never repeat a question already asked in this session.
- A session is capped at 15 questions.
- The JSON object must contain: "type" ("multiple_choice" or "short_answer"), "question", "difficulty", "explanation", "cognitive_analysis". Multiple-choice questions add "options" and "correct_answer"; short-answer questions add "answer_pattern" and/or "expected_keywords".
- "cognitive_analysis" maps skill labels to scores greater than 0.1 and at most 1.0.
- Respond with the JSON object only, no surrounding prose."#;

/// Compose the generation request for the next question.
///
/// `history` is the student's skill profile across prior sessions on the
/// same chapter; it is merged with the current-session profile so the
/// generator can bias toward weak skills. The chapter-history fetch itself
/// is the engine's job — this function is pure.
pub fn compose_generation_request(
    context: &QuestionContext,
    difficulty: f64,
    history: &SkillProfile,
) -> PromptParts {
    let combined = context.skill_profile.merge(history);

    let mut user = String::new();
    let _ = writeln!(user, "Subject: {}", context.subject);
    let _ = writeln!(user, "Chapter: {}", context.chapter);
    let _ = writeln!(user, "Subtopic: {}", context.subtopic);
    let _ = writeln!(
        user,
        "Question {} of {}",
        context.question_number, MAX_SESSION_QUESTIONS
    );
    let _ = writeln!(user, "Target difficulty: {difficulty:.1}");
    user.push('\n');

    user.push_str("Skill profile (current session + chapter history):\n");
    for skill in CognitiveSkill::ALL {
        let stats = combined.stats(skill);
        match stats.correct_rate() {
            Some(rate) => {
                let _ = writeln!(
                    user,
                    "- {skill}: {}/{} correct ({:.0}%)",
                    stats.correct,
                    stats.count,
                    rate * 100.0
                );
            }
            None => {
                let _ = writeln!(user, "- {skill}: no attempts yet");
            }
        }
    }
    user.push('\n');

    if context.previous_answers.is_empty() {
        user.push_str("No questions answered yet in this session.\n");
    } else {
        user.push_str("Answers so far this session:\n");
        for (i, answer) in context.previous_answers.iter().enumerate() {
            let outcome = if answer.is_correct { "correct" } else { "incorrect" };
            let _ = writeln!(user, "{}. {outcome}", i + 1);
        }
    }
    user.push('\n');

    user.push_str("Ground the question in this learning content:\n");
    user.push_str(&context.content);

    PromptParts {
        system: GENERATION_CONTRACT.to_string(),
        user,
    }
}
