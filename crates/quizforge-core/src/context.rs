//! Question-context assembly.
//!
//! Pure transformation of already-loaded session state plus in-memory
//! answer history; no network or storage access.

use crate::model::{Answer, AnswerSummary, QuestionContext, SessionState};
use crate::profile::SkillProfile;

/// Assemble the transient context for the next question-generation call.
///
/// `question_number` is 1-based. The context is rebuilt fresh for every
/// call and never persisted.
pub fn build_question_context(
    state: &SessionState,
    question_number: u32,
    answers: &[Answer],
) -> QuestionContext {
    QuestionContext {
        subject: state.subject.clone(),
        chapter: state.chapter.clone(),
        subtopic: state.subtopic.clone(),
        question_number,
        content: state.content.clone(),
        previous_answers: answers.iter().map(AnswerSummary::from).collect(),
        skill_profile: SkillProfile::from_answers(answers),
    }
}
