//! Difficulty estimation from the running correctness trail.

use crate::model::AnswerSummary;

/// Lowest difficulty, used when the student has no history yet.
pub const BASE_DIFFICULTY: f64 = 0.3;
/// Difficulty ceiling.
pub const MAX_DIFFICULTY: f64 = 0.9;
/// Difficulty gained per correct answer.
const STEP: f64 = 0.1;

/// Map the session's previous answers to a difficulty in
/// [[`BASE_DIFFICULTY`], [`MAX_DIFFICULTY`]].
///
/// Purely a function of the count of correct answers: not skill-aware, not
/// recency-weighted. Saturates after 6 correct answers; this is a
/// compatibility-critical property, not a bug.
pub fn estimate_difficulty(previous: &[AnswerSummary]) -> f64 {
    if previous.is_empty() {
        return BASE_DIFFICULTY;
    }
    let correct = previous.iter().filter(|a| a.is_correct).count();
    (BASE_DIFFICULTY + STEP * correct as f64).min(MAX_DIFFICULTY)
}
