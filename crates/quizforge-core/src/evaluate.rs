//! Answer grading.
//!
//! Synchronous and infallible: a malformed answer pattern degrades to
//! keyword matching instead of surfacing an error to the student.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::model::{CognitiveAnalysis, QuestionKind, QuestionSpec};

/// The graded outcome of a submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub feedback: String,
    pub explanation: String,
    /// Skill weights to attribute to this answer, passed through from the
    /// question spec.
    pub cognitive_analysis: CognitiveAnalysis,
}

const FEEDBACK_CORRECT: &str = "Correct! Well done.";
const FEEDBACK_INCORRECT: &str = "Not quite. Review the explanation and keep going.";

/// Grade a submitted answer against a question spec.
///
/// Multiple choice is an exact, case-sensitive match against the declared
/// correct answer. Short answer tries the declared pattern as a
/// case-insensitive regex; an invalid pattern falls back to keyword
/// containment, as does the absence of a pattern.
pub fn evaluate_answer(spec: &QuestionSpec, submitted: &str) -> Evaluation {
    let is_correct = match &spec.kind {
        QuestionKind::MultipleChoice { correct_answer, .. } => submitted == correct_answer,
        QuestionKind::ShortAnswer {
            answer_pattern,
            expected_keywords,
        } => match answer_pattern {
            Some(pattern) => match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => re.is_match(submitted),
                Err(e) => {
                    tracing::debug!("invalid answer pattern {pattern:?}, falling back to keywords: {e}");
                    matches_any_keyword(submitted, expected_keywords)
                }
            },
            None => matches_any_keyword(submitted, expected_keywords),
        },
    };

    let feedback = if is_correct {
        FEEDBACK_CORRECT
    } else {
        FEEDBACK_INCORRECT
    };

    Evaluation {
        is_correct,
        feedback: feedback.to_string(),
        explanation: spec.explanation.clone(),
        cognitive_analysis: spec.cognitive_analysis.clone(),
    }
}

/// Case-insensitive substring match against any expected keyword.
fn matches_any_keyword(submitted: &str, keywords: &[String]) -> bool {
    let lowered = submitted.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lowered.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_choice(correct: &str) -> QuestionSpec {
        QuestionSpec {
            kind: QuestionKind::MultipleChoice {
                options: vec!["Paris".into(), "London".into(), correct.into()],
                correct_answer: correct.into(),
            },
            question: "Pick one".into(),
            difficulty: 0.3,
            explanation: "Because so.".into(),
            cognitive_analysis: Default::default(),
        }
    }

    fn short_answer(pattern: Option<&str>, keywords: &[&str]) -> QuestionSpec {
        QuestionSpec {
            kind: QuestionKind::ShortAnswer {
                answer_pattern: pattern.map(str::to_string),
                expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            },
            question: "Answer in a sentence".into(),
            difficulty: 0.4,
            explanation: String::new(),
            cognitive_analysis: Default::default(),
        }
    }

    #[test]
    fn multiple_choice_exact_match() {
        let spec = multiple_choice("Berlin");
        assert!(evaluate_answer(&spec, "Berlin").is_correct);
        assert!(!evaluate_answer(&spec, "berlin").is_correct);
        assert!(!evaluate_answer(&spec, "Berlin ").is_correct);
        assert!(!evaluate_answer(&spec, "Paris").is_correct);
    }

    #[test]
    fn short_answer_pattern_is_case_insensitive() {
        let spec = short_answer(Some("paris"), &[]);
        assert!(evaluate_answer(&spec, "Paris is the capital").is_correct);
        assert!(evaluate_answer(&spec, "PARIS").is_correct);
        assert!(!evaluate_answer(&spec, "London").is_correct);
    }

    #[test]
    fn invalid_pattern_falls_back_to_keywords() {
        let spec = short_answer(Some("(unclosed"), &["paris"]);
        let eval = evaluate_answer(&spec, "I think it is Paris");
        assert!(eval.is_correct);
        let eval = evaluate_answer(&spec, "no idea");
        assert!(!eval.is_correct);
    }

    #[test]
    fn missing_pattern_uses_keywords_directly() {
        let spec = short_answer(None, &["mitochondria", "organelle"]);
        assert!(evaluate_answer(&spec, "The Mitochondria does that").is_correct);
        assert!(!evaluate_answer(&spec, "the nucleus").is_correct);
    }

    #[test]
    fn no_pattern_and_no_keywords_is_incorrect() {
        let spec = short_answer(None, &[]);
        assert!(!evaluate_answer(&spec, "anything").is_correct);
    }

    #[test]
    fn feedback_and_explanation_are_populated() {
        let spec = multiple_choice("Paris");
        let eval = evaluate_answer(&spec, "Paris");
        assert_eq!(eval.feedback, FEEDBACK_CORRECT);
        assert_eq!(eval.explanation, "Because so.");

        let eval = evaluate_answer(&spec, "London");
        assert_eq!(eval.feedback, FEEDBACK_INCORRECT);
    }

    #[test]
    fn cognitive_analysis_passes_through() {
        let mut spec = multiple_choice("Paris");
        spec.cognitive_analysis.insert("memory_retrieval".into(), 0.8);
        let eval = evaluate_answer(&spec, "Paris");
        assert_eq!(eval.cognitive_analysis.get("memory_retrieval"), Some(&0.8));
    }

    #[test]
    fn correct_option_recognized_regardless_of_option_order() {
        for correct in ["Paris", "London", "Berlin"] {
            let spec = QuestionSpec {
                kind: QuestionKind::MultipleChoice {
                    options: vec!["Berlin".into(), "Paris".into(), "London".into()],
                    correct_answer: correct.into(),
                },
                question: "Capital?".into(),
                difficulty: 0.3,
                explanation: String::new(),
                cognitive_analysis: Default::default(),
            };
            assert!(evaluate_answer(&spec, correct).is_correct);
        }
    }
}
