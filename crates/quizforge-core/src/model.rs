//! Core data model types for quizforge.
//!
//! These are the fundamental types that the entire quizforge system uses
//! to represent quiz sessions, answers, and generated questions.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hard cap on questions per quiz session.
pub const MAX_SESSION_QUESTIONS: u32 = 15;

/// The three cognitive skills a question can probe.
///
/// Generation providers report free-form skill labels; every label is
/// funneled through [`CognitiveSkill::from_str`] so that an unrecognized
/// label is an explicit parse error instead of a silently mis-bucketed
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveSkill {
    Recall,
    Conceptual,
    Reasoning,
}

impl CognitiveSkill {
    /// All skills, in canonical cycling order.
    pub const ALL: [CognitiveSkill; 3] = [
        CognitiveSkill::Recall,
        CognitiveSkill::Conceptual,
        CognitiveSkill::Reasoning,
    ];
}

impl fmt::Display for CognitiveSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CognitiveSkill::Recall => write!(f, "recall"),
            CognitiveSkill::Conceptual => write!(f, "conceptual"),
            CognitiveSkill::Reasoning => write!(f, "reasoning"),
        }
    }
}

impl FromStr for CognitiveSkill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recall" | "memory_retrieval" | "memory-retrieval" | "memorization" => {
                Ok(CognitiveSkill::Recall)
            }
            "reasoning" | "problem_solving" | "problem-solving" | "analysis" => {
                Ok(CognitiveSkill::Reasoning)
            }
            "conceptual" | "concept_application" | "understanding" | "comprehension" => {
                Ok(CognitiveSkill::Conceptual)
            }
            other => Err(format!("unknown cognitive skill label: {other}")),
        }
    }
}

/// Skill-label to weight mapping as reported by the generation provider.
///
/// Insertion order is preserved so that dominant-skill ties resolve to the
/// first-encountered label.
pub type CognitiveAnalysis = IndexMap<String, f64>;

/// A single answered question within a session. Append-only: once recorded
/// it is never mutated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The question text as presented to the student.
    pub question: String,
    /// The student's raw response.
    pub response: String,
    /// Whether the response was graded correct.
    pub is_correct: bool,
    /// Skill-label to weight mapping attributed to this answer, scores in (0, 1].
    #[serde(default)]
    pub cognitive_analysis: CognitiveAnalysis,
    /// When the answer was recorded.
    pub answered_at: DateTime<Utc>,
}

/// Compact view of a prior answer handed to the prompt composer.
///
/// Deliberately drops the raw question/response text: the generator only
/// needs the correctness trail and skill attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSummary {
    pub is_correct: bool,
    #[serde(default)]
    pub cognitive_analysis: CognitiveAnalysis,
}

impl From<&Answer> for AnswerSummary {
    fn from(answer: &Answer) -> Self {
        Self {
            is_correct: answer.is_correct,
            cognitive_analysis: answer.cognitive_analysis.clone(),
        }
    }
}

/// The answer-checking shape of a generated question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct_answer: String,
    },
    ShortAnswer {
        #[serde(default)]
        answer_pattern: Option<String>,
        #[serde(default)]
        expected_keywords: Vec<String>,
    },
}

/// A question produced by the generation provider.
///
/// This is untrusted input: the provider is asked for this shape but the
/// engine must parse it defensively (see `engine::parse_question_spec`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// The prompt text shown to the student.
    pub question: String,
    /// Difficulty the provider claims for this question.
    #[serde(default)]
    pub difficulty: f64,
    /// Explanation shown after grading.
    #[serde(default)]
    pub explanation: String,
    /// Skill weights to attribute to the answer, scores in (0.1, 1.0].
    #[serde(default)]
    pub cognitive_analysis: CognitiveAnalysis,
}

/// Identity and content for one quiz session, loaded once at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub student_id: String,
    pub assigned_quiz_id: String,
    pub subject: String,
    pub chapter: String,
    pub subtopic: String,
    /// The learning content questions must be grounded in.
    pub content: String,
    /// Session question cap.
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,
}

fn default_max_questions() -> u32 {
    MAX_SESSION_QUESTIONS
}

/// Transient per-call payload handed to the prompt composer. Rebuilt fresh
/// for every "next question" request; never persisted.
#[derive(Debug, Clone)]
pub struct QuestionContext {
    pub subject: String,
    pub chapter: String,
    pub subtopic: String,
    /// 1-based index of the question about to be generated.
    pub question_number: u32,
    pub content: String,
    pub previous_answers: Vec<AnswerSummary>,
    pub skill_profile: crate::profile::SkillProfile,
}

/// Aggregate analytics for a completed session. Created exactly once at
/// finalization and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// Aggregate score in [0, 100].
    pub score: f64,
    /// Per-skill mean cognitive weight across answers that reported it.
    pub skill_averages: SkillAverages,
    pub total_questions: u32,
    pub correct_answers: u32,
    /// The full answer list for the session.
    pub answers: Vec<Answer>,
    /// Narrative summary of the session.
    pub summary: String,
    pub subtopic: String,
    pub assigned_quiz_id: String,
    pub student_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Mean cognitive weight per skill; `None` when no answer reported it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillAverages {
    pub recall: Option<f64>,
    pub conceptual: Option<f64>,
    pub reasoning: Option<f64>,
}

impl SkillAverages {
    pub fn get(&self, skill: CognitiveSkill) -> Option<f64> {
        match skill {
            CognitiveSkill::Recall => self.recall,
            CognitiveSkill::Conceptual => self.conceptual,
            CognitiveSkill::Reasoning => self.reasoning,
        }
    }
}

impl SessionAnalytics {
    /// The empty analytics object reported when a session never produced an
    /// answer. Guards against persisting bogus zero-score records.
    pub fn empty(student_id: &str, assigned_quiz_id: &str, subtopic: &str) -> Self {
        Self {
            score: 0.0,
            skill_averages: SkillAverages::default(),
            total_questions: 0,
            correct_answers: 0,
            answers: Vec::new(),
            summary: String::new(),
            subtopic: subtopic.to_string(),
            assigned_quiz_id: assigned_quiz_id.to_string(),
            student_id: student_id.to_string(),
            completed_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_questions == 0
    }
}
