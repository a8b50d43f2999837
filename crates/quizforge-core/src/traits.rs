//! Trait definitions for generation providers and storage collaborators.
//!
//! These async traits are implemented by the `quizforge-providers` and
//! `quizforge-store` crates respectively.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Answer, SessionAnalytics};

// ---------------------------------------------------------------------------
// Generation provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that generate quiz questions from prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Generate a completion from a system/user prompt pair.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    /// The fixed instruction block.
    pub system: String,
    /// The per-call context block.
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for one generation call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub estimated_cost_usd: f64,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
    /// Cost per 1K input tokens in USD.
    pub cost_per_1k_input: f64,
    /// Cost per 1K output tokens in USD.
    pub cost_per_1k_output: f64,
}

// ---------------------------------------------------------------------------
// Storage traits
// ---------------------------------------------------------------------------

/// Student profile as loaded at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
}

/// An assigned quiz: which subtopic of which chapter a student must take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: String,
    pub subject: String,
    pub chapter: String,
    pub subtopic_id: String,
}

/// Learning content for one subtopic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtopicRecord {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Session-state store keyed by student and assignment.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_student(&self, student_id: &str) -> Result<Option<StudentRecord>, StoreError>;

    async fn load_assignment(
        &self,
        assigned_quiz_id: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError>;

    async fn load_subtopic(&self, subtopic_id: &str)
        -> Result<Option<SubtopicRecord>, StoreError>;
}

/// Cross-session answer lookup, scoped to one student's work on a chapter.
/// Used only to bias skill selection in generated questions.
#[async_trait]
pub trait ChapterHistory: Send + Sync {
    async fn chapter_answers(
        &self,
        student_id: &str,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Answer>, StoreError>;
}

/// Full-detail submission record keyed by session + student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub student_id: String,
    pub assigned_quiz_id: String,
    pub analytics: SessionAnalytics,
}

/// Compact per-student rollup entry used by analytics dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub student_id: String,
    pub score: f64,
    pub subject: String,
    pub chapter: String,
    pub subtopic: String,
    pub completed_at: DateTime<Utc>,
}

/// Marks an assignment as submitted by a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub assigned_quiz_id: String,
    pub student_id: String,
    pub completed_at: DateTime<Utc>,
}

/// The three records finalization writes as one logical unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsBatch {
    pub submission: SubmissionRecord,
    pub history_entry: HistoryEntry,
    pub completion: CompletionMarker,
}

/// Atomic multi-record write facility for session finalization.
#[async_trait]
pub trait AnalyticsWriter: Send + Sync {
    /// Persist all three records of the batch, or none of them. A partial
    /// write must never become visible to concurrent readers.
    async fn commit(&self, batch: AnalyticsBatch) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Extract the first JSON object from a generation response.
///
/// Handles:
/// - fenced json code blocks (preferred)
/// - a raw `{...}` object embedded in prose (string- and escape-aware
///   brace matching)
pub fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(fenced) = fenced_json_block(response) {
        return Some(fenced);
    }
    balanced_object(response)
}

/// The trimmed content of the first json (or untagged) code fence.
fn fenced_json_block(response: &str) -> Option<&str> {
    let mut rest = response;
    loop {
        let start = rest.find("```")?;
        let after = &rest[start + 3..];
        let newline = after.find('\n')?;
        let lang = after[..newline].trim().to_lowercase();
        let body = &after[newline + 1..];
        let end = body.find("```")?;
        if lang.is_empty() || lang == "json" {
            let content = body[..end].trim();
            if !content.is_empty() {
                return Some(content);
            }
        }
        rest = &body[end + 3..];
    }
}

/// The first balanced `{...}` substring, skipping braces inside strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_fenced_json_block() {
        let input = "Here is your question:\n\n```json\n{\"question\": \"Q?\"}\n```\n\nEnjoy!";
        assert_eq!(extract_json_object(input), Some("{\"question\": \"Q?\"}"));
    }

    #[test]
    fn extract_bare_fence() {
        let input = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(input), Some("{\"a\": 1}"));
    }

    #[test]
    fn extract_raw_object_in_prose() {
        let input = "Sure! {\"question\": \"Q?\", \"difficulty\": 0.4} hope that helps";
        assert_eq!(
            extract_json_object(input),
            Some("{\"question\": \"Q?\", \"difficulty\": 0.4}")
        );
    }

    #[test]
    fn extract_nested_object() {
        let input = "{\"a\": {\"b\": 1}, \"c\": 2}";
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn braces_inside_strings_are_skipped() {
        let input = r#"{"question": "What does { mean in \"JSON\"?", "difficulty": 0.5}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_json_object("I cannot answer that."), None);
        assert_eq!(extract_json_object(""), None);
        assert_eq!(extract_json_object("{truncated"), None);
    }

    #[test]
    fn skips_non_json_fences() {
        let input = "```python\nprint('hi')\n```\n\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(input), Some("{\"a\": 1}"));
    }
}
