//! Central quiz-session orchestrator.
//!
//! Wires the context builder, difficulty estimator, prompt composer,
//! generation provider, evaluator, and finalizer into the four operations
//! the UI layer calls: initialize, next_question, evaluate, finalize.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use uuid::Uuid;

use crate::context::build_question_context;
use crate::difficulty::{estimate_difficulty, BASE_DIFFICULTY};
use crate::error::EngineError;
use crate::evaluate::{evaluate_answer, Evaluation};
use crate::finalize::compute_analytics;
use crate::model::{
    Answer, QuestionKind, QuestionSpec, SessionAnalytics, SessionState, MAX_SESSION_QUESTIONS,
};
use crate::profile::SkillProfile;
use crate::prompt::compose_generation_request;
use crate::traits::{
    extract_json_object, AnalyticsBatch, AnalyticsWriter, ChapterHistory, CompletionMarker,
    GenerateRequest, HistoryEntry, LlmProvider, SessionStore, SubmissionRecord,
};

/// Configuration for the quiz engine.
#[derive(Debug, Clone)]
pub struct QuizEngineConfig {
    /// Model identifier passed to the generation provider.
    pub model: String,
    /// Max tokens per generation call.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-session question cap.
    pub max_questions: u32,
}

impl Default for QuizEngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            max_questions: MAX_SESSION_QUESTIONS,
        }
    }
}

/// The adaptive quiz-session engine.
///
/// Stateless across calls: the caller owns the session lifecycle and passes
/// the accumulated answer list into each operation.
pub struct QuizEngine {
    provider: Arc<dyn LlmProvider>,
    sessions: Arc<dyn SessionStore>,
    history: Arc<dyn ChapterHistory>,
    writer: Arc<dyn AnalyticsWriter>,
    config: QuizEngineConfig,
}

impl QuizEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sessions: Arc<dyn SessionStore>,
        history: Arc<dyn ChapterHistory>,
        writer: Arc<dyn AnalyticsWriter>,
        config: QuizEngineConfig,
    ) -> Self {
        Self {
            provider,
            sessions,
            history,
            writer,
            config,
        }
    }

    /// Load identity and learning content for a new session.
    ///
    /// Fails with a missing-entity error if the student, assignment, or
    /// subtopic content does not exist; those are fatal to session start.
    pub async fn initialize(
        &self,
        student_id: &str,
        assigned_quiz_id: &str,
    ) -> Result<SessionState, EngineError> {
        let student = self
            .sessions
            .load_student(student_id)
            .await?
            .ok_or_else(|| EngineError::StudentNotFound(student_id.to_string()))?;

        let assignment = self
            .sessions
            .load_assignment(assigned_quiz_id)
            .await?
            .ok_or_else(|| EngineError::AssignmentNotFound(assigned_quiz_id.to_string()))?;

        let subtopic = self
            .sessions
            .load_subtopic(&assignment.subtopic_id)
            .await?
            .ok_or_else(|| EngineError::SubtopicNotFound(assignment.subtopic_id.clone()))?;

        tracing::info!(
            student = %student.id,
            assignment = %assignment.id,
            subtopic = %subtopic.id,
            "quiz session initialized"
        );

        Ok(SessionState {
            student_id: student.id,
            assigned_quiz_id: assignment.id,
            subject: assignment.subject,
            chapter: assignment.chapter,
            subtopic: subtopic.id,
            content: subtopic.content,
            max_questions: self.config.max_questions,
        })
    }

    /// Produce the next question for the session.
    ///
    /// Never fails: any error in the generation chain (history lookup,
    /// provider call, unparsable output) is logged and replaced by the
    /// fixed fallback question, so the student-facing flow never
    /// hard-fails mid-session.
    pub async fn next_question(
        &self,
        state: &SessionState,
        question_number: u32,
        answers: &[Answer],
    ) -> QuestionSpec {
        match self.generate_question(state, question_number, answers).await {
            Ok(spec) => spec,
            Err(e) => {
                tracing::warn!("question generation failed, serving fallback: {e:#}");
                fallback_question()
            }
        }
    }

    async fn generate_question(
        &self,
        state: &SessionState,
        question_number: u32,
        answers: &[Answer],
    ) -> Result<QuestionSpec> {
        let context = build_question_context(state, question_number, answers);
        let difficulty = estimate_difficulty(&context.previous_answers);

        let chapter_answers = self
            .history
            .chapter_answers(&state.student_id, &state.subject, &state.chapter)
            .await
            .context("chapter history lookup failed")?;
        let history_profile = SkillProfile::from_answers(&chapter_answers);

        let parts = compose_generation_request(&context, difficulty, &history_profile);

        let response = self
            .provider
            .generate(&GenerateRequest {
                model: self.config.model.clone(),
                system: parts.system,
                user: parts.user,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .await
            .context("generation provider call failed")?;

        let json = extract_json_object(&response.content)
            .context("no JSON object found in provider response")?;
        parse_question_spec(json)
    }

    /// Grade a submitted answer. Synchronous, never fails.
    pub fn evaluate(&self, spec: &QuestionSpec, submitted: &str) -> Evaluation {
        evaluate_answer(spec, submitted)
    }

    /// Aggregate the session and persist it atomically.
    ///
    /// An empty answer list is a no-op that returns empty analytics and
    /// performs zero writes. A failed commit is surfaced: the caller must
    /// not report the quiz complete until this succeeds.
    ///
    /// The engine does NOT deduplicate: calling finalize twice with the
    /// same session data writes twice. Preventing duplicate finalization
    /// is the caller's contract.
    pub async fn finalize(
        &self,
        state: &SessionState,
        answers: &[Answer],
    ) -> Result<SessionAnalytics, EngineError> {
        let analytics = compute_analytics(state, answers);
        if analytics.is_empty() {
            tracing::info!(
                student = %state.student_id,
                assignment = %state.assigned_quiz_id,
                "finalize called with no answers, skipping persistence"
            );
            return Ok(analytics);
        }

        let completed_at = analytics.completed_at;
        let batch = AnalyticsBatch {
            submission: SubmissionRecord {
                id: Uuid::new_v4(),
                student_id: state.student_id.clone(),
                assigned_quiz_id: state.assigned_quiz_id.clone(),
                analytics: analytics.clone(),
            },
            history_entry: HistoryEntry {
                student_id: state.student_id.clone(),
                score: analytics.score,
                subject: state.subject.clone(),
                chapter: state.chapter.clone(),
                subtopic: state.subtopic.clone(),
                completed_at,
            },
            completion: CompletionMarker {
                assigned_quiz_id: state.assigned_quiz_id.clone(),
                student_id: state.student_id.clone(),
                completed_at,
            },
        };

        self.writer.commit(batch).await?;

        tracing::info!(
            student = %state.student_id,
            assignment = %state.assigned_quiz_id,
            score = analytics.score,
            "session finalized"
        );
        Ok(analytics)
    }
}

/// Parse and validate a question spec from untrusted provider JSON.
///
/// Rejects empty question text and degenerate multiple-choice shapes;
/// drops cognitive-analysis entries outside (0, 1].
pub fn parse_question_spec(json: &str) -> Result<QuestionSpec> {
    let mut spec: QuestionSpec =
        serde_json::from_str(json).context("provider JSON does not match question shape")?;

    if spec.question.trim().is_empty() {
        anyhow::bail!("question text is empty");
    }
    if let QuestionKind::MultipleChoice {
        options,
        correct_answer,
    } = &spec.kind
    {
        if options.is_empty() {
            anyhow::bail!("multiple-choice question has no options");
        }
        if correct_answer.trim().is_empty() {
            anyhow::bail!("multiple-choice question has no correct answer");
        }
    }

    spec.cognitive_analysis.retain(|label, weight| {
        let keep = weight.is_finite() && *weight > 0.0 && *weight <= 1.0;
        if !keep {
            tracing::debug!("dropping out-of-range cognitive score {weight} for {label:?}");
        }
        keep
    });

    if !(0.0..=1.0).contains(&spec.difficulty) {
        spec.difficulty = spec.difficulty.clamp(0.0, 1.0);
    }

    Ok(spec)
}

/// The fixed general-knowledge question served when generation fails.
pub fn fallback_question() -> QuestionSpec {
    let mut cognitive_analysis = crate::model::CognitiveAnalysis::new();
    cognitive_analysis.insert("memory_retrieval".to_string(), 0.8);

    QuestionSpec {
        kind: QuestionKind::MultipleChoice {
            options: vec![
                "Paris".to_string(),
                "London".to_string(),
                "Berlin".to_string(),
                "Madrid".to_string(),
            ],
            correct_answer: "Paris".to_string(),
        },
        question: "What is the capital of France?".to_string(),
        difficulty: BASE_DIFFICULTY,
        explanation: "Paris is the capital of France. (This question was substituted because \
                      the question generator was temporarily unavailable.)"
            .to_string(),
        cognitive_analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, StoreError};
    use crate::model::CognitiveAnalysis;
    use crate::traits::{
        AssignmentRecord, GenerateResponse, ModelInfo, StudentRecord, SubtopicRecord, TokenUsage,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FixedProvider {
        content: String,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
            if self.fail {
                return Err(ProviderError::NetworkError("connection reset".into()).into());
            }
            Ok(GenerateResponse {
                content: self.content.clone(),
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            })
        }

        fn available_models(&self) -> Vec<ModelInfo> {
            vec![]
        }
    }

    struct TestStore {
        missing_student: bool,
    }

    #[async_trait]
    impl SessionStore for TestStore {
        async fn load_student(
            &self,
            student_id: &str,
        ) -> Result<Option<StudentRecord>, StoreError> {
            if self.missing_student {
                return Ok(None);
            }
            Ok(Some(StudentRecord {
                id: student_id.to_string(),
                name: "Test Student".into(),
            }))
        }

        async fn load_assignment(
            &self,
            assigned_quiz_id: &str,
        ) -> Result<Option<AssignmentRecord>, StoreError> {
            Ok(Some(AssignmentRecord {
                id: assigned_quiz_id.to_string(),
                subject: "Biology".into(),
                chapter: "Cells".into(),
                subtopic_id: "mitochondria".into(),
            }))
        }

        async fn load_subtopic(
            &self,
            subtopic_id: &str,
        ) -> Result<Option<SubtopicRecord>, StoreError> {
            Ok(Some(SubtopicRecord {
                id: subtopic_id.to_string(),
                title: "Mitochondria".into(),
                content: "The mitochondrion produces ATP.".into(),
            }))
        }
    }

    #[async_trait]
    impl ChapterHistory for TestStore {
        async fn chapter_answers(
            &self,
            _student_id: &str,
            _subject: &str,
            _chapter: &str,
        ) -> Result<Vec<Answer>, StoreError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct CountingWriter {
        commits: AtomicU32,
        batches: Mutex<Vec<AnalyticsBatch>>,
        fail: bool,
    }

    #[async_trait]
    impl AnalyticsWriter for CountingWriter {
        async fn commit(&self, batch: AnalyticsBatch) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("batch rejected".into()));
            }
            self.commits.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().push(batch);
            Ok(())
        }
    }

    const QUESTION_JSON: &str = r#"{
        "type": "multiple_choice",
        "question": "Which organelle produces ATP?",
        "options": ["Nucleus", "Mitochondrion", "Ribosome"],
        "correct_answer": "Mitochondrion",
        "difficulty": 0.4,
        "explanation": "ATP synthesis happens in the mitochondrion.",
        "cognitive_analysis": {"memory_retrieval": 0.7}
    }"#;

    fn engine(provider: FixedProvider, writer: Arc<CountingWriter>) -> QuizEngine {
        let store = Arc::new(TestStore {
            missing_student: false,
        });
        QuizEngine::new(
            Arc::new(provider),
            store.clone(),
            store,
            writer,
            QuizEngineConfig::default(),
        )
    }

    fn session_state() -> SessionState {
        SessionState {
            student_id: "s1".into(),
            assigned_quiz_id: "quiz-7".into(),
            subject: "Biology".into(),
            chapter: "Cells".into(),
            subtopic: "mitochondria".into(),
            content: "The mitochondrion produces ATP.".into(),
            max_questions: 15,
        }
    }

    fn answer(is_correct: bool) -> Answer {
        Answer {
            question: "q".into(),
            response: "r".into(),
            is_correct,
            cognitive_analysis: CognitiveAnalysis::new(),
            answered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn initialize_builds_session_state() {
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: false,
            },
            Arc::new(CountingWriter::default()),
        );
        let state = engine.initialize("s1", "quiz-7").await.unwrap();
        assert_eq!(state.student_id, "s1");
        assert_eq!(state.subject, "Biology");
        assert_eq!(state.subtopic, "mitochondria");
        assert!(state.content.contains("ATP"));
        assert_eq!(state.max_questions, 15);
    }

    #[tokio::test]
    async fn initialize_fails_on_missing_student() {
        let store = Arc::new(TestStore {
            missing_student: true,
        });
        let engine = QuizEngine::new(
            Arc::new(FixedProvider {
                content: String::new(),
                fail: false,
            }),
            store.clone(),
            store,
            Arc::new(CountingWriter::default()),
            QuizEngineConfig::default(),
        );
        let err = engine.initialize("ghost", "quiz-7").await.unwrap_err();
        assert!(matches!(err, EngineError::StudentNotFound(_)));
    }

    #[tokio::test]
    async fn next_question_parses_provider_output() {
        let engine = engine(
            FixedProvider {
                content: format!("Here you go:\n```json\n{QUESTION_JSON}\n```"),
                fail: false,
            },
            Arc::new(CountingWriter::default()),
        );
        let spec = engine.next_question(&session_state(), 1, &[]).await;
        assert_eq!(spec.question, "Which organelle produces ATP?");
        assert!((spec.difficulty - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn provider_failure_serves_the_fallback_question() {
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: true,
            },
            Arc::new(CountingWriter::default()),
        );
        let spec = engine.next_question(&session_state(), 1, &[]).await;
        assert_eq!(spec.question, fallback_question().question);
        assert!(spec.question.contains("capital of France"));
    }

    #[tokio::test]
    async fn unparsable_output_serves_the_fallback_question() {
        let engine = engine(
            FixedProvider {
                content: "Sorry, I can't produce a question right now.".into(),
                fail: false,
            },
            Arc::new(CountingWriter::default()),
        );
        let spec = engine.next_question(&session_state(), 1, &[]).await;
        assert_eq!(spec.question, fallback_question().question);
    }

    #[tokio::test]
    async fn finalize_commits_one_batch() {
        let writer = Arc::new(CountingWriter::default());
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: false,
            },
            writer.clone(),
        );
        let answers = vec![answer(true), answer(true), answer(false), answer(true)];
        let analytics = engine.finalize(&session_state(), &answers).await.unwrap();
        assert_eq!(analytics.score, 75.0);
        assert_eq!(writer.commits.load(Ordering::SeqCst), 1);

        let batches = writer.batches.lock().unwrap();
        let batch = &batches[0];
        assert_eq!(batch.submission.student_id, "s1");
        assert_eq!(batch.history_entry.score, 75.0);
        assert_eq!(batch.completion.assigned_quiz_id, "quiz-7");
    }

    #[tokio::test]
    async fn finalize_with_no_answers_writes_nothing() {
        let writer = Arc::new(CountingWriter::default());
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: false,
            },
            writer.clone(),
        );
        let analytics = engine.finalize(&session_state(), &[]).await.unwrap();
        assert!(analytics.is_empty());
        assert_eq!(writer.commits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finalize_surfaces_commit_failure() {
        let writer = Arc::new(CountingWriter {
            fail: true,
            ..Default::default()
        });
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: false,
            },
            writer,
        );
        let err = engine
            .finalize(&session_state(), &[answer(true)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[tokio::test]
    async fn finalize_twice_writes_twice() {
        // Duplicate-finalization protection is a caller contract, not
        // engine behavior.
        let writer = Arc::new(CountingWriter::default());
        let engine = engine(
            FixedProvider {
                content: String::new(),
                fail: false,
            },
            writer.clone(),
        );
        let answers = vec![answer(true)];
        engine.finalize(&session_state(), &answers).await.unwrap();
        engine.finalize(&session_state(), &answers).await.unwrap();
        assert_eq!(writer.commits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn parse_rejects_empty_question() {
        let json = r#"{"type": "short_answer", "question": "  "}"#;
        assert!(parse_question_spec(json).is_err());
    }

    #[test]
    fn parse_rejects_degenerate_multiple_choice() {
        let json = r#"{
            "type": "multiple_choice",
            "question": "Pick one",
            "options": [],
            "correct_answer": "A"
        }"#;
        assert!(parse_question_spec(json).is_err());
    }

    #[test]
    fn parse_drops_out_of_range_cognitive_scores() {
        let json = r#"{
            "type": "short_answer",
            "question": "Explain ATP synthesis",
            "cognitive_analysis": {"recall": 0.5, "reasoning": 1.7, "conceptual": -0.2}
        }"#;
        let spec = parse_question_spec(json).unwrap();
        assert_eq!(spec.cognitive_analysis.len(), 1);
        assert_eq!(spec.cognitive_analysis.get("recall"), Some(&0.5));
    }

    #[test]
    fn parse_clamps_declared_difficulty() {
        let json = r#"{
            "type": "short_answer",
            "question": "Explain ATP synthesis",
            "difficulty": 3.2
        }"#;
        let spec = parse_question_spec(json).unwrap();
        assert_eq!(spec.difficulty, 1.0);
    }

    #[test]
    fn fallback_question_evaluates_paris_correct() {
        let spec = fallback_question();
        assert!(evaluate_answer(&spec, "Paris").is_correct);
        assert!(!evaluate_answer(&spec, "London").is_correct);
    }
}
