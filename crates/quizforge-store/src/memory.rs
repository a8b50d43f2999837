//! In-memory store backing all three storage traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use quizforge_core::error::StoreError;
use quizforge_core::model::Answer;
use quizforge_core::traits::{
    AnalyticsBatch, AnalyticsWriter, AssignmentRecord, ChapterHistory, CompletionMarker,
    HistoryEntry, SessionStore, StudentRecord, SubmissionRecord, SubtopicRecord,
};

#[derive(Default)]
struct Inner {
    students: HashMap<String, StudentRecord>,
    assignments: HashMap<String, AssignmentRecord>,
    subtopics: HashMap<String, SubtopicRecord>,
    /// Prior-session answers keyed by (student, subject, chapter).
    chapter_answers: HashMap<(String, String, String), Vec<Answer>>,
    submissions: Vec<SubmissionRecord>,
    history: Vec<HistoryEntry>,
    completions: Vec<CompletionMarker>,
    fail_commits: bool,
}

/// An in-memory store for tests and the offline demo flow.
///
/// One mutex guards every collection; `commit` pushes all three records of
/// a batch under a single lock, so readers never observe a partial write.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding ----------------------------------------------------------

    pub fn insert_student(&self, student: StudentRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.students.insert(student.id.clone(), student);
    }

    pub fn insert_assignment(&self, assignment: AssignmentRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.assignments.insert(assignment.id.clone(), assignment);
    }

    pub fn insert_subtopic(&self, subtopic: SubtopicRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.subtopics.insert(subtopic.id.clone(), subtopic);
    }

    pub fn insert_chapter_answers(
        &self,
        student_id: &str,
        subject: &str,
        chapter: &str,
        answers: Vec<Answer>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .chapter_answers
            .entry((
                student_id.to_string(),
                subject.to_string(),
                chapter.to_string(),
            ))
            .or_default()
            .extend(answers);
    }

    /// Force every subsequent commit to fail, for exercising the
    /// finalization error path.
    pub fn set_fail_commits(&self, fail: bool) {
        self.inner.lock().unwrap().fail_commits = fail;
    }

    // -- inspection -------------------------------------------------------

    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.inner.lock().unwrap().submissions.clone()
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.inner.lock().unwrap().history.clone()
    }

    pub fn completions(&self) -> Vec<CompletionMarker> {
        self.inner.lock().unwrap().completions.clone()
    }

    pub fn is_completed(&self, assigned_quiz_id: &str, student_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .completions
            .iter()
            .any(|c| c.assigned_quiz_id == assigned_quiz_id && c.student_id == student_id)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_student(&self, student_id: &str) -> Result<Option<StudentRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().students.get(student_id).cloned())
    }

    async fn load_assignment(
        &self,
        assigned_quiz_id: &str,
    ) -> Result<Option<AssignmentRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .assignments
            .get(assigned_quiz_id)
            .cloned())
    }

    async fn load_subtopic(
        &self,
        subtopic_id: &str,
    ) -> Result<Option<SubtopicRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .subtopics
            .get(subtopic_id)
            .cloned())
    }
}

#[async_trait]
impl ChapterHistory for MemoryStore {
    async fn chapter_answers(
        &self,
        student_id: &str,
        subject: &str,
        chapter: &str,
    ) -> Result<Vec<Answer>, StoreError> {
        let key = (
            student_id.to_string(),
            subject.to_string(),
            chapter.to_string(),
        );
        Ok(self
            .inner
            .lock()
            .unwrap()
            .chapter_answers
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AnalyticsWriter for MemoryStore {
    async fn commit(&self, batch: AnalyticsBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_commits {
            return Err(StoreError::Unavailable("commit rejected".into()));
        }
        // All three pushes happen under the same lock; readers see the
        // batch entirely or not at all.
        inner.submissions.push(batch.submission);
        inner.history.push(batch.history_entry);
        inner.completions.push(batch.completion);
        tracing::debug!("committed analytics batch ({} total)", inner.submissions.len());
        Ok(())
    }
}
