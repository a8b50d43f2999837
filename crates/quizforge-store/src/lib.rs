//! quizforge-store — storage collaborators for the quiz engine.
//!
//! Implements the `SessionStore`, `ChapterHistory`, and `AnalyticsWriter`
//! traits over a single in-memory store. All collections live behind one
//! mutex, so an analytics commit is observed entirely or not at all by
//! concurrent readers — the atomic multi-record semantics the session
//! finalizer requires.

mod memory;

pub use memory::MemoryStore;
