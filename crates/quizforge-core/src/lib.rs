//! quizforge-core — the adaptive quiz-session engine.
//!
//! This crate defines the data model, collaborator traits, and session
//! logic that the rest of the quizforge system builds on: skill profiling,
//! difficulty estimation, context and prompt composition, answer grading,
//! and session finalization.

pub mod context;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod finalize;
pub mod model;
pub mod profile;
pub mod prompt;
pub mod traits;
