//! quizforge-providers — LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for Anthropic, OpenAI, and Ollama,
//! allowing quizforge to generate quiz questions from multiple backends.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{create_provider, load_config, ProviderConfig, QuizforgeConfig};
