//! Mock provider for testing and the offline demo flow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizforge_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

/// A mock generation provider that never leaves the process.
///
/// Returns configurable responses based on user-prompt content matching,
/// or a scripted sequence of responses for multi-question sessions.
pub struct MockProvider {
    /// Map of user-prompt substring → response content.
    responses: HashMap<String, String>,
    /// Scripted responses served in order, cycling when exhausted.
    script: Vec<String>,
    /// Default response if nothing else matches.
    default_response: String,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<GenerateRequest>>,
}

const DEFAULT_QUESTION: &str = r#"{
    "type": "multiple_choice",
    "question": "Which organelle produces most of a cell's ATP?",
    "options": ["Nucleus", "Mitochondrion", "Ribosome", "Golgi apparatus"],
    "correct_answer": "Mitochondrion",
    "difficulty": 0.3,
    "explanation": "ATP synthesis happens on the inner mitochondrial membrane.",
    "cognitive_analysis": {"memory_retrieval": 0.8}
}"#;

impl MockProvider {
    /// Create a mock with the given user-prompt-substring → response map.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            script: Vec::new(),
            default_response: DEFAULT_QUESTION.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            script: Vec::new(),
            default_response: response.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that serves the given responses in order, cycling
    /// once the script is exhausted.
    pub fn with_script(script: Vec<String>) -> Self {
        Self {
            responses: HashMap::new(),
            script,
            default_response: DEFAULT_QUESTION.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let content = if !self.script.is_empty() {
            self.script[call as usize % self.script.len()].clone()
        } else {
            self.responses
                .iter()
                .find(|(key, _)| request.user.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| self.default_response.clone())
        };

        let token_count = (content.len() / 4) as u32; // Rough estimate

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens: (request.user.len() / 4) as u32,
                completion_tokens: token_count,
                total_tokens: (request.user.len() / 4) as u32 + token_count,
                estimated_cost_usd: 0.0,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock-model".into(),
            system: "contract".into(),
            user: user.into(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn default_response_is_a_parsable_question() {
        let provider = MockProvider::new(HashMap::new());
        let response = provider.generate(&request("anything")).await.unwrap();
        let spec = quizforge_core::engine::parse_question_spec(&response.content).unwrap();
        assert!(spec.question.contains("ATP"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert(
            "Biology".to_string(),
            r#"{"type": "short_answer", "question": "Name an organelle."}"#.to_string(),
        );
        responses.insert(
            "History".to_string(),
            r#"{"type": "short_answer", "question": "Name a Roman emperor."}"#.to_string(),
        );

        let provider = MockProvider::new(responses);

        let resp = provider
            .generate(&request("Subject: Biology\nChapter: Cells"))
            .await
            .unwrap();
        assert!(resp.content.contains("organelle"));

        let resp = provider
            .generate(&request("Subject: History\nChapter: Rome"))
            .await
            .unwrap();
        assert!(resp.content.contains("Roman emperor"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn script_cycles_in_order() {
        let provider = MockProvider::with_script(vec![
            r#"{"type": "short_answer", "question": "First?"}"#.to_string(),
            r#"{"type": "short_answer", "question": "Second?"}"#.to_string(),
        ]);

        let first = provider.generate(&request("x")).await.unwrap();
        let second = provider.generate(&request("x")).await.unwrap();
        let third = provider.generate(&request("x")).await.unwrap();
        assert!(first.content.contains("First?"));
        assert!(second.content.contains("Second?"));
        assert!(third.content.contains("First?"));
    }

    #[tokio::test]
    async fn captures_last_request() {
        let provider = MockProvider::with_fixed_response("{}");
        provider.generate(&request("hello")).await.unwrap();
        let last = provider.last_request().unwrap();
        assert_eq!(last.user, "hello");
        assert_eq!(last.system, "contract");
    }
}
