use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info};

use super::structs::{
    generate_content_request::{Content, GenerateContentRequest, GenerationConfig},
    generate_content_response::GenerateContentResponse,
};
use crate::{
    agents::{AgentProfile, AgentTask, TextGenerator},
    errors::{
        constants::{
            DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_MAX_RETRY_ATTEMPTS,
            DEFAULT_RETRY_DELAY_MS, DEFAULT_TEMPERATURE,
        },
        Result, TalkgenError,
    },
    utils::retry_with_backoff,
};

#[derive(Debug)]
enum CallError {
    Transient(String),
    Permanent(String),
}

impl CallError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(message) | Self::Permanent(message) => f.write_str(message),
        }
    }
}

/// Gemini `generateContent` backend.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_attempts: u32,
    retry_delay: Duration,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    pub fn build_request(
        &self,
        agent: &AgentProfile,
        task: &AgentTask,
        context: Option<&str>,
    ) -> GenerateContentRequest {
        let system = format!(
            "You are {}. {}\nYour personal goal is: {}",
            agent.role, agent.backstory, agent.goal
        );

        let mut prompt = format!(
            "{}\n\nThis is the expected criteria for your final answer: {}",
            task.description, task.expected_output
        );
        if let Some(context) = context {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }

        GenerateContentRequest {
            systemInstruction: Content::text(None, system),
            contents: vec![Content::text(Some("user"), prompt)],
            generationConfig: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    async fn call(&self, request: &GenerateContentRequest) -> std::result::Result<String, CallError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("status {status} body {body}");
            return if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                Err(CallError::Transient(message))
            } else {
                Err(CallError::Permanent(message))
            };
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| CallError::Permanent(format!("failed to parse body: {e}")))?;

        parsed
            .text()
            .ok_or_else(|| CallError::Permanent("response contained no text".to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[tracing::instrument(skip(self, task, context), fields(role = %agent.role, model = %self.model))]
    async fn generate(
        &self,
        agent: &AgentProfile,
        task: &AgentTask,
        context: Option<&str>,
    ) -> Result<String> {
        let request = self.build_request(agent, task, context);
        debug!(endpoint = %self.endpoint(), "Calling Gemini");

        let text = retry_with_backoff(
            || self.call(&request),
            CallError::is_transient,
            self.max_attempts,
            self.retry_delay,
        )
        .await
        .map_err(|e| TalkgenError::generation(e.to_string()))?;

        info!(chars = text.chars().count(), "Gemini generation finished");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use serde_json::json;

    fn agent() -> AgentProfile {
        AgentProfile::new("Copywriter", "Write captions.", "Instagram specialist.")
    }

    fn task() -> AgentTask {
        AgentTask::new("Write the captions.", "3 captions.")
    }

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("gemini-key")
            .with_base_url(server.base_url())
            .with_model("test-model")
            .with_retry(3, Duration::from_millis(10))
    }

    #[test]
    fn test_build_request_includes_context() {
        let request = GeminiClient::new("k").build_request(&agent(), &task(), Some("Theme 1"));
        let system = &request.systemInstruction.parts[0].text;
        assert!(system.contains("You are Copywriter."));
        assert!(system.contains("Write captions."));
        let prompt = &request.contents[0].parts[0].text;
        assert!(prompt.starts_with("Write the captions."));
        assert!(prompt.ends_with("Theme 1"));
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::new("very-secret");
        assert!(!format!("{:?}", client).contains("very-secret"));
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/v1beta/models/test-model:generateContent")
                    .header("x-goog-api-key", "gemini-key")
                    .body_includes("You are Copywriter.");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "Legenda pronta ✨"}]},
                        "finishReason": "STOP"
                    }]
                }));
            })
            .await;

        let text = client(&server).generate(&agent(), &task(), None).await.unwrap();

        assert_eq!(text, "Legenda pronta ✨");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_does_not_retry_client_errors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST");
                then.status(400).body(r#"{"error":{"message":"API key not valid"}}"#);
            })
            .await;

        let err = client(&server).generate(&agent(), &task(), None).await.unwrap_err();

        match err {
            TalkgenError::Generation(message) => assert!(message.contains("API key not valid")),
            other => panic!("Expected generation error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_gives_up_on_persistent_server_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST");
                then.status(503).body("overloaded");
            })
            .await;

        let err = client(&server).generate(&agent(), &task(), None).await.unwrap_err();

        match err {
            TalkgenError::Generation(message) => assert!(message.contains("503")),
            other => panic!("Expected generation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_candidates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST");
                then.status(200).json_body(json!({"candidates": []}));
            })
            .await;

        let err = client(&server).generate(&agent(), &task(), None).await.unwrap_err();
        assert!(matches!(err, TalkgenError::Generation(_)));
    }
}
