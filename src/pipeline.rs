use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    agents::{
        crew::{Crew, CrewOutput},
        TextGenerator,
    },
    errors::{validation::validate_niche, Result},
    render::{
        client::{PollPolicy, RenderJobClient},
        job::{Credentials, JobResult, RenderRequest},
        sanitizer::sanitize,
    },
    speech::{SpeechSynthesizer, Voice},
};

/// Where and how the utterance is rendered into a video.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub client: RenderJobClient,
    pub credentials: Credentials,
    pub voice_id: String,
    pub voice_provider: String,
    pub source_url: String,
    pub policy: PollPolicy,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub copy: CrewOutput,
    pub utterance: String,
    pub preview_audio: Option<Bytes>,
    pub video: Option<JobResult>,
}

/// Niche in, marketing copy, spoken preview and avatar video out.
pub struct Pipeline<G> {
    generator: G,
    language: String,
    max_script_length: usize,
    preview: Option<(Box<dyn SpeechSynthesizer + Send + Sync>, Voice)>,
    render: Option<RenderTarget>,
}

impl<G> Pipeline<G>
where
    G: TextGenerator + Send + Sync,
{
    pub fn new(generator: G, language: impl Into<String>, max_script_length: usize) -> Self {
        Self {
            generator,
            language: language.into(),
            max_script_length,
            preview: None,
            render: None,
        }
    }

    pub fn with_preview(
        mut self,
        synthesizer: impl SpeechSynthesizer + Send + Sync + 'static,
        voice: Voice,
    ) -> Self {
        self.preview = Some((Box::new(synthesizer), voice));
        self
    }

    pub fn with_render(mut self, target: RenderTarget) -> Self {
        self.render = Some(target);
        self
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn run(&self, niche: &str, cancel: &CancellationToken) -> Result<PipelineOutput> {
        validate_niche(niche)?;

        let copy = Crew::marketing(niche.trim(), &self.language)
            .kickoff(&self.generator)
            .await?;
        let utterance = sanitize(copy.raw(), self.max_script_length);
        info!(chars = utterance.chars().count(), "Script sanitized");

        let preview_audio = match &self.preview {
            Some((synthesizer, voice)) if !utterance.is_empty() => {
                match synthesizer.synthesize(&utterance, voice).await {
                    Ok(audio) => Some(audio),
                    Err(e) => {
                        warn!(error = %e, "Preview synthesis failed, continuing");
                        None
                    }
                }
            }
            _ => None,
        };

        let video = match &self.render {
            Some(target) => {
                let request = RenderRequest::new(
                    utterance.clone(),
                    target.voice_id.clone(),
                    target.source_url.clone(),
                )?
                .with_voice_provider(target.voice_provider.clone());

                let result = target
                    .client
                    .render(&request, &target.credentials, target.policy, cancel)
                    .await?;
                Some(result)
            }
            None => None,
        };

        Ok(PipelineOutput {
            copy,
            utterance,
            preview_audio,
            video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agents::gemini::gemini::GeminiClient, errors::TalkgenError,
        speech::gcp_tts::gcp_tts::GoogleTts,
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Duration;

    const MODEL_OUTPUT: &str = "**Olá, empreendedora!** Seus \"doces\" merecem destaque.\n```json\n{\"cta\": true}\n```\nVem comigo!";

    async fn mock_gemini(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/v1beta/models/test-model:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": MODEL_OUTPUT}]}}]
                }));
            })
            .await;
    }

    fn generator(server: &MockServer) -> GeminiClient {
        GeminiClient::new("g-key")
            .with_base_url(server.base_url())
            .with_model("test-model")
            .with_retry(1, Duration::from_millis(1))
    }

    fn target(server: &MockServer) -> RenderTarget {
        RenderTarget {
            client: RenderJobClient::new(&server.base_url(), Duration::from_secs(5)).unwrap(),
            credentials: Credentials::new("r-key"),
            voice_id: "pt-BR-FranciscaNeural".to_string(),
            voice_provider: "microsoft".to_string(),
            source_url: "https://example.com/avatar.jpg".to_string(),
            policy: PollPolicy {
                poll_interval: Duration::from_millis(10),
                max_wait: Duration::from_secs(2),
                max_transport_retries: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_run_renders_sanitized_script() {
        let server = MockServer::start_async().await;
        mock_gemini(&server).await;
        let submit = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/talks")
                    .header("authorization", "Basic r-key")
                    .body_includes("Olá, empreendedora! Seus doces merecem destaque.Vem comigo!");
                then.status(201).json_body(json!({"id": "tlk_9"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/talks/tlk_9");
                then.status(200)
                    .json_body(json!({"status": "done", "result_url": "https://cdn.example.com/9.mp4"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/v1/text:synthesize");
                then.status(200)
                    .json_body(json!({"audioContent": STANDARD.encode(b"mp3")}));
            })
            .await;

        let pipeline = Pipeline::new(generator(&server), "Brazilian Portuguese", 500)
            .with_preview(
                GoogleTts::new("t-key").with_base_url(server.base_url()),
                Voice::new("pt-BR", "pt-BR-Wavenet-A"),
            )
            .with_render(target(&server));

        let output = pipeline
            .run("Doces artesanais", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.copy.steps.len(), 3);
        assert_eq!(
            output.utterance,
            "Olá, empreendedora! Seus doces merecem destaque.Vem comigo!"
        );
        assert_eq!(output.preview_audio, Some(Bytes::from_static(b"mp3")));
        assert_eq!(
            output.video.and_then(|video| video.result_url().map(str::to_string)),
            Some("https://cdn.example.com/9.mp4".to_string())
        );
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_continues_when_preview_fails() {
        let server = MockServer::start_async().await;
        mock_gemini(&server).await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/v1/text:synthesize");
                then.status(500).body("boom");
            })
            .await;

        let pipeline = Pipeline::new(generator(&server), "English", 20).with_preview(
            GoogleTts::new("t-key").with_base_url(server.base_url()),
            Voice::new("pt-BR", "pt-BR-Wavenet-A"),
        );

        let output = pipeline
            .run("Arquitetura", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.utterance, "Olá, empreendedora!");
        assert!(output.preview_audio.is_none());
        assert!(output.video.is_none());
    }

    #[tokio::test]
    async fn test_run_surfaces_submission_errors() {
        let server = MockServer::start_async().await;
        mock_gemini(&server).await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/talks");
                then.status(401).body(r#"{"message":"Unauthorized"}"#);
            })
            .await;

        let pipeline =
            Pipeline::new(generator(&server), "English", 500).with_render(target(&server));

        let err = pipeline
            .run("Arquitetura", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TalkgenError::Render(crate::errors::RenderError::Submission(
                crate::errors::SubmissionError::Rejected { status: 401, .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_run_rejects_blank_niche() {
        let server = MockServer::start_async().await;
        let pipeline = Pipeline::new(generator(&server), "English", 500);

        let err = pipeline
            .run("   ", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TalkgenError::InvalidInput(_)));
    }
}
