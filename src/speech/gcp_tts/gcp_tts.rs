use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use super::structs::{
    synthesize_request::{AudioConfig, SynthesisInput, SynthesizeRequest, VoiceSelectionParams},
    synthesize_response::SynthesizeResponse,
};
use crate::{
    errors::{
        constants::{DEFAULT_PITCH, DEFAULT_SPEAKING_RATE, DEFAULT_TTS_BASE_URL},
        Result, TalkgenError,
    },
    speech::{SpeechSynthesizer, Voice},
};

/// Google Cloud Text-to-Speech over REST, authenticated with an API key.
#[derive(Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    speaking_rate: f32,
    pitch: f32,
}

impl std::fmt::Debug for GoogleTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTts")
            .field("base_url", &self.base_url)
            .field("speaking_rate", &self.speaking_rate)
            .field("pitch", &self.pitch)
            .finish_non_exhaustive()
    }
}

impl GoogleTts {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_TTS_BASE_URL.to_string(),
            speaking_rate: DEFAULT_SPEAKING_RATE,
            pitch: DEFAULT_PITCH,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_prosody(mut self, speaking_rate: f32, pitch: f32) -> Self {
        self.speaking_rate = speaking_rate;
        self.pitch = pitch;
        self
    }

    pub fn build_request(&self, text: &str, voice: &Voice) -> SynthesizeRequest {
        SynthesizeRequest {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: VoiceSelectionParams {
                languageCode: voice.language_code.clone(),
                name: voice.name.clone(),
            },
            audioConfig: AudioConfig {
                audioEncoding: String::from("MP3"),
                speakingRate: self.speaking_rate,
                pitch: self.pitch,
            },
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    /// Synthesize text to speech and return the MP3 data.
    #[tracing::instrument(skip(self, text, voice), fields(voice = %voice.name))]
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Bytes> {
        let request = self.build_request(text, voice);

        let response = self
            .client
            .post(format!(
                "{}/v1/text:synthesize",
                self.base_url.trim_end_matches('/')
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TalkgenError::tts_synthesis(format!(
                "status {status} body {body}"
            )));
        }

        let response: SynthesizeResponse = response.json().await?;
        let audio = response
            .decode_audio()
            .map_err(|e| TalkgenError::tts_synthesis(format!("invalid audioContent: {e}")))?;

        info!(bytes = audio.len(), "TTS synthesis finished");
        Ok(audio)
    }
}
