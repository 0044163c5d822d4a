pub mod gcp_tts;
pub mod preview;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::Result;

/// Voice of a speech synthesis backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voice {
    pub language_code: String,
    pub name: String,
}

impl Voice {
    pub fn new(language_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            name: name.into(),
        }
    }
}

/// Speech synthesis used for local previews of an utterance.
#[async_trait]
pub trait SpeechSynthesizer {
    /// Synthesize `text` and return encoded audio.
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Bytes>;
}
