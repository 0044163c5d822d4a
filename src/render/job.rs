use std::{collections::BTreeMap, fmt};

use crate::errors::{
    constants::DEFAULT_VOICE_PROVIDER,
    validation::{validate_media_url, validate_utterance},
    Result, TalkgenError,
};

/// One render submission. Built once and only read afterwards.
///
/// Example:
/// ```rust
/// use talkgen::render::job::RenderRequest;
///
/// let request = RenderRequest::new(
///     "Olá! Conheça nossos doces artesanais.",
///     "pt-BR-FranciscaNeural",
///     "https://example.com/avatar.jpg",
/// )
/// .unwrap()
/// .with_option("fluent", "true");
/// assert_eq!(request.provider_options()["fluent"], "true");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    utterance: String,
    voice_id: String,
    voice_provider: String,
    source_url: String,
    provider_options: BTreeMap<String, String>,
}

impl RenderRequest {
    pub fn new(
        utterance: impl Into<String>,
        voice_id: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Result<Self> {
        let utterance = utterance.into();
        let voice_id = voice_id.into();
        let source_url = source_url.into();

        validate_utterance(&utterance)?;
        if voice_id.trim().is_empty() {
            return Err(TalkgenError::invalid_input("Voice id cannot be empty"));
        }
        validate_media_url(&source_url)?;

        Ok(Self {
            utterance,
            voice_id,
            voice_provider: DEFAULT_VOICE_PROVIDER.to_string(),
            source_url,
            provider_options: Self::default_options(),
        })
    }

    fn default_options() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("fluent".to_string(), "false".to_string()),
            ("pad_audio".to_string(), "0.0".to_string()),
        ])
    }

    pub fn with_voice_provider(mut self, provider: impl Into<String>) -> Self {
        self.voice_provider = provider.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provider_options.insert(key.into(), value.into());
        self
    }

    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn voice_provider(&self) -> &str {
        &self.voice_provider
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn provider_options(&self) -> &BTreeMap<String, String> {
        &self.provider_options
    }
}

/// Identifier the render API assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a remote render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Started,
    Done,
    Errored,
}

impl JobStatus {
    /// Map the provider's `status` field.
    ///
    /// Unrecognized strings continue as `Started`.
    pub fn from_wire(status: Option<&str>) -> Self {
        match status {
            None | Some("created") => Self::Submitted,
            Some("started") => Self::Started,
            Some("done") => Self::Done,
            Some("error") | Some("rejected") => Self::Errored,
            Some(_) => Self::Started,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match self {
            Self::Done | Self::Errored => false,
            Self::Submitted => true,
            Self::Started => next != Self::Submitted,
        }
    }
}

/// Terminal outcome of a render job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Succeeded { result_url: String },
    Failed { message: String },
}

impl JobResult {
    pub fn result_url(&self) -> Option<&str> {
        match self {
            Self::Succeeded { result_url } => Some(result_url),
            Self::Failed { .. } => None,
        }
    }
}

/// Render API token, sent as `Authorization: Basic <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn basic_header(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}
