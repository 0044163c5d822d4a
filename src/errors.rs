use std::time::Duration;

use crate::render::job::{JobResult, JobStatus};

/// Failure of a single render submission. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Render API rejected submission with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Render API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Render API returned a malformed submission response: {0}")]
    MalformedResponse(String),
}

/// Failure while driving a submitted job to a terminal state.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Render job status unavailable after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },

    #[error("Render job did not finish within {waited:?} (last status: {last_status:?})")]
    Timeout {
        waited: Duration,
        last_status: JobStatus,
    },

    #[error("Render job failed: {message}")]
    RemoteFailure { message: String },

    #[error("Render job polling was cancelled")]
    Cancelled,
}

impl PollError {
    /// Terminal outcome carried by this error, if the remote reported one.
    pub fn into_job_result(self) -> Option<JobResult> {
        match self {
            Self::RemoteFailure { message } => Some(JobResult::Failed { message }),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Custom error types for the talkgen application
#[derive(Debug, thiserror::Error)]
pub enum TalkgenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Text generation error: {0}")]
    Generation(String),

    #[error("TTS synthesis error: {0}")]
    TTSSynthesis(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Text too long (max {max_length} characters)")]
    TextTooLong { max_length: usize },

    #[error("Telemetry setup error: {0}")]
    Telemetry(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TalkgenError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn tts_synthesis(message: impl Into<String>) -> Self {
        Self::TTSSynthesis(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn text_too_long(max_length: usize) -> Self {
        Self::TextTooLong { max_length }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn missing_env_var(var_name: &str) -> Self {
        Self::Config(format!("Missing environment variable: {}", var_name))
    }
}

impl From<SubmissionError> for TalkgenError {
    fn from(error: SubmissionError) -> Self {
        Self::Render(RenderError::Submission(error))
    }
}

impl From<PollError> for TalkgenError {
    fn from(error: PollError) -> Self {
        Self::Render(RenderError::Poll(error))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TalkgenError>;

/// Input validation functions
pub mod validation {
    use super::*;

    /// Validate the niche a campaign is generated for
    pub fn validate_niche(niche: &str) -> Result<()> {
        if niche.trim().is_empty() {
            return Err(TalkgenError::invalid_input("Niche cannot be empty"));
        }

        if niche.chars().count() > constants::MAX_NICHE_LENGTH {
            return Err(TalkgenError::text_too_long(constants::MAX_NICHE_LENGTH));
        }

        Ok(())
    }

    /// Validate an utterance before it is sent to the render API
    pub fn validate_utterance(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(TalkgenError::invalid_input("Utterance cannot be empty"));
        }

        if text.chars().count() > constants::MAX_UTTERANCE_LENGTH {
            return Err(TalkgenError::text_too_long(constants::MAX_UTTERANCE_LENGTH));
        }

        Ok(())
    }

    /// Validate that a media URL is absolute http(s)
    pub fn validate_media_url(raw: &str) -> Result<()> {
        let parsed = url::Url::parse(raw)
            .map_err(|e| TalkgenError::invalid_input(format!("Invalid media URL {raw}: {e}")))?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(TalkgenError::invalid_input(format!(
                "Unsupported media URL scheme: {other}"
            ))),
        }
    }
}

/// Constants used throughout the application
pub mod constants {
    // Configuration constants
    pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
    pub const ENV_PREFIX: &str = "TALKGEN_";

    // Text generation constants
    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_LANGUAGE: &str = "Brazilian Portuguese";
    pub const MAX_NICHE_LENGTH: usize = 200;

    // Script constants
    pub const DEFAULT_MAX_SCRIPT_LENGTH: usize = 500;
    pub const MAX_UTTERANCE_LENGTH: usize = 5000;

    // Render API constants
    pub const DEFAULT_RENDER_BASE_URL: &str = "https://api.d-id.com";
    pub const DEFAULT_SOURCE_URL: &str =
        "https://d-id-public-bucket.s3.us-west-2.amazonaws.com/alice.jpg";
    pub const DEFAULT_VOICE_PROVIDER: &str = "microsoft";
    pub const DEFAULT_VOICE_ID: &str = "pt-BR-FranciscaNeural";
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
    pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;
    pub const DEFAULT_MAX_TRANSPORT_RETRIES: u32 = 3;
    pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;
    pub const MAX_WAIT_LIMIT_SECS: u64 = 24 * 3600;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    // TTS constants
    pub const DEFAULT_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";
    pub const DEFAULT_TTS_VOICE: &str = "pt-BR-Wavenet-A";
    pub const DEFAULT_TTS_LANGUAGE_CODE: &str = "pt-BR";
    pub const DEFAULT_SPEAKING_RATE: f32 = 1.0;
    pub const DEFAULT_PITCH: f32 = 0.0;
    pub const DEFAULT_CACHE_SIZE: usize = 64;

    // Retry constants
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
    pub const MAX_RETRY_DELAY_MS: u64 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_talkgen_error_creation() {
        let config_error = TalkgenError::config("Test config error");
        assert!(matches!(config_error, TalkgenError::Config(_)));
        assert_eq!(
            config_error.to_string(),
            "Configuration error: Test config error"
        );

        let generation_error = TalkgenError::generation("quota");
        assert_eq!(generation_error.to_string(), "Text generation error: quota");
    }

    #[test]
    fn test_text_too_long_error() {
        let error = TalkgenError::text_too_long(500);
        assert!(matches!(error, TalkgenError::TextTooLong { max_length: 500 }));
        assert_eq!(error.to_string(), "Text too long (max 500 characters)");
    }

    #[test]
    fn test_submission_error_keeps_status_and_body() {
        let error = SubmissionError::Rejected {
            status: 401,
            body: r#"{"message":"Unauthorized"}"#.to_string(),
        };
        assert_eq!(
            error.to_string(),
            r#"Render API rejected submission with status 401: {"message":"Unauthorized"}"#
        );

        let wrapped: TalkgenError = error.into();
        assert!(matches!(
            wrapped,
            TalkgenError::Render(RenderError::Submission(SubmissionError::Rejected {
                status: 401,
                ..
            }))
        ));
    }

    #[test]
    fn test_poll_error_into_job_result() {
        let failure = PollError::RemoteFailure {
            message: "face not detected".to_string(),
        };
        assert_eq!(
            failure.into_job_result(),
            Some(JobResult::Failed {
                message: "face not detected".to_string()
            })
        );
        assert_eq!(PollError::Cancelled.into_job_result(), None);
    }

    mod validation_tests {
        use super::super::constants;
        use super::super::validation::*;

        #[test]
        fn test_validate_niche() {
            assert!(validate_niche("Doces artesanais").is_ok());
            assert!(validate_niche("").is_err());
            assert!(validate_niche("   ").is_err());
            assert!(validate_niche(&"a".repeat(constants::MAX_NICHE_LENGTH + 1)).is_err());
        }

        #[test]
        fn test_validate_utterance_counts_chars() {
            let accented = "é".repeat(constants::MAX_UTTERANCE_LENGTH);
            assert!(validate_utterance(&accented).is_ok());
            assert!(validate_utterance(&format!("{accented}é")).is_err());
            assert!(validate_utterance(" \n ").is_err());
        }

        #[test]
        fn test_validate_media_url() {
            assert!(validate_media_url("https://example.com/avatar.jpg").is_ok());
            assert!(validate_media_url("not a url").is_err());
            assert!(validate_media_url("ftp://example.com/avatar.jpg").is_err());
        }
    }
}
