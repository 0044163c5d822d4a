use std::{env, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    errors::{constants::*, Result, TalkgenError},
    render::client::PollPolicy,
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub temperature: f32,
    pub language: String,
    pub render_api_key: Option<String>,
    pub render_base_url: String,
    pub source_url: String,
    pub voice_id: String,
    pub voice_provider: String,
    pub max_script_length: usize,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub max_transport_retries: u32,
    pub request_timeout_secs: u64,
    pub tts_api_key: Option<String>,
    pub tts_voice: String,
    pub tts_language_code: String,
    pub otel_http_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            language: DEFAULT_LANGUAGE.to_string(),
            render_api_key: None,
            render_base_url: DEFAULT_RENDER_BASE_URL.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            voice_provider: DEFAULT_VOICE_PROVIDER.to_string(),
            max_script_length: DEFAULT_MAX_SCRIPT_LENGTH,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            max_transport_retries: DEFAULT_MAX_TRANSPORT_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            tts_api_key: None,
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            tts_language_code: DEFAULT_TTS_LANGUAGE_CODE.to_string(),
            otel_http_url: None,
        }
    }
}

impl Config {
    /// Load `path` if it exists, otherwise read `TALKGEN_*` environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            Self::from_toml(&raw)?
        } else {
            Self::from_lookup(|name| env::var(name).ok())?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(raw)?)
    }

    /// Build a config from a variable lookup, e.g. the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let defaults = Config::default();

        let gemini_api_key =
            var("GEMINI_API_KEY").ok_or_else(|| TalkgenError::missing_env_var("TALKGEN_GEMINI_API_KEY"))?;

        Ok(Config {
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            temperature: parse_or(var("TEMPERATURE"), "TEMPERATURE", defaults.temperature)?,
            language: var("LANGUAGE").unwrap_or(defaults.language),
            render_api_key: var("RENDER_API_KEY"),
            render_base_url: var("RENDER_BASE_URL").unwrap_or(defaults.render_base_url),
            source_url: var("SOURCE_URL").unwrap_or(defaults.source_url),
            voice_id: var("VOICE_ID").unwrap_or(defaults.voice_id),
            voice_provider: var("VOICE_PROVIDER").unwrap_or(defaults.voice_provider),
            max_script_length: parse_or(
                var("MAX_SCRIPT_LENGTH"),
                "MAX_SCRIPT_LENGTH",
                defaults.max_script_length,
            )?,
            poll_interval_secs: parse_or(
                var("POLL_INTERVAL_SECS"),
                "POLL_INTERVAL_SECS",
                defaults.poll_interval_secs,
            )?,
            max_wait_secs: parse_or(var("MAX_WAIT_SECS"), "MAX_WAIT_SECS", defaults.max_wait_secs)?,
            max_transport_retries: parse_or(
                var("MAX_TRANSPORT_RETRIES"),
                "MAX_TRANSPORT_RETRIES",
                defaults.max_transport_retries,
            )?,
            request_timeout_secs: parse_or(
                var("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            tts_api_key: var("TTS_API_KEY"),
            tts_voice: var("TTS_VOICE").unwrap_or(defaults.tts_voice),
            tts_language_code: var("TTS_LANGUAGE_CODE").unwrap_or(defaults.tts_language_code),
            otel_http_url: var("OTEL_HTTP_URL"),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(TalkgenError::config("gemini_api_key is required"));
        }
        if self.poll_interval_secs == 0 {
            return Err(TalkgenError::config("poll_interval_secs must be positive"));
        }
        if self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            return Err(TalkgenError::config(format!(
                "poll_interval_secs must be at most {MAX_POLL_INTERVAL_SECS}"
            )));
        }
        if self.max_wait_secs > MAX_WAIT_LIMIT_SECS {
            return Err(TalkgenError::config(format!(
                "max_wait_secs must be at most {MAX_WAIT_LIMIT_SECS}"
            )));
        }
        if self.max_script_length == 0 {
            return Err(TalkgenError::config("max_script_length must be positive"));
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            max_transport_retries: self.max_transport_retries,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Key for the preview voice; falls back to the Gemini key.
    pub fn tts_key(&self) -> &str {
        self.tts_api_key.as_deref().unwrap_or(&self.gemini_api_key)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TalkgenError::config(format!("Invalid value for {ENV_PREFIX}{name}: {raw}"))),
        None => Ok(default),
    }
}
