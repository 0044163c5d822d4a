use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::job::RenderRequest;

/// Body of `POST /talks`.
///
/// Example:
/// ```rust
/// use talkgen::render::{job::RenderRequest, structs::create_talk_request::CreateTalkRequest};
///
/// let request = RenderRequest::new("Olá!", "pt-BR-FranciscaNeural", "https://example.com/a.jpg").unwrap();
/// let body = serde_json::to_value(CreateTalkRequest::from(&request)).unwrap();
/// assert_eq!(body["script"]["provider"]["voice_id"], "pt-BR-FranciscaNeural");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateTalkRequest {
    pub script: Script,
    pub config: BTreeMap<String, String>,
    pub source_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Script {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtitles: String,
    pub provider: VoiceProvider,
    pub input: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VoiceProvider {
    #[serde(rename = "type")]
    pub kind: String,
    pub voice_id: String,
}

impl From<&RenderRequest> for CreateTalkRequest {
    fn from(request: &RenderRequest) -> Self {
        Self {
            script: Script {
                kind: "text".to_string(),
                subtitles: "false".to_string(),
                provider: VoiceProvider {
                    kind: request.voice_provider().to_string(),
                    voice_id: request.voice_id().to_string(),
                },
                input: request.utterance().to_string(),
            },
            config: request.provider_options().clone(),
            source_url: request.source_url().to_string(),
        }
    }
}
