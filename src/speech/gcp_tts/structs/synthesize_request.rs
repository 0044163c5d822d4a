use serde::{Deserialize, Serialize};

/// Example:
/// ```rust
/// use talkgen::speech::gcp_tts::structs::synthesize_request::*;
///
/// let request = SynthesizeRequest {
///     input: SynthesisInput { text: String::from("Olá!") },
///     voice: VoiceSelectionParams {
///         languageCode: String::from("pt-BR"),
///         name: String::from("pt-BR-Wavenet-A"),
///     },
///     audioConfig: AudioConfig {
///         audioEncoding: String::from("MP3"),
///         speakingRate: 1.0f32,
///         pitch: 0.0f32,
///     },
/// };
/// assert_eq!(serde_json::to_value(&request).unwrap()["voice"]["languageCode"], "pt-BR");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
#[allow(non_snake_case)]
pub struct SynthesizeRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelectionParams,
    pub audioConfig: AudioConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SynthesisInput {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[allow(non_snake_case)]
pub struct VoiceSelectionParams {
    pub languageCode: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[allow(non_snake_case)]
pub struct AudioConfig {
    pub audioEncoding: String,
    pub speakingRate: f32,
    pub pitch: f32,
}
