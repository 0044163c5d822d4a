use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
#[allow(non_snake_case)]
pub struct SynthesizeResponse {
    pub audioContent: String,
}

impl SynthesizeResponse {
    /// Decode the base64 `audioContent` field.
    pub fn decode_audio(&self) -> Result<Bytes, base64::DecodeError> {
        STANDARD.decode(&self.audioContent).map(Bytes::from)
    }
}
