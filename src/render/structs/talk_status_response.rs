use serde::{Deserialize, Serialize};

/// Body of `GET /talks/{id}`. Only the fields the poll loop reads.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TalkStatusResponse {
    pub status: Option<String>,
    pub result_url: Option<String>,
    pub error: Option<serde_json::Value>,
}

impl TalkStatusResponse {
    /// Human readable failure reason reported by the provider.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(serde_json::Value::Object(fields)) => fields
                .get("description")
                .or_else(|| fields.get("message"))
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| serde_json::Value::Object(fields.clone()).to_string()),
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => "render job reported an error without details".to_string(),
        }
    }
}
