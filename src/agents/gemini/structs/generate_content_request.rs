use serde::{Deserialize, Serialize};

/// Example:
/// ```rust
/// use talkgen::agents::gemini::structs::generate_content_request::*;
///
/// let request = GenerateContentRequest {
///     systemInstruction: Content::text(None, "You are a copywriter."),
///     contents: vec![Content::text(Some("user"), "Write a caption.")],
///     generationConfig: GenerationConfig { temperature: 0.7 },
/// };
/// assert_eq!(request.contents[0].parts[0].text, "Write a caption.");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
#[allow(non_snake_case)]
pub struct GenerateContentRequest {
    pub systemInstruction: Content,
    pub contents: Vec<Content>,
    pub generationConfig: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
}
