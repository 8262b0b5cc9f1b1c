use serde::{Deserialize, Serialize};

use crate::templates::{Language, PromptLength};

// -- Client <-> proxy wire types --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImagePayload {
    pub base64_image: String,
    pub mime_type: String,
    pub language: Language,
    pub length: PromptLength,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextPayload {
    pub input_text: String,
    pub language: Language,
    pub length: PromptLength,
}

/// Request envelope accepted by the proxy endpoint. Exactly one variant is
/// active per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ApiRequest {
    AnalyzeImage(AnalyzeImagePayload),
    GenerateText(GenerateTextPayload),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, details: &str) -> Self {
        Self {
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }
}

// -- Gemini wire types --

#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    InlineData { inline_data: GeminiInlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
pub struct GeminiInlineData {
    pub mime_type: String,
    pub data: String,
}

// The response comes back camelCase, unlike the snake_case the endpoint
// accepts on requests.
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponseContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponsePart {
    pub text: Option<String>,
}
