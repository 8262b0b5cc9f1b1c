use reqwest::Client as ReqwestClient;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::image_utils::encode_image_base64;
use crate::structs::{GeminiContent, GeminiInlineData, GeminiPart, GeminiRequest, GeminiResponse};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Decoded image bytes with the MIME type the uploader declared.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {detail}")]
    Provider { status: StatusCode, detail: String },
    #[error("failed to decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Gemini response contained no text")]
    EmptyResponse,
}

/// Sends a single generateContent call. One attempt, no retries; any failure
/// is reported upward with the provider's detail text.
pub async fn send_gemini_request(
    client: &ReqwestClient,
    api_key: &str,
    api_base: &str,
    instruction: &str,
    image: Option<&InlineImage>,
) -> Result<String, GatewayError> {
    let mut parts = Vec::new();

    // The image part goes first, then the instruction.
    if let Some(image) = image {
        parts.push(GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.mime_type.clone(),
                data: encode_image_base64(&image.bytes),
            },
        });
    }
    parts.push(GeminiPart::Text {
        text: instruction.to_string(),
    });

    let request_body = GeminiRequest {
        contents: vec![GeminiContent { parts }],
    };

    debug!(
        "Sending request to Gemini ({} instruction chars, image: {})",
        instruction.len(),
        image.is_some()
    );
    let now = std::time::Instant::now();

    let response = client
        .post(format!("{api_base}/models/{GEMINI_MODEL}:generateContent"))
        .header("x-goog-api-key", api_key)
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    let response_body = response.text().await?;

    if !status.is_success() {
        return Err(GatewayError::Provider {
            status,
            detail: response_body,
        });
    }

    let response: GeminiResponse = serde_json::from_str(&response_body)?;
    let text = extract_text(&response).ok_or(GatewayError::EmptyResponse)?;

    info!("Gemini responded in {:.1}s", now.elapsed().as_secs_f32());
    Ok(text)
}

fn extract_text(response: &GeminiResponse) -> Option<String> {
    let parts = &response.candidates.first()?.content.as_ref()?.parts;
    let text: String = parts.iter().filter_map(|part| part.text.as_deref()).collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
