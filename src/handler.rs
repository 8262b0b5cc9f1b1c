use lambda_http::http::Method;
use lambda_http::{Request, Response};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::apis::{send_gemini_request, InlineImage, GEMINI_BASE_URL};
use crate::image_utils::decode_image_base64;
use crate::structs::{AnalyzeImagePayload, ErrorResponse, GenerateTextPayload, PromptResponse};
use crate::templates::{build_image_instruction, build_text_instruction};

/// Server-side configuration, read once at cold start. The credential never
/// travels to the client.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub api_base: String,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            api_base: GEMINI_BASE_URL.to_string(),
        }
    }
}

// The {type, payload} envelope is split open in two steps so an unknown type
// can be told apart from a malformed payload.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

pub async fn handle_request(
    req: Request,
    client: &ReqwestClient,
    config: &ProxyConfig,
) -> Result<Response<String>, lambda_http::Error> {
    debug!("Received a new request");

    if req.method() != Method::POST {
        warn!("Rejected {} request", req.method());
        return json_response(405, &ErrorResponse::new("Method not allowed"));
    }

    // Refuse to do any work without the provider credential
    let Some(api_key) = config.api_key.as_deref() else {
        error!("GEMINI_API_KEY is not configured");
        return json_response(
            500,
            &ErrorResponse::with_details("Server configuration error", "GEMINI_API_KEY not found."),
        );
    };

    let envelope: Envelope = match serde_json::from_slice(req.body()) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to parse request body: {e}");
            return json_response(400, &ErrorResponse::new("Invalid request body"));
        }
    };

    let result = match envelope.kind.as_str() {
        "analyzeImage" => {
            let payload: AnalyzeImagePayload = match serde_json::from_value(envelope.payload) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Malformed analyzeImage payload: {e}");
                    return json_response(
                        400,
                        &ErrorResponse::with_details("Invalid request payload", &e.to_string()),
                    );
                }
            };

            let bytes = match decode_image_base64(&payload.base64_image) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Image payload is not valid base64: {e}");
                    return json_response(
                        400,
                        &ErrorResponse::with_details("Invalid request payload", &e.to_string()),
                    );
                }
            };

            info!(
                "Dispatching analyzeImage ({} bytes, {} {})",
                bytes.len(),
                payload.language,
                payload.length
            );

            let image = InlineImage {
                bytes,
                mime_type: payload.mime_type,
            };
            let instruction = build_image_instruction(payload.language, payload.length);
            send_gemini_request(client, api_key, &config.api_base, &instruction, Some(&image)).await
        }
        "generateText" => {
            let payload: GenerateTextPayload = match serde_json::from_value(envelope.payload) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Malformed generateText payload: {e}");
                    return json_response(
                        400,
                        &ErrorResponse::with_details("Invalid request payload", &e.to_string()),
                    );
                }
            };

            info!(
                "Dispatching generateText ({} {})",
                payload.language, payload.length
            );

            let instruction =
                build_text_instruction(&payload.input_text, payload.language, payload.length);
            send_gemini_request(client, api_key, &config.api_base, &instruction, None).await
        }
        other => {
            warn!("Unknown request type: {other}");
            return json_response(400, &ErrorResponse::new("Invalid request type"));
        }
    };

    // Nothing about the request or the response is kept after this point
    match result {
        Ok(prompt) => {
            info!("Returning generated prompt ({} chars)", prompt.len());
            json_response(200, &PromptResponse { prompt })
        }
        Err(e) => {
            error!("Gemini call failed: {e}");
            json_response(
                500,
                &ErrorResponse::with_details("API call failed", &e.to_string()),
            )
        }
    }
}

fn json_response<T: serde::Serialize>(
    status: u16,
    body: &T,
) -> Result<Response<String>, lambda_http::Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_string(body)?)?;
    Ok(response)
}
