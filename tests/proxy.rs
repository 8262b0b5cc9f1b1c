//! Endpoint-level tests for the proxy handler, with the Gemini upstream
//! replaced by a local mock server.

use prompt_forge::handler::{handle_request, ProxyConfig};
use prompt_forge::image_utils::encode_image_base64;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn post(body: Value) -> lambda_http::Request {
    lambda_http::http::Request::builder()
        .method("POST")
        .uri("/api")
        .header("content-type", "application/json")
        .body(lambda_http::Body::Text(body.to_string()))
        .unwrap()
}

fn config(api_key: Option<&str>, api_base: &str) -> ProxyConfig {
    ProxyConfig {
        api_key: api_key.map(str::to_string),
        api_base: api_base.to_string(),
    }
}

fn gemini_reply(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
}

fn parse_body(response: &lambda_http::Response<String>) -> Value {
    serde_json::from_str(response.body()).unwrap()
}

#[tokio::test]
async fn analyze_image_returns_a_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(gemini_reply("  A misty forest at dawn  ")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = post(json!({
        "type": "analyzeImage",
        "payload": {
            "base64Image": encode_image_base64(b"fake png bytes"),
            "mimeType": "image/png",
            "language": "en",
            "length": "short"
        }
    }));

    let response = handle_request(request, &reqwest::Client::new(), &config(Some("k"), &server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(parse_body(&response)["prompt"], "A misty forest at dawn");
}

#[tokio::test]
async fn generate_text_returns_a_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("月下猫影，星河为幕")))
        .expect(1)
        .mount(&server)
        .await;

    let request = post(json!({
        "type": "generateText",
        "payload": {
            "inputText": "a cat under the moon",
            "language": "zh",
            "length": "long"
        }
    }));

    let response = handle_request(request, &reqwest::Client::new(), &config(Some("k"), &server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let prompt = parse_body(&response)["prompt"].as_str().unwrap().to_string();
    assert!(!prompt.is_empty());
}

#[tokio::test]
async fn unknown_request_type_is_rejected() {
    let request = post(json!({"type": "unknownType", "payload": {}}));

    let response = handle_request(
        request,
        &reqwest::Client::new(),
        &config(Some("k"), "http://127.0.0.1:9"),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(parse_body(&response)["error"], "Invalid request type");
}

#[tokio::test]
async fn missing_credential_is_a_configuration_error() {
    let server = MockServer::start().await;
    // The provider must not be contacted at all
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply("unreachable")))
        .expect(0)
        .mount(&server)
        .await;

    let request = post(json!({
        "type": "generateText",
        "payload": {"inputText": "a cat", "language": "en", "length": "short"}
    }));

    let response = handle_request(request, &reqwest::Client::new(), &config(None, &server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = parse_body(&response);
    assert_eq!(body["error"], "Server configuration error");
    assert_eq!(body["details"], "GEMINI_API_KEY not found.");
}

#[tokio::test]
async fn upstream_failure_maps_to_api_call_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("key revoked"))
        .mount(&server)
        .await;

    let request = post(json!({
        "type": "generateText",
        "payload": {"inputText": "a cat", "language": "en", "length": "medium"}
    }));

    let response = handle_request(request, &reqwest::Client::new(), &config(Some("k"), &server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = parse_body(&response);
    assert_eq!(body["error"], "API call failed");
    assert!(body["details"].as_str().unwrap().contains("key revoked"));
}

#[tokio::test]
async fn undecodable_image_payload_is_rejected() {
    let request = post(json!({
        "type": "analyzeImage",
        "payload": {
            "base64Image": "???not-base64???",
            "mimeType": "image/png",
            "language": "en",
            "length": "short"
        }
    }));

    let response = handle_request(
        request,
        &reqwest::Client::new(),
        &config(Some("k"), "http://127.0.0.1:9"),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(parse_body(&response)["error"], "Invalid request payload");
}

#[tokio::test]
async fn malformed_enum_values_are_rejected() {
    let request = post(json!({
        "type": "generateText",
        "payload": {"inputText": "a cat", "language": "fr", "length": "huge"}
    }));

    let response = handle_request(
        request,
        &reqwest::Client::new(),
        &config(Some("k"), "http://127.0.0.1:9"),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(parse_body(&response)["error"], "Invalid request payload");
}

#[tokio::test]
async fn non_post_requests_are_rejected() {
    let request = lambda_http::http::Request::builder()
        .method("GET")
        .uri("/api")
        .body(lambda_http::Body::Empty)
        .unwrap();

    let response = handle_request(
        request,
        &reqwest::Client::new(),
        &config(Some("k"), "http://127.0.0.1:9"),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 405);
    assert_eq!(parse_body(&response)["error"], "Method not allowed");
}
