use lambda_http::{run, service_fn, Error};
use prompt_forge::handler::{handle_request, ProxyConfig};
use reqwest::Client as ReqwestClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_env_filter(EnvFilter::new("prompt_forge=debug"))
        .init();

    info!("Starting the prompt generation service");

    // Read configuration here because this place is a cold start. A missing
    // credential is reported per request, not fatal at startup.
    let config = ProxyConfig::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, requests will be rejected");
    } else {
        info!("Gemini credential loaded");
    }

    let client = ReqwestClient::new();
    info!("Gemini API client initialized");

    // Run the Lambda function
    info!("Starting Lambda function");
    run(service_fn(|req| handle_request(req, &client, &config))).await
}
