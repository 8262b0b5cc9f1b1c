use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::image_utils::{encode_image_base64, is_image_mime};
use crate::structs::{
    AnalyzeImagePayload, ApiRequest, ErrorResponse, GenerateTextPayload, PromptResponse,
};
use crate::templates::{Language, PromptLength};

const COPY_CONFIRMATION: Duration = Duration::from_secs(2);

// User-facing messages, as the product ships them.
const MSG_INVALID_IMAGE: &str = "请上传有效的图片文件。";
const MSG_NO_IMAGE: &str = "请先选择一张图片。";
const MSG_NO_CONCEPT: &str = "请输入您的想法。";

/// How a session talks to the prompt service. The production transport posts
/// to the proxy endpoint; it never sees the provider credential.
#[async_trait]
pub trait PromptTransport {
    async fn generate(&self, request: ApiRequest) -> Result<String>;
}

pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(client: ReqwestClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PromptTransport for HttpTransport {
    async fn generate(&self, request: ApiRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("failed to reach the prompt service")?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ErrorResponse>().await {
                Ok(body) => match body.details {
                    Some(details) => anyhow!("{}: {}", body.error, details),
                    None => anyhow!("{} ({})", body.error, status),
                },
                Err(_) => anyhow!("prompt service returned {status}"),
            });
        }

        let body: PromptResponse = response
            .json()
            .await
            .context("prompt service returned an unreadable response")?;
        Ok(body.prompt)
    }
}

/// A viewer resource backing the image preview (an object URL in the
/// browser). Released exactly once, when the attachment it belongs to is
/// replaced, removed or dropped.
pub trait PreviewHandle: Send {
    fn release(&mut self);
}

pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    preview: Box<dyn PreviewHandle>,
}

impl Drop for ImageAttachment {
    fn drop(&mut self) {
        self.preview.release();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Image,
    Text,
}

/// Per-request lifecycle. Transitions happen only through the session's
/// submit/resolve/reject/reset paths, never by poking individual flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Submitting,
    Succeeded { prompt: String },
    Failed { message: String },
}

/// Client-side controller: collects the user's input, talks to the proxy and
/// holds the result/error state for the view.
pub struct PromptSession<T: PromptTransport> {
    transport: T,
    mode: InputMode,
    language: Language,
    length: PromptLength,
    concept: String,
    image: Option<ImageAttachment>,
    state: RequestState,
    copied_until: Option<Instant>,
    picker_epoch: u64,
}

impl<T: PromptTransport> PromptSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            mode: InputMode::Image,
            language: Language::Zh,
            length: PromptLength::Medium,
            concept: String::new(),
            image: None,
            state: RequestState::Idle,
            copied_until: None,
            picker_epoch: 0,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn length(&self) -> PromptLength {
        self.length
    }

    pub fn set_length(&mut self, length: PromptLength) {
        self.length = length;
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn set_concept(&mut self, concept: impl Into<String>) {
        self.concept = concept.into();
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == RequestState::Submitting
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.state {
            RequestState::Succeeded { prompt } => Some(prompt),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            RequestState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Bumped whenever the selected image is removed, so the view can reset
    /// the file picker and the same file can be re-selected immediately.
    pub fn picker_epoch(&self) -> u64 {
        self.picker_epoch
    }

    /// Single funnel for every image source (picker, drop, paste). A
    /// non-image candidate is rejected with a user-visible message and the
    /// current attachment is kept.
    pub fn attach_image(
        &mut self,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        preview: Box<dyn PreviewHandle>,
    ) {
        let candidate = ImageAttachment {
            bytes,
            mime_type: mime_type.into(),
            preview,
        };

        if !is_image_mime(&candidate.mime_type) {
            warn!("Rejected non-image attachment: {}", candidate.mime_type);
            self.state = RequestState::Failed {
                message: MSG_INVALID_IMAGE.to_string(),
            };
            return; // candidate dropped, its preview released
        }

        // Replacing the attachment drops the old one, releasing its preview
        self.image = Some(candidate);
        self.state = RequestState::Idle;
    }

    /// Clipboard paste only counts while the image tab is active.
    pub fn paste_image(
        &mut self,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        preview: Box<dyn PreviewHandle>,
    ) {
        let mime_type = mime_type.into();
        if self.mode != InputMode::Image {
            debug!("Ignoring pasted file outside image mode");
            let _ = ImageAttachment {
                bytes,
                mime_type,
                preview,
            };
            return;
        }
        self.attach_image(bytes, mime_type, preview);
    }

    /// Clears the file, the preview, the result and any error together.
    pub fn remove_image(&mut self) {
        self.image = None;
        self.state = RequestState::Idle;
        self.picker_epoch += 1;
    }

    pub async fn submit_image(&mut self) {
        if self.is_loading() {
            debug!("Ignoring submit while a request is in flight");
            return;
        }
        let Some(attachment) = self.image.as_ref() else {
            self.state = RequestState::Failed {
                message: MSG_NO_IMAGE.to_string(),
            };
            return;
        };

        let request = ApiRequest::AnalyzeImage(AnalyzeImagePayload {
            base64_image: encode_image_base64(&attachment.bytes),
            mime_type: attachment.mime_type.clone(),
            language: self.language,
            length: self.length,
        });

        self.state = RequestState::Submitting;
        self.state = match self.transport.generate(request).await {
            Ok(prompt) => RequestState::Succeeded { prompt },
            Err(e) => RequestState::Failed {
                message: format!("图片分析失败。请检查您的网络连接，或尝试使用其他图片。详情: {e:#}"),
            },
        };
    }

    pub async fn submit_text(&mut self) {
        if self.is_loading() {
            debug!("Ignoring submit while a request is in flight");
            return;
        }
        if self.concept.trim().is_empty() {
            self.state = RequestState::Failed {
                message: MSG_NO_CONCEPT.to_string(),
            };
            return;
        }

        let request = ApiRequest::GenerateText(GenerateTextPayload {
            input_text: self.concept.clone(),
            language: self.language,
            length: self.length,
        });

        self.state = RequestState::Submitting;
        self.state = match self.transport.generate(request).await {
            Ok(prompt) => RequestState::Succeeded { prompt },
            Err(e) => RequestState::Failed {
                message: format!("提示词生成失败。请检查您的网络连接后重试。详情: {e:#}"),
            },
        };
    }

    /// Returns the text to hand to the clipboard and arms the transient
    /// copied indicator, which reverts on its own after two seconds.
    pub fn copy_prompt(&mut self) -> Option<String> {
        let RequestState::Succeeded { prompt } = &self.state else {
            return None;
        };
        self.copied_until = Some(Instant::now() + COPY_CONFIRMATION);
        Some(prompt.clone())
    }

    pub fn copy_confirmed(&self) -> bool {
        self.copied_until
            .is_some_and(|until| Instant::now() < until)
    }
}
