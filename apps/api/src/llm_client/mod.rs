/// LLM client: the single point of entry for every model call in Celestia.
///
/// ARCHITECTURAL RULE: flows reach the model only through the `ModelBackend` trait.
/// `LlmClient` is the production backend (Anthropic Messages API); tests swap in a
/// scripted backend.
///
/// Model: claude-sonnet-4-5, fixed for every flow.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all readings and translations.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Lifetime horoscopes cover up to 100 yearly entries, so leave generous headroom.
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

impl LlmError {
    /// True when the upstream service reported it is overloaded or throttling us.
    pub fn is_overloaded(&self) -> bool {
        matches!(
            self,
            LlmError::Api { status: 429 | 503 | 529, .. } | LlmError::RateLimited { .. }
        )
    }
}

/// Media attached to a model request. The prompt text refers to it by position,
/// never by embedding the bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRef {
    /// Base64 payload taken from a `data:` URI.
    Inline { media_type: String, data: String },
    /// Publicly resolvable URL the model fetches itself.
    Url(String),
}

/// One fully rendered flow invocation: prompts, declared output schema, optional media.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub flow: &'static str,
    pub system: String,
    pub prompt: String,
    pub output_schema: Value,
    pub media: Option<MediaRef>,
}

/// The opaque generation service boundary.
///
/// `Ok(None)` means the model answered with nothing usable (no text, empty text or
/// JSON `null`). Transport failures are `Err`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<Option<Value>, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageSource<'a> {
    Base64 { media_type: &'a str, data: &'a str },
    Url { url: &'a str },
}

impl MediaRef {
    fn as_content_part(&self) -> ContentPart<'_> {
        let source = match self {
            MediaRef::Inline { media_type, data } => ImageSource::Base64 { media_type, data },
            MediaRef::Url(url) => ImageSource::Url { url },
        };
        ContentPart::Image { source }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Production model backend wrapping the Anthropic Messages API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the Messages API, returning the full response object.
    /// Retries transport failures, 429 and 5xx with exponential backoff. Any other
    /// status is terminal.
    async fn call(
        &self,
        system: &str,
        content: Vec<ContentPart<'_>>,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ModelBackend for LlmClient {
    async fn generate(&self, request: &ModelRequest) -> Result<Option<Value>, LlmError> {
        let system = system_with_schema(request)?;

        let mut content = Vec::with_capacity(2);
        if let Some(media) = &request.media {
            content.push(media.as_content_part());
        }
        content.push(ContentPart::Text {
            text: &request.prompt,
        });

        let response = self.call(&system, content).await?;
        debug!(flow = request.flow, "model responded");

        parse_model_text(response.text())
    }
}

/// Appends the declared output schema to the flow's system prompt.
fn system_with_schema(request: &ModelRequest) -> Result<String, LlmError> {
    let schema = serde_json::to_string_pretty(&request.output_schema)?;
    Ok(format!(
        "{}\n\n{}\n\n{}\n{}",
        request.system,
        prompts::JSON_ONLY_SYSTEM,
        prompts::OUTPUT_SCHEMA_PREAMBLE,
        schema
    ))
}

/// Turns the model's text block into JSON. Missing, blank or `null` output is `None`.
fn parse_model_text(text: Option<&str>) -> Result<Option<Value>, LlmError> {
    let Some(text) = text else {
        return Ok(None);
    };
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
