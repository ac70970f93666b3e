// OpenAI API client: chat completions (with vision parts) and image generation
// One outbound call per operation, no retries; failures are logged and surfaced

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::app_config::{OpenAiConfig, CONFIG};

// Shared HTTP client with connection pooling for all OpenAI calls
static OPENAI_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(CONFIG.openai.request_timeout))
        .user_agent("ProdShot-Backend/1.0")
        .build()
        .expect("Failed to create HTTP client for OpenAI")
});

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("OpenAI API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("OpenAI response missing expected content")]
    MissingContent,

    #[error("Failed to parse OpenAI response: {0}")]
    Parse(String),
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A chat message; content is plain text or a list of vision parts
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrlPart {
    pub url: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// User message carrying a text part plus image attachments
    pub fn user_with_images(text: impl Into<String>, image_urls: &[String]) -> Self {
        let mut parts = vec![ContentPart::Text { text: text.into() }];
        for url in image_urls {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrlPart { url: url.clone() },
            });
        }
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    size: String,
    quality: String,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Result of a single image generation call
#[derive(Debug, Clone)]
pub struct GeneratedImageData {
    pub url: String,
    pub generation_time_ms: i32,
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            config: CONFIG.openai.clone(),
        }
    }

    pub fn with_config(config: OpenAiConfig) -> Self {
        Self { config }
    }

    /// Execute one chat completion and return the assistant's text content
    #[instrument(skip(self, messages))]
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
        json_mode: bool,
    ) -> Result<String, OpenAiError> {
        let request = ChatCompletionRequest {
            model: self.config.completion_model.clone(),
            messages,
            temperature,
            max_completion_tokens: max_tokens,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = OPENAI_HTTP_CLIENT
            .post(format!("{}/chat/completions", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI chat completion failed: {} {}", status, body);
            return Err(OpenAiError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OpenAiError::MissingContent)
    }

    /// Generate one image and return its URL with timing
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        quality: &str,
    ) -> Result<GeneratedImageData, OpenAiError> {
        info!(
            "Generating image: size={}, quality={}, prompt_len={}",
            size,
            quality,
            prompt.len()
        );

        let request = ImageGenerationRequest {
            model: self.config.image_model.clone(),
            prompt: prompt.to_string(),
            size: size.to_string(),
            quality: quality.to_string(),
            n: 1,
        };

        let start = Instant::now();
        let response = OPENAI_HTTP_CLIENT
            .post(format!("{}/images/generations", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI image generation failed: {} {}", status, body);
            return Err(OpenAiError::Api { status, body });
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or(OpenAiError::MissingContent)?;

        let data = GeneratedImageData {
            url,
            generation_time_ms: start.elapsed().as_millis() as i32,
        };

        info!("Image generated in {}ms", data.generation_time_ms);
        Ok(data)
    }

    /// Generate several variations of one prompt.
    ///
    /// Per-item failures are logged and skipped; the call errors only when
    /// nothing succeeded.
    pub async fn generate_image_variations(
        &self,
        prompt: &str,
        count: u32,
        size: &str,
    ) -> Result<Vec<GeneratedImageData>, OpenAiError> {
        run_variation_loop(count, VARIATION_SPACING, |_| {
            self.generate_image(prompt, size, "standard")
        })
        .await
    }
}

/// Pause between variation calls to stay under provider rate limits
const VARIATION_SPACING: Duration = Duration::from_millis(500);

/// Drive the variation loop over any per-item generator: failed items are
/// skipped, and the loop errors only when every item failed
async fn run_variation_loop<F, Fut>(
    count: u32,
    spacing: Duration,
    mut generate: F,
) -> Result<Vec<GeneratedImageData>, OpenAiError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<GeneratedImageData, OpenAiError>>,
{
    let mut images = Vec::new();
    let mut last_error = None;

    for i in 0..count {
        match generate(i).await {
            Ok(data) => images.push(data),
            Err(e) => {
                warn!("Variation {} of {} failed: {}", i + 1, count, e);
                last_error = Some(e);
            },
        }

        if i + 1 < count {
            tokio::time::sleep(spacing).await;
        }
    }

    if images.is_empty() {
        return Err(last_error.unwrap_or(OpenAiError::MissingContent));
    }

    Ok(images)
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_serializes_as_plain_string() {
        let msg = ChatMessage::system("You are a product image analyzer.");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "You are a product image analyzer.");
    }

    #[test]
    fn test_vision_message_serializes_parts() {
        let msg = ChatMessage::user_with_images(
            "Describe this",
            &["https://cdn.example.com/a.jpg".to_string()],
        );
        let json = serde_json::to_value(&msg).unwrap();
        let parts = json["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "Describe this");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "https://cdn.example.com/a.jpg");
    }

    fn stub_image(i: u32) -> GeneratedImageData {
        GeneratedImageData {
            url: format!("https://img.example.com/{}.png", i),
            generation_time_ms: 10,
        }
    }

    fn api_failure() -> OpenAiError {
        OpenAiError::Api {
            status: 500,
            body: "upstream error".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_variation_loop_skips_failed_items() {
        let result = run_variation_loop(3, Duration::from_millis(500), |i| async move {
            if i == 1 {
                Err(api_failure())
            } else {
                Ok(stub_image(i))
            }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].url, "https://img.example.com/0.png");
        assert_eq!(result[1].url, "https://img.example.com/2.png");
    }

    #[tokio::test(start_paused = true)]
    async fn test_variation_loop_errors_only_when_all_fail() {
        let result =
            run_variation_loop(2, Duration::from_millis(500), |_| async { Err(api_failure()) })
                .await;
        assert!(matches!(result, Err(OpenAiError::Api { status: 500, .. })));
    }

    #[test]
    fn test_json_mode_response_format() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 1.0,
            max_completion_tokens: 2000,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");

        let request = ChatCompletionRequest {
            response_format: None,
            ..request
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("response_format").is_none());
    }
}
