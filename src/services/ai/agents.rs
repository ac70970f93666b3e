// AI agents: fixed system prompts over the shared chat completion client
// Each agent is one templated request; no retries, no tool loops

use serde_json::Value;
use tracing::{error, instrument};

use super::client::{ChatMessage, OpenAiClient, OpenAiError};

/// Maximum style-reference images forwarded to the prompt engineer
const MAX_STYLE_REFERENCE_IMAGES: usize = 3;

// =============================================================================
// AGENT CORE
// =============================================================================

/// Options for a single agent execution
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Image URLs attached to the user message as vision parts
    pub images: Vec<String>,
    /// Extra context appended to the prompt as JSON
    pub context: Option<Value>,
    /// Request a JSON-object response
    pub json: bool,
}

/// One external AI completion call wrapped in a fixed system prompt
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: &'static str,
    pub system_prompt: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Agent {
    /// Build the message list for one execution. Pure, so the payload shape
    /// is testable without any network access.
    pub fn build_messages(&self, prompt: &str, options: &AgentOptions) -> Vec<ChatMessage> {
        let full_prompt = match &options.context {
            Some(context) => format!("{}\n\nAdditional context: {}", prompt, context),
            None => prompt.to_string(),
        };

        let user_message = if options.images.is_empty() {
            ChatMessage::user(full_prompt)
        } else {
            ChatMessage::user_with_images(full_prompt, &options.images)
        };

        vec![ChatMessage::system(self.system_prompt), user_message]
    }

    /// Execute the agent and return the raw text reply
    #[instrument(skip(self, client, prompt, options), fields(agent = self.name))]
    pub async fn execute(
        &self,
        client: &OpenAiClient,
        prompt: &str,
        options: &AgentOptions,
    ) -> Result<String, OpenAiError> {
        let messages = self.build_messages(prompt, options);
        client
            .chat_completion(messages, self.temperature, self.max_tokens, options.json)
            .await
            .map_err(|e| {
                error!("Agent {} failed: {}", self.name, e);
                e
            })
    }

    /// Execute with JSON mode and parse the reply
    pub async fn execute_json(
        &self,
        client: &OpenAiClient,
        prompt: &str,
        options: &AgentOptions,
    ) -> Result<Value, OpenAiError> {
        let options = AgentOptions {
            json: true,
            ..options.clone()
        };
        let content = self.execute(client, prompt, &options).await?;
        serde_json::from_str(&content).map_err(|e| OpenAiError::Parse(e.to_string()))
    }
}

// =============================================================================
// IMAGE ANALYSIS AGENT
// =============================================================================

/// Describes product images: shot type, angle, composition, visible features
pub struct ImageAnalysisAgent {
    agent: Agent,
}

impl ImageAnalysisAgent {
    pub fn new() -> Self {
        Self {
            agent: Agent {
                name: "ImageAnalysisAgent",
                system_prompt: "You are a product image analyzer.\n\
                    You receive: product images and optional context (title, description).\n\
                    You return: a JSON object where each key is the image filename/url and each \
                    value is a natural language description of what you see in that image.\n\
                    Focus on: shot type (hero, lifestyle, detail, scale, etc.), angle, \
                    composition, visible features, and what the image shows.\n\
                    Be concise but thorough in your descriptions.",
                temperature: 1.0,
                max_tokens: 2000,
            },
        }
    }

    /// Analyze a single product image into a short description
    pub async fn analyze_image(
        &self,
        client: &OpenAiClient,
        image_url: &str,
        context: Option<Value>,
    ) -> Result<String, OpenAiError> {
        let mut prompt = "Analyze this product image and describe what you see in 2-3 \
            sentences. Focus on shot type, composition, and visible features."
            .to_string();
        if let Some(ref ctx) = context {
            prompt.push_str(&format!("\nContext: {}", ctx));
        }

        let options = AgentOptions {
            images: vec![image_url.to_string()],
            ..Default::default()
        };
        self.agent.execute(client, &prompt, &options).await
    }
}

impl Default for ImageAnalysisAgent {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RECOMMENDATION AGENT
// =============================================================================

/// Recommends additional shots that would improve conversion
pub struct RecommendationAgent {
    agent: Agent,
}

impl RecommendationAgent {
    pub fn new() -> Self {
        Self {
            agent: Agent {
                name: "RecommendationAgent",
                system_prompt: "You are an e-commerce conversion expert.\n\
                    You will analyze product images and recommend additional shots that would \
                    improve conversion.\n\
                    You return: a JSON object with a \"recommendations\" key holding an array \
                    of strings, each string a specific recommendation for an additional product \
                    shot that would help convert browsers to buyers.\n\
                    Focus on: lifestyle shots showing the product in use, detail shots of \
                    materials/features, scale comparisons, and hero shots that are missing.\n\
                    Each recommendation should be one clear, actionable sentence describing \
                    what to capture.\n\
                    Recommend 3-6 shots maximum based on what's missing from the current images.",
                temperature: 1.0,
                max_tokens: 2000,
            },
        }
    }

    /// Recommend additional product shots based on the selected images
    pub async fn recommend_shots(
        &self,
        client: &OpenAiClient,
        image_urls: &[String],
        context: Option<Value>,
    ) -> Result<Vec<String>, OpenAiError> {
        let prompt = "Analyze these product images and recommend additional shots that \
            would improve conversion.";

        let options = AgentOptions {
            images: image_urls.to_vec(),
            context,
            json: true,
        };
        let reply = self.agent.execute_json(client, prompt, &options).await?;
        Ok(Self::parse_recommendations(&reply))
    }

    /// Accept either {"recommendations": [...]} or a bare array; model output
    /// drifts between the two
    pub fn parse_recommendations(reply: &Value) -> Vec<String> {
        let array = match reply {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get("recommendations").and_then(|v| v.as_array()),
            _ => None,
        };

        array
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for RecommendationAgent {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PROMPT GENERATION AGENT
// =============================================================================

/// Generates and refines image-generation prompts from shot recommendations
pub struct PromptGenerationAgent {
    agent: Agent,
}

impl PromptGenerationAgent {
    pub fn new() -> Self {
        Self {
            agent: Agent {
                name: "PromptGenerationAgent",
                system_prompt: "You are a DALL-E prompt engineer specialized in e-commerce \
                    product photography.\n\
                    You receive: a recommendation for a shot to create, optionally with \
                    existing product images for style reference.\n\
                    You return: a single string that is an optimized DALL-E prompt.\n\
                    The prompt should be: specific, detailed, mention lighting, composition, \
                    background, and maintain consistency with any existing images shown.\n\
                    Keep prompts under 400 characters for best results.\n\
                    Focus on photorealistic, professional e-commerce quality.",
                temperature: 1.0,
                max_tokens: 2000,
            },
        }
    }

    /// Turn a shot recommendation into an optimized generation prompt
    pub async fn generate_prompt(
        &self,
        client: &OpenAiClient,
        recommendation: &str,
        style_reference_images: &[String],
        context: Option<Value>,
    ) -> Result<String, OpenAiError> {
        let images: Vec<String> = style_reference_images
            .iter()
            .take(MAX_STYLE_REFERENCE_IMAGES)
            .cloned()
            .collect();

        let options = AgentOptions {
            images,
            context,
            json: false,
        };
        self.agent.execute(client, recommendation, &options).await
    }

    /// Refine an existing prompt based on user feedback
    pub async fn refine_prompt(
        &self,
        client: &OpenAiClient,
        original_prompt: &str,
        feedback: &str,
    ) -> Result<String, OpenAiError> {
        let prompt = format!(
            "Original prompt: {}\n\nUser feedback: {}\n\nCreate an improved prompt.",
            original_prompt, feedback
        );
        self.agent
            .execute(client, &prompt, &AgentOptions::default())
            .await
    }
}

impl Default for PromptGenerationAgent {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::client::MessageContent;

    fn test_agent() -> Agent {
        Agent {
            name: "TestAgent",
            system_prompt: "You are a test agent.",
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    #[test]
    fn test_build_messages_without_images() {
        let messages = test_agent().build_messages("hello", &AgentOptions::default());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(
            messages[0].content,
            MessageContent::Text("You are a test agent.".to_string())
        );
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, MessageContent::Text("hello".to_string()));
    }

    #[test]
    fn test_build_messages_appends_context() {
        let options = AgentOptions {
            context: Some(serde_json::json!({"title": "Mug"})),
            ..Default::default()
        };
        let messages = test_agent().build_messages("hello", &options);
        match &messages[1].content {
            MessageContent::Text(text) => {
                assert!(text.starts_with("hello\n\nAdditional context: "));
                assert!(text.contains("\"title\":\"Mug\""));
            },
            other => panic!("Expected text content, got {:?}", other),
        }
    }

    #[test]
    fn test_build_messages_with_images_uses_parts() {
        let options = AgentOptions {
            images: vec![
                "https://cdn.example.com/1.jpg".to_string(),
                "https://cdn.example.com/2.jpg".to_string(),
            ],
            ..Default::default()
        };
        let messages = test_agent().build_messages("describe", &options);
        match &messages[1].content {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 3),
            other => panic!("Expected parts content, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_recommendations_object_and_array() {
        let wrapped = serde_json::json!({"recommendations": ["shot a", "shot b"]});
        assert_eq!(
            RecommendationAgent::parse_recommendations(&wrapped),
            vec!["shot a", "shot b"]
        );

        let bare = serde_json::json!(["shot a"]);
        assert_eq!(RecommendationAgent::parse_recommendations(&bare), vec!["shot a"]);

        let junk = serde_json::json!("not a list");
        assert!(RecommendationAgent::parse_recommendations(&junk).is_empty());
    }

    #[test]
    fn test_style_reference_cap() {
        // generate_prompt truncates to MAX_STYLE_REFERENCE_IMAGES before building parts
        let urls: Vec<String> = (0..5)
            .map(|i| format!("https://cdn.example.com/{}.jpg", i))
            .collect();
        let capped: Vec<String> = urls.iter().take(MAX_STYLE_REFERENCE_IMAGES).cloned().collect();
        assert_eq!(capped.len(), 3);
    }
}
