// AI layer: OpenAI client plus the fixed-prompt agents built on it

pub mod agents;
pub mod client;

pub use agents::{
    Agent, AgentOptions, ImageAnalysisAgent, PromptGenerationAgent, RecommendationAgent,
};
pub use client::{ChatMessage, GeneratedImageData, OpenAiClient, OpenAiError};
