// Generated image model: status lifecycle and the revision chain
// A generated image may refine a parent image; refinements form a tree
// rooted at first-generation images within the same studio session.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::generated_images;

// =============================================================================
// STATUS LIFECYCLE
// =============================================================================

/// Generation lifecycle status.
///
/// Transitions are monotonic: pending -> processing -> {completed, failed}.
/// Completed and failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }

    /// Whether moving to `next` is a legal forward transition
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        matches!(
            (self, next),
            (GenerationStatus::Pending, GenerationStatus::Processing)
                | (GenerationStatus::Pending, GenerationStatus::Failed)
                | (GenerationStatus::Processing, GenerationStatus::Completed)
                | (GenerationStatus::Processing, GenerationStatus::Failed)
        )
    }
}

impl FromStr for GenerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GenerationStatus::Pending),
            "processing" => Ok(GenerationStatus::Processing),
            "completed" => Ok(GenerationStatus::Completed),
            "failed" => Ok(GenerationStatus::Failed),
            other => Err(format!("Unknown generation status: {}", other)),
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CHAT HISTORY
// =============================================================================

/// One entry of the prompt/refinement conversation stored with an image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChatEntry {
    pub role: String,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Generated image database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = generated_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GeneratedImage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub parent_image_id: Option<Uuid>,
    pub preset_type: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub recommendation: Option<String>,
    pub chat_history: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub storage_path: Option<String>,
    pub generation_params: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
    pub status: String,
    pub generation_time_ms: Option<i32>,
    pub cost: Option<BigDecimal>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New generated image for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generated_images)]
pub struct NewGeneratedImage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub parent_image_id: Option<Uuid>,
    pub preset_type: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub recommendation: Option<String>,
    pub chat_history: Option<serde_json::Value>,
    pub generation_params: serde_json::Value,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn generation_status(&self) -> GenerationStatus {
        // Unknown strings are treated as failed rather than panicking
        GenerationStatus::from_str(&self.status).unwrap_or(GenerationStatus::Failed)
    }

    pub fn is_completed(&self) -> bool {
        self.generation_status() == GenerationStatus::Completed
    }

    pub fn is_outstanding(&self) -> bool {
        !self.generation_status().is_terminal()
    }

    pub fn chat_entries(&self) -> Vec<ChatEntry> {
        self.chat_history
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

// =============================================================================
// REVISION CHAIN GUARDS
// =============================================================================

/// Revision chain violations surfaced before a generation is accepted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RevisionChainError {
    #[error("Parent image {0} does not belong to this session")]
    ParentOutsideSession(Uuid),

    #[error("Parent image {0} is not completed and cannot be refined")]
    ParentNotCompleted(Uuid),

    #[error("Parent image {0} already has a generation in flight")]
    OutstandingSibling(Uuid),
}

/// Validate that `parent_id` is a legal refinement target within `session_images`.
///
/// Rules: the parent must exist in the session, must have completed, and must
/// not already have a pending/processing child. Operates on loaded rows so the
/// invariant logic stays testable without a database.
pub fn validate_refinement_target(
    session_images: &[GeneratedImage],
    session_id: Uuid,
    parent_id: Uuid,
) -> Result<(), RevisionChainError> {
    let parent = session_images
        .iter()
        .find(|img| img.id == parent_id && img.session_id == session_id)
        .ok_or(RevisionChainError::ParentOutsideSession(parent_id))?;

    if !parent.is_completed() {
        return Err(RevisionChainError::ParentNotCompleted(parent_id));
    }

    let has_outstanding_child = session_images
        .iter()
        .any(|img| img.parent_image_id == Some(parent_id) && img.is_outstanding());

    if has_outstanding_child {
        return Err(RevisionChainError::OutstandingSibling(parent_id));
    }

    Ok(())
}

/// Next version number within a session (1-based, insertion order)
pub fn next_version(session_images: &[GeneratedImage]) -> i32 {
    session_images.iter().map(|img| img.version).max().unwrap_or(0) + 1
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to generate an image in a studio session
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "prompt": "Hero shot of a ceramic mug on a marble counter, soft morning light",
    "recommendation": "Add a lifestyle shot showing the mug in use",
    "size": "1024x1024",
    "parent_image_id": null
}))]
pub struct GenerateImageRequest {
    #[validate(length(min = 1, max = 1000, message = "Prompt must be 1-1000 characters"))]
    pub prompt: String,

    #[validate(length(max = 1000, message = "Recommendation must be less than 1000 characters"))]
    pub recommendation: Option<String>,

    /// One of 1024x1024, 1792x1024, 1024x1792
    pub size: Option<String>,

    /// Optional parent image to refine; forms the revision chain
    pub parent_image_id: Option<Uuid>,
}

/// Supported image sizes for the generation API
pub const SUPPORTED_IMAGE_SIZES: [&str; 3] = ["1024x1024", "1792x1024", "1024x1792"];

impl GenerateImageRequest {
    pub fn validate_custom(&self) -> Result<(), String> {
        if let Some(ref size) = self.size {
            if !SUPPORTED_IMAGE_SIZES.contains(&size.as_str()) {
                return Err(format!(
                    "Unsupported image size '{}'. Supported: {}",
                    size,
                    SUPPORTED_IMAGE_SIZES.join(", ")
                ));
            }
        }
        Ok(())
    }

    pub fn size_or_default(&self) -> &str {
        self.size.as_deref().unwrap_or("1024x1024")
    }
}

/// Request to refine a prompt based on feedback
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"feedback": "Make the background darker and add warm lighting"}))]
pub struct RefinePromptRequest {
    #[validate(length(min = 1, max = 2000, message = "Feedback must be 1-2000 characters"))]
    pub feedback: String,
}

/// Generated image response for API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedImageResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub parent_image_id: Option<Uuid>,
    pub url: Option<String>,
    pub prompt: String,
    pub recommendation: Option<String>,
    pub status: GenerationStatus,
    pub version: i32,
    pub generation_time_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn to_response(&self) -> GeneratedImageResponse {
        GeneratedImageResponse {
            id: self.id,
            session_id: self.session_id,
            parent_image_id: self.parent_image_id,
            url: self.image_url.clone(),
            prompt: self.prompt.clone(),
            recommendation: self.recommendation.clone(),
            status: self.generation_status(),
            version: self.version,
            generation_time_ms: self.generation_time_ms,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn image(session: Uuid, status: &str, version: i32, parent: Option<Uuid>) -> GeneratedImage {
        let now = Utc::now();
        GeneratedImage {
            id: Uuid::new_v4(),
            session_id: session,
            product_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            parent_image_id: parent,
            preset_type: "custom".to_string(),
            prompt: "a mug".to_string(),
            negative_prompt: None,
            recommendation: None,
            chat_history: None,
            image_url: None,
            storage_path: None,
            generation_params: serde_json::json!({}),
            metadata: None,
            status: status.to_string(),
            generation_time_ms: None,
            cost: None,
            version,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_never_regresses() {
        use GenerationStatus::*;
        let all = [Pending, Processing, Completed, Failed];

        // Legal forward moves
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Failed));

        // Terminal states accept nothing
        for next in all {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }

        // No reverse moves
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Pending));

        // Self-loops are not transitions
        for status in all {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "processing", "completed", "failed"] {
            assert_eq!(GenerationStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(GenerationStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_refinement_requires_completed_parent_in_session() {
        let session = Uuid::new_v4();
        let completed = image(session, "completed", 1, None);
        let processing = image(session, "processing", 2, None);
        let foreign = image(Uuid::new_v4(), "completed", 1, None);

        let images = vec![completed.clone(), processing.clone()];

        assert!(validate_refinement_target(&images, session, completed.id).is_ok());
        assert_eq!(
            validate_refinement_target(&images, session, processing.id),
            Err(RevisionChainError::ParentNotCompleted(processing.id))
        );
        assert_eq!(
            validate_refinement_target(&images, session, foreign.id),
            Err(RevisionChainError::ParentOutsideSession(foreign.id))
        );
    }

    #[test]
    fn test_single_outstanding_child_per_parent() {
        let session = Uuid::new_v4();
        let head = image(session, "completed", 1, None);
        let in_flight = image(session, "processing", 2, Some(head.id));

        let images = vec![head.clone(), in_flight];
        assert_eq!(
            validate_refinement_target(&images, session, head.id),
            Err(RevisionChainError::OutstandingSibling(head.id))
        );

        // A terminal child frees the parent for the next refinement
        let done_child = image(session, "failed", 2, Some(head.id));
        let images = vec![head.clone(), done_child];
        assert!(validate_refinement_target(&images, session, head.id).is_ok());
    }

    #[test]
    fn test_next_version() {
        let session = Uuid::new_v4();
        assert_eq!(next_version(&[]), 1);
        let images = vec![
            image(session, "completed", 1, None),
            image(session, "completed", 3, None),
        ];
        assert_eq!(next_version(&images), 4);
    }

    #[test]
    fn test_generate_request_size_validation() {
        let mut request = GenerateImageRequest {
            prompt: "a mug".to_string(),
            recommendation: None,
            size: Some("1792x1024".to_string()),
            parent_image_id: None,
        };
        assert!(request.validate_custom().is_ok());

        request.size = Some("512x512".to_string());
        assert!(request.validate_custom().is_err());

        request.size = None;
        assert!(request.validate_custom().is_ok());
        assert_eq!(request.size_or_default(), "1024x1024");
    }
}
