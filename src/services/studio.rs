// Studio service: sessions, prompt engineering, and image generation
// Generation status is driven through the monotonic lifecycle; the revision
// chain is validated against the session's loaded images before accepting
// a refinement.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::app_config::CONFIG;
use crate::db::DieselPool;
use crate::models::generated_image::{
    next_version, validate_refinement_target, ChatEntry, GenerateImageRequest,
    GeneratedImageResponse, GenerationStatus, RefinePromptRequest,
};
use crate::models::studio_session::{
    CreateSessionRequest, GeneratePromptRequest, SessionResponse, SessionStatus,
};
use crate::models::{
    GeneratedImage, NewGeneratedImage, NewStudioSession, Organization, ProductImage,
    StudioSession, UsageAction,
};
use crate::schema::{generated_images, product_images, products, studio_sessions};
use crate::services::ai::{OpenAiClient, PromptGenerationAgent};
use crate::services::product::load_product_for_org;
use crate::services::usage::UsageService;
use crate::utils::ServiceError;

/// Sessions stay open this long before they expire
const SESSION_TTL_HOURS: i64 = 24;

pub struct StudioService {
    pool: DieselPool,
    openai_client: OpenAiClient,
}

impl StudioService {
    pub fn new(pool: DieselPool, openai_client: OpenAiClient) -> Self {
        Self {
            pool,
            openai_client,
        }
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Open a studio session against a product
    pub async fn create_session(
        &self,
        organization: &Organization,
        user_id: Uuid,
        product_id: Uuid,
        request: CreateSessionRequest,
    ) -> Result<SessionResponse, ServiceError> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;

        let now = chrono::Utc::now();
        let new_session = NewStudioSession {
            id: Uuid::new_v4(),
            product_id: product.id,
            user_id,
            name: request.name_for(&product.name),
            status: SessionStatus::Active.as_str().to_string(),
            expires_at: Some(StudioSession::extended_expiry(SESSION_TTL_HOURS)),
            created_at: now,
            updated_at: now,
        };

        let session: StudioSession = diesel::insert_into(studio_sessions::table)
            .values(&new_session)
            .returning(StudioSession::as_returning())
            .get_result(&mut conn)
            .await?;

        info!("Opened studio session {} on product {}", session.id, product.id);
        Ok(session.to_response())
    }

    /// Mark a session completed; a completed session accepts no further work
    pub async fn complete_session(
        &self,
        organization: &Organization,
        session_id: Uuid,
    ) -> Result<SessionResponse, ServiceError> {
        let mut conn = self.pool.get().await?;
        let session = load_session_for_org(&mut conn, organization.id, session_id).await?;

        let session: StudioSession = diesel::update(studio_sessions::table.find(session.id))
            .set((
                studio_sessions::status.eq(SessionStatus::Completed.as_str()),
                studio_sessions::updated_at.eq(chrono::Utc::now()),
            ))
            .returning(StudioSession::as_returning())
            .get_result(&mut conn)
            .await?;

        Ok(session.to_response())
    }

    // =========================================================================
    // PROMPT ENGINEERING
    // =========================================================================

    /// Turn a shot recommendation into an optimized generation prompt,
    /// optionally anchored on the product's selected images for style
    pub async fn generate_prompt(
        &self,
        organization: &Organization,
        session_id: Uuid,
        request: GeneratePromptRequest,
    ) -> Result<String, ServiceError> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let session = load_session_for_org(&mut conn, organization.id, session_id).await?;
        require_active(&session)?;

        let product = load_product_for_org(&mut conn, organization.id, session.product_id).await?;

        let style_refs: Vec<String> = if request.use_style_reference {
            product_images::table
                .filter(product_images::product_id.eq(product.id))
                .filter(product_images::is_selected.eq(true))
                .order(product_images::position.asc())
                .select(ProductImage::as_select())
                .load(&mut conn)
                .await?
                .into_iter()
                .map(|img| img.url)
                .collect()
        } else {
            Vec::new()
        };

        let context = json!({
            "title": product.name,
            "description": product.description,
        });

        let agent = PromptGenerationAgent::new();
        let prompt = agent
            .generate_prompt(
                &self.openai_client,
                &request.recommendation,
                &style_refs,
                Some(context),
            )
            .await?;

        Ok(prompt)
    }

    /// Refine a generated image's prompt from user feedback.
    ///
    /// The feedback exchange is appended to the image's chat history so the
    /// conversation survives across refinements.
    pub async fn refine_prompt(
        &self,
        organization: &Organization,
        session_id: Uuid,
        image_id: Uuid,
        request: RefinePromptRequest,
    ) -> Result<String, ServiceError> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let session = load_session_for_org(&mut conn, organization.id, session_id).await?;
        require_active(&session)?;

        let image: GeneratedImage = generated_images::table
            .find(image_id)
            .filter(generated_images::session_id.eq(session.id))
            .select(GeneratedImage::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ServiceError::NotFound("Generated image not found".to_string()))?;

        let agent = PromptGenerationAgent::new();
        let refined = agent
            .refine_prompt(&self.openai_client, &image.prompt, &request.feedback)
            .await?;

        let mut history = image.chat_entries();
        history.push(ChatEntry::user(&request.feedback));
        history.push(ChatEntry::assistant(&refined));

        diesel::update(generated_images::table.find(image.id))
            .set((
                generated_images::chat_history.eq(json!(history)),
                generated_images::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(refined)
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Generate an image in a session, optionally refining a parent image.
    ///
    /// The row is inserted pending, moved to processing for the external
    /// call, and lands in completed or failed. Usage is billed on success
    /// only.
    pub async fn generate_image(
        &self,
        organization: &Organization,
        user_id: Uuid,
        session_id: Uuid,
        request: GenerateImageRequest,
    ) -> Result<GeneratedImageResponse, ServiceError> {
        request.validate()?;
        request
            .validate_custom()
            .map_err(ServiceError::ValidationError)?;
        UsageService::check_quota(organization)?;

        let mut conn = self.pool.get().await?;
        let session = load_session_for_org(&mut conn, organization.id, session_id).await?;
        require_active(&session)?;

        let size = request.size_or_default().to_string();
        let prompt = request.prompt.clone();
        let txn_session_id = session.id;
        let txn_product_id = session.product_id;
        let txn_size = size.clone();

        // Guard and insert atomically; a concurrent insert against the same
        // parent trips the in-flight refinement index
        let image: GeneratedImage = conn
            .build_transaction()
            .run::<_, ServiceError, _>(|conn| {
                Box::pin(async move {
                    let session_images: Vec<GeneratedImage> = generated_images::table
                        .filter(generated_images::session_id.eq(txn_session_id))
                        .select(GeneratedImage::as_select())
                        .load(conn)
                        .await?;

                    if let Some(parent_id) = request.parent_image_id {
                        validate_refinement_target(&session_images, txn_session_id, parent_id)?;
                    }

                    let now = chrono::Utc::now();
                    let new_image = NewGeneratedImage {
                        id: Uuid::new_v4(),
                        session_id: txn_session_id,
                        product_id: txn_product_id,
                        user_id,
                        parent_image_id: request.parent_image_id,
                        preset_type: if request.recommendation.is_some() {
                            "recommendation".to_string()
                        } else {
                            "custom".to_string()
                        },
                        prompt: request.prompt.clone(),
                        negative_prompt: None,
                        recommendation: request.recommendation.clone(),
                        chat_history: Some(json!(vec![ChatEntry::user(&request.prompt)])),
                        generation_params: json!({
                            "model": CONFIG.openai.image_model,
                            "size": txn_size,
                            "quality": "standard",
                        }),
                        status: GenerationStatus::Pending.as_str().to_string(),
                        version: next_version(&session_images),
                        created_at: now,
                        updated_at: now,
                    };

                    diesel::insert_into(generated_images::table)
                        .values(&new_image)
                        .returning(GeneratedImage::as_returning())
                        .get_result(conn)
                        .await
                        .map_err(map_refinement_conflict)
                })
            })
            .await?;

        let image = transition(&mut conn, image, GenerationStatus::Processing).await?;

        match self
            .openai_client
            .generate_image(&prompt, &size, "standard")
            .await
        {
            Ok(data) => {
                let completed: GeneratedImage =
                    diesel::update(generated_images::table.find(image.id))
                        .set((
                            generated_images::status.eq(GenerationStatus::Completed.as_str()),
                            generated_images::image_url.eq(&data.url),
                            generated_images::generation_time_ms.eq(data.generation_time_ms),
                            generated_images::cost.eq(generation_cost(&size)),
                            generated_images::updated_at.eq(chrono::Utc::now()),
                        ))
                        .returning(GeneratedImage::as_returning())
                        .get_result(&mut conn)
                        .await?;

                UsageService::record(
                    &mut conn,
                    organization.id,
                    user_id,
                    UsageAction::ImageGeneration,
                    Some(completed.id),
                    generation_cost(&size),
                )
                .await?;

                info!(
                    "Generated image {} (v{}) in {}ms",
                    completed.id,
                    completed.version,
                    data.generation_time_ms
                );
                Ok(completed.to_response())
            },
            Err(e) => {
                error!("Image generation {} failed: {}", image.id, e);
                diesel::update(generated_images::table.find(image.id))
                    .set((
                        generated_images::status.eq(GenerationStatus::Failed.as_str()),
                        generated_images::metadata.eq(json!({ "error": e.to_string() })),
                        generated_images::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(&mut conn)
                    .await?;
                Err(e.into())
            },
        }
    }

    /// All images in a session, newest version first
    pub async fn list_session_images(
        &self,
        organization: &Organization,
        session_id: Uuid,
    ) -> Result<Vec<GeneratedImageResponse>, ServiceError> {
        let mut conn = self.pool.get().await?;
        let session = load_session_for_org(&mut conn, organization.id, session_id).await?;

        let images: Vec<GeneratedImage> = generated_images::table
            .filter(generated_images::session_id.eq(session.id))
            .order(generated_images::version.desc())
            .select(GeneratedImage::as_select())
            .load(&mut conn)
            .await?;

        Ok(images.iter().map(|img| img.to_response()).collect())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Load a session whose product belongs to the organization
pub async fn load_session_for_org(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    session_id: Uuid,
) -> Result<StudioSession, ServiceError> {
    studio_sessions::table
        .inner_join(products::table)
        .filter(studio_sessions::id.eq(session_id))
        .filter(products::organization_id.eq(organization_id))
        .select(StudioSession::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::NotFound("Studio session not found".to_string()))
}

fn require_active(session: &StudioSession) -> Result<(), ServiceError> {
    if session.is_active() {
        Ok(())
    } else {
        Err(ServiceError::InvalidStateTransition(
            "Studio session is completed or expired".to_string(),
        ))
    }
}

/// Apply a status transition, rejecting anything the lifecycle forbids
async fn transition(
    conn: &mut AsyncPgConnection,
    image: GeneratedImage,
    next: GenerationStatus,
) -> Result<GeneratedImage, ServiceError> {
    let current = image.generation_status();
    if !current.can_transition_to(next) {
        return Err(ServiceError::InvalidStateTransition(format!(
            "Cannot move generation {} from {} to {}",
            image.id, current, next
        )));
    }

    Ok(diesel::update(generated_images::table.find(image.id))
        .set((
            generated_images::status.eq(next.as_str()),
            generated_images::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(GeneratedImage::as_returning())
        .get_result(conn)
        .await?)
}

/// Surface a unique violation from the in-flight refinement index as the
/// same error the in-code guard raises
fn map_refinement_conflict(e: diesel::result::Error) -> ServiceError {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => ServiceError::InvalidStateTransition(
            "Parent image already has a refinement in progress".to_string(),
        ),
        other => other.into(),
    }
}

/// Provider list price per image, keyed by size
fn generation_cost(size: &str) -> Option<BigDecimal> {
    let price = match size {
        "1024x1024" => "0.040",
        "1792x1024" | "1024x1792" => "0.080",
        _ => return None,
    };
    price.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_cost_by_size() {
        assert_eq!(generation_cost("1024x1024"), "0.040".parse().ok());
        assert_eq!(generation_cost("1792x1024"), "0.080".parse().ok());
        assert_eq!(generation_cost("1024x1792"), "0.080".parse().ok());
        assert_eq!(generation_cost("512x512"), None);
    }

    #[test]
    fn test_concurrent_refinement_conflict_maps_to_state_error() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let conflict = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        assert!(matches!(
            map_refinement_conflict(conflict),
            ServiceError::InvalidStateTransition(_)
        ));

        // Anything else keeps its normal mapping
        assert!(matches!(
            map_refinement_conflict(DieselError::NotFound),
            ServiceError::NotFound(_)
        ));
    }

    #[test]
    fn test_require_active() {
        let now = chrono::Utc::now();
        let mut session = StudioSession {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Test".to_string(),
            status: "active".to_string(),
            session_data: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(require_active(&session).is_ok());

        session.status = "completed".to_string();
        assert!(matches!(
            require_active(&session),
            Err(ServiceError::InvalidStateTransition(_))
        ));
    }
}
