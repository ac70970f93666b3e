// Studio API handlers: sessions, prompt engineering, generation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::acting_organization,
    middleware::auth::AuthenticatedUser,
    models::generated_image::{
        GenerateImageRequest, GeneratedImageResponse, RefinePromptRequest,
    },
    models::studio_session::{CreateSessionRequest, GeneratePromptRequest, SessionResponse},
    utils::ServiceError,
};

/// Open a studio session on a product
/// POST /api/v1/products/{id}/sessions
#[utoipa::path(
    post,
    path = "/v1/products/{id}/sessions",
    tag = "Studio",
    operation_id = "createSession",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_session(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let session = state
        .studio_service
        .create_session(&organization, auth_user.user_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Turn a shot recommendation into an optimized generation prompt
/// POST /api/v1/sessions/{id}/prompt
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/prompt",
    tag = "Studio",
    operation_id = "generatePrompt",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = GeneratePromptRequest,
    responses(
        (status = 200, description = "Optimized prompt"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session completed or expired"),
        (status = 502, description = "Prompt model failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn generate_prompt(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<GeneratePromptRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let prompt = state
        .studio_service
        .generate_prompt(&organization, id, request)
        .await?;
    Ok(Json(json!({ "prompt": prompt })))
}

/// Generate an image in a session, optionally refining a parent image
/// POST /api/v1/sessions/{id}/generate
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/generate",
    tag = "Studio",
    operation_id = "generateImage",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = GenerateImageRequest,
    responses(
        (status = 201, description = "Image generated", body = GeneratedImageResponse),
        (status = 400, description = "Invalid prompt or size"),
        (status = 402, description = "Usage quota exceeded"),
        (status = 404, description = "Session or parent image not found"),
        (status = 409, description = "Parent image cannot be refined yet"),
        (status = 502, description = "Image model failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn generate_image(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let image = state
        .studio_service
        .generate_image(&organization, auth_user.user_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// Refine a generated image's prompt from feedback
/// POST /api/v1/sessions/{id}/images/{image_id}/refine-prompt
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/images/{image_id}/refine-prompt",
    tag = "Studio",
    operation_id = "refinePrompt",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("image_id" = Uuid, Path, description = "Generated image id")
    ),
    request_body = RefinePromptRequest,
    responses(
        (status = 200, description = "Refined prompt"),
        (status = 404, description = "Session or image not found"),
        (status = 409, description = "Session completed or expired"),
        (status = 502, description = "Prompt model failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn refine_prompt(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RefinePromptRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let prompt = state
        .studio_service
        .refine_prompt(&organization, id, image_id, request)
        .await?;
    Ok(Json(json!({ "prompt": prompt })))
}

/// List a session's generated images, newest version first
/// GET /api/v1/sessions/{id}/images
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/images",
    tag = "Studio",
    operation_id = "listSessionImages",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Generated images", body = [GeneratedImageResponse]),
        (status = 404, description = "Session not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_session_images(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let images = state
        .studio_service
        .list_session_images(&organization, id)
        .await?;
    Ok(Json(images))
}

/// Close a studio session
/// POST /api/v1/sessions/{id}/complete
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/complete",
    tag = "Studio",
    operation_id = "completeSession",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 404, description = "Session not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn complete_session(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let session = state
        .studio_service
        .complete_session(&organization, id)
        .await?;
    Ok(Json(session))
}
