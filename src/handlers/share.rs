// Share API handlers: link creation, public showcase, archive download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::acting_organization,
    middleware::auth::AuthenticatedUser,
    models::share_link::{CreateShareLinkRequest, ShareLinkResponse},
    services::share::ShowcaseResponse,
    utils::ServiceError,
};

/// Create (or reuse) a share link for a product
/// POST /api/v1/products/{id}/share
#[utoipa::path(
    post,
    path = "/v1/products/{id}/share",
    tag = "Share",
    operation_id = "createShareLink",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = CreateShareLinkRequest,
    responses(
        (status = 201, description = "Share link", body = ShareLinkResponse),
        (status = 400, description = "Expiry must be in the future"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Could not allocate a unique code")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_share_link(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateShareLinkRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let link = state
        .share_service
        .create_for_product(&organization, auth_user.user_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Public showcase page data behind a share link
/// GET /api/v1/share/{short_code}
#[utoipa::path(
    get,
    path = "/v1/share/{short_code}",
    tag = "Share",
    operation_id = "showcase",
    params(("short_code" = String, Path, description = "Share short code")),
    responses(
        (status = 200, description = "Showcase payload", body = ShowcaseResponse),
        (status = 404, description = "Unknown share code"),
        (status = 410, description = "Share link expired or deactivated")
    )
)]
pub async fn showcase(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let payload = state.share_service.showcase(&short_code).await?;
    Ok(Json(payload))
}

/// Download all completed images behind a share link as a zip archive
/// GET /api/v1/share/{short_code}/download
#[utoipa::path(
    get,
    path = "/v1/share/{short_code}/download",
    tag = "Share",
    operation_id = "downloadShareArchive",
    params(("short_code" = String, Path, description = "Share short code")),
    responses(
        (status = 200, description = "Zip archive of generated images"),
        (status = 404, description = "Unknown share code or no images"),
        (status = 410, description = "Share link expired or deactivated"),
        (status = 502, description = "Image storage unreachable")
    )
)]
pub async fn download_archive(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let (filename, archive) = state.share_service.download_archive(&short_code).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        archive,
    ))
}

/// Deactivate a share link
/// DELETE /api/v1/share-links/{id}
#[utoipa::path(
    delete,
    path = "/v1/share-links/{id}",
    tag = "Share",
    operation_id = "deactivateShareLink",
    params(("id" = Uuid, Path, description = "Share link id")),
    responses(
        (status = 200, description = "Share link deactivated", body = ShareLinkResponse),
        (status = 403, description = "Only the creator may deactivate"),
        (status = 404, description = "Share link not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn deactivate_share_link(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let link = state
        .share_service
        .deactivate(auth_user.user_id, id)
        .await?;
    Ok(Json(link))
}
