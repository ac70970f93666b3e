// HTTP handlers; thin shims over the service layer

pub mod docs;
pub mod products;
pub mod share;
pub mod studio;

use axum::{
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::models::Organization;
use crate::utils::ServiceError;

/// Resolve the organization the authenticated user acts for.
///
/// Users act within their first organization; a user without one cannot
/// touch tenant-scoped resources.
pub async fn acting_organization(
    state: &AppState,
    user_id: Uuid,
) -> Result<Organization, ServiceError> {
    let mut conn = state.diesel_pool.get().await?;
    Organization::find_for_user(&mut conn, user_id)
        .await?
        .ok_or_else(|| {
            ServiceError::Forbidden("User does not belong to an organization".to_string())
        })
}

// Product routes (authenticated)
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list_products))
        .route("/scrape", post(products::scrape_product))
        .route("/{id}", get(products::get_product))
        .route("/{id}/select-images", post(products::select_images))
        .route("/{id}/analyze", post(products::analyze_product))
        .route("/{id}/recommendations", post(products::recommend_shots))
        .route("/{id}/sessions", post(studio::create_session))
        .route("/{id}/share", post(share::create_share_link))
}

// Studio session routes (authenticated)
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/prompt", post(studio::generate_prompt))
        .route("/{id}/generate", post(studio::generate_image))
        .route(
            "/{id}/images/{image_id}/refine-prompt",
            post(studio::refine_prompt),
        )
        .route("/{id}/images", get(studio::list_session_images))
        .route("/{id}/complete", post(studio::complete_session))
}

// Share link management routes (authenticated)
pub fn share_link_routes() -> Router<AppState> {
    Router::new().route("/{id}", delete(share::deactivate_share_link))
}

// Public share routes (no authentication)
pub fn public_share_routes() -> Router<AppState> {
    Router::new()
        .route("/{short_code}", get(share::showcase))
        .route("/{short_code}/download", get(share::download_archive))
}

// Documentation routes
pub fn docs_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(docs::serve_swagger_ui))
        .route("/openapi.json", get(docs::serve_openapi_spec))
}
