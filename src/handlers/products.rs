// Product API handlers: scrape, selection, analysis, recommendations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    app::AppState,
    handlers::acting_organization,
    middleware::auth::AuthenticatedUser,
    models::product::{
        ProductListResponse, ProductPagination, ProductResponse, ScrapeProductRequest,
        SelectImagesRequest,
    },
    utils::ServiceError,
};

/// Scrape a product page into a new product
/// POST /api/v1/products/scrape
#[utoipa::path(
    post,
    path = "/v1/products/scrape",
    tag = "Products",
    operation_id = "scrapeProduct",
    request_body = ScrapeProductRequest,
    responses(
        (status = 201, description = "Product created from scraped page", body = ProductResponse),
        (status = 400, description = "Invalid or unsupported URL"),
        (status = 402, description = "Usage quota exceeded"),
        (status = 502, description = "Scraping provider failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn scrape_product(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(request): Json<ScrapeProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let product = state
        .product_service
        .scrape_product(&organization, auth_user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List the organization's products
/// GET /api/v1/products
#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Products",
    operation_id = "listProducts",
    params(ProductPagination),
    responses(
        (status = 200, description = "Paginated product list", body = ProductListResponse)
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(pagination): Query<ProductPagination>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let list = state
        .product_service
        .list_products(&organization, pagination)
        .await?;
    Ok(Json(list))
}

/// Fetch one product with its images
/// GET /api/v1/products/{id}
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    tag = "Products",
    operation_id = "getProduct",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let product = state.product_service.get_product(&organization, id).await?;
    Ok(Json(product))
}

/// Replace the product's image selection
/// POST /api/v1/products/{id}/select-images
#[utoipa::path(
    post,
    path = "/v1/products/{id}/select-images",
    tag = "Products",
    operation_id = "selectImages",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = SelectImagesRequest,
    responses(
        (status = 200, description = "Selection updated", body = ProductResponse),
        (status = 400, description = "Image ids do not belong to this product"),
        (status = 404, description = "Product not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn select_images(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectImagesRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let product = state
        .product_service
        .select_images(&organization, id, request)
        .await?;
    Ok(Json(product))
}

/// Analyze the selected images with the vision model
/// POST /api/v1/products/{id}/analyze
#[utoipa::path(
    post,
    path = "/v1/products/{id}/analyze",
    tag = "Products",
    operation_id = "analyzeProduct",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Per-image analyses"),
        (status = 400, description = "No images selected"),
        (status = 402, description = "Usage quota exceeded"),
        (status = 502, description = "Vision model failed for all images")
    ),
    security(("bearerAuth" = []))
)]
pub async fn analyze_product(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let analyses = state
        .product_service
        .analyze_selected(&organization, auth_user.user_id, id)
        .await?;
    Ok(Json(json!({ "analyses": analyses })))
}

/// Recommend additional shots for the product
/// POST /api/v1/products/{id}/recommendations
#[utoipa::path(
    post,
    path = "/v1/products/{id}/recommendations",
    tag = "Products",
    operation_id = "recommendShots",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Shot recommendations"),
        (status = 400, description = "No images selected"),
        (status = 502, description = "Recommendation model failed")
    ),
    security(("bearerAuth" = []))
)]
pub async fn recommend_shots(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let organization = acting_organization(&state, auth_user.user_id).await?;
    let recommendations = state
        .product_service
        .recommend_shots(&organization, id)
        .await?;
    Ok(Json(json!({ "recommendations": recommendations })))
}
