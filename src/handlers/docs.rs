// API documentation: OpenAPI spec assembled by utoipa, Swagger UI from CDN

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app::AppState;
use crate::handlers::{products, share, studio};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ProdShot Backend API",
        description = "Product photography platform: scrape product pages, analyze images, and generate studio shots",
        version = "1.0.0"
    ),
    paths(
        products::scrape_product,
        products::list_products,
        products::get_product,
        products::select_images,
        products::analyze_product,
        products::recommend_shots,
        studio::create_session,
        studio::generate_prompt,
        studio::generate_image,
        studio::refine_prompt,
        studio::list_session_images,
        studio::complete_session,
        share::create_share_link,
        share::showcase,
        share::download_archive,
        share::deactivate_share_link,
    ),
    components(schemas(
        crate::models::product::ScrapeProductRequest,
        crate::models::product::SelectImagesRequest,
        crate::models::product::ProductResponse,
        crate::models::product::ProductListResponse,
        crate::models::product::ProductStatus,
        crate::models::product_image::ProductImageResponse,
        crate::models::product_image::ImageAnalysisResult,
        crate::models::studio_session::CreateSessionRequest,
        crate::models::studio_session::GeneratePromptRequest,
        crate::models::studio_session::SessionResponse,
        crate::models::studio_session::SessionStatus,
        crate::models::generated_image::GenerateImageRequest,
        crate::models::generated_image::RefinePromptRequest,
        crate::models::generated_image::GeneratedImageResponse,
        crate::models::generated_image::GenerationStatus,
        crate::models::generated_image::ChatEntry,
        crate::models::share_link::CreateShareLinkRequest,
        crate::models::share_link::ShareLinkResponse,
        crate::services::share::ShowcaseResponse,
        crate::services::share::ShowcaseImage,
    )),
    tags(
        (name = "Products", description = "Product scraping, selection, and analysis"),
        (name = "Studio", description = "Studio sessions and image generation"),
        (name = "Share", description = "Public showcase links"),
        (name = "Health", description = "Service health checks")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serve OpenAPI JSON specification at /v1/docs/openapi.json
pub async fn serve_openapi_spec(State(_state): State<AppState>) -> Response {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            spec,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize OpenAPI spec: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

/// Serve Swagger UI HTML at /v1/docs
pub async fn serve_swagger_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

// Embedded Swagger UI HTML
const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ProdShot API Documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
    <style>
        body { margin: 0; padding: 0; }
        #swagger-ui { max-width: 1460px; margin: 0 auto; padding: 20px; }
        .topbar { display: none; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            const currentPath = window.location.pathname;
            const needsApiPrefix = currentPath.includes('/api/');
            const specUrl = needsApiPrefix ? '/api/v1/docs/openapi.json' : '/v1/docs/openapi.json';

            window.ui = SwaggerUIBundle({
                url: specUrl,
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                layout: "StandaloneLayout",
                docExpansion: "list",
                tryItOutEnabled: true,
                validatorUrl: null
            });
        }
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().unwrap();
        assert!(json.contains("/v1/products/scrape"));
        assert!(json.contains("/v1/share/{short_code}"));
        assert!(json.contains("bearerAuth"));
    }
}
