// Library exports for the ProdShot backend
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::auth_middleware;
pub use middleware::AuthenticatedUser;
pub use models::auth::AccessTokenClaims;
pub use services::{
    FirecrawlClient, JwtService, ProductService, ShareService, StudioService, UsageService,
};
pub use utils::ServiceError;

// Re-export handler route builders
pub use handlers::{
    docs_routes, product_routes, public_share_routes, session_routes, share_link_routes,
};

// Library initialization function for external consumers
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    use std::sync::Arc;
    use tracing::info;

    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config();

    // Initialize database pool
    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    // Run migrations if enabled
    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&diesel_pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    // Initialize Redis pool
    info!("Initializing Redis pool...");
    let redis_config = RedisConfig::from_env();
    let redis_pool = RedisPool::new(redis_config).await?;

    // Initialize external clients and services
    let openai_client = services::ai::OpenAiClient::new();
    let scrape_client = FirecrawlClient::new();

    let jwt_service = Arc::new(JwtService::new());
    let product_service = Arc::new(ProductService::new(
        diesel_pool.clone(),
        scrape_client,
        openai_client.clone(),
    ));
    let studio_service = Arc::new(StudioService::new(diesel_pool.clone(), openai_client));
    let share_service = Arc::new(ShareService::new(diesel_pool.clone(), redis_pool.clone()));

    Ok(AppState {
        config: Arc::new(config.clone()),
        diesel_pool,
        redis_pool,
        jwt_service,
        product_service,
        studio_service,
        share_service,
        max_connections,
    })
}

// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let mut overall_healthy = true;
    let timestamp = chrono::Utc::now().to_rfc3339();

    // Check PostgreSQL
    let postgres_health = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => serde_json::json!({
            "status": "healthy",
            "max_connections": state.max_connections,
            "error": null
        }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        },
    };

    // Check Redis
    let redis_health_result = state.redis_pool.health_check().await;
    if !redis_health_result.is_healthy {
        overall_healthy = false;
    }

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "prodshot-backend",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health,
            "redis": serde_json::json!({
                "status": if redis_health_result.is_healthy { "healthy" } else { "unhealthy" },
                "latency_ms": redis_health_result.latency_ms,
                "error": redis_health_result.error
            })
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Build the full API router with auth-protected and public route groups
pub fn build_router(state: AppState) -> axum::Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower_http::trace::TraceLayer;

    let protected = Router::new()
        .nest("/products", product_routes())
        .nest("/sessions", session_routes())
        .nest("/share-links", share_link_routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let mut public = Router::new()
        .route("/health", get(health_check))
        .nest("/share", public_share_routes());

    if state.config.features.enable_swagger_ui {
        public = public.nest("/docs", docs_routes());
    }

    Router::new()
        .nest("/api/v1", protected.merge(public))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
