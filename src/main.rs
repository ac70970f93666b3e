use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prodshot_backend_core::{app_config, build_router, initialize_app_state};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prodshot_backend_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = app_config::config();
    let bind_address = format!("{}:{}", config.bind_address, config.port);
    info!("Starting ProdShot Backend API on {}", bind_address);

    let state = match initialize_app_state().await {
        Ok(state) => {
            info!("Application state initialized successfully");
            state
        },
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(std::io::Error::other(format!(
                "Initialization failed: {}",
                e
            )));
        },
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app).await
}
