// Application state and configuration
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{JwtService, ProductService, ShareService, StudioService},
    RedisPool,
};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub jwt_service: Arc<JwtService>,
    pub product_service: Arc<ProductService>,
    pub studio_service: Arc<StudioService>,
    pub share_service: Arc<ShareService>,
    pub max_connections: u32,
}
