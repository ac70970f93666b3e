// Authenticated user carried through request extensions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user information extracted from JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token_id: String,
    pub email: String,
    pub subscription_tier: String,
    pub exp: u64,
}
