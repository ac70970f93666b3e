// JWT claim structures for access token validation

use serde::{Deserialize, Serialize};

/// Access token claims validated on every authenticated request.
/// Tokens are issued by the identity service; this backend only validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,

    /// JWT ID
    pub jti: String,

    /// User email address
    pub email: String,

    /// Subscription tier carried for display/limits hints
    pub tier: String,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Expiry (unix seconds)
    pub exp: u64,

    /// Issued at (unix seconds)
    pub iat: u64,
}
