// JWT validation for access tokens issued by the identity service
// This backend never mints user tokens outside of tests

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::app_config::CONFIG;
use crate::models::auth::AccessTokenClaims;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token subject is not a valid user id")]
    InvalidSubject,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub audience: String,
    pub issuer: String,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            access_secret: CONFIG.jwt_access_secret.clone(),
            audience: CONFIG.jwt_audience.clone(),
            issuer: CONFIG.jwt_issuer.clone(),
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new() -> Self {
        Self {
            config: JwtConfig::from_env(),
        }
    }

    pub fn with_config(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.access_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            other => JwtError::Invalid(format!("{:?}", other)),
        })?;

        Ok(data.claims)
    }

    /// Extract the user id from validated claims
    pub fn user_id_from_claims(claims: &AccessTokenClaims) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidSubject)
    }

    /// Mint a token with this service's key material. Used by tests and
    /// local tooling only.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        tier: &str,
        ttl_secs: u64,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            email: email.to_string(),
            tier: tier.to_string(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
            exp: now + ttl_secs,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.access_secret.as_bytes()),
        )
        .map_err(|e| JwtError::Invalid(e.to_string()))
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            access_secret: "test-secret-key-for-unit-tests-only".to_string(),
            audience: "prodshot.io".to_string(),
            issuer: "prodshot-backend".to_string(),
        })
    }

    #[test]
    fn test_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();
        let token = service
            .generate_access_token(user_id, "user@example.com", "pro", 3600)
            .unwrap();

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.tier, "pro");
        assert_eq!(JwtService::user_id_from_claims(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let token = service
            .generate_access_token(Uuid::new_v4(), "user@example.com", "free", 3600)
            .unwrap();

        let other = JwtService::with_config(JwtConfig {
            access_secret: "a-different-secret".to_string(),
            audience: "prodshot.io".to_string(),
            issuer: "prodshot-backend".to_string(),
        });
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let service = test_service();
        let token = service
            .generate_access_token(Uuid::new_v4(), "user@example.com", "free", 3600)
            .unwrap();

        let other = JwtService::with_config(JwtConfig {
            access_secret: "test-secret-key-for-unit-tests-only".to_string(),
            audience: "someone-else.example".to_string(),
            issuer: "prodshot-backend".to_string(),
        });
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(test_service().validate_access_token("not.a.token").is_err());
    }

    #[test]
    fn test_bad_subject() {
        let claims = AccessTokenClaims {
            sub: "not-a-uuid".to_string(),
            jti: Uuid::new_v4().to_string(),
            email: "x@example.com".to_string(),
            tier: "free".to_string(),
            aud: "prodshot.io".to_string(),
            iss: "prodshot-backend".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(matches!(
            JwtService::user_id_from_claims(&claims),
            Err(JwtError::InvalidSubject)
        ));
    }
}
