// Share link model: public, expiring, tokenized access to generated images

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::share_links;

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Share link database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = share_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShareLink {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub generated_image_id: Option<Uuid>,
    pub created_by: Uuid,
    pub token: String,
    pub short_code: String,
    pub views: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New share link for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = share_links)]
pub struct NewShareLink {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub generated_image_id: Option<Uuid>,
    pub created_by: Uuid,
    pub token: String,
    pub short_code: String,
    pub views: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareLink {
    /// A link is valid iff active and either unexpiring or not yet expired
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity at a fixed instant; used directly by the tests
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }

    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_code)
    }
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to create a share link for a product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"expires_at": "2026-12-31T23:59:59Z"}))]
pub struct CreateShareLinkRequest {
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateShareLinkRequest {
    pub fn validate_custom(&self) -> Result<(), String> {
        if let Some(expires_at) = self.expires_at {
            if expires_at <= Utc::now() {
                return Err("Expiration date must be in the future".to_string());
            }
        }
        Ok(())
    }

    /// Requested expiry, or the configured default window
    pub fn expires_or_default(&self, default_days: i64) -> DateTime<Utc> {
        self.expires_at
            .unwrap_or_else(|| Utc::now() + Duration::days(default_days))
    }
}

/// Share link response for API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "123e4567-e89b-12d3-a456-426614174000",
    "share_url": "https://prodshot.io/s/aB3xK9mQ",
    "short_code": "aB3xK9mQ",
    "views": 0,
    "expires_at": "2026-12-31T23:59:59Z",
    "is_active": true
}))]
pub struct ShareLinkResponse {
    pub id: Uuid,
    pub share_url: String,
    pub short_code: String,
    pub views: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ShareLink {
    pub fn to_response(&self, base_url: &str) -> ShareLinkResponse {
        ShareLinkResponse {
            id: self.id,
            share_url: self.public_url(base_url),
            short_code: self.short_code.clone(),
            views: self.views,
            expires_at: self.expires_at,
            is_active: self.is_active,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn link(is_active: bool, expires_at: Option<DateTime<Utc>>) -> ShareLink {
        let now = Utc::now();
        ShareLink {
            id: Uuid::new_v4(),
            product_id: Some(Uuid::new_v4()),
            generated_image_id: None,
            created_by: Uuid::new_v4(),
            token: "t".repeat(32),
            short_code: "aB3xK9mQ".to_string(),
            views: 0,
            expires_at,
            is_active,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validity_matrix() {
        let now = Utc::now();
        let future = now + Duration::hours(1);
        let past = now - Duration::hours(1);

        assert!(link(true, None).is_valid_at(now));
        assert!(link(true, Some(future)).is_valid_at(now));
        assert!(!link(true, Some(past)).is_valid_at(now));
        assert!(!link(false, None).is_valid_at(now));
        assert!(!link(false, Some(future)).is_valid_at(now));
        assert!(!link(false, Some(past)).is_valid_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        // Exactly-now expiry is already expired
        assert!(!link(true, Some(now)).is_valid_at(now));
    }

    #[test]
    fn test_public_url_trims_trailing_slash() {
        let l = link(true, None);
        assert_eq!(
            l.public_url("https://prodshot.io/s/"),
            "https://prodshot.io/s/aB3xK9mQ"
        );
    }

    #[test]
    fn test_expires_or_default() {
        let request = CreateShareLinkRequest { expires_at: None };
        let expiry = request.expires_or_default(30);
        let delta = expiry - Utc::now();
        assert!(delta > Duration::days(29) && delta <= Duration::days(30));

        let explicit = Utc::now() + Duration::days(7);
        let request = CreateShareLinkRequest {
            expires_at: Some(explicit),
        };
        assert_eq!(request.expires_or_default(30), explicit);
    }

    #[test]
    fn test_past_expiry_rejected() {
        let request = CreateShareLinkRequest {
            expires_at: Some(Utc::now() - Duration::hours(1)),
        };
        assert!(request.validate_custom().is_err());
    }
}
