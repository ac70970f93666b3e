// Studio session model: the working context tying a user and product together

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::schema::studio_sessions;

/// Session status: active until completed or expired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

/// Studio session database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = studio_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StudioSession {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: String,
    pub session_data: Option<serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New studio session for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = studio_sessions)]
pub struct NewStudioSession {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudioSession {
    pub fn session_status(&self) -> SessionStatus {
        SessionStatus::from_str(&self.status).unwrap_or(SessionStatus::Completed)
    }

    /// Active and not past its expiry
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.session_status() == SessionStatus::Active
            && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }

    pub fn extended_expiry(hours: i64) -> DateTime<Utc> {
        Utc::now() + Duration::hours(hours)
    }
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to create a studio session
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"name": "Spring catalog shots"}))]
pub struct CreateSessionRequest {
    #[validate(length(max = 255, message = "Name must be less than 255 characters"))]
    pub name: Option<String>,
}

impl CreateSessionRequest {
    /// Session name, defaulting to one derived from the product name
    pub fn name_for(&self, product_name: &str) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("Studio Session - {}", product_name),
        }
    }
}

/// Request to generate a prompt from a recommendation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "recommendation": "Add a lifestyle shot showing the mug in use at a breakfast table",
    "use_style_reference": true
}))]
pub struct GeneratePromptRequest {
    #[validate(length(min = 1, max = 2000, message = "Recommendation must be 1-2000 characters"))]
    pub recommendation: String,

    #[serde(default = "default_use_style_reference")]
    pub use_style_reference: bool,
}

fn default_use_style_reference() -> bool {
    true
}

/// Studio session response for API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub status: SessionStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StudioSession {
    pub fn to_response(&self) -> SessionResponse {
        SessionResponse {
            id: self.id,
            product_id: self.product_id,
            name: self.name.clone(),
            status: self.session_status(),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(status: &str, expires_at: Option<DateTime<Utc>>) -> StudioSession {
        let now = Utc::now();
        StudioSession {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Test".to_string(),
            status: status.to_string(),
            session_data: None,
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_active() {
        let now = Utc::now();
        assert!(session("active", None).is_active_at(now));
        assert!(session("active", Some(now + Duration::hours(1))).is_active_at(now));
        assert!(!session("active", Some(now - Duration::hours(1))).is_active_at(now));
        assert!(!session("completed", None).is_active_at(now));
    }

    #[test]
    fn test_default_session_name() {
        let request = CreateSessionRequest { name: None };
        assert_eq!(request.name_for("Ceramic Mug"), "Studio Session - Ceramic Mug");

        let request = CreateSessionRequest {
            name: Some("  My shoot  ".to_string()),
        };
        assert_eq!(request.name_for("Ceramic Mug"), "My shoot");

        let request = CreateSessionRequest {
            name: Some("   ".to_string()),
        };
        assert_eq!(request.name_for("Mug"), "Studio Session - Mug");
    }
}
