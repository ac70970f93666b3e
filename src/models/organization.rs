// Organization model: multi-tenant ownership and metered usage

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::{organization_members, organizations};

/// Organization database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub subscription_tier: String,
    pub usage_count: i32,
    pub usage_limit: Option<i32>,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Whether this organization may trigger another billable action.
    ///
    /// NULL usage_limit means unlimited; gating only applies when limit
    /// enforcement is switched on.
    pub fn can_use_credits(&self, enforce_limits: bool) -> bool {
        if !enforce_limits {
            return true;
        }
        match self.usage_limit {
            None => true,
            Some(limit) => self.usage_count < limit,
        }
    }

    pub fn remaining_credits(&self) -> Option<i32> {
        self.usage_limit.map(|limit| (limit - self.usage_count).max(0))
    }

    /// Load an organization by id
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        org_id: Uuid,
    ) -> Result<Organization, diesel::result::Error> {
        organizations::table
            .find(org_id)
            .select(Organization::as_select())
            .first(conn)
            .await
    }

    /// First organization the user belongs to; the acting tenant for requests
    pub async fn find_for_user(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Option<Organization>, diesel::result::Error> {
        organizations::table
            .inner_join(organization_members::table)
            .filter(organization_members::user_id.eq(user_id))
            .order(organization_members::created_at.asc())
            .select(Organization::as_select())
            .first(conn)
            .await
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(usage_count: i32, usage_limit: Option<i32>) -> Organization {
        let now = Utc::now();
        Organization {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            owner_id: Uuid::new_v4(),
            subscription_tier: "free".to_string(),
            usage_count,
            usage_limit,
            settings: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_usage_gating() {
        // Under the limit
        assert!(org(4, Some(5)).can_use_credits(true));
        // At the limit
        assert!(!org(5, Some(5)).can_use_credits(true));
        // Over the limit
        assert!(!org(9, Some(5)).can_use_credits(true));
        // Unlimited
        assert!(org(1000, None).can_use_credits(true));
        // Enforcement off
        assert!(org(9, Some(5)).can_use_credits(false));
    }

    #[test]
    fn test_remaining_credits() {
        assert_eq!(org(3, Some(5)).remaining_credits(), Some(2));
        assert_eq!(org(7, Some(5)).remaining_credits(), Some(0));
        assert_eq!(org(3, None).remaining_credits(), None);
    }
}
