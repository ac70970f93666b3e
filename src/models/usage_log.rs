// Usage log model: one row per billable action

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::usage_logs;

/// Billable actions the platform meters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageAction {
    ProductScrape,
    ImageAnalysis,
    ImageGeneration,
}

impl UsageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageAction::ProductScrape => "product_scrape",
            UsageAction::ImageAnalysis => "image_analysis",
            UsageAction::ImageGeneration => "image_generation",
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            UsageAction::ProductScrape => "product",
            UsageAction::ImageAnalysis => "product_image",
            UsageAction::ImageGeneration => "generated_image",
        }
    }
}

/// Usage log database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = usage_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UsageLog {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub action_type: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub credits_used: BigDecimal,
    pub cost: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
}

/// New usage log entry for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = usage_logs)]
pub struct NewUsageLog {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub action_type: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub credits_used: BigDecimal,
    pub cost: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
}

impl NewUsageLog {
    /// One credit per action unless the caller says otherwise
    pub fn for_action(
        organization_id: Uuid,
        user_id: Uuid,
        action: UsageAction,
        resource_id: Option<Uuid>,
        cost: Option<BigDecimal>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            action_type: action.as_str().to_string(),
            resource_type: action.resource_type().to_string(),
            resource_id,
            metadata: None,
            credits_used: BigDecimal::from(1),
            cost,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_resource_pairing() {
        assert_eq!(UsageAction::ProductScrape.as_str(), "product_scrape");
        assert_eq!(UsageAction::ProductScrape.resource_type(), "product");
        assert_eq!(UsageAction::ImageGeneration.resource_type(), "generated_image");
    }

    #[test]
    fn test_default_credits() {
        let entry = NewUsageLog::for_action(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UsageAction::ImageGeneration,
            None,
            None,
        );
        assert_eq!(entry.credits_used, BigDecimal::from(1));
        assert_eq!(entry.action_type, "image_generation");
    }
}
