// Usage gating: the quota check against organization limits

use bigdecimal::BigDecimal;
use chrono::Utc;
use prodshot_backend_core::models::{NewUsageLog, Organization, UsageAction};
use uuid::Uuid;

fn org(usage_count: i32, usage_limit: Option<i32>) -> Organization {
    let now = Utc::now();
    Organization {
        id: Uuid::new_v4(),
        name: "Acme Goods".to_string(),
        slug: "acme-goods".to_string(),
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
fn gating_blocks_at_and_above_the_limit() {
    assert!(org(0, Some(10)).can_use_credits(true));
    assert!(org(9, Some(10)).can_use_credits(true));
    assert!(!org(10, Some(10)).can_use_credits(true));
    assert!(!org(11, Some(10)).can_use_credits(true));
}

#[test]
fn null_limit_means_unlimited() {
    assert!(org(1_000_000, None).can_use_credits(true));
    assert_eq!(org(1_000_000, None).remaining_credits(), None);
}

#[test]
fn enforcement_flag_bypasses_gating() {
    assert!(org(999, Some(10)).can_use_credits(false));
}

#[test]
fn remaining_credits_never_go_negative() {
    assert_eq!(org(3, Some(10)).remaining_credits(), Some(7));
    assert_eq!(org(15, Some(10)).remaining_credits(), Some(0));
}

#[test]
fn usage_log_entries_carry_one_credit_by_default() {
    let entry = NewUsageLog::for_action(
        Uuid::new_v4(),
        Uuid::new_v4(),
        UsageAction::ProductScrape,
        Some(Uuid::new_v4()),
        None,
    );
    assert_eq!(entry.credits_used, BigDecimal::from(1));
    assert_eq!(entry.action_type, "product_scrape");
    assert_eq!(entry.resource_type, "product");
    assert!(entry.cost.is_none());
}

#[test]
fn action_types_map_to_resource_types() {
    assert_eq!(UsageAction::ProductScrape.resource_type(), "product");
    assert_eq!(UsageAction::ImageAnalysis.resource_type(), "product_image");
    assert_eq!(UsageAction::ImageGeneration.resource_type(), "generated_image");
}
