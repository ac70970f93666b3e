// Usage metering: quota checks before billable actions, recording after

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_config::CONFIG;
use crate::models::{NewUsageLog, Organization, UsageAction};
use crate::schema::{organizations, usage_logs};
use crate::utils::ServiceError;

pub struct UsageService;

impl UsageService {
    /// Reject the action when the organization is out of credits.
    ///
    /// Gating is skipped entirely when limit enforcement is disabled.
    pub fn check_quota(organization: &Organization) -> Result<(), ServiceError> {
        if organization.can_use_credits(CONFIG.features.enforce_usage_limits) {
            Ok(())
        } else {
            warn!(
                "Organization {} blocked at usage {}/{:?}",
                organization.id, organization.usage_count, organization.usage_limit
            );
            Err(ServiceError::QuotaExceeded)
        }
    }

    /// Record one billable action: bump the counter and append a log row.
    ///
    /// Called only after the action succeeded; failed external calls are
    /// not billed.
    pub async fn record(
        conn: &mut AsyncPgConnection,
        organization_id: Uuid,
        user_id: Uuid,
        action: UsageAction,
        resource_id: Option<Uuid>,
        cost: Option<BigDecimal>,
    ) -> Result<(), ServiceError> {
        diesel::update(organizations::table.find(organization_id))
            .set((
                organizations::usage_count.eq(organizations::usage_count + 1),
                organizations::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(conn)
            .await?;

        let entry = NewUsageLog::for_action(organization_id, user_id, action, resource_id, cost);
        diesel::insert_into(usage_logs::table)
            .values(&entry)
            .execute(conn)
            .await?;

        info!(
            "Recorded {} for organization {} (resource {:?})",
            entry.action_type, organization_id, resource_id
        );
        Ok(())
    }
}
