//! Audit trail for moderation actions.

use adoptme_common::{
    AppResult, IdGenerator, PageParams, Paginated, pagination::AUDIT_DEFAULT_LIMIT,
};
use adoptme_db::{
    entities::{audit_log, user},
    repositories::{AuditLogRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    access::{Capability, authorize},
    params::non_blank,
    summary::{ActorSummary, load_users},
};

/// Audit action: an admin changed a report's status or note.
pub const REPORT_UPDATED: &str = "REPORT_UPDATED";
/// Audit action: an admin hid a listing.
pub const LISTING_HIDDEN: &str = "LISTING_HIDDEN";
/// Audit action: an admin made a hidden listing visible again.
pub const LISTING_UNHIDDEN: &str = "LISTING_UNHIDDEN";

/// Audit target type for listings.
pub const TARGET_LISTING: &str = "Listing";
/// Audit target type for reports.
pub const TARGET_REPORT: &str = "Report";

/// Query-string filters for the audit log.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilters {
    pub action: Option<String>,
    pub target_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// An audit record with its actor summarized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: String,
    pub actor: Option<ActorSummary>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub meta: Value,
    pub created_at: DateTime<FixedOffset>,
}

/// Writes and lists moderation audit records.
#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditLogRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub const fn new(audit_repo: AuditLogRepository, user_repo: UserRepository) -> Self {
        Self {
            audit_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an entry. Never fails the caller: errors are logged and dropped.
    pub async fn record(
        &self,
        actor_id: &str,
        action: &str,
        target_type: &str,
        target_id: &str,
        meta: Value,
    ) {
        let model = audit_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            actor_id: Set(actor_id.to_string()),
            action: Set(action.to_string()),
            target_type: Set(target_type.to_string()),
            target_id: Set(target_id.to_string()),
            meta: Set(meta),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = self.audit_repo.create(model).await {
            tracing::error!(
                actor_id = %actor_id,
                action = %action,
                target_id = %target_id,
                error = %e,
                "Failed to write audit log"
            );
        }
    }

    /// Audit entries, newest first, with actor summaries. Admin only.
    pub async fn list(
        &self,
        caller: &user::Model,
        filters: AuditFilters,
    ) -> AppResult<Paginated<AuditLogView>> {
        authorize(caller, Capability::Moderate)?;

        let page = PageParams::from_raw(
            filters.page.as_deref(),
            filters.limit.as_deref(),
            AUDIT_DEFAULT_LIMIT,
        );
        let (entries, total) = self
            .audit_repo
            .find_page(
                non_blank(filters.action.as_deref()),
                non_blank(filters.target_type.as_deref()),
                page,
            )
            .await?;

        let actor_ids: Vec<&str> = entries.iter().map(|e| e.actor_id.as_str()).collect();
        let actors = load_users(&self.user_repo, &actor_ids).await?;
        let items = entries
            .into_iter()
            .map(|e| AuditLogView {
                actor: actors.get(&e.actor_id).map(ActorSummary::from),
                id: e.id,
                action: e.action,
                target_type: e.target_type,
                target_id: e.target_id,
                meta: e.meta,
                created_at: e.created_at,
            })
            .collect();

        Ok(Paginated::new(items, total, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::access::fixtures;
    use adoptme_common::AppError;
    use adoptme_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn service(db: MockDatabase) -> AuditService {
        let db = Arc::new(db.into_connection());
        AuditService::new(AuditLogRepository::new(db.clone()), UserRepository::new(db))
    }

    fn entry(id: &str, actor_id: &str) -> audit_log::Model {
        audit_log::Model {
            id: id.to_string(),
            actor_id: actor_id.to_string(),
            action: LISTING_HIDDEN.to_string(),
            target_type: TARGET_LISTING.to_string(),
            target_id: "l1".to_string(),
            meta: json!({}),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_record_swallows_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())]);

        // completes without panicking or returning an error
        service(db)
            .record("admin", LISTING_HIDDEN, TARGET_LISTING, "l1", json!({}))
            .await;
    }

    #[tokio::test]
    async fn test_list_with_actor_role() {
        let admin = fixtures::user("admin", UserRole::Admin);
        let count = maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[entry("a1", "admin")]])
            .append_query_results([[count]])
            .append_query_results([[admin.clone()]]);

        let page = service(db)
            .list(&admin, AuditFilters::default())
            .await
            .unwrap();

        assert_eq!(page.limit, 20);
        let actor = page.items[0].actor.as_ref().unwrap();
        assert_eq!(actor.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let user = fixtures::user("u", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let result = service(db).list(&user, AuditFilters::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
