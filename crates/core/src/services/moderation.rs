//! Moderation: listing reports and listing visibility.

use adoptme_common::{AppError, AppResult, IdGenerator, PageParams, Paginated, pagination::DEFAULT_LIMIT};
use adoptme_db::{
    entities::{
        pet_listing,
        report::{self, ReportReason, ReportStatus},
        user,
    },
    repositories::{ListingRepository, ReportRepository, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::{
    access::{Capability, authorize},
    audit::{self, AuditService},
    params::parse_enum,
    summary::{ListingSummary, UserSummary, load_listings, load_users},
};

/// Input for reporting a listing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportInput {
    pub reason: ReportReason,

    #[serde(default)]
    #[validate(length(max = 500, message = "Message must be at most 500 characters"))]
    pub message: String,
}

/// Admin transition of a report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportInput {
    pub status: ReportStatus,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub admin_note: Option<String>,
}

/// Query-string filters for the report list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilters {
    /// Absent means `open`; an empty value means every status.
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ReportFilters {
    fn status(&self) -> AppResult<Option<ReportStatus>> {
        match self.status.as_deref() {
            None => Ok(Some(ReportStatus::Open)),
            raw => parse_enum("status", raw),
        }
    }
}

/// A report with reporter and listing summarized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub reporter: Option<UserSummary>,
    pub listing: Option<ListingSummary>,
    pub reason: ReportReason,
    pub message: String,
    pub status: ReportStatus,
    pub admin_note: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    report_repo: ReportRepository,
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    audit: AuditService,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        listing_repo: ListingRepository,
        user_repo: UserRepository,
        audit: AuditService,
    ) -> Self {
        Self {
            report_repo,
            listing_repo,
            user_repo,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Reports ====================

    /// File a report. Hidden listings can still be reported; a reporter holds at
    /// most one unresolved report per listing.
    pub async fn create_report(
        &self,
        reporter: &user::Model,
        listing_id: &str,
        mut input: CreateReportInput,
    ) -> AppResult<report::Model> {
        input.message = input.message.trim().to_string();
        input.validate()?;

        let listing = self.listing_repo.get_by_id(listing_id).await?;

        if self
            .report_repo
            .find_unresolved(&reporter.id, &listing.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You already reported this listing".to_string(),
            ));
        }

        let now = Utc::now();
        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(reporter.id.clone()),
            listing_id: Set(listing.id),
            reason: Set(input.reason),
            message: Set(input.message),
            status: Set(ReportStatus::Open),
            admin_note: Set(String::new()),
            resolved_by: Set(None),
            resolved_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let report = self.report_repo.create(model).await?;
        tracing::info!(report_id = %report.id, listing_id = %report.listing_id, reason = ?report.reason, "Report submitted");
        Ok(report)
    }

    /// Reports for review, newest first. Admin only.
    pub async fn list_reports(
        &self,
        caller: &user::Model,
        filters: ReportFilters,
    ) -> AppResult<Paginated<ReportView>> {
        authorize(caller, Capability::Moderate)?;

        let status = filters.status()?;
        let page = PageParams::from_raw(filters.page.as_deref(), filters.limit.as_deref(), DEFAULT_LIMIT);
        let (reports, total) = self.report_repo.find_page(status, page).await?;

        let reporter_ids: Vec<&str> = reports.iter().map(|r| r.reporter_id.as_str()).collect();
        let listing_ids: Vec<&str> = reports.iter().map(|r| r.listing_id.as_str()).collect();
        let reporters = load_users(&self.user_repo, &reporter_ids).await?;
        let listings = load_listings(&self.listing_repo, &listing_ids).await?;

        let items = reports
            .into_iter()
            .map(|r| ReportView {
                reporter: reporters.get(&r.reporter_id).map(UserSummary::from),
                listing: listings.get(&r.listing_id).map(|l| {
                    ListingSummary::brief(l)
                        .with_status(l.status)
                        .with_visibility(l.is_hidden)
                }),
                id: r.id,
                reason: r.reason,
                message: r.message,
                status: r.status,
                admin_note: r.admin_note,
                resolved_by: r.resolved_by,
                resolved_at: r.resolved_at,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect();

        Ok(Paginated::new(items, total, page))
    }

    /// Move a report to any status. Resolving stamps the resolver and time.
    pub async fn update_report(
        &self,
        caller: &user::Model,
        report_id: &str,
        input: UpdateReportInput,
    ) -> AppResult<report::Model> {
        authorize(caller, Capability::Moderate)?;
        input.validate()?;

        let report = self.report_repo.get_by_id(report_id).await?;

        let now = Utc::now();
        let mut active: report::ActiveModel = report.into();
        active.status = Set(input.status);
        if let Some(note) = input.admin_note {
            active.admin_note = Set(note.trim().to_string());
        }
        if input.status == ReportStatus::Resolved {
            active.resolved_by = Set(Some(caller.id.clone()));
            active.resolved_at = Set(Some(now.into()));
        }
        active.updated_at = Set(now.into());

        let report = self.report_repo.update(active).await?;
        tracing::info!(report_id = %report.id, admin_id = %caller.id, status = ?report.status, "Report updated");

        self.audit
            .record(
                &caller.id,
                audit::REPORT_UPDATED,
                audit::TARGET_REPORT,
                &report.id,
                json!({ "status": report.status }),
            )
            .await;

        Ok(report)
    }

    // ==================== Listing visibility ====================

    /// Hide or unhide a listing. Admin only.
    pub async fn set_listing_hidden(
        &self,
        caller: &user::Model,
        listing_id: &str,
        is_hidden: bool,
    ) -> AppResult<pet_listing::Model> {
        authorize(caller, Capability::Moderate)?;

        let listing = self.listing_repo.get_by_id(listing_id).await?;

        let mut active: pet_listing::ActiveModel = listing.into();
        active.is_hidden = Set(is_hidden);
        active.updated_at = Set(Utc::now().into());
        let listing = self.listing_repo.update(active).await?;

        let action = if listing.is_hidden {
            audit::LISTING_HIDDEN
        } else {
            audit::LISTING_UNHIDDEN
        };
        tracing::info!(listing_id = %listing.id, admin_id = %caller.id, action, "Listing visibility changed");

        self.audit
            .record(&caller.id, action, audit::TARGET_LISTING, &listing.id, json!({}))
            .await;

        Ok(listing)
    }
}
