//! Listing report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus},
};
use adoptme_common::{AppError, AppResult, PageParams};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

/// Map a write failure, turning a hit on the one-unresolved-report index into `Conflict`.
fn write_err(err: DbErr, conflict: &str) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict(conflict.to_string())
    } else {
        AppError::Database(err.to_string())
    }
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new report. A concurrent duplicate unresolved report surfaces as `Conflict`.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "You already reported this listing"))
    }

    /// Get a report by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("Report"))
    }

    /// The reporter's open or under-review report on a listing, if any.
    pub async fn find_unresolved(
        &self,
        reporter_id: &str,
        listing_id: &str,
    ) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::ListingId.eq(listing_id))
            .filter(report::Column::Status.is_in(ReportStatus::UNRESOLVED))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports with an optional status filter, newest first.
    pub async fn find_page(
        &self,
        status: Option<ReportStatus>,
        page: PageParams,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let mut query = Report::find();
        if let Some(status) = status {
            query = query.filter(report::Column::Status.eq(status));
        }

        let items = query
            .clone()
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total = query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Update a report. Reopening while the reporter already has another
    /// unresolved report on the listing surfaces as `Conflict`.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| {
            write_err(
                e,
                "The reporter already has an unresolved report on this listing",
            )
        })
    }
}
