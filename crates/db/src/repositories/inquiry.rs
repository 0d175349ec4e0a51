//! Inquiry repository.

use std::sync::Arc;

use super::listing::escape_like;
use crate::entities::{
    Inquiry,
    inquiry::{self, InquiryStatus},
};
use adoptme_common::{AppError, AppResult, PageParams};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, extension::postgres::PgExpr},
};

/// Admin inquiry filter: optional status plus a case-insensitive substring of
/// the message or phone number.
fn admin_filter(status: Option<InquiryStatus>, q: Option<&str>) -> Select<inquiry::Entity> {
    let mut query = Inquiry::find();
    if let Some(status) = status {
        query = query.filter(inquiry::Column::Status.eq(status));
    }
    if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query = query.filter(
            Condition::any()
                .add(Expr::col((Inquiry, inquiry::Column::Message)).ilike(pattern.as_str()))
                .add(Expr::col((Inquiry, inquiry::Column::Phone)).ilike(pattern.as_str())),
        );
    }
    query
}

/// Inquiry repository for database operations.
#[derive(Clone)]
pub struct InquiryRepository {
    db: Arc<DatabaseConnection>,
}

impl InquiryRepository {
    /// Create a new inquiry repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an inquiry by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<inquiry::Model>> {
        Inquiry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an inquiry by ID, returning `NotFound` if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<inquiry::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Inquiry"))
    }

    /// Create a new inquiry.
    pub async fn create(&self, model: inquiry::ActiveModel) -> AppResult<inquiry::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an inquiry.
    pub async fn update(&self, model: inquiry::ActiveModel) -> AppResult<inquiry::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Inquiries received by a listing owner, newest first.
    pub async fn find_for_owner(
        &self,
        owner_id: &str,
        status: Option<InquiryStatus>,
        page: PageParams,
    ) -> AppResult<(Vec<inquiry::Model>, u64)> {
        let mut query = Inquiry::find().filter(inquiry::Column::OwnerId.eq(owner_id));
        if let Some(status) = status {
            query = query.filter(inquiry::Column::Status.eq(status));
        }

        self.fetch_page(query, page).await
    }

    /// All inquiries, optionally filtered by status and by a case-insensitive
    /// substring of the message or phone number.
    pub async fn find_all(
        &self,
        status: Option<InquiryStatus>,
        q: Option<&str>,
        page: PageParams,
    ) -> AppResult<(Vec<inquiry::Model>, u64)> {
        let query = admin_filter(status, q);
        self.fetch_page(query, page).await
    }

    async fn fetch_page(
        &self,
        query: Select<inquiry::Entity>,
        page: PageParams,
    ) -> AppResult<(Vec<inquiry::Model>, u64)> {
        let items = query
            .clone()
            .order_by_desc(inquiry::Column::CreatedAt)
            .order_by_desc(inquiry::Column::Id)
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
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Value};

    fn create_test_inquiry(id: &str, owner_id: &str, sender_id: &str) -> inquiry::Model {
        inquiry::Model {
            id: id.to_string(),
            listing_id: "listing1".to_string(),
            owner_id: owner_id.to_string(),
            sender_id: sender_id.to_string(),
            message: "Is she still available?".to_string(),
            phone: "555-0100".to_string(),
            status: InquiryStatus::Open,
            owner_note: String::new(),
            is_flagged: false,
            flag_reason: String::new(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_for_owner() {
        let i1 = create_test_inquiry("i1", "owner", "u1");
        let i2 = create_test_inquiry("i2", "owner", "u2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[i1, i2]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = InquiryRepository::new(db);
        let (items, total) = repo
            .find_for_owner("owner", Some(InquiryStatus::Open), PageParams::default())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(total, 2);
        assert!(items.iter().all(|i| i.owner_id == "owner"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<inquiry::Model>::new()])
                .into_connection(),
        );

        let repo = InquiryRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Inquiry not found"));
    }

    #[test]
    fn test_admin_filter_binds_search_pattern() {
        let statement =
            admin_filter(Some(InquiryStatus::Open), Some(" dog ")).build(DatabaseBackend::Postgres);

        assert!(statement.sql.contains(r#""inquiry"."message" ILIKE $"#));
        assert!(statement.sql.contains(r#""inquiry"."phone" ILIKE $"#));

        let values = statement.values.unwrap().0;
        assert_eq!(values.iter().filter(|v| **v == Value::from("%dog%")).count(), 2);
        assert!(values.contains(&Value::from("open")));
    }

    #[test]
    fn test_admin_filter_blank_query_adds_nothing() {
        let statement = admin_filter(None, Some("  ")).build(DatabaseBackend::Postgres);

        assert!(!statement.sql.contains("ILIKE"));
        assert!(statement.values.is_none_or(|values| values.0.is_empty()));
    }
}
