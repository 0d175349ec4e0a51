//! Create report table migration.

use sea_orm_migration::prelude::*;

use super::m20260101_000002_create_pet_listing_table::PetListing;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Report::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::ListingId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Reason).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Message).string_len(512).not_null().default(""))
                    .col(ColumnDef::new(Report::Status).string_len(16).not_null().default("open"))
                    .col(ColumnDef::new(Report::AdminNote).string_len(512).not_null().default(""))
                    .col(ColumnDef::new(Report::ResolvedBy).string_len(32))
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_listing")
                            .from(Report::Table, Report::ListingId)
                            .to(PetListing::Table, PetListing::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: admin queue (status, newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_created_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col((Report::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Index: duplicate check (listing, reporter, status)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_listing_reporter_status")
                    .table(Report::Table)
                    .col(Report::ListingId)
                    .col(Report::ReporterId)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        // At most one unresolved report per reporter and listing
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_report_one_unresolved
                ON report (reporter_id, listing_id)
                WHERE status IN ('open', 'reviewing');
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ReporterId,
    ListingId,
    Reason,
    Message,
    Status,
    AdminNote,
    ResolvedBy,
    ResolvedAt,
    CreatedAt,
    UpdatedAt,
}
