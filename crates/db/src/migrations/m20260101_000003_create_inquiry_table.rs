//! Create inquiry table migration.

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
                    .table(Inquiry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Inquiry::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Inquiry::ListingId).string_len(32).not_null())
                    .col(ColumnDef::new(Inquiry::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Inquiry::SenderId).string_len(32).not_null())
                    .col(ColumnDef::new(Inquiry::Message).text().not_null())
                    .col(ColumnDef::new(Inquiry::Phone).string_len(32).not_null().default(""))
                    .col(ColumnDef::new(Inquiry::Status).string_len(16).not_null().default("open"))
                    .col(ColumnDef::new(Inquiry::OwnerNote).string_len(512).not_null().default(""))
                    .col(ColumnDef::new(Inquiry::IsFlagged).boolean().not_null().default(false))
                    .col(ColumnDef::new(Inquiry::FlagReason).string_len(256).not_null().default(""))
                    .col(
                        ColumnDef::new(Inquiry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Inquiry::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inquiry_listing")
                            .from(Inquiry::Table, Inquiry::ListingId)
                            .to(PetListing::Table, PetListing::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_inquiry_owner_created_at", Inquiry::OwnerId),
            ("idx_inquiry_listing_created_at", Inquiry::ListingId),
            ("idx_inquiry_status_created_at", Inquiry::Status),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Inquiry::Table)
                        .col(col)
                        .col((Inquiry::CreatedAt, IndexOrder::Desc))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Inquiry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Inquiry {
    Table,
    Id,
    ListingId,
    OwnerId,
    SenderId,
    Message,
    Phone,
    Status,
    OwnerNote,
    IsFlagged,
    FlagReason,
    CreatedAt,
    UpdatedAt,
}
