//! Create pet listing table migration.

use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PetListing::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PetListing::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PetListing::OwnerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PetListing::ListingType)
                            .string_len(16)
                            .not_null()
                            .default("adoption"),
                    )
                    .col(ColumnDef::new(PetListing::Title).string_len(128).not_null())
                    .col(ColumnDef::new(PetListing::Description).text().not_null())
                    .col(ColumnDef::new(PetListing::Species).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PetListing::Breed)
                            .string_len(64)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(PetListing::Age).integer())
                    .col(
                        ColumnDef::new(PetListing::Gender)
                            .string_len(16)
                            .not_null()
                            .default("unknown"),
                    )
                    .col(ColumnDef::new(PetListing::Location).string_len(128).not_null())
                    .col(
                        ColumnDef::new(PetListing::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(PetListing::Images)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(PetListing::IsHidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PetListing::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PetListing::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_listing_owner")
                            .from(PetListing::Table, PetListing::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id + created_at (own listings view)
        manager
            .create_index(
                Index::create()
                    .name("idx_pet_listing_owner_created_at")
                    .table(PetListing::Table)
                    .col(PetListing::OwnerId)
                    .col((PetListing::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Index: public feed (visible listings, newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_pet_listing_hidden_created_at")
                    .table(PetListing::Table)
                    .col(PetListing::IsHidden)
                    .col((PetListing::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // GIN index backing the free-text search over title + description
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE INDEX IF NOT EXISTS idx_pet_listing_text_search
                ON pet_listing
                USING GIN (to_tsvector('simple', title || ' ' || description));
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PetListing::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum PetListing {
    Table,
    Id,
    OwnerId,
    ListingType,
    Title,
    Description,
    Species,
    Breed,
    Age,
    Gender,
    Location,
    Status,
    Images,
    IsHidden,
    CreatedAt,
    UpdatedAt,
}
