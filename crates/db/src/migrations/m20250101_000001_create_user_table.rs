//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(320)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::EmailLower).string_len(320).not_null())
                    .col(ColumnDef::new(User::FullName).string_len(256).null())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).null())
                    .col(ColumnDef::new(User::Token).string_len(64).null().unique_key())
                    .col(ColumnDef::new(User::Bio).text().null())
                    .col(ColumnDef::new(User::AvatarUrl).string_len(512).null())
                    .col(ColumnDef::new(User::Location).string_len(256).null())
                    .col(ColumnDef::new(User::Website).string_len(512).null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: email_lower (case-insensitive lookup during signin/import)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_email_lower")
                    .table(User::Table)
                    .col(User::EmailLower)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Email,
    EmailLower,
    FullName,
    Role,
    PasswordHash,
    Token,
    Bio,
    AvatarUrl,
    Location,
    Website,
    CreatedAt,
    UpdatedAt,
}
