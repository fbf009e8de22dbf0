//! Create poll table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Poll::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Poll::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Poll::Description).text().null())
                    .col(ColumnDef::new(Poll::Category).string_len(128).null())
                    .col(ColumnDef::new(Poll::Options).json().not_null())
                    .col(ColumnDef::new(Poll::Tags).json().not_null())
                    .col(
                        ColumnDef::new(Poll::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Poll::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Poll::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_user")
                            .from(Poll::Table, Poll::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (is_active, created_at) for the active listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_active_created_at")
                    .table(Poll::Table)
                    .col(Poll::IsActive)
                    .col(Poll::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_by (for listing a user's submissions)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_created_by")
                    .table(Poll::Table)
                    .col(Poll::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Index: title (bulk vote import resolves polls by title)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_title")
                    .table(Poll::Table)
                    .col(Poll::Title)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
    Title,
    Description,
    Category,
    Options,
    Tags,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
