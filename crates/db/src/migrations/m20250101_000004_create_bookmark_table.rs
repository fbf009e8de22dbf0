//! Create bookmark table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookmark::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookmark::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookmark::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Bookmark::PollId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Bookmark::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmark_user")
                            .from(Bookmark::Table, Bookmark::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmark_poll")
                            .from(Bookmark::Table, Bookmark::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, poll_id) - set semantics
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmark_user_poll")
                    .table(Bookmark::Table)
                    .col(Bookmark::UserId)
                    .col(Bookmark::PollId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for loading a user's bookmark set)
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmark_user_id")
                    .table(Bookmark::Table)
                    .col(Bookmark::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookmark::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bookmark {
    Table,
    Id,
    UserId,
    PollId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Poll {
    Table,
    Id,
}
