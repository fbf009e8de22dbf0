//! Create bulk upload table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BulkUpload::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BulkUpload::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::UploadedBy)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::UploadType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BulkUpload::FileName).string_len(512).not_null())
                    .col(
                        ColumnDef::new(BulkUpload::Status)
                            .string_len(16)
                            .not_null()
                            .default("processing"),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::TotalRecords)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::SuccessfulRecords)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::FailedRecords)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BulkUpload::ErrorDetails).json_binary().not_null())
                    .col(
                        ColumnDef::new(BulkUpload::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BulkUpload::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bulk_upload_user")
                            .from(BulkUpload::Table, BulkUpload::UploadedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (uploaded_by, created_at) for the session history listing
        manager
            .create_index(
                Index::create()
                    .name("idx_bulk_upload_user_created_at")
                    .table(BulkUpload::Table)
                    .col(BulkUpload::UploadedBy)
                    .col(BulkUpload::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BulkUpload::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BulkUpload {
    Table,
    Id,
    UploadedBy,
    UploadType,
    FileName,
    Status,
    TotalRecords,
    SuccessfulRecords,
    FailedRecords,
    ErrorDetails,
    CreatedAt,
    CompletedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
