//! Bulk upload session entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a bulk upload session.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Session is currently being processed.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Session completed successfully.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Session completed with some row errors.
    #[sea_orm(string_value = "partial")]
    #[serde(rename = "partial")]
    PartiallyCompleted,
    /// Session failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Data type being imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    /// User accounts.
    #[sea_orm(string_value = "users")]
    Users,
    /// Polls with inline options.
    #[sea_orm(string_value = "polls")]
    Polls,
    /// Explicit ballots.
    #[sea_orm(string_value = "votes")]
    Votes,
    /// Synthetically distributed ballots.
    #[sea_orm(string_value = "random_votes")]
    RandomVotes,
}

/// A bulk upload session.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bulk_upload")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Admin who started this upload.
    #[sea_orm(indexed)]
    pub uploaded_by: String,

    pub upload_type: UploadType,

    pub file_name: String,

    pub status: UploadStatus,

    /// Total rows in the CSV.
    #[sea_orm(default_value = 0)]
    pub total_records: i32,

    /// Successfully imported rows.
    #[sea_orm(default_value = 0)]
    pub successful_records: i32,

    /// Failed rows.
    #[sea_orm(default_value = 0)]
    pub failed_records: i32,

    /// Per-row errors (JSON array of `{line, message}` objects).
    #[sea_orm(column_type = "JsonBinary")]
    pub error_details: Json,

    /// When this session was created.
    pub created_at: DateTimeWithTimeZone,

    /// When this session finished.
    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UploadedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
