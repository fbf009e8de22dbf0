//! Database repositories.

/// Rows per batched INSERT. Postgres caps a statement at 65535 bind
/// parameters; at 13 columns the user table tops out around 5000 rows,
/// so batched writes are issued in chunks of this size.
pub(crate) const INSERT_CHUNK_SIZE: usize = 1000;

pub mod bookmark;
pub mod bulk_upload;
pub mod poll;
pub mod user;
pub mod vote;

pub use bookmark::BookmarkRepository;
pub use bulk_upload::BulkUploadRepository;
pub use poll::PollRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
