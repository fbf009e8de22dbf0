//! Database entities.

pub mod bookmark;
pub mod bulk_upload;
pub mod poll;
pub mod user;
pub mod vote;

pub use bookmark::Entity as Bookmark;
pub use bulk_upload::Entity as BulkUpload;
pub use poll::Entity as Poll;
pub use user::Entity as User;
pub use vote::Entity as Vote;
