//! Core business logic for pollhub.
//!
//! Services compose the repositories from `pollhub-db` into the operations
//! the API exposes: poll lifecycle, voting, bookmarks, accounts, and bulk
//! CSV import.

pub mod csv;
pub mod services;

pub use services::*;
