//! HTTP API layer for pollhub.
//!
//! - **Endpoints**: polls, votes, bookmarks, accounts, admin, bulk import
//! - **Extractors**: bearer-token authentication and the admin capability
//! - **Middleware**: token resolution, shared application state
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
