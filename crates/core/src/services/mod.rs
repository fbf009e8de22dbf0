//! Business logic services.

pub mod bookmark;
pub mod import;
pub mod poll;
pub mod stats;
pub mod user;
pub mod vote;

pub use bookmark::BookmarkService;
pub use import::{ImportReport, ImportService};
pub use poll::{CreatePollInput, PollOption, PollService, PollView, UpdatePollInput};
pub use stats::{OverviewStats, StatsService};
pub use user::{SignupInput, UpdateProfileInput, UserService};
pub use vote::{VoteService, VoteView};
