//! Search coordinator.
//!
//! Takes one [`SearchRequest`](crate::search::SearchRequest) through
//! `created → policing → fetching → parsing → scoring → ranked`, ending in
//! `partial`, `failed` or `cancelled` when providers fail or the search is
//! cut short.

mod config;
pub mod dedup;
mod matcher;
mod runner;
mod types;

pub use config::CoordinatorConfig;
pub use matcher::match_segment;
pub use runner::SearchCoordinator;
pub use types::*;
