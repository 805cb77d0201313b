//! Statistical scoring engine.
//!
//! [`stats`] holds the descriptive statistics; [`RankingPolicy`] blends
//! provider trust, popularity, quality and the provider hint into one
//! composite score and defines the total ranking order.

mod ranking;
pub mod stats;

pub use ranking::{
    rank, DownloadHandoff, RankingPolicy, ScoredCandidate, ScoringContext, ScoringInput,
    DEFAULT_PRIOR,
};
pub use stats::StatsError;
