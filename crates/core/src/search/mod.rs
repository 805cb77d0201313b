//! Search request model.
//!
//! A [`SearchRequest`] names a series, an ordered segment of episodes and the
//! [`SearchOptions`] policy for one search.

mod filter;
mod types;

pub use filter::{passes_all, CandidateFilter};
pub use types::*;
