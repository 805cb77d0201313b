//! Candidate model.
//!
//! Providers turn raw search results into [`Candidate`] values. Quality
//! detection and the release-title grammar live here as well since every
//! provider family shares them.

mod quality;
mod release;
mod types;

pub use quality::{Codec, Quality, QualityOrder, QualityTag, Resolution, Source};
pub use release::{normalize_title, EpisodeMarker, ParsedRelease};
pub use types::{Candidate, CandidateBuilder, CandidateError, DownloadRef};
