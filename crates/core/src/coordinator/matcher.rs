//! Candidate to segment matching.

use crate::candidate::{Candidate, EpisodeMarker, ParsedRelease};
use crate::search::SearchRequest;

/// Segment episode tokens a candidate covers, or `None` when it does not
/// belong to the request.
///
/// The title's name prefix must be the series name. Season packs only
/// match season searches.
pub fn match_segment(candidate: &Candidate, request: &SearchRequest) -> Option<Vec<String>> {
    let parsed = ParsedRelease::parse(candidate.title());
    if !parsed.matches_series(&request.series.name) {
        return None;
    }

    let matched: Vec<String> = match parsed.marker? {
        EpisodeMarker::Episodes { season, episodes } => request
            .segment
            .iter()
            .filter(|ep| ep.season == season && episodes.contains(&ep.episode))
            .map(|ep| ep.id.clone())
            .collect(),
        EpisodeMarker::Season(season) if request.options.season_search => request
            .segment
            .iter()
            .filter(|ep| ep.season == season)
            .map(|ep| ep.id.clone())
            .collect(),
        EpisodeMarker::Season(_) => Vec::new(),
        EpisodeMarker::AirDate(date) => request
            .segment
            .iter()
            .filter(|ep| ep.air_date == Some(date))
            .map(|ep| ep.id.clone())
            .collect(),
    };

    if matched.is_empty() {
        None
    } else {
        Some(matched)
    }
}
