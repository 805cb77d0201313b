//! Types describing one search's intent.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::candidate::Quality;

use super::filter::CandidateFilter;

/// Why a search was triggered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// User-initiated search for specific episodes.
    Manual,
    /// Recurring search for newly aired episodes.
    #[default]
    Daily,
    /// Gap-filling search for older episodes.
    Backlog,
}

impl SearchType {
    /// The provider fetch mode for this search type.
    pub fn mode(&self) -> SearchMode {
        match self {
            SearchType::Daily => SearchMode::Daily,
            SearchType::Manual | SearchType::Backlog => SearchMode::Backlog,
        }
    }
}

/// How providers fetch: latest listings or targeted per-episode queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Daily,
    Backlog,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Daily => write!(f, "daily"),
            SearchMode::Backlog => write!(f, "backlog"),
        }
    }
}

/// Search policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchOptions {
    #[serde(default)]
    pub search_type: SearchType,
    /// Accept releases at or below the quality already held.
    #[serde(default)]
    pub down_cur_quality: bool,
    /// Search for whole-season packs instead of single episodes.
    #[serde(default)]
    pub season_search: bool,
    /// Ordered filter chain; a candidate must pass every predicate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backlog_filter: Vec<CandidateFilter>,
}

impl SearchOptions {
    pub fn new(search_type: SearchType) -> Self {
        Self {
            search_type,
            ..Default::default()
        }
    }

    pub fn with_down_cur_quality(mut self, value: bool) -> Self {
        self.down_cur_quality = value;
        self
    }

    pub fn with_season_search(mut self, value: bool) -> Self {
        self.season_search = value;
        self
    }

    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.backlog_filter.push(filter);
        self
    }
}

/// Target series identity, as supplied by the external indexer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesIdentity {
    /// Opaque indexer token.
    pub id: String,
    /// Display name used to build queries and match release titles.
    pub name: String,
    /// Episodes are released by air date rather than SxxEyy.
    #[serde(default)]
    pub air_by_date: bool,
}

impl SeriesIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            air_by_date: false,
        }
    }
}

/// One target episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeIdentity {
    /// Opaque indexer token.
    pub id: String,
    pub season: u32,
    pub episode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
}

impl EpisodeIdentity {
    pub fn new(id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            id: id.into(),
            season,
            episode,
            air_date: None,
        }
    }

    pub fn with_air_date(mut self, air_date: NaiveDate) -> Self {
        self.air_date = Some(air_date);
        self
    }
}

/// Errors for requests that cannot be executed at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Search request has an empty episode segment")]
    EmptySegment,

    #[error("Search request series name is empty")]
    EmptySeriesName,

    #[error("Episode {0} appears more than once in the segment")]
    DuplicateEpisode(String),

    #[error("Unknown provider requested: {0}")]
    UnknownProvider(String),
}

/// One unit of search work. Consumed once by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub series: SeriesIdentity,
    /// Ordered target episodes.
    pub segment: Vec<EpisodeIdentity>,
    #[serde(default)]
    pub options: SearchOptions,
    /// Providers to use; empty means every eligible provider.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
    /// Quality already held for the segment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_quality: Option<Quality>,
}

impl SearchRequest {
    pub fn new(series: SeriesIdentity, segment: Vec<EpisodeIdentity>) -> Self {
        Self {
            id: Uuid::new_v4(),
            series,
            segment,
            options: SearchOptions::default(),
            providers: Vec::new(),
            current_quality: None,
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_current_quality(mut self, quality: Quality) -> Self {
        self.current_quality = Some(quality);
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.options.search_type.mode()
    }

    /// Structural validation; provider names are checked by the coordinator.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.series.name.trim().is_empty() {
            return Err(RequestError::EmptySeriesName);
        }
        if self.segment.is_empty() {
            return Err(RequestError::EmptySegment);
        }
        let mut seen = HashSet::new();
        for episode in &self.segment {
            if !seen.insert(episode.id.as_str()) {
                return Err(RequestError::DuplicateEpisode(episode.id.clone()));
            }
        }
        Ok(())
    }

    /// Distinct seasons of the segment, in first-seen order.
    pub fn seasons(&self) -> Vec<u32> {
        let mut seasons = Vec::new();
        for episode in &self.segment {
            if !seasons.contains(&episode.season) {
                seasons.push(episode.season);
            }
        }
        seasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SearchRequest {
        SearchRequest::new(
            SeriesIdentity::new("tvdb:1", "Show Name"),
            vec![
                EpisodeIdentity::new("ep-1", 1, 1),
                EpisodeIdentity::new("ep-2", 1, 2),
                EpisodeIdentity::new("ep-3", 2, 1),
            ],
        )
    }

    #[test]
    fn test_search_type_mode() {
        assert_eq!(SearchType::Daily.mode(), SearchMode::Daily);
        assert_eq!(SearchType::Backlog.mode(), SearchMode::Backlog);
        assert_eq!(SearchType::Manual.mode(), SearchMode::Backlog);
    }

    #[test]
    fn test_validate_ok() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_segment() {
        let mut req = request();
        req.segment.clear();
        assert_eq!(req.validate(), Err(RequestError::EmptySegment));
    }

    #[test]
    fn test_validate_empty_series_name() {
        let mut req = request();
        req.series.name = "  ".to_string();
        assert_eq!(req.validate(), Err(RequestError::EmptySeriesName));
    }

    #[test]
    fn test_validate_duplicate_episode() {
        let mut req = request();
        req.segment.push(EpisodeIdentity::new("ep-1", 1, 1));
        assert_eq!(
            req.validate(),
            Err(RequestError::DuplicateEpisode("ep-1".to_string()))
        );
    }

    #[test]
    fn test_seasons_in_order() {
        assert_eq!(request().seasons(), vec![1, 2]);
    }

    #[test]
    fn test_deserialize_minimal_request_defaults_options() {
        let json = r#"{
            "series": {"id": "tvdb:1", "name": "Show Name"},
            "segment": [{"id": "ep-1", "season": 1, "episode": 2}]
        }"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.options, SearchOptions::default());
        assert_eq!(req.options.search_type, SearchType::Daily);
        assert!(req.providers.is_empty());
        assert!(!req.series.air_by_date);
    }

    #[test]
    fn test_free_text_search_type_is_rejected() {
        let json = r#"{
            "series": {"id": "tvdb:1", "name": "Show Name"},
            "segment": [{"id": "ep-1", "season": 1, "episode": 2}],
            "options": {"search_type": "whenever"}
        }"#;
        let result: Result<SearchRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
