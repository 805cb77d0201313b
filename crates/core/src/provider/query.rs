//! Search strings for a request.

use crate::search::{SearchMode, SearchRequest};

/// One query a provider issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchString {
    pub query: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Segment episode token the query targets.
    pub episode_id: Option<String>,
}

impl SearchString {
    fn name_only(query: String) -> Self {
        Self {
            query,
            season: None,
            episode: None,
            episode_id: None,
        }
    }
}

/// Series name cleaned for use in a query: apostrophes dropped, other
/// punctuation turned into spaces.
pub fn query_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the queries for a request.
///
/// Daily mode issues one query on the series name. Backlog mode issues one
/// query per season when `season_search` is set, otherwise one per episode
/// (`Name S01E02`, or `Name 2024.01.31` for air-by-date series).
pub fn search_strings(request: &SearchRequest, mode: SearchMode) -> Vec<SearchString> {
    let name = query_name(&request.series.name);

    if mode == SearchMode::Daily {
        return vec![SearchString::name_only(name)];
    }

    if request.options.season_search {
        return request
            .seasons()
            .into_iter()
            .map(|season| SearchString {
                query: format!("{name} S{season:02}"),
                season: Some(season),
                episode: None,
                episode_id: None,
            })
            .collect();
    }

    request
        .segment
        .iter()
        .map(|ep| {
            let query = match ep.air_date {
                Some(date) if request.series.air_by_date => {
                    format!("{name} {}", date.format("%Y.%m.%d"))
                }
                _ => format!("{name} S{:02}E{:02}", ep.season, ep.episode),
            };
            SearchString {
                query,
                season: Some(ep.season),
                episode: Some(ep.episode),
                episode_id: Some(ep.id.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{EpisodeIdentity, SearchOptions, SearchType, SeriesIdentity};
    use chrono::NaiveDate;

    fn request() -> SearchRequest {
        SearchRequest::new(
            SeriesIdentity::new("s1", "Marvel's Agents: of S.H.I.E.L.D."),
            vec![
                EpisodeIdentity::new("e1", 1, 2),
                EpisodeIdentity::new("e2", 1, 3),
                EpisodeIdentity::new("e3", 2, 1),
            ],
        )
        .with_options(SearchOptions::new(SearchType::Backlog))
    }

    #[test]
    fn test_query_name() {
        assert_eq!(
            query_name("Marvel's Agents: of S.H.I.E.L.D."),
            "Marvels Agents of S H I E L D"
        );
        assert_eq!(query_name("  The   Office "), "The Office");
    }

    #[test]
    fn test_daily_uses_series_name() {
        let strings = search_strings(&request(), SearchMode::Daily);
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].query, "Marvels Agents of S H I E L D");
        assert!(strings[0].episode_id.is_none());
    }

    #[test]
    fn test_backlog_per_episode() {
        let strings = search_strings(&request(), SearchMode::Backlog);
        let queries: Vec<_> = strings.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(
            queries,
            vec![
                "Marvels Agents of S H I E L D S01E02",
                "Marvels Agents of S H I E L D S01E03",
                "Marvels Agents of S H I E L D S02E01",
            ]
        );
        assert_eq!(strings[1].episode_id.as_deref(), Some("e2"));
        assert_eq!(strings[2].season, Some(2));
    }

    #[test]
    fn test_backlog_season_search() {
        let mut req = request();
        req.options.season_search = true;
        let strings = search_strings(&req, SearchMode::Backlog);
        let queries: Vec<_> = strings.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(
            queries,
            vec![
                "Marvels Agents of S H I E L D S01",
                "Marvels Agents of S H I E L D S02",
            ]
        );
        assert!(strings.iter().all(|s| s.episode_id.is_none()));
    }

    #[test]
    fn test_air_by_date() {
        let mut series = SeriesIdentity::new("s2", "The Daily Show");
        series.air_by_date = true;
        let req = SearchRequest::new(
            series,
            vec![EpisodeIdentity::new("e1", 2024, 10)
                .with_air_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())],
        )
        .with_options(SearchOptions::new(SearchType::Backlog));

        let strings = search_strings(&req, SearchMode::Backlog);
        assert_eq!(strings[0].query, "The Daily Show 2024.01.31");
    }
}
