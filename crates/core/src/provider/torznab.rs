//! Torznab provider (RSS feed with `torznab:attr` extensions).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

use crate::candidate::{Candidate, DownloadRef};
use crate::fetch::HttpRequest;
use crate::search::{SearchMode, SearchRequest};

use super::config::{ProviderConfig, ProviderKind};
use super::context::FetchContext;
use super::error::ProviderError;
use super::query::{query_name, search_strings, SearchString};
use super::traits::{Provider, RawResponse};

const TV_CATEGORY: u32 = 5000;

/// `<error code="100" description="..."/>` answered in place of a feed.
static TORZNAB_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<error\s+code="(\d+)"(?:\s+description="([^"]*)")?"#).unwrap()
});

pub struct TorznabProvider {
    config: ProviderConfig,
}

impl TorznabProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn base_query(&self) -> String {
        format!(
            "{}/api?t=tvsearch&cat={}&apikey={}",
            self.config.base_url(),
            TV_CATEGORY,
            urlencoding::encode(self.config.api_key.as_deref().unwrap_or_default())
        )
    }

    /// Latest TV releases, no query.
    fn build_feed_url(&self) -> String {
        self.base_query()
    }

    fn build_search_url(&self, request: &SearchRequest, search: &SearchString) -> String {
        let mut url = self.base_query();
        if request.series.air_by_date && search.episode_id.is_some() {
            url.push_str(&format!("&q={}", urlencoding::encode(&search.query)));
            return url;
        }
        url.push_str(&format!(
            "&q={}",
            urlencoding::encode(&query_name(&request.series.name))
        ));
        if let Some(season) = search.season {
            url.push_str(&format!("&season={season}"));
        }
        if let Some(episode) = search.episode {
            url.push_str(&format!("&ep={episode}"));
        }
        url
    }

    fn raw(&self, request: &SearchRequest, episode: Option<String>, status: u16, body: Vec<u8>) -> RawResponse {
        RawResponse {
            provider: self.config.id.clone(),
            series: request.series.id.clone(),
            episode,
            status,
            body,
        }
    }
}

/// Torznab reports credential problems as an `<error>` document with codes
/// 100-199.
fn check_error_document(body: &[u8]) -> Result<(), ProviderError> {
    let text = String::from_utf8_lossy(body);
    let Some(caps) = TORZNAB_ERROR.captures(&text) else {
        return Ok(());
    };
    let code: u16 = caps[1].parse().unwrap_or(0);
    let description = caps.get(2).map(|m| m.as_str()).unwrap_or("unknown error");
    if (100..200).contains(&code) {
        Err(ProviderError::Authentication { status: 401 })
    } else {
        Err(ProviderError::Http {
            status: 200,
            message: format!("torznab error {code}: {description}"),
        })
    }
}

fn parse_rfc2822(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl Provider for TorznabProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Torznab
    }

    fn accepts(&self, request: &SearchRequest) -> bool {
        self.config.accepts(request)
    }

    async fn search(
        &self,
        request: &SearchRequest,
        mode: SearchMode,
        ctx: &FetchContext,
    ) -> Result<Vec<RawResponse>, ProviderError> {
        if mode == SearchMode::Daily {
            debug!(provider = %self.config.id, "Fetching latest Torznab feed");
            let response = ctx
                .fetch(&self.config.id, HttpRequest::get(self.build_feed_url()))
                .await?;
            check_error_document(&response.body)?;
            return Ok(vec![self.raw(request, None, response.status, response.body)]);
        }

        let mut responses = Vec::new();
        for search in search_strings(request, mode) {
            debug!(provider = %self.config.id, query = %search.query, "Searching Torznab");
            let url = self.build_search_url(request, &search);
            let response = ctx.fetch(&self.config.id, HttpRequest::get(url)).await?;
            check_error_document(&response.body)?;
            responses.push(self.raw(request, search.episode_id, response.status, response.body));
        }
        Ok(responses)
    }

    fn parse(&self, raw: &RawResponse, _mode: SearchMode) -> Result<Vec<Candidate>, ProviderError> {
        let channel = rss::Channel::read_from(&raw.body[..])
            .map_err(|e| ProviderError::Parsing(format!("invalid Torznab feed: {e}")))?;

        let mut candidates = Vec::new();
        for item in channel.items() {
            let Some(title) = item.title().map(str::trim).filter(|t| !t.is_empty()) else {
                continue;
            };

            let attrs = item.extensions().get("torznab").and_then(|m| m.get("attr"));
            let attr = |name: &str| -> Option<String> {
                attrs?
                    .iter()
                    .find(|ext| ext.attrs().get("name").map(String::as_str) == Some(name))
                    .and_then(|ext| ext.attrs().get("value").cloned())
            };

            let link = item.link().map(str::to_string);
            let magnet = attr("magneturl").or_else(|| {
                link.clone().filter(|l| l.starts_with("magnet:"))
            });
            let torrent = item
                .enclosure()
                .map(|e| e.url().to_string())
                .or_else(|| link.filter(|l| !l.starts_with("magnet:")));
            let Some(download) = DownloadRef::from_links(magnet, torrent) else {
                debug!(provider = %self.config.id, title, "Skipping item without a download link");
                continue;
            };

            let size = attr("size")
                .and_then(|s| s.parse::<u64>().ok())
                .or_else(|| item.enclosure().and_then(|e| e.length().parse().ok()))
                .unwrap_or(0);
            let seeders: Option<u32> = attr("seeders").and_then(|s| s.parse().ok());
            let peers: Option<u32> = attr("peers").and_then(|s| s.parse().ok());
            let leechers = peers.map(|p| p.saturating_sub(seeders.unwrap_or(0)));

            let built = Candidate::builder(&self.config.id, title, download)
                .series(raw.series.clone())
                .episode(raw.episode.clone())
                .size_bytes(size)
                .seeders(seeders)
                .leechers(leechers)
                .published_at(item.pub_date().and_then(parse_rfc2822))
                .canonical_id(attr("infohash"))
                .reliability_hint(self.config.trust_hint)
                .build();
            match built {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => debug!(provider = %self.config.id, error = %e, "Dropping invalid item"),
            }
        }

        debug!(provider = %self.config.id, results = candidates.len(), "Parsed Torznab feed");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{EpisodeIdentity, SearchOptions, SearchType, SeriesIdentity};
    use crate::testing::fixtures;

    fn provider() -> TorznabProvider {
        TorznabProvider::new(
            ProviderConfig::new("torznab", ProviderKind::Torznab, "http://prowlarr:9696/1")
                .with_api_key("k"),
        )
    }

    fn raw(body: &str) -> RawResponse {
        RawResponse {
            provider: "torznab".to_string(),
            series: "s1".to_string(),
            episode: None,
            status: 200,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_urls() {
        let p = provider();
        assert_eq!(
            p.build_feed_url(),
            "http://prowlarr:9696/1/api?t=tvsearch&cat=5000&apikey=k"
        );

        let request = SearchRequest::new(
            SeriesIdentity::new("s1", "Show Name"),
            vec![EpisodeIdentity::new("e1", 1, 2)],
        )
        .with_options(SearchOptions::new(SearchType::Backlog));
        let strings = search_strings(&request, SearchMode::Backlog);
        assert_eq!(
            p.build_search_url(&request, &strings[0]),
            "http://prowlarr:9696/1/api?t=tvsearch&cat=5000&apikey=k&q=Show%20Name&season=1&ep=2"
        );
    }

    #[test]
    fn test_parse_feed() {
        let candidates = provider()
            .parse(&raw(fixtures::TORZNAB_FEED), SearchMode::Daily)
            .unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title(), "Show.Name.S01E02.720p.HDTV.x264-GRP");
        assert_eq!(first.seeders(), Some(25));
        assert_eq!(first.leechers(), Some(5));
        assert_eq!(first.size_bytes(), 734_003_200);
        assert_eq!(first.canonical_id(), Some("0123456789abcdef"));
        assert!(matches!(first.download(), DownloadRef::Magnet(_)));
        assert!(first.published_at().is_some());

        let second = &candidates[1];
        assert!(matches!(second.download(), DownloadRef::Torrent(_)));
        assert_eq!(second.size_bytes(), 2_000_000);
        assert_eq!(second.seeders(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = provider()
            .parse(&raw("{\"not\": \"xml\"}"), SearchMode::Daily)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Parsing(_)));
    }

    #[test]
    fn test_error_document() {
        let auth = br#"<?xml version="1.0"?><error code="100" description="Incorrect user credentials"/>"#;
        assert_eq!(
            check_error_document(auth),
            Err(ProviderError::Authentication { status: 401 })
        );
        let other = br#"<error code="300" description="No such function"/>"#;
        assert!(matches!(
            check_error_document(other),
            Err(ProviderError::Http { .. })
        ));
        assert!(check_error_document(fixtures::TORZNAB_FEED.as_bytes()).is_ok());
    }
}
