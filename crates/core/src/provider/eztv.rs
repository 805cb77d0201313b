//! EZTV provider (HTML search pages).

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::candidate::{Candidate, DownloadRef};
use crate::fetch::HttpRequest;
use crate::search::{SearchMode, SearchRequest};

use super::config::{ProviderConfig, ProviderKind};
use super::context::FetchContext;
use super::error::ProviderError;
use super::query::search_strings;
use super::traits::{Provider, RawResponse};

pub struct EztvProvider {
    config: ProviderConfig,
}

impl EztvProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// EZTV search paths use dashes between words.
    fn build_search_url(&self, query: &str) -> String {
        let slug = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!(
            "{}/search/{}",
            self.config.base_url(),
            urlencoding::encode(&slug)
        )
    }
}

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::Parsing(format!("invalid selector {css}: {e:?}")))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse sizes like "350.25 MB" or "1.2 GB" into bytes.
pub(crate) fn parse_size(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    let value: f64 = parts.next()?.replace(',', "").parse().ok()?;
    let multiplier = match parts.next()?.to_ascii_uppercase().as_str() {
        "B" => 1.0,
        "KB" | "KIB" => 1024.0,
        "MB" | "MIB" => 1024.0 * 1024.0,
        "GB" | "GIB" => 1024.0 * 1024.0 * 1024.0,
        "TB" | "TIB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    if value.is_finite() && value >= 0.0 {
        Some((value * multiplier).round() as u64)
    } else {
        None
    }
}

#[async_trait]
impl Provider for EztvProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Eztv
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
        let mut responses = Vec::new();
        for search in search_strings(request, mode) {
            debug!(provider = %self.config.id, query = %search.query, "Searching EZTV");
            let response = ctx
                .fetch(
                    &self.config.id,
                    HttpRequest::get(self.build_search_url(&search.query)),
                )
                .await?;
            responses.push(RawResponse {
                provider: self.config.id.clone(),
                series: request.series.id.clone(),
                episode: search.episode_id,
                status: response.status,
                body: response.body,
            });
        }
        Ok(responses)
    }

    fn parse(&self, raw: &RawResponse, _mode: SearchMode) -> Result<Vec<Candidate>, ProviderError> {
        let html = std::str::from_utf8(&raw.body)
            .map_err(|e| ProviderError::Parsing(format!("EZTV page is not UTF-8: {e}")))?;
        let document = Html::parse_document(html);

        let row_sel = selector("tr.forum_header_border")?;
        let title_sel = selector("a.epinfo")?;
        let magnet_sel = selector("a.magnet")?;
        let torrent_sel = selector("a.download_1")?;
        let cell_sel = selector("td")?;

        let mut candidates = Vec::new();
        for row in document.select(&row_sel) {
            let Some(title_el) = row.select(&title_sel).next() else {
                continue;
            };
            let title = cell_text(&title_el);
            if title.is_empty() {
                continue;
            }

            let magnet = row
                .select(&magnet_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            let torrent = row
                .select(&torrent_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            let Some(download) = DownloadRef::from_links(magnet, torrent) else {
                debug!(provider = %self.config.id, title = %title, "Skipping row without a download link");
                continue;
            };

            // Columns: show, episode, links, size, released, seeds
            let cells: Vec<String> = row.select(&cell_sel).map(|c| cell_text(&c)).collect();
            let size = cells.get(3).and_then(|s| parse_size(s)).unwrap_or(0);
            let seeders = cells.get(5).and_then(|s| s.replace(',', "").parse::<u32>().ok());

            let built = Candidate::builder(&self.config.id, title, download)
                .series(raw.series.clone())
                .episode(raw.episode.clone())
                .size_bytes(size)
                .seeders(seeders)
                .reliability_hint(self.config.trust_hint)
                .build();
            match built {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => debug!(provider = %self.config.id, error = %e, "Dropping invalid row"),
            }
        }

        debug!(provider = %self.config.id, results = candidates.len(), "Parsed EZTV page");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn provider() -> EztvProvider {
        EztvProvider::new(ProviderConfig::new(
            "eztv",
            ProviderKind::Eztv,
            "https://eztv.example/",
        ))
    }

    #[test]
    fn test_build_search_url() {
        assert_eq!(
            provider().build_search_url("Show Name S01E02"),
            "https://eztv.example/search/show-name-s01e02"
        );
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1 KB"), Some(1024));
        assert_eq!(parse_size("1.5 GB"), Some(1_610_612_736));
        assert_eq!(parse_size("350 MB"), Some(367_001_600));
        assert_eq!(parse_size("big"), None);
        assert_eq!(parse_size("12 parsecs"), None);
    }

    #[test]
    fn test_parse_page() {
        let raw = RawResponse {
            provider: "eztv".to_string(),
            series: "s1".to_string(),
            episode: Some("e1".to_string()),
            status: 200,
            body: fixtures::EZTV_PAGE.as_bytes().to_vec(),
        };
        let candidates = provider().parse(&raw, SearchMode::Backlog).unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title(), "Show Name S01E02 1080p WEB x264-GRP");
        assert_eq!(first.seeders(), Some(1234));
        assert_eq!(first.size_bytes(), 1_610_612_736);
        assert_eq!(first.canonical_id(), Some("feedface00112233"));

        let second = &candidates[1];
        assert!(matches!(second.download(), DownloadRef::Torrent(_)));
        assert_eq!(second.seeders(), None);
    }

    #[test]
    fn test_page_without_rows_is_empty() {
        let raw = RawResponse {
            provider: "eztv".to_string(),
            series: "s1".to_string(),
            episode: None,
            status: 200,
            body: b"<html><body>No results</body></html>".to_vec(),
        };
        assert!(provider()
            .parse(&raw, SearchMode::Daily)
            .unwrap()
            .is_empty());
    }
}
