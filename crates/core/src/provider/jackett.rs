//! Jackett provider (JSON results API).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::candidate::{Candidate, DownloadRef};
use crate::fetch::HttpRequest;
use crate::search::{SearchMode, SearchRequest};

use super::config::{ProviderConfig, ProviderKind};
use super::context::FetchContext;
use super::error::ProviderError;
use super::query::{search_strings, SearchString};
use super::traits::{Provider, RawResponse};

/// Newznab TV category.
const TV_CATEGORY: u32 = 5000;

pub struct JackettProvider {
    config: ProviderConfig,
}

impl JackettProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v2.0/indexers/{}/results?apikey={}&Query={}&Category[]={}",
            self.config.base_url(),
            urlencoding::encode(&self.config.indexer),
            urlencoding::encode(self.config.api_key.as_deref().unwrap_or_default()),
            urlencoding::encode(query),
            TV_CATEGORY
        )
    }
}

#[async_trait]
impl Provider for JackettProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Jackett
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
        for SearchString {
            query, episode_id, ..
        } in search_strings(request, mode)
        {
            debug!(provider = %self.config.id, query = %query, "Searching Jackett");
            let http = HttpRequest::get(self.build_search_url(&query))
                .header("Accept", "application/json");
            let response = ctx.fetch(&self.config.id, http).await?;
            responses.push(RawResponse {
                provider: self.config.id.clone(),
                series: request.series.id.clone(),
                episode: episode_id,
                status: response.status,
                body: response.body,
            });
        }
        Ok(responses)
    }

    fn parse(&self, raw: &RawResponse, _mode: SearchMode) -> Result<Vec<Candidate>, ProviderError> {
        let response: JackettResponse = serde_json::from_slice(&raw.body)
            .map_err(|e| ProviderError::Parsing(format!("invalid Jackett response: {e}")))?;

        let mut candidates = Vec::new();
        for result in response.Results {
            let Some(download) = DownloadRef::from_links(result.MagnetUri, result.Link) else {
                debug!(provider = %self.config.id, title = %result.Title, "Skipping result without a download link");
                continue;
            };
            let seeders = result.Seeders.map(|s| s.max(0) as u32);
            let leechers = match (result.Peers, result.Seeders) {
                (Some(peers), seeders) => {
                    Some(peers.saturating_sub(seeders.unwrap_or(0)).max(0) as u32)
                }
                (None, _) => None,
            };

            let built = Candidate::builder(&self.config.id, result.Title, download)
                .series(raw.series.clone())
                .episode(raw.episode.clone())
                .size_bytes(result.Size.unwrap_or(0).max(0) as u64)
                .seeders(seeders)
                .leechers(leechers)
                .published_at(result.PublishDate.as_deref().and_then(parse_jackett_date))
                .canonical_id(result.InfoHash)
                .reliability_hint(self.config.trust_hint)
                .build();
            match built {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => debug!(provider = %self.config.id, error = %e, "Dropping invalid result"),
            }
        }

        debug!(provider = %self.config.id, results = candidates.len(), "Parsed Jackett response");
        Ok(candidates)
    }
}

/// Jackett dates are ISO 8601, with or without an offset.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    MagnetUri: Option<String>,
    Link: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
    PublishDate: Option<String>,
}
