//! Mock provider for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::candidate::Candidate;
use crate::fetch::HttpRequest;
use crate::provider::{FetchContext, Provider, ProviderError, ProviderKind, RawResponse};
use crate::search::{SearchMode, SearchRequest};

/// Mock implementation of the Provider trait.
///
/// Provides controllable behavior for testing:
/// - Return a fixed candidate list from `parse`
/// - Fail search or parse with a chosen error
/// - Delay the search to exercise cancellation and deadlines
/// - Route a real request through the [`FetchContext`] so policing and
///   retries apply
///
/// # Example
///
/// ```rust,ignore
/// use scout_core::testing::{MockProvider, fixtures};
///
/// let provider = MockProvider::new("a").with_candidates(vec![
///     fixtures::candidate("a", "Show.Name.S01E02.1080p.WEB-DL.x264-GRP", "hash1", 40),
/// ]);
/// ```
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    candidates: Vec<Candidate>,
    search_error: Option<ProviderError>,
    parse_error: Option<String>,
    delay: Option<Duration>,
    fetch_url: Option<String>,
    accepts: bool,
    search_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            candidates: Vec::new(),
            search_error: None,
            parse_error: None,
            delay: None,
            fetch_url: None,
            accepts: true,
            search_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Candidates returned by `parse` for every response.
    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_search_error(mut self, error: ProviderError) -> Self {
        self.search_error = Some(error);
        self
    }

    pub fn with_parse_error(mut self, message: impl Into<String>) -> Self {
        self.parse_error = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Issue one GET to `url` through the fetch context during search.
    pub fn with_fetch(mut self, url: impl Into<String>) -> Self {
        self.fetch_url = Some(url.into());
        self
    }

    /// Decline every request in `accepts`.
    pub fn rejecting(mut self) -> Self {
        self.accepts = false;
        self
    }

    /// Number of times `search` was called.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Torznab
    }

    fn accepts(&self, _request: &SearchRequest) -> bool {
        self.accepts
    }

    async fn search(
        &self,
        request: &SearchRequest,
        _mode: SearchMode,
        ctx: &FetchContext,
    ) -> Result<Vec<RawResponse>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.search_error {
            return Err(error.clone());
        }

        let (status, body) = match &self.fetch_url {
            Some(url) => {
                let response = ctx.fetch(&self.id, HttpRequest::get(url.clone())).await?;
                (response.status, response.body)
            }
            None => (200, Vec::new()),
        };

        Ok(vec![RawResponse {
            provider: self.id.clone(),
            series: request.series.id.clone(),
            episode: request.segment.first().map(|ep| ep.id.clone()),
            status,
            body,
        }])
    }

    fn parse(&self, _raw: &RawResponse, _mode: SearchMode) -> Result<Vec<Candidate>, ProviderError> {
        match &self.parse_error {
            Some(message) => Err(ProviderError::Parsing(message.clone())),
            None => Ok(self.candidates.clone()),
        }
    }
}
