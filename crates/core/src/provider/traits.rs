use async_trait::async_trait;

use crate::candidate::Candidate;
use crate::search::{SearchMode, SearchRequest};

use super::config::ProviderKind;
use super::context::FetchContext;
use super::error::ProviderError;

/// One raw provider response, tagged with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub provider: String,
    /// Series token of the request.
    pub series: String,
    /// Episode token the query targeted; `None` for listings and season packs.
    pub episode: Option<String>,
    pub status: u16,
    pub body: Vec<u8>,
}

/// A pluggable search backend.
///
/// `search` performs network calls through the [`FetchContext`]; `parse` is
/// pure and turns each response into candidates.
#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Cheap, side-effect-free eligibility check.
    fn accepts(&self, request: &SearchRequest) -> bool;

    async fn search(
        &self,
        request: &SearchRequest,
        mode: SearchMode,
        ctx: &FetchContext,
    ) -> Result<Vec<RawResponse>, ProviderError>;

    fn parse(&self, raw: &RawResponse, mode: SearchMode) -> Result<Vec<Candidate>, ProviderError>;
}
