//! Types for the search coordinator.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::scoring::ScoredCandidate;
use crate::search::RequestError;

/// Errors that fail a search before any provider is contacted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] RequestError),
}

/// Lifecycle of one search.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Created,
    Policing,
    Fetching,
    Parsing,
    Scoring,
    /// Every eligible provider succeeded.
    Ranked,
    /// Some providers failed; results from the rest.
    Partial,
    /// No provider produced results.
    Failed,
    Cancelled,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchState::Ranked | SearchState::Partial | SearchState::Failed | SearchState::Cancelled
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: SearchState) -> bool {
        use SearchState::*;
        if self.is_terminal() {
            return false;
        }
        match next {
            Partial | Cancelled => true,
            Policing => *self == Created,
            Fetching => *self == Policing,
            Parsing => *self == Fetching,
            Scoring => *self == Parsing,
            Ranked => *self == Scoring,
            Failed => *self == Policing || *self == Scoring,
            Created => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchState::Created => "created",
            SearchState::Policing => "policing",
            SearchState::Fetching => "fetching",
            SearchState::Parsing => "parsing",
            SearchState::Scoring => "scoring",
            SearchState::Ranked => "ranked",
            SearchState::Partial => "partial",
            SearchState::Failed => "failed",
            SearchState::Cancelled => "cancelled",
        }
    }
}

/// Outcome of one provider within a search.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Candidates that survived matching and filtering.
    Succeeded { candidates: usize },
    Policed { reason: String },
    Misconfigured { reason: String },
    FetchFailed { error: String },
    AuthFailed { error: String },
    ParseFailed { error: String },
    Cancelled,
}

impl ProviderStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderStatus::Succeeded { .. })
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderStatus::Succeeded { .. } => "succeeded",
            ProviderStatus::Policed { .. } => "policed",
            ProviderStatus::Misconfigured { .. } => "misconfigured",
            ProviderStatus::FetchFailed { .. } => "fetch_failed",
            ProviderStatus::AuthFailed { .. } => "auth_failed",
            ProviderStatus::ParseFailed { .. } => "parse_failed",
            ProviderStatus::Cancelled => "cancelled",
        }
    }
}

/// Result of one search.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub request_id: Uuid,
    pub state: SearchState,
    /// Best first.
    pub candidates: Vec<ScoredCandidate>,
    /// Per-provider outcome, for every provider that accepted the request.
    pub statuses: BTreeMap<String, ProviderStatus>,
    pub duration_ms: u64,
}

impl RankedResult {
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }
}
