pub mod candidate;
pub mod config;
pub mod coordinator;
pub mod fetch;
pub mod metrics;
pub mod policing;
pub mod provider;
pub mod scoring;
pub mod search;
pub mod testing;

pub use candidate::{Candidate, DownloadRef, Quality, QualityOrder, QualityTag};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use coordinator::{
    CoordinatorConfig, CoordinatorError, ProviderStatus, RankedResult, SearchCoordinator,
    SearchState,
};
pub use fetch::{FetchConfig, FetchError, FetchSession, HttpTransport, ReqwestTransport};
pub use policing::{
    Outcome, PolicingError, QuotaConfig, QuotaState, QuotaStore, RequestPolice,
    SqliteQuotaStore,
};
pub use provider::{
    build_provider, build_providers, FetchContext, Provider, ProviderConfig, ProviderError,
    ProviderKind, RawResponse,
};
pub use scoring::{DownloadHandoff, RankingPolicy, ScoredCandidate};
pub use search::{
    CandidateFilter, EpisodeIdentity, SearchMode, SearchOptions, SearchRequest, SearchType,
    SeriesIdentity,
};
