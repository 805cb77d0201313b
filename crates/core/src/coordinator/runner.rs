//! Search coordinator implementation.
//!
//! Drives one request through policing, bounded concurrent fetching,
//! parsing, scoring and ranking. No single provider's failure fails the
//! search; it shows up in the per-provider statuses instead.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::candidate::Candidate;
use crate::fetch::FetchSession;
use crate::metrics;
use crate::policing::{PolicingError, RequestPolice};
use crate::provider::{FetchContext, Provider, ProviderError, RawResponse};
use crate::scoring::{rank, RankingPolicy, ScoredCandidate, ScoringContext, ScoringInput};
use crate::search::{passes_all, RequestError, SearchRequest};

use super::config::CoordinatorConfig;
use super::dedup::deduplicate;
use super::matcher::match_segment;
use super::types::{CoordinatorError, ProviderStatus, RankedResult, SearchState};

type FetchOutcome = Result<Vec<RawResponse>, ProviderError>;

/// Fans a search request out to providers and ranks what comes back.
pub struct SearchCoordinator {
    config: CoordinatorConfig,
    providers: Vec<Arc<dyn Provider>>,
    ctx: FetchContext,
    police: Arc<RequestPolice>,
    policy: RankingPolicy,
}

impl SearchCoordinator {
    /// Create a coordinator. Provider order is the registration order used
    /// for tie-breaking.
    pub fn new(
        config: CoordinatorConfig,
        providers: Vec<Arc<dyn Provider>>,
        session: Arc<FetchSession>,
        police: Arc<RequestPolice>,
        policy: RankingPolicy,
    ) -> Self {
        Self {
            config,
            providers,
            ctx: FetchContext::new(session, police.clone()),
            police,
            policy,
        }
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn police(&self) -> &RequestPolice {
        &self.police
    }

    /// Run a search to completion.
    pub async fn execute(&self, request: SearchRequest) -> Result<RankedResult, CoordinatorError> {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Run a search that stops early when `cancel` fires.
    ///
    /// Providers still in flight at cancellation get
    /// [`ProviderStatus::Cancelled`]; results from providers that finished
    /// are still ranked.
    ///
    /// In-flight fetches are dropped, not awaited. Every attempt that
    /// returned before that point has been charged to its provider's quota,
    /// but an attempt still waiting on the network when the search stops is
    /// never recorded, so each cancelled provider may have one upstream
    /// request the quota does not see.
    pub async fn execute_with_cancel(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<RankedResult, CoordinatorError> {
        let span = info_span!("search", request_id = %request.id);
        self.run(request, cancel).instrument(span).await
    }

    /// Explicitly requested providers in registration order, or all of them.
    fn resolve_providers(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<(usize, Arc<dyn Provider>)>, RequestError> {
        for wanted in &request.providers {
            if !self.providers.iter().any(|p| p.id() == wanted) {
                return Err(RequestError::UnknownProvider(wanted.clone()));
            }
        }

        Ok(self
            .providers
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                request.providers.is_empty() || request.providers.iter().any(|id| id == p.id())
            })
            .map(|(index, p)| (index, p.clone()))
            .collect())
    }

    async fn run(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<RankedResult, CoordinatorError> {
        let start = Instant::now();
        request.validate()?;
        let selected = self.resolve_providers(&request)?;
        let mode = request.mode();

        info!(
            series = %request.series.name,
            episodes = request.segment.len(),
            %mode,
            providers = selected.len(),
            "Starting search"
        );

        let mut state = SearchState::Created;
        let mut statuses: BTreeMap<String, ProviderStatus> = BTreeMap::new();

        // Policing gate
        transition(&mut state, SearchState::Policing);
        let mut eligible: Vec<(usize, Arc<dyn Provider>)> = Vec::new();
        for (index, provider) in selected {
            if !provider.accepts(&request) {
                debug!(provider = provider.id(), "Provider declined request");
                continue;
            }
            match self.police.check(provider.id()).await {
                Ok(()) => eligible.push((index, provider)),
                Err(e) => {
                    info!(provider = provider.id(), reason = %e, "Provider policed");
                    metrics::POLICED_CHECKS
                        .with_label_values(&[provider.id(), e.reason()])
                        .inc();
                    statuses.insert(provider.id().to_string(), policed_status(&e));
                }
            }
        }

        if eligible.is_empty() {
            warn!("No eligible providers");
            transition(&mut state, SearchState::Failed);
            return Ok(self.finish(&request, state, Vec::new(), statuses, start));
        }

        // Bounded concurrent fetch, racing cancellation and the deadline
        transition(&mut state, SearchState::Fetching);
        let (mut outcomes, cancelled) = self.fetch_all(&request, &eligible, &cancel).await;

        // Parse, match and filter in registration order
        transition(&mut state, SearchState::Parsing);
        let mut inputs: Vec<ScoringInput> = Vec::new();
        for (index, provider) in &eligible {
            let status = match outcomes.remove(index) {
                None => ProviderStatus::Cancelled,
                Some(Err(e)) => {
                    warn!(provider = provider.id(), error = %e, "Provider search failed");
                    error_status(&e)
                }
                Some(Ok(responses)) => match self.collect(provider.as_ref(), &request, &responses) {
                    Ok(found) => {
                        let count = found.len();
                        inputs.extend(found.into_iter().map(|(candidate, matched_episodes)| {
                            ScoringInput {
                                candidate,
                                provider_index: *index,
                                matched_episodes,
                            }
                        }));
                        ProviderStatus::Succeeded { candidates: count }
                    }
                    Err(e) => {
                        warn!(provider = provider.id(), error = %e, "Provider response unparseable");
                        error_status(&e)
                    }
                },
            };
            statuses.insert(provider.id().to_string(), status);
        }

        // Score, dedup and rank
        transition(&mut state, SearchState::Scoring);
        let scoring = ScoringContext {
            trust: self.provider_trust().await,
            current_quality: request.current_quality,
            down_cur_quality: request.options.down_cur_quality,
        };
        let mut ranked = deduplicate(self.policy.score(inputs, &scoring));
        rank(&mut ranked);

        let final_state = if cancelled {
            SearchState::Cancelled
        } else if statuses.values().all(ProviderStatus::is_success) {
            SearchState::Ranked
        } else if statuses.values().any(ProviderStatus::is_success) {
            SearchState::Partial
        } else {
            SearchState::Failed
        };
        transition(&mut state, final_state);

        Ok(self.finish(&request, state, ranked, statuses, start))
    }

    /// Fetch every eligible provider with at most `max_concurrent_fetches`
    /// in flight. Returns the finished outcomes keyed by provider index and
    /// whether the fetch phase was cut short.
    async fn fetch_all(
        &self,
        request: &SearchRequest,
        eligible: &[(usize, Arc<dyn Provider>)],
        cancel: &CancellationToken,
    ) -> (HashMap<usize, FetchOutcome>, bool) {
        let mode = request.mode();
        let ctx = &self.ctx;
        let fetches = eligible.iter().map(|(index, provider)| async move {
            let outcome = provider.search(request, mode, ctx).await;
            (*index, outcome)
        });
        let mut in_flight = pin!(stream::iter(fetches).buffer_unordered(self.config.concurrency()));
        let mut deadline = pin!(deadline(self.config.deadline()));

        let mut outcomes = HashMap::new();
        let cancelled = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(finished = outcomes.len(), "Search cancelled");
                    break true;
                }
                _ = &mut deadline => {
                    warn!(finished = outcomes.len(), "Search deadline reached");
                    break true;
                }
                next = in_flight.next() => match next {
                    Some((index, outcome)) => {
                        outcomes.insert(index, outcome);
                    }
                    None => break false,
                },
            }
        };

        (outcomes, cancelled)
    }

    /// Parse every response of one provider and keep the candidates that
    /// match the segment and pass the filter chain.
    fn collect(
        &self,
        provider: &dyn Provider,
        request: &SearchRequest,
        responses: &[RawResponse],
    ) -> Result<Vec<(Candidate, Vec<String>)>, ProviderError> {
        let mode = request.mode();
        let mut kept = Vec::new();
        for raw in responses {
            for candidate in provider.parse(raw, mode)? {
                let Some(matched) = match_segment(&candidate, request) else {
                    debug!(provider = provider.id(), title = candidate.title(), "Not in segment");
                    continue;
                };
                if !passes_all(
                    &request.options.backlog_filter,
                    &candidate,
                    &self.policy.quality_order,
                ) {
                    debug!(provider = provider.id(), title = candidate.title(), "Filtered out");
                    continue;
                }
                kept.push((candidate, matched));
            }
        }
        Ok(kept)
    }

    /// Bayesian trust for every registered provider.
    async fn provider_trust(&self) -> HashMap<String, f64> {
        let mut samples = BTreeMap::new();
        for provider in &self.providers {
            if let Some(reliability) = self.police.reliability(provider.id()).await {
                samples.insert(provider.id().to_string(), reliability);
            }
        }
        self.policy.provider_trust(&samples)
    }

    fn finish(
        &self,
        request: &SearchRequest,
        state: SearchState,
        candidates: Vec<ScoredCandidate>,
        statuses: BTreeMap<String, ProviderStatus>,
        start: Instant,
    ) -> RankedResult {
        let elapsed = start.elapsed();
        for (provider, status) in &statuses {
            metrics::PROVIDER_OUTCOMES
                .with_label_values(&[provider.as_str(), status.label()])
                .inc();
        }
        metrics::SEARCH_DURATION
            .with_label_values(&[state.as_str()])
            .observe(elapsed.as_secs_f64());
        metrics::CANDIDATES_RANKED.observe(candidates.len() as f64);

        info!(
            state = state.as_str(),
            candidates = candidates.len(),
            duration_ms = elapsed.as_millis() as u64,
            "Search finished"
        );

        RankedResult {
            request_id: request.id,
            state,
            candidates,
            statuses,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

fn transition(state: &mut SearchState, next: SearchState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal search transition {state:?} -> {next:?}"
    );
    debug!(from = state.as_str(), to = next.as_str(), "Search state");
    *state = next;
}

fn deadline(limit: Option<Duration>) -> impl Future<Output = ()> {
    async move {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    }
}

fn policed_status(e: &PolicingError) -> ProviderStatus {
    if e.is_misconfiguration() {
        ProviderStatus::Misconfigured {
            reason: e.to_string(),
        }
    } else {
        ProviderStatus::Policed {
            reason: e.to_string(),
        }
    }
}

fn error_status(e: &ProviderError) -> ProviderStatus {
    match e {
        ProviderError::Authentication { .. } => ProviderStatus::AuthFailed {
            error: e.to_string(),
        },
        ProviderError::Parsing(_) => ProviderStatus::ParseFailed {
            error: e.to_string(),
        },
        ProviderError::Policed(policing) => policed_status(policing),
        ProviderError::Http { .. } | ProviderError::Fetch(_) => ProviderStatus::FetchFailed {
            error: e.to_string(),
        },
    }
}
