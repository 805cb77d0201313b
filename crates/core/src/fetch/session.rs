//! Retry/backoff wrapper around the HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::metrics;

use super::config::FetchConfig;
use super::types::{
    AttemptGuard, FetchError, HttpRequest, HttpResponse, HttpTransport, Sleeper, TokioSleeper,
    Unguarded,
};

/// HTTP session giving every provider call bounded retry with backoff.
///
/// Retries connection failures, timeouts and responses whose status is in
/// the force-list. Any other response, successful or not, is returned to the
/// caller as-is.
pub struct FetchSession {
    config: FetchConfig,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl FetchSession {
    pub fn new(config: FetchConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let secs = self.config.backoff_factor * 2f64.powi(exponent);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }

    /// Send a request under the retry policy.
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        match self.send_guarded(request, &Unguarded).await {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Send a request under the retry policy, running `guard` around every
    /// attempt.
    ///
    /// The outer error is the guard refusing an attempt; the inner result is
    /// the fetch outcome.
    pub async fn send_guarded<G: AttemptGuard>(
        &self,
        request: &HttpRequest,
        guard: &G,
    ) -> Result<Result<HttpResponse, FetchError>, G::Error> {
        let mut request = request.clone();
        if request.timeout.is_none() {
            request.timeout = Some(Duration::from_secs(self.config.timeout_secs));
        }

        let attempts = self.config.max_attempts();
        let mut last_status = None;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            guard.admit().await?;
            let result = self.transport.execute(&request).await;
            guard.settle(&result).await;

            match result {
                Ok(response) if self.config.is_forced(response.status) => {
                    warn!(
                        url = %request.url,
                        attempt,
                        status = response.status,
                        "Retryable response status"
                    );
                    last_status = Some(response.status);
                    last_error = format!("HTTP {}: {}", response.status, response.body_excerpt());
                }
                Ok(response) => {
                    debug!(url = %request.url, attempt, status = response.status, "Fetch complete");
                    return Ok(Ok(response));
                }
                Err(e) if e.is_retryable() => {
                    warn!(url = %request.url, attempt, error = %e, "Retryable transport error");
                    last_status = None;
                    last_error = e.to_string();
                }
                Err(e) => {
                    warn!(url = %request.url, attempt, error = %e, "Transport error");
                    return Ok(Err(FetchError::Transport(e)));
                }
            }

            if attempt < attempts {
                let delay = self.backoff_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                metrics::FETCH_RETRIES.inc();
                self.sleeper.sleep(delay).await;
            }
        }

        Ok(Err(FetchError::RetriesExhausted {
            attempts,
            last_status,
            last_error,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::TransportError;
    use crate::testing::{RecordingSleeper, ScriptedTransport};

    fn session(transport: Arc<ScriptedTransport>, sleeper: Arc<RecordingSleeper>) -> FetchSession {
        FetchSession::new(FetchConfig::default(), transport).with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_succeeds_after_two_503s() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status("http://p/a", 503).await;
        transport.push_status("http://p/a", 503).await;
        transport.push_response("http://p/a", 200, "ok").await;
        let sleeper = Arc::new(RecordingSleeper::new());

        let response = session(transport.clone(), sleeper.clone())
            .send(&HttpRequest::get("http://p/a"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"ok");
        assert_eq!(
            sleeper.sleeps().await,
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert_eq!(transport.request_count("http://p/a").await, 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..3 {
            transport.push_status("http://p/a", 502).await;
        }
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = session(transport.clone(), sleeper.clone())
            .send(&HttpRequest::get("http://p/a"))
            .await
            .unwrap_err();

        match err {
            FetchError::RetriesExhausted {
                attempts,
                last_status,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_status, Some(502));
            }
            other => panic!("Expected RetriesExhausted, got {other:?}"),
        }
        // No sleep after the final attempt
        assert_eq!(sleeper.sleeps().await.len(), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status("http://p/a", 404).await;
        transport.push_response("http://p/a", 200, "never").await;
        let sleeper = Arc::new(RecordingSleeper::new());

        let response = session(transport.clone(), sleeper.clone())
            .send(&HttpRequest::get("http://p/a"))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(sleeper.sleeps().await.is_empty());
        assert_eq!(transport.request_count("http://p/a").await, 1);
    }

    #[tokio::test]
    async fn test_retries_timeouts_and_connect_errors() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_error("http://p/a", TransportError::Timeout)
            .await;
        transport
            .push_error("http://p/a", TransportError::Connect("refused".into()))
            .await;
        transport.push_response("http://p/a", 200, "ok").await;
        let sleeper = Arc::new(RecordingSleeper::new());

        let response = session(transport, sleeper.clone())
            .send(&HttpRequest::get("http://p/a"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(sleeper.sleeps().await.len(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_transport_error_surfaces_immediately() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_error("http://p/a", TransportError::Request("invalid url".into()))
            .await;
        let sleeper = Arc::new(RecordingSleeper::new());

        let err = session(transport, sleeper.clone())
            .send(&HttpRequest::get("http://p/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(TransportError::Request(_))));
        assert!(sleeper.sleeps().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_timeout_applied_when_unset() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_response("http://p/a", 200, "ok").await;
        let session = FetchSession::new(FetchConfig::default(), transport.clone())
            .with_sleeper(Arc::new(RecordingSleeper::new()));

        session.send(&HttpRequest::get("http://p/a")).await.unwrap();

        let requests = transport.requests().await;
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(30)));
    }

    /// Admits `limit` attempts and counts settled ones.
    struct CountingGuard {
        limit: usize,
        admitted: std::sync::atomic::AtomicUsize,
        settled: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AttemptGuard for CountingGuard {
        type Error = &'static str;

        async fn admit(&self) -> Result<(), Self::Error> {
            use std::sync::atomic::Ordering;
            if self.admitted.load(Ordering::SeqCst) >= self.limit {
                return Err("limit reached");
            }
            self.admitted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn settle(&self, _result: &Result<HttpResponse, TransportError>) {
            self.settled
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_guard_sees_every_attempt_and_can_stop_retries() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let transport = Arc::new(ScriptedTransport::new());
        transport.push_status("http://p/a", 503).await;
        transport.push_status("http://p/a", 503).await;
        transport.push_response("http://p/a", 200, "ok").await;
        let sleeper = Arc::new(RecordingSleeper::new());
        let session = session(transport.clone(), sleeper);

        let guard = CountingGuard {
            limit: 2,
            admitted: AtomicUsize::new(0),
            settled: AtomicUsize::new(0),
        };
        let refused = session
            .send_guarded(&HttpRequest::get("http://p/a"), &guard)
            .await
            .unwrap_err();

        assert_eq!(refused, "limit reached");
        assert_eq!(guard.settled.load(Ordering::SeqCst), 2);
        assert_eq!(transport.request_count("http://p/a").await, 2);
    }

    #[test]
    fn test_backoff_delay() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = FetchSession::new(
            FetchConfig::default().with_backoff_factor(0.5),
            transport,
        );
        assert_eq!(session.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(session.backoff_delay(2), Duration::from_secs(1));
        assert_eq!(session.backoff_delay(3), Duration::from_secs(2));
    }
}
