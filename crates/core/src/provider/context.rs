use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::fetch::{AttemptGuard, FetchSession, HttpRequest, HttpResponse, TransportError};
use crate::policing::{Outcome, PolicingError, RequestPolice};

use super::error::ProviderError;

/// Everything a provider needs to make network calls.
#[derive(Clone)]
pub struct FetchContext {
    session: Arc<FetchSession>,
    police: Arc<RequestPolice>,
}

impl FetchContext {
    pub fn new(session: Arc<FetchSession>, police: Arc<RequestPolice>) -> Self {
        Self { session, police }
    }

    pub fn police(&self) -> &RequestPolice {
        &self.police
    }

    /// Police, send and record one request.
    ///
    /// Every attempt, retries included, is checked against the provider's
    /// quota before it goes out and charged after it returns, so a provider
    /// that hits its ceiling mid-retry stops there. A non-success status is
    /// mapped to [`ProviderError::Authentication`] or [`ProviderError::Http`].
    pub async fn fetch(
        &self,
        provider: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, ProviderError> {
        let guard = QuotaGuard {
            police: &self.police,
            provider,
        };
        let response = self.session.send_guarded(&request, &guard).await??;
        if !response.is_success() {
            return Err(ProviderError::from_status(
                response.status,
                response.body_excerpt(),
            ));
        }
        Ok(response)
    }
}

/// Charges each attempt to one provider's quota.
struct QuotaGuard<'a> {
    police: &'a RequestPolice,
    provider: &'a str,
}

#[async_trait]
impl<'a> AttemptGuard for QuotaGuard<'a> {
    type Error = PolicingError;

    async fn admit(&self) -> Result<(), PolicingError> {
        self.police.check(self.provider).await
    }

    async fn settle(&self, result: &Result<HttpResponse, TransportError>) {
        let outcome = match result {
            Ok(response) if response.is_success() => Outcome::Success,
            _ => Outcome::Failure,
        };
        if let Err(e) = self.police.record(self.provider, outcome).await {
            warn!(provider = self.provider, error = %e, "Failed to record request outcome");
        }
    }
}
