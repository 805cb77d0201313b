//! Transport-agnostic request, response and error types.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP method of a provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Overrides the session timeout when set.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First bytes of the body, for error messages.
    pub fn body_excerpt(&self) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(200)
            .collect()
    }
}

/// Errors from a single transport attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Connection failures and timeouts are retried; anything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout)
    }
}

/// Terminal error of a fetch after the retry policy ran.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
        last_error: String,
    },
}

/// The underlying HTTP transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Hook run around every individual attempt of a fetch.
///
/// `admit` runs before each attempt, retries included; an error stops the
/// fetch before the request goes out. `settle` sees the raw result of every
/// attempt that was sent.
#[async_trait]
pub trait AttemptGuard: Send + Sync {
    type Error: Send;

    async fn admit(&self) -> Result<(), Self::Error>;

    async fn settle(&self, result: &Result<HttpResponse, TransportError>);
}

/// Guard that admits everything and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unguarded;

#[async_trait]
impl AttemptGuard for Unguarded {
    type Error = std::convert::Infallible;

    async fn admit(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn settle(&self, _result: &Result<HttpResponse, TransportError>) {}
}

/// Backoff sleeper, injectable so tests never wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_transport_errors() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(!TransportError::Request("bad url".into()).is_retryable());
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(204, Vec::new());
        assert!(response.is_success());
        let response = HttpResponse::new(404, "x".repeat(500));
        assert!(!response.is_success());
        assert_eq!(response.body_excerpt().len(), 200);
    }

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::get("http://host/api")
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(5));
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::RetriesExhausted {
            attempts: 3,
            last_status: Some(503),
            last_error: "HTTP 503".to_string(),
        };
        assert_eq!(err.to_string(), "Gave up after 3 attempts: HTTP 503");
        let err = FetchError::Transport(TransportError::Timeout);
        assert_eq!(err.to_string(), "Request timed out");
    }
}
