//! Scripted HTTP transport and recording sleeper.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetch::{HttpRequest, HttpResponse, HttpTransport, Sleeper, TransportError};

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that replays queued responses per URL.
///
/// Each request pops the next scripted result for its URL. Once a URL's
/// queue is empty (or was never scripted) the transport answers
/// `200` with an empty body.
///
/// # Example
///
/// ```rust,ignore
/// let transport = Arc::new(ScriptedTransport::new());
/// transport.push_status("http://p/a", 503).await;
/// transport.push_response("http://p/a", 200, "ok").await;
///
/// let session = FetchSession::new(FetchConfig::default(), transport.clone());
/// session.send(&HttpRequest::get("http://p/a")).await?;
/// assert_eq!(transport.request_count("http://p/a").await, 2);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Arc<RwLock<HashMap<String, VecDeque<Scripted>>>>,
    requests: Arc<RwLock<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and an empty body.
    pub async fn push_status(&self, url: &str, status: u16) {
        self.push(url, Ok(HttpResponse::new(status, Vec::new())))
            .await;
    }

    pub async fn push_response(&self, url: &str, status: u16, body: &str) {
        self.push(url, Ok(HttpResponse::new(status, body.as_bytes().to_vec())))
            .await;
    }

    pub async fn push_error(&self, url: &str, error: TransportError) {
        self.push(url, Err(error)).await;
    }

    async fn push(&self, url: &str, result: Scripted) {
        self.scripts
            .write()
            .await
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    /// Number of requests made to `url`.
    pub async fn request_count(&self, url: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Every request made, in order.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.write().await.push(request.clone());
        self.scripts
            .write()
            .await
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(HttpResponse::new(200, Vec::new())))
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: RwLock<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.read().await.clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.write().await.push(duration);
    }
}
