//! Resilient fetch session.
//!
//! Every provider request goes through a [`FetchSession`], which retries
//! connection failures, timeouts and force-listed statuses with exponential
//! backoff before surfacing a terminal [`FetchError`].

mod config;
mod reqwest_transport;
mod session;
mod types;

pub use config::FetchConfig;
pub use reqwest_transport::ReqwestTransport;
pub use session::FetchSession;
pub use types::*;
