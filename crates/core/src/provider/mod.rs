//! Search providers.
//!
//! Each provider family implements [`Provider`]: build queries for a
//! request, fetch them through a [`FetchContext`], and parse the raw
//! responses into candidates. Families are a closed set ([`ProviderKind`])
//! constructed by [`build_providers`].

mod config;
mod context;
mod error;
mod eztv;
mod jackett;
pub mod query;
mod registry;
mod torznab;
mod traits;

pub use config::{ProviderConfig, ProviderKind};
pub use context::FetchContext;
pub use error::ProviderError;
pub use eztv::EztvProvider;
pub use jackett::JackettProvider;
pub use registry::{build_provider, build_providers};
pub use torznab::TorznabProvider;
pub use traits::{Provider, RawResponse};
