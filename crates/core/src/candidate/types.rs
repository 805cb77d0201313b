//! The normalized release record every provider produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quality::{Quality, QualityTag};

/// Errors raised when a provider tries to build an invalid candidate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("Candidate provider identifier is empty")]
    EmptyProvider,

    #[error("Candidate download reference is empty")]
    EmptyDownload,
}

/// How a release is fetched by the download collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "uri", rename_all = "snake_case")]
pub enum DownloadRef {
    Magnet(String),
    Torrent(String),
    Nzb(String),
}

impl DownloadRef {
    /// The URI handed to the download collaborator.
    pub fn uri(&self) -> &str {
        match self {
            DownloadRef::Magnet(uri) | DownloadRef::Torrent(uri) | DownloadRef::Nzb(uri) => uri,
        }
    }

    /// Pick the magnet link when a listing carries both kinds.
    pub fn from_links(magnet: Option<String>, torrent_url: Option<String>) -> Option<Self> {
        match (magnet, torrent_url) {
            (Some(m), _) if !m.trim().is_empty() => Some(DownloadRef::Magnet(m)),
            (_, Some(t)) if !t.trim().is_empty() => Some(DownloadRef::Torrent(t)),
            _ => None,
        }
    }

    /// Extract the BitTorrent info hash from a magnet URI, lowercased.
    pub fn magnet_info_hash(&self) -> Option<String> {
        let DownloadRef::Magnet(uri) = self else {
            return None;
        };
        uri.split(['?', '&'])
            .find_map(|part| part.strip_prefix("xt=urn:btih:"))
            .filter(|hash| !hash.is_empty())
            .map(|hash| hash.to_lowercase())
    }
}

/// One discovered release.
///
/// Immutable once built: fields are private and exposed through getters.
/// Build through [`Candidate::builder`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Candidate {
    provider: String,
    title: String,
    series: Option<String>,
    episode: Option<String>,
    size_bytes: u64,
    seeders: Option<u32>,
    leechers: Option<u32>,
    published_at: Option<DateTime<Utc>>,
    quality: QualityTag,
    download: DownloadRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reliability_hint: Option<f64>,
}

impl Candidate {
    /// Start building a candidate. The quality tag defaults to the one
    /// detected from `title`.
    pub fn builder(
        provider: impl Into<String>,
        title: impl Into<String>,
        download: DownloadRef,
    ) -> CandidateBuilder {
        let title = title.into();
        CandidateBuilder {
            quality: QualityTag::from_title(&title),
            candidate: Candidate {
                provider: provider.into(),
                title,
                series: None,
                episode: None,
                size_bytes: 0,
                seeders: None,
                leechers: None,
                published_at: None,
                quality: QualityTag::default(),
                download,
                canonical_id: None,
                reliability_hint: None,
            },
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Series identity token from the external indexer.
    pub fn series(&self) -> Option<&str> {
        self.series.as_deref()
    }

    /// Episode identity token, when the provider searched for one episode.
    pub fn episode(&self) -> Option<&str> {
        self.episode.as_deref()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn seeders(&self) -> Option<u32> {
        self.seeders
    }

    pub fn leechers(&self) -> Option<u32> {
        self.leechers
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn quality_tag(&self) -> QualityTag {
        self.quality
    }

    pub fn quality(&self) -> Quality {
        self.quality.quality()
    }

    pub fn download(&self) -> &DownloadRef {
        &self.download
    }

    /// Provider-supplied canonical identifier (info hash, NZB guid).
    pub fn canonical_id(&self) -> Option<&str> {
        self.canonical_id.as_deref()
    }

    pub fn reliability_hint(&self) -> Option<f64> {
        self.reliability_hint
    }
}

/// Builder enforcing the candidate invariants.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    candidate: Candidate,
    quality: QualityTag,
}

impl CandidateBuilder {
    pub fn series(mut self, series: impl Into<String>) -> Self {
        self.candidate.series = Some(series.into());
        self
    }

    pub fn episode(mut self, episode: Option<String>) -> Self {
        self.candidate.episode = episode;
        self
    }

    pub fn size_bytes(mut self, size_bytes: u64) -> Self {
        self.candidate.size_bytes = size_bytes;
        self
    }

    pub fn seeders(mut self, seeders: Option<u32>) -> Self {
        self.candidate.seeders = seeders;
        self
    }

    pub fn leechers(mut self, leechers: Option<u32>) -> Self {
        self.candidate.leechers = leechers;
        self
    }

    pub fn published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.candidate.published_at = published_at;
        self
    }

    pub fn quality(mut self, quality: QualityTag) -> Self {
        self.quality = quality;
        self
    }

    pub fn canonical_id(mut self, canonical_id: Option<String>) -> Self {
        self.candidate.canonical_id = canonical_id
            .map(|id| id.trim().to_lowercase())
            .filter(|id| !id.is_empty());
        self
    }

    /// Reliability hint in [0, 1]; out-of-range values are clamped.
    pub fn reliability_hint(mut self, hint: Option<f64>) -> Self {
        self.candidate.reliability_hint = hint.filter(|h| h.is_finite()).map(|h| h.clamp(0.0, 1.0));
        self
    }

    pub fn build(self) -> Result<Candidate, CandidateError> {
        let mut candidate = self.candidate;
        if candidate.provider.trim().is_empty() {
            return Err(CandidateError::EmptyProvider);
        }
        if candidate.download.uri().trim().is_empty() {
            return Err(CandidateError::EmptyDownload);
        }
        if candidate.canonical_id.is_none() {
            candidate.canonical_id = candidate.download.magnet_info_hash();
        }
        candidate.quality = self.quality;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnet(hash: &str) -> DownloadRef {
        DownloadRef::Magnet(format!("magnet:?xt=urn:btih:{}&dn=test", hash))
    }

    #[test]
    fn test_builder_detects_quality_from_title() {
        let candidate = Candidate::builder("jackett", "Show.S01E01.720p.HDTV.x264", magnet("ab"))
            .size_bytes(1024)
            .build()
            .unwrap();
        assert_eq!(candidate.quality(), Quality::HdTv);
        assert_eq!(candidate.size_bytes(), 1024);
    }

    #[test]
    fn test_builder_rejects_empty_provider() {
        let err = Candidate::builder("  ", "Title", magnet("ab"))
            .build()
            .unwrap_err();
        assert_eq!(err, CandidateError::EmptyProvider);
    }

    #[test]
    fn test_builder_rejects_empty_download() {
        let err = Candidate::builder("eztv", "Title", DownloadRef::Torrent(String::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, CandidateError::EmptyDownload);
    }

    #[test]
    fn test_canonical_id_falls_back_to_magnet_hash() {
        let candidate = Candidate::builder("eztv", "Title", magnet("ABCDEF"))
            .build()
            .unwrap();
        assert_eq!(candidate.canonical_id(), Some("abcdef"));

        let candidate = Candidate::builder("eztv", "Title", magnet("ABCDEF"))
            .canonical_id(Some(" 123ABC ".to_string()))
            .build()
            .unwrap();
        assert_eq!(candidate.canonical_id(), Some("123abc"));
    }

    #[test]
    fn test_reliability_hint_is_clamped() {
        let candidate = Candidate::builder("p", "Title", magnet("a"))
            .reliability_hint(Some(1.7))
            .build()
            .unwrap();
        assert_eq!(candidate.reliability_hint(), Some(1.0));

        let candidate = Candidate::builder("p", "Title", magnet("a"))
            .reliability_hint(Some(f64::NAN))
            .build()
            .unwrap();
        assert_eq!(candidate.reliability_hint(), None);
    }

    #[test]
    fn test_download_from_links_prefers_magnet() {
        let download = DownloadRef::from_links(
            Some("magnet:?xt=urn:btih:abc".to_string()),
            Some("http://x/1.torrent".to_string()),
        );
        assert!(matches!(download, Some(DownloadRef::Magnet(_))));

        let download = DownloadRef::from_links(Some(String::new()), Some("http://x/1.torrent".to_string()));
        assert_eq!(
            download,
            Some(DownloadRef::Torrent("http://x/1.torrent".to_string()))
        );
        assert!(DownloadRef::from_links(None, None).is_none());
    }

    #[test]
    fn test_torrent_link_has_no_info_hash() {
        let download = DownloadRef::Torrent("http://x/1.torrent".to_string());
        assert!(download.magnet_info_hash().is_none());
    }
}
