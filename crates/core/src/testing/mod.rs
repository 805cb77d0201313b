//! Testing utilities and test doubles.
//!
//! Lets the fetch, policing, provider and coordinator layers be exercised
//! end to end without network access or wall-clock waits.
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_core::testing::{ScriptedTransport, RecordingSleeper, MockProvider};
//!
//! let transport = Arc::new(ScriptedTransport::new());
//! transport.push_status("http://c/search", 503).await;
//!
//! let session = FetchSession::new(FetchConfig::default(), transport.clone())
//!     .with_sleeper(Arc::new(RecordingSleeper::new()));
//! ```

mod clock;
mod mock_provider;
mod transport;

pub use clock::ManualClock;
pub use mock_provider::MockProvider;
pub use transport::{RecordingSleeper, ScriptedTransport};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::candidate::{Candidate, DownloadRef};
    use crate::search::{EpisodeIdentity, SearchOptions, SearchRequest, SearchType, SeriesIdentity};

    /// Create a magnet candidate with reasonable defaults (700 MB).
    pub fn candidate(provider: &str, title: &str, info_hash: &str, seeders: u32) -> Candidate {
        candidate_with_size(provider, title, info_hash, seeders, 700 * 1024 * 1024)
    }

    pub fn candidate_with_size(
        provider: &str,
        title: &str,
        info_hash: &str,
        seeders: u32,
        size_bytes: u64,
    ) -> Candidate {
        Candidate::builder(
            provider,
            title,
            DownloadRef::Magnet(format!("magnet:?xt=urn:btih:{}&dn=release", info_hash)),
        )
        .size_bytes(size_bytes)
        .seeders(Some(seeders))
        .leechers(Some(seeders / 4))
        .build()
        .expect("fixture candidate is valid")
    }

    /// Backlog request for "Show Name" covering `S01E<n>` for each `n`.
    pub fn backlog_request(episodes: &[u32]) -> SearchRequest {
        SearchRequest::new(
            SeriesIdentity::new("show-name", "Show Name"),
            episodes
                .iter()
                .map(|&e| EpisodeIdentity::new(format!("s01e{e:02}"), 1, e))
                .collect(),
        )
        .with_options(SearchOptions::new(SearchType::Backlog))
    }

    /// Jackett `/results` JSON with a magnet result, a torrent-link-only
    /// result and a result without any link.
    pub const JACKETT_RESULTS: &str = r#"{
  "Results": [
    {
      "Title": "Show.Name.S01E02.1080p.WEB-DL.x264-GRP",
      "Tracker": "SomeTracker",
      "MagnetUri": "magnet:?xt=urn:btih:abcdef0123456789&dn=Show.Name.S01E02",
      "Link": "http://localhost:9117/dl/sometracker/?jackett_apikey=x&path=1",
      "InfoHash": "abcdef0123456789",
      "Size": 1500000000,
      "Seeders": 42,
      "Peers": 50,
      "PublishDate": "2024-03-10T18:00:00Z"
    },
    {
      "Title": "Show.Name.S01E02.720p.HDTV.x264-OTHER",
      "Tracker": "OtherTracker",
      "MagnetUri": null,
      "Link": "http://localhost:9117/dl/othertracker/?jackett_apikey=x&path=2",
      "InfoHash": null,
      "Size": 900000000,
      "PublishDate": "2024-03-10T19:30:00"
    },
    {
      "Title": "Show.Name.S01E02.REPACK.720p.HDTV",
      "Tracker": "BrokenTracker",
      "MagnetUri": null,
      "Link": null,
      "Size": 800000000,
      "Seeders": 3,
      "Peers": 4
    }
  ],
  "Indexers": []
}"#;

    /// Torznab RSS feed: one item with a magnet attribute, one with only an
    /// enclosure.
    pub const TORZNAB_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:torznab="http://torznab.com/schemas/2015/feed">
  <channel>
    <title>Prowlarr</title>
    <link>http://prowlarr:9696/</link>
    <description>Prowlarr Feed</description>
    <item>
      <title>Show.Name.S01E02.720p.HDTV.x264-GRP</title>
      <guid>http://tracker.example/details/1</guid>
      <pubDate>Sun, 10 Mar 2024 18:00:00 +0000</pubDate>
      <torznab:attr name="seeders" value="25" />
      <torznab:attr name="peers" value="30" />
      <torznab:attr name="size" value="734003200" />
      <torznab:attr name="infohash" value="0123456789abcdef" />
      <torznab:attr name="magneturl" value="magnet:?xt=urn:btih:0123456789abcdef&amp;dn=Show.Name.S01E02" />
    </item>
    <item>
      <title>Show.Name.S01E02.480p.HDTV.x264-SD</title>
      <guid>http://tracker.example/details/2</guid>
      <enclosure url="http://tracker.example/download/2.torrent" length="2000000" type="application/x-bittorrent" />
    </item>
  </channel>
</rss>"#;

    /// EZTV search results page with two release rows.
    pub const EZTV_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<table class="forum_header_border">
  <tr class="forum_header_border" name="hover">
    <td class="forum_thread_post"><a href="/shows/1/show-name/">Show Name</a></td>
    <td class="forum_thread_post"><a href="/ep/1/show-name-s01e02-1080p/" class="epinfo">Show Name S01E02 1080p WEB x264-GRP</a></td>
    <td class="forum_thread_post"><a href="magnet:?xt=urn:btih:feedface00112233&amp;dn=Show.Name.S01E02" class="magnet">M</a></td>
    <td class="forum_thread_post">1.5 GB</td>
    <td class="forum_thread_post">2h</td>
    <td class="forum_thread_post_end"><font color="green">1,234</font></td>
  </tr>
  <tr class="forum_header_border" name="hover">
    <td class="forum_thread_post"><a href="/shows/1/show-name/">Show Name</a></td>
    <td class="forum_thread_post"><a href="/ep/2/show-name-s01e02-720p/" class="epinfo">Show Name S01E02 720p HDTV x264-SVA</a></td>
    <td class="forum_thread_post"><a href="https://zoink.example/show.name.s01e02.torrent" class="download_1">T</a></td>
    <td class="forum_thread_post">350 MB</td>
    <td class="forum_thread_post">3h</td>
    <td class="forum_thread_post_end">-</td>
  </tr>
</table>
</body>
</html>"#;
}
