//! Release title grammar.
//!
//! Extracts the series name prefix and the episode marker from scene-style
//! release titles such as `Show.Name.S01E02.720p.HDTV.x264-GRP`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// `S01E02`, `S01E02E03`, `S01E02-E03`, `s1e2`
static SXXEYY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[ ._\-\[(])s(\d{1,2})[ ._]?e(\d{1,3})(?:[\-]?e(\d{1,3}))?").unwrap()
});

/// `1x02`
static NXNN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[ ._\-\[(])(\d{1,2})x(\d{2,3})(?:$|[ ._\-\])])").unwrap());

/// Season packs: `S01`, `Season 1`
static SEASON_PACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[ ._\-\[(])(?:s(\d{1,2})|season[ ._]?(\d{1,2}))(?:$|[ ._\-\])])").unwrap()
});

/// `2024.01.31`, `2024-01-31`, `2024 01 31`
static AIR_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[ ._\-\[(])((?:19|20)\d{2})[ ._\-](\d{2})[ ._\-](\d{2})(?:$|[ ._\-\])])")
        .unwrap()
});

/// Episode marker found in a release title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeMarker {
    /// One or more episodes of a season.
    Episodes { season: u32, episodes: Vec<u32> },
    /// A whole-season pack.
    Season(u32),
    /// An air-by-date release.
    AirDate(NaiveDate),
}

/// A release title split into its name prefix and episode marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRelease {
    /// Normalized series name prefix (text before the marker).
    pub name: String,
    pub marker: Option<EpisodeMarker>,
}

impl ParsedRelease {
    pub fn parse(title: &str) -> Self {
        if let Some(caps) = SXXEYY.captures(title) {
            let season = caps[1].parse().unwrap_or(0);
            let first: u32 = caps[2].parse().unwrap_or(0);
            let last: u32 = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(first);
            let episodes = if last > first {
                (first..=last).collect()
            } else {
                vec![first]
            };
            return Self::with_prefix(
                title,
                caps.get(0).map(|m| m.start()),
                EpisodeMarker::Episodes { season, episodes },
            );
        }

        if let Some(caps) = AIR_DATE.captures(title) {
            let date = NaiveDate::from_ymd_opt(
                caps[1].parse().unwrap_or(0),
                caps[2].parse().unwrap_or(0),
                caps[3].parse().unwrap_or(0),
            );
            if let Some(date) = date {
                return Self::with_prefix(
                    title,
                    caps.get(0).map(|m| m.start()),
                    EpisodeMarker::AirDate(date),
                );
            }
        }

        if let Some(caps) = NXNN.captures(title) {
            let season = caps[1].parse().unwrap_or(0);
            let episode = caps[2].parse().unwrap_or(0);
            return Self::with_prefix(
                title,
                caps.get(0).map(|m| m.start()),
                EpisodeMarker::Episodes {
                    season,
                    episodes: vec![episode],
                },
            );
        }

        if let Some(caps) = SEASON_PACK.captures(title) {
            let season = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            return Self::with_prefix(
                title,
                caps.get(0).map(|m| m.start()),
                EpisodeMarker::Season(season),
            );
        }

        Self {
            name: normalize_title(title),
            marker: None,
        }
    }

    fn with_prefix(title: &str, marker_start: Option<usize>, marker: EpisodeMarker) -> Self {
        let prefix = marker_start.map(|i| &title[..i]).unwrap_or(title);
        Self {
            name: normalize_title(prefix),
            marker: Some(marker),
        }
    }

    /// Whether the title's name prefix is the given series name.
    pub fn matches_series(&self, series_name: &str) -> bool {
        let wanted = normalize_title(series_name);
        !wanted.is_empty() && self.name == wanted
    }
}

/// Lowercase, drop punctuation, collapse separators into single spaces.
///
/// Used for series-name matching and as part of the dedup key.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c == '\'' {
            // "Grey's" and "Greys" are the same show
        } else {
            pending_space = true;
        }
    }
    out
}
