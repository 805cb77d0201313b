//! Candidate filter predicates carried by [`SearchOptions`](super::SearchOptions).

use serde::{Deserialize, Serialize};

use crate::candidate::{normalize_title, Candidate, Quality, QualityOrder};

/// One predicate of a search's filter chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CandidateFilter {
    /// Candidates reporting fewer seeders are dropped. Unknown counts pass.
    MinSeeders(u32),
    MinSize(u64),
    MaxSize(u64),
    /// Drop candidates ranked below this quality.
    MinQuality(Quality),
    /// Every word must appear in the normalized title.
    RequireWords(Vec<String>),
    /// No word may appear in the normalized title.
    RejectWords(Vec<String>),
}

impl CandidateFilter {
    pub fn accepts(&self, candidate: &Candidate, order: &QualityOrder) -> bool {
        match self {
            CandidateFilter::MinSeeders(min) => candidate.seeders().is_none_or(|s| s >= *min),
            CandidateFilter::MinSize(min) => candidate.size_bytes() >= *min,
            CandidateFilter::MaxSize(max) => candidate.size_bytes() <= *max,
            CandidateFilter::MinQuality(min) => {
                order.ordinal(candidate.quality()) >= order.ordinal(*min)
            }
            CandidateFilter::RequireWords(words) => {
                let title = title_words(candidate);
                words
                    .iter()
                    .all(|w| title.iter().any(|t| *t == normalize_title(w)))
            }
            CandidateFilter::RejectWords(words) => {
                let title = title_words(candidate);
                !words
                    .iter()
                    .any(|w| title.iter().any(|t| *t == normalize_title(w)))
            }
        }
    }
}

fn title_words(candidate: &Candidate) -> Vec<String> {
    normalize_title(candidate.title())
        .split(' ')
        .map(str::to_string)
        .collect()
}

/// Apply a filter chain in order.
pub fn passes_all(filters: &[CandidateFilter], candidate: &Candidate, order: &QualityOrder) -> bool {
    filters.iter().all(|f| f.accepts(candidate, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::DownloadRef;

    fn candidate(title: &str, size: u64, seeders: Option<u32>) -> Candidate {
        Candidate::builder("p", title, DownloadRef::Torrent("http://x/1".to_string()))
            .size_bytes(size)
            .seeders(seeders)
            .build()
            .unwrap()
    }

    #[test]
    fn test_min_seeders_passes_unknown() {
        let order = QualityOrder::default();
        let filter = CandidateFilter::MinSeeders(5);
        assert!(filter.accepts(&candidate("a", 1, None), &order));
        assert!(filter.accepts(&candidate("a", 1, Some(5)), &order));
        assert!(!filter.accepts(&candidate("a", 1, Some(4)), &order));
    }

    #[test]
    fn test_size_bounds() {
        let order = QualityOrder::default();
        let c = candidate("a", 500, None);
        assert!(CandidateFilter::MinSize(100).accepts(&c, &order));
        assert!(!CandidateFilter::MinSize(501).accepts(&c, &order));
        assert!(CandidateFilter::MaxSize(500).accepts(&c, &order));
        assert!(!CandidateFilter::MaxSize(499).accepts(&c, &order));
    }

    #[test]
    fn test_min_quality() {
        let order = QualityOrder::default();
        let filter = CandidateFilter::MinQuality(Quality::HdTv);
        assert!(filter.accepts(&candidate("Show.S01E01.1080p.WEB-DL", 1, None), &order));
        assert!(!filter.accepts(&candidate("Show.S01E01.HDTV.XviD", 1, None), &order));
    }

    #[test]
    fn test_words() {
        let order = QualityOrder::default();
        let c = candidate("Show.S01E01.PROPER.720p.HDTV", 1, None);
        assert!(CandidateFilter::RequireWords(vec!["proper".into()]).accepts(&c, &order));
        assert!(!CandidateFilter::RequireWords(vec!["repack".into()]).accepts(&c, &order));
        assert!(!CandidateFilter::RejectWords(vec!["Proper".into()]).accepts(&c, &order));
        assert!(CandidateFilter::RejectWords(vec!["x265".into()]).accepts(&c, &order));
    }

    #[test]
    fn test_passes_all_in_order() {
        let order = QualityOrder::default();
        let filters = vec![CandidateFilter::MinSize(10), CandidateFilter::MaxSize(20)];
        assert!(passes_all(&filters, &candidate("a", 15, None), &order));
        assert!(!passes_all(&filters, &candidate("a", 25, None), &order));
        assert!(passes_all(&[], &candidate("a", 25, None), &order));
    }

    #[test]
    fn test_filter_serialization() {
        let json = serde_json::to_string(&CandidateFilter::MinSeeders(3)).unwrap();
        assert_eq!(json, r#"{"type":"min_seeders","value":3}"#);
        let parsed: CandidateFilter =
            serde_json::from_str(r#"{"type":"min_quality","value":"hd_tv"}"#).unwrap();
        assert_eq!(parsed, CandidateFilter::MinQuality(Quality::HdTv));
    }
}
