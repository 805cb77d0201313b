//! Deduplication of scored candidates across providers.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::candidate::{normalize_title, Candidate};
use crate::scoring::ScoredCandidate;

/// Identity of a release across providers: the canonical id when the
/// provider supplied one, else the normalized title plus size.
pub fn dedup_key(candidate: &Candidate) -> String {
    match candidate.canonical_id() {
        Some(id) => format!("id:{id}"),
        None => format!(
            "title:{}:{}",
            normalize_title(candidate.title()),
            candidate.size_bytes()
        ),
    }
}

/// Whether `challenger` should replace `current` for the same key.
fn supersedes(challenger: &ScoredCandidate, current: &ScoredCandidate) -> bool {
    match challenger
        .composite_score
        .total_cmp(&current.composite_score)
    {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => challenger.provider_index < current.provider_index,
    }
}

/// Keep one candidate per key: the higher composite score, and on a tie
/// the one from the earlier-registered provider.
///
/// Output keeps first-seen key order; callers rank afterwards.
pub fn deduplicate(scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<ScoredCandidate> = Vec::new();

    for candidate in scored {
        let key = dedup_key(&candidate.candidate);
        match slots.get(&key) {
            Some(&slot) => {
                if supersedes(&candidate, &kept[slot]) {
                    kept[slot] = candidate;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::DownloadRef;

    fn scored(provider: &str, uri: &str, score: f64, index: usize) -> ScoredCandidate {
        let candidate = Candidate::builder(provider, "Show.S01E01.720p", DownloadRef::Magnet(uri.into()))
            .size_bytes(100)
            .build()
            .unwrap();
        ScoredCandidate {
            candidate,
            composite_score: score,
            quality_rank: 0,
            provider_score: 0.5,
            popularity: 0.5,
            acceptable_quality: true,
            matched_episodes: Vec::new(),
            provider_index: index,
        }
    }

    #[test]
    fn test_key_prefers_canonical_id() {
        let with_hash = scored("a", "magnet:?xt=urn:btih:ABC", 0.0, 0);
        assert_eq!(dedup_key(&with_hash.candidate), "id:abc");

        let without = scored("a", "magnet:?dn=x", 0.0, 0);
        assert_eq!(dedup_key(&without.candidate), "title:show s01e01 720p:100");
    }

    #[test]
    fn test_keeps_higher_composite() {
        let result = deduplicate(vec![
            scored("a", "magnet:?xt=urn:btih:abc", 0.4, 0),
            scored("b", "magnet:?xt=urn:btih:ABC&tr=x", 0.7, 1),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].candidate.provider(), "b");
    }

    #[test]
    fn test_tie_goes_to_earlier_provider() {
        let result = deduplicate(vec![
            scored("b", "magnet:?xt=urn:btih:abc", 0.5, 1),
            scored("a", "magnet:?xt=urn:btih:abc", 0.5, 0),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].candidate.provider(), "a");
    }

    #[test]
    fn test_title_and_size_key() {
        let result = deduplicate(vec![
            scored("a", "magnet:?dn=one", 0.5, 0),
            scored("b", "magnet:?dn=two", 0.6, 1),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].candidate.provider(), "b");
    }
}
