//! Composite scoring and the total ranking order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, Quality, QualityOrder};
use crate::policing::Reliability;

use super::stats::{bayesian_weight, mean, simple_weight, standard_deviation};

/// Prior used when no provider has a reliability sample yet.
pub const DEFAULT_PRIOR: f64 = 0.5;

/// Tunable weights of the composite score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingPolicy {
    #[serde(default = "default_trust_weight")]
    pub trust_weight: f64,
    #[serde(default = "default_popularity_weight")]
    pub popularity_weight: f64,
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
    #[serde(default = "default_hint_weight")]
    pub hint_weight: f64,
    /// Sample size at which observed reliability and the prior weigh equally.
    #[serde(default = "default_bayes_threshold")]
    pub bayes_threshold: f64,
    /// Qualities lowest first.
    #[serde(default)]
    pub quality_order: QualityOrder,
}

fn default_trust_weight() -> f64 {
    0.4
}

fn default_popularity_weight() -> f64 {
    0.2
}

fn default_quality_weight() -> f64 {
    0.3
}

fn default_hint_weight() -> f64 {
    0.1
}

fn default_bayes_threshold() -> f64 {
    10.0
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            trust_weight: default_trust_weight(),
            popularity_weight: default_popularity_weight(),
            quality_weight: default_quality_weight(),
            hint_weight: default_hint_weight(),
            bayes_threshold: default_bayes_threshold(),
            quality_order: QualityOrder::default(),
        }
    }
}

/// A candidate awaiting scoring.
#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub candidate: Candidate,
    /// Registration index of the candidate's provider.
    pub provider_index: usize,
    /// Segment episode tokens the candidate covers.
    pub matched_episodes: Vec<String>,
}

/// Request-level inputs to scoring.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    /// Bayesian trust per provider id.
    pub trust: HashMap<String, f64>,
    pub current_quality: Option<Quality>,
    pub down_cur_quality: bool,
}

/// A candidate with its score breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub composite_score: f64,
    pub quality_rank: u32,
    pub provider_score: f64,
    pub popularity: f64,
    /// Whether the quality is acceptable given the quality already held.
    pub acceptable_quality: bool,
    pub matched_episodes: Vec<String>,
    #[serde(skip)]
    pub provider_index: usize,
}

/// What the download collaborator needs to fetch a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadHandoff {
    pub uri: String,
    pub quality: Quality,
    pub size_bytes: u64,
    pub provider: String,
}

impl ScoredCandidate {
    pub fn handoff(&self) -> DownloadHandoff {
        DownloadHandoff {
            uri: self.candidate.download().uri().to_string(),
            quality: self.candidate.quality(),
            size_bytes: self.candidate.size_bytes(),
            provider: self.candidate.provider().to_string(),
        }
    }

    /// Ranking order: best first. Total over any candidate set.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .composite_score
            .total_cmp(&self.composite_score)
            .then_with(|| other.acceptable_quality.cmp(&self.acceptable_quality))
            .then_with(|| other.quality_rank.cmp(&self.quality_rank))
            .then_with(|| other.candidate.size_bytes().cmp(&self.candidate.size_bytes()))
            .then_with(|| self.provider_index.cmp(&other.provider_index))
            .then_with(|| self.candidate.title().cmp(other.candidate.title()))
            .then_with(|| {
                self.candidate
                    .download()
                    .uri()
                    .cmp(other.candidate.download().uri())
            })
    }
}

/// Sort best first.
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(ScoredCandidate::rank_cmp);
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl RankingPolicy {
    /// Bayesian trust per provider, shrunk toward the mean raw score of
    /// providers that have a sample.
    pub fn provider_trust(&self, samples: &BTreeMap<String, Reliability>) -> HashMap<String, f64> {
        let observed: Vec<f64> = samples
            .values()
            .filter(|r| r.sample_size > 0)
            .map(|r| r.raw_score)
            .collect();
        let prior = mean(&observed).unwrap_or(DEFAULT_PRIOR);

        samples
            .iter()
            .map(|(provider, r)| {
                let trust =
                    bayesian_weight(r.sample_size as f64, r.raw_score, self.bayes_threshold, prior);
                (provider.clone(), trust)
            })
            .collect()
    }

    /// Normalized quality signal in [0, 1].
    pub fn quality_signal(&self, quality: Quality) -> f64 {
        let max = self.quality_order.max_ordinal();
        if max == 0 {
            return 0.0;
        }
        self.quality_order.ordinal(quality) as f64 / max as f64
    }

    fn acceptable(&self, quality: Quality, ctx: &ScoringContext) -> bool {
        match ctx.current_quality {
            None => true,
            Some(_) if ctx.down_cur_quality => true,
            Some(current) => {
                self.quality_order.ordinal(quality) > self.quality_order.ordinal(current)
            }
        }
    }

    /// Score a candidate set. Popularity is relative to the set.
    pub fn score(&self, inputs: Vec<ScoringInput>, ctx: &ScoringContext) -> Vec<ScoredCandidate> {
        let popularity = popularity(&inputs);

        inputs
            .into_iter()
            .zip(popularity)
            .map(|(input, popularity)| {
                let candidate = input.candidate;
                let trust = ctx
                    .trust
                    .get(candidate.provider())
                    .copied()
                    .unwrap_or(DEFAULT_PRIOR);
                let quality = self.quality_signal(candidate.quality());
                let hint = candidate.reliability_hint().unwrap_or(trust);

                let composite_score = simple_weight(self.trust_weight, trust)
                    + simple_weight(self.popularity_weight, popularity)
                    + simple_weight(self.quality_weight, quality)
                    + simple_weight(self.hint_weight, hint);

                ScoredCandidate {
                    quality_rank: self.quality_order.ordinal(candidate.quality()),
                    acceptable_quality: self.acceptable(candidate.quality(), ctx),
                    composite_score,
                    provider_score: trust,
                    popularity,
                    matched_episodes: input.matched_episodes,
                    provider_index: input.provider_index,
                    candidate,
                }
            })
            .collect()
    }
}

/// Logistic of the seeders z-score within the set.
fn popularity(inputs: &[ScoringInput]) -> Vec<f64> {
    let seeders: Vec<f64> = inputs
        .iter()
        .filter_map(|i| i.candidate.seeders())
        .map(f64::from)
        .collect();

    if seeders.len() < 2 {
        return vec![0.5; inputs.len()];
    }

    let (m, sd) = match (mean(&seeders), standard_deviation(&seeders, false)) {
        (Ok(m), Ok(sd)) => (m, sd),
        _ => return vec![0.5; inputs.len()],
    };

    inputs
        .iter()
        .map(|i| match i.candidate.seeders() {
            None => 0.0,
            Some(_) if sd == 0.0 => 0.5,
            Some(s) => logistic((f64::from(s) - m) / sd),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{Codec, DownloadRef, QualityTag, Resolution, Source};

    fn candidate(provider: &str, title: &str, seeders: Option<u32>, size: u64) -> Candidate {
        Candidate::builder(
            provider,
            title,
            DownloadRef::Torrent(format!("http://{provider}/{title}")),
        )
        .seeders(seeders)
        .size_bytes(size)
        .build()
        .unwrap()
    }

    fn input(candidate: Candidate, provider_index: usize) -> ScoringInput {
        ScoringInput {
            candidate,
            provider_index,
            matched_episodes: vec!["e1".to_string()],
        }
    }

    #[test]
    fn test_provider_trust_shrinks_toward_global_mean() {
        let policy = RankingPolicy::default();
        let mut samples = BTreeMap::new();
        samples.insert(
            "good".to_string(),
            Reliability {
                sample_size: 10,
                raw_score: 1.0,
            },
        );
        samples.insert(
            "new".to_string(),
            Reliability {
                sample_size: 0,
                raw_score: 0.0,
            },
        );

        let trust = policy.provider_trust(&samples);
        // Prior is the mean of providers with samples: 1.0
        assert_eq!(trust["new"], 1.0);
        assert_eq!(trust["good"], 1.0);
    }

    #[test]
    fn test_provider_trust_without_samples_uses_default_prior() {
        let policy = RankingPolicy::default();
        let mut samples = BTreeMap::new();
        samples.insert(
            "a".to_string(),
            Reliability {
                sample_size: 0,
                raw_score: 0.0,
            },
        );
        assert_eq!(policy.provider_trust(&samples)["a"], DEFAULT_PRIOR);
    }

    #[test]
    fn test_popularity_needs_two_reporters() {
        let inputs = vec![
            input(candidate("a", "x", Some(10), 1), 0),
            input(candidate("a", "y", None, 1), 0),
        ];
        assert_eq!(popularity(&inputs), vec![0.5, 0.5]);
    }

    #[test]
    fn test_popularity_orders_by_seeders() {
        let inputs = vec![
            input(candidate("a", "x", Some(100), 1), 0),
            input(candidate("a", "y", Some(10), 1), 0),
            input(candidate("a", "z", None, 1), 0),
        ];
        let p = popularity(&inputs);
        assert!(p[0] > 0.5);
        assert!(p[1] < 0.5);
        assert_eq!(p[2], 0.0);
    }

    #[test]
    fn test_popularity_zero_deviation() {
        let inputs = vec![
            input(candidate("a", "x", Some(5), 1), 0),
            input(candidate("a", "y", Some(5), 1), 0),
        ];
        assert_eq!(popularity(&inputs), vec![0.5, 0.5]);
    }

    #[test]
    fn test_quality_signal() {
        let policy = RankingPolicy::default();
        assert_eq!(policy.quality_signal(Quality::UhdBluRay), 1.0);
        assert_eq!(policy.quality_signal(Quality::Unknown), 1.0 / 12.0);

        let empty = RankingPolicy {
            quality_order: QualityOrder::new(Vec::new()),
            ..Default::default()
        };
        assert_eq!(empty.quality_signal(Quality::UhdBluRay), 0.0);
    }

    #[test]
    fn test_hint_falls_back_to_trust() {
        let policy = RankingPolicy {
            trust_weight: 0.0,
            popularity_weight: 0.0,
            quality_weight: 0.0,
            hint_weight: 1.0,
            ..Default::default()
        };
        let mut ctx = ScoringContext::default();
        ctx.trust.insert("a".to_string(), 0.8);

        let hinted = Candidate::builder("a", "x", DownloadRef::Torrent("http://a/x".into()))
            .reliability_hint(Some(0.3))
            .build()
            .unwrap();
        let scored = policy.score(
            vec![input(hinted, 0), input(candidate("a", "y", None, 1), 0)],
            &ctx,
        );
        assert!((scored[0].composite_score - 0.3).abs() < 1e-12);
        assert!((scored[1].composite_score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_quality_acceptability() {
        let policy = RankingPolicy::default();
        let ctx = ScoringContext {
            current_quality: Some(Quality::FullHdWebDl),
            ..Default::default()
        };
        assert!(!policy.acceptable(Quality::HdTv, &ctx));
        assert!(!policy.acceptable(Quality::FullHdWebDl, &ctx));
        assert!(policy.acceptable(Quality::FullHdBluRay, &ctx));

        let ctx = ScoringContext {
            down_cur_quality: true,
            ..ctx
        };
        assert!(policy.acceptable(Quality::HdTv, &ctx));
    }

    #[test]
    fn test_rank_is_total_and_deterministic() {
        let policy = RankingPolicy::default();
        let hd = QualityTag::new(Resolution::Hd1080, Source::Web, Codec::Avc);
        let make = |provider: &str, title: &str, size: u64| {
            Candidate::builder(
                provider,
                title,
                DownloadRef::Torrent(format!("http://{provider}/{title}")),
            )
            .quality(hd)
            .size_bytes(size)
            .build()
            .unwrap()
        };

        let inputs = vec![
            input(make("b", "same", 100), 1),
            input(make("a", "same", 100), 0),
            input(make("a", "bigger", 200), 0),
        ];
        let ctx = ScoringContext::default();

        let mut first = policy.score(inputs.clone(), &ctx);
        rank(&mut first);
        let mut reversed_inputs = inputs;
        reversed_inputs.reverse();
        let mut second = policy.score(reversed_inputs, &ctx);
        rank(&mut second);

        let order = |v: &[ScoredCandidate]| {
            v.iter()
                .map(|s| s.candidate.download().uri().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&first), order(&second));
        assert_eq!(
            order(&first),
            vec!["http://a/bigger", "http://a/same", "http://b/same"]
        );
    }

    #[test]
    fn test_handoff() {
        let policy = RankingPolicy::default();
        let scored = policy.score(
            vec![input(candidate("a", "x", None, 42), 0)],
            &ScoringContext::default(),
        );
        let handoff = scored[0].handoff();
        assert_eq!(handoff.uri, "http://a/x");
        assert_eq!(handoff.size_bytes, 42);
        assert_eq!(handoff.provider, "a");
        assert_eq!(handoff.quality, Quality::Unknown);
    }
}
