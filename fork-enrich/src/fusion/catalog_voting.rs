//! Artist Catalog Voting
//!
//! Fallback country per artist, voted from the per-album evidence of every
//! album by that artist. A vote weighs 3 when the evidence passes the trust
//! filter and 1 otherwise; placeholder and unresolved countries do not vote.
//!
//! A winner is accepted when it is the only candidate, leads the runner-up
//! by at least 1, or holds weight 3 or more. A catalog whose candidates are
//! all secondary distribution markets yields nothing.

use super::trust::can_use_evidence;
use super::{artist_key, EvidenceProvider, EvidenceSource, Proposal};
use crate::codes::{is_secondary_distribution_market, CountryCode, CountryResult, LanguageCode};
use crate::types::{AlbumRecord, EvidenceCache};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const TRUSTED_WEIGHT: u32 = 3;
pub const UNTRUSTED_WEIGHT: u32 = 1;

/// Weighted votes for one artist, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryVote {
    tally: Vec<(CountryCode, u32)>,
}

/// Outcome of counting one artist's votes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted(CountryCode),
    NoVotes,
    DistributionNoise,
    InsufficientMargin,
}

impl CountryVote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, country: CountryCode, weight: u32) {
        match self.tally.iter_mut().find(|(c, _)| *c == country) {
            Some((_, w)) => *w += weight,
            None => self.tally.push((country, weight)),
        }
    }

    /// Add one album's evidence; returns false when it carries no vote
    pub fn add_evidence(&mut self, country: Option<&str>, language: Option<&str>) -> bool {
        let country = CountryResult::parse(country);
        let language = LanguageCode::parse(language);
        let weight = if can_use_evidence(&country, language.as_ref()) {
            TRUSTED_WEIGHT
        } else {
            UNTRUSTED_WEIGHT
        };
        match country.into_known() {
            Some(code) => {
                self.add(code, weight);
                true
            }
            None => false,
        }
    }

    pub fn weight(&self, country: &str) -> u32 {
        self.tally
            .iter()
            .find(|(c, _)| c.as_str() == country)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn decide(&self) -> VoteOutcome {
        // Strictly greater keeps the first-seen country on ties
        let mut best: Option<(&CountryCode, u32)> = None;
        let mut second: Option<u32> = None;
        for (country, weight) in &self.tally {
            match best {
                Some((_, best_weight)) if *weight <= best_weight => {
                    if second.map_or(true, |s| *weight > s) {
                        second = Some(*weight);
                    }
                }
                _ => {
                    second = best.map(|(_, w)| w);
                    best = Some((country, *weight));
                }
            }
        }

        let Some((winner, best_weight)) = best else {
            return VoteOutcome::NoVotes;
        };

        if self
            .tally
            .iter()
            .all(|(c, _)| is_secondary_distribution_market(c))
        {
            return VoteOutcome::DistributionNoise;
        }

        let single = self.tally.len() == 1;
        let clear_margin = second.map_or(true, |s| best_weight >= s + 1);
        if single || clear_margin || best_weight >= TRUSTED_WEIGHT {
            VoteOutcome::Accepted(winner.clone())
        } else {
            VoteOutcome::InsufficientMargin
        }
    }
}

/// Counters from building the fallback table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VotingStats {
    pub artists_voted: usize,
    pub accepted: usize,
    pub rejected_distribution_noise: usize,
    pub rejected_insufficient_margin: usize,
}

/// Accepted fallback country per normalized artist key
#[derive(Debug, Clone, Default)]
pub struct CatalogFallbacks {
    by_artist: HashMap<String, CountryCode>,
    stats: VotingStats,
}

impl CatalogFallbacks {
    pub fn build(albums: &[AlbumRecord], evidence: &EvidenceCache) -> Self {
        let mut votes: HashMap<String, CountryVote> = HashMap::new();

        for album in albums {
            if album.url.is_empty() {
                continue;
            }
            let Some(entry) = evidence.get(&album.url) else {
                continue;
            };
            let key = artist_key(&album.artist);
            if key.is_empty() {
                continue;
            }
            let mut ballot = CountryVote::new();
            if !ballot.add_evidence(entry.country.as_deref(), entry.language.as_deref()) {
                continue;
            }
            let vote = votes.entry(key).or_default();
            for (country, weight) in ballot.tally {
                vote.add(country, weight);
            }
        }

        let mut by_artist = HashMap::new();
        let mut stats = VotingStats::default();
        for (key, vote) in votes {
            stats.artists_voted += 1;
            match vote.decide() {
                VoteOutcome::Accepted(country) => {
                    stats.accepted += 1;
                    by_artist.insert(key, country);
                }
                VoteOutcome::DistributionNoise => stats.rejected_distribution_noise += 1,
                VoteOutcome::InsufficientMargin => stats.rejected_insufficient_margin += 1,
                VoteOutcome::NoVotes => {}
            }
        }

        debug!(
            artists_voted = stats.artists_voted,
            accepted = stats.accepted,
            noise = stats.rejected_distribution_noise,
            margin = stats.rejected_insufficient_margin,
            "Built catalog voting fallbacks"
        );

        Self { by_artist, stats }
    }

    pub fn get(&self, artist: &str) -> Option<&CountryCode> {
        self.by_artist.get(&artist_key(artist))
    }

    pub fn stats(&self) -> &VotingStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.by_artist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_artist.is_empty()
    }
}

/// Catalog fallback for the album's full artist string (country only)
pub struct CatalogVoteProvider {
    fallbacks: Arc<CatalogFallbacks>,
}

impl CatalogVoteProvider {
    pub fn new(fallbacks: Arc<CatalogFallbacks>) -> Self {
        Self { fallbacks }
    }
}

impl EvidenceProvider for CatalogVoteProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::CatalogVote
    }

    fn propose(&self, album: &AlbumRecord, _resolved_country: Option<&CountryCode>) -> Proposal {
        Proposal::country(self.fallbacks.get(&album.artist).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(entries: &[(&str, u32)]) -> CountryVote {
        let mut v = CountryVote::new();
        for (c, w) in entries {
            v.add(CountryCode::new(*c), *w);
        }
        v
    }

    #[test]
    fn test_tie_of_weak_votes_is_rejected() {
        assert_eq!(
            vote(&[("US", 1), ("GB", 1)]).decide(),
            VoteOutcome::InsufficientMargin
        );
    }

    #[test]
    fn test_single_trusted_vote_accepted() {
        assert_eq!(
            vote(&[("US", 3)]).decide(),
            VoteOutcome::Accepted(CountryCode::new("US"))
        );
    }

    #[test]
    fn test_single_weak_vote_accepted() {
        assert_eq!(
            vote(&[("JP", 1)]).decide(),
            VoteOutcome::Accepted(CountryCode::new("JP"))
        );
    }

    #[test]
    fn test_margin_of_one_accepted() {
        assert_eq!(
            vote(&[("GB", 1), ("US", 2)]).decide(),
            VoteOutcome::Accepted(CountryCode::new("US"))
        );
    }

    #[test]
    fn test_strong_tie_accepts_first_seen() {
        assert_eq!(
            vote(&[("FR", 3), ("US", 3)]).decide(),
            VoteOutcome::Accepted(CountryCode::new("FR"))
        );
    }

    #[test]
    fn test_all_secondary_markets_rejected() {
        assert_eq!(vote(&[("CA", 1)]).decide(), VoteOutcome::DistributionNoise);
        assert_eq!(
            vote(&[("CA", 2), ("AU", 1)]).decide(),
            VoteOutcome::DistributionNoise
        );
    }

    #[test]
    fn test_secondary_market_can_win_against_real_country() {
        assert_eq!(
            vote(&[("CA", 2), ("US", 1)]).decide(),
            VoteOutcome::Accepted(CountryCode::new("CA"))
        );
    }

    #[test]
    fn test_no_votes() {
        assert_eq!(CountryVote::new().decide(), VoteOutcome::NoVotes);
    }

    #[test]
    fn test_evidence_weights() {
        let mut v = CountryVote::new();
        assert!(v.add_evidence(Some("US"), Some("eng")));
        assert!(v.add_evidence(Some("FR"), Some("eng")));
        assert!(!v.add_evidence(Some("XW"), Some("eng")));
        assert!(!v.add_evidence(Some("Unknown"), None));
        assert!(v.add_evidence(Some("CA"), None));
        assert_eq!(v.weight("US"), 3);
        assert_eq!(v.weight("FR"), 1);
        assert_eq!(v.weight("CA"), 1);
        assert_eq!(v.weight("XW"), 0);
    }
}
