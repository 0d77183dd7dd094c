//! Resolution Engine
//!
//! Precedence, per field, first success wins:
//! 1. artist profile (full artist string)
//! 2. artist profile of the primary artist of a collaboration
//! 3. place names in the album description (country only)
//! 4. catalog voting fallback (country only)
//! 5. per-album evidence that passes the trust filter
//! 6. language derived from the resolved country (language only)
//!
//! Whatever is still empty is written as "Unknown". The engine works on
//! snapshots handed to [`ResolutionEngine::new`]; it performs no I/O and
//! never fails.

use super::artist_profiles::{ArtistProfileProvider, ArtistProfiles, PrimaryArtistProvider};
use super::catalog_voting::{CatalogFallbacks, CatalogVoteProvider, VotingStats};
use super::trust::can_use_evidence;
use super::{EvidenceProvider, EvidenceSource, Proposal};
use crate::codes::{primary_language, CountryCode, CountryResult, LanguageCode, UNKNOWN};
use crate::inference::infer_from_place_names;
use crate::types::{AlbumRecord, ArtistCache, EvidenceCache};
use crate::validators::coverage::CoverageReport;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolved fields for one album, with the source of each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub country: Option<CountryCode>,
    pub language: Option<LanguageCode>,
    pub country_source: Option<EvidenceSource>,
    pub language_source: Option<EvidenceSource>,
}

impl Resolution {
    /// Output value for the `country` field
    pub fn country_tag(&self) -> String {
        self.country
            .as_ref()
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Output value for the `language` field
    pub fn language_tag(&self) -> String {
        self.language
            .as_ref()
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn is_complete(&self) -> bool {
        self.country.is_some() && self.language.is_some()
    }

    fn apply(&mut self, proposal: Proposal, source: EvidenceSource) {
        if self.country.is_none() {
            if let Some(country) = proposal.country {
                self.country = Some(country);
                self.country_source = Some(source);
            }
        }
        if self.language.is_none() {
            if let Some(language) = proposal.language {
                self.language = Some(language);
                self.language_source = Some(source);
            }
        }
    }
}

/// Place-name inference over the album description
pub struct DescriptionProvider;

impl EvidenceProvider for DescriptionProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::Description
    }

    fn propose(&self, album: &AlbumRecord, _resolved_country: Option<&CountryCode>) -> Proposal {
        Proposal::country(infer_from_place_names(&album.description))
    }
}

/// Per-album lookup cache, gated by the trust filter
pub struct AlbumEvidenceProvider {
    evidence: Arc<EvidenceCache>,
}

impl AlbumEvidenceProvider {
    pub fn new(evidence: Arc<EvidenceCache>) -> Self {
        Self { evidence }
    }
}

impl EvidenceProvider for AlbumEvidenceProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::AlbumEvidence
    }

    fn propose(&self, album: &AlbumRecord, resolved_country: Option<&CountryCode>) -> Proposal {
        if album.url.is_empty() {
            return Proposal::none();
        }
        let Some(entry) = self.evidence.get(&album.url) else {
            return Proposal::none();
        };

        let country = CountryResult::parse(entry.country.as_deref());
        let language = LanguageCode::parse(entry.language.as_deref());
        if !can_use_evidence(&country, language.as_ref()) {
            return Proposal::none();
        }
        let Some(country) = country.into_known() else {
            return Proposal::none();
        };

        // The release's language describes the artist only when the release
        // country is the artist's country
        let language = match resolved_country {
            Some(resolved) if *resolved != country => None,
            _ => language,
        };
        Proposal {
            country: Some(country),
            language,
        }
    }
}

/// Primary language of whatever country was resolved
pub struct DerivedLanguageProvider;

impl EvidenceProvider for DerivedLanguageProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::DerivedFromCountry
    }

    fn propose(&self, _album: &AlbumRecord, resolved_country: Option<&CountryCode>) -> Proposal {
        Proposal::language(resolved_country.and_then(primary_language))
    }
}

pub struct ResolutionEngine {
    providers: Vec<Box<dyn EvidenceProvider>>,
    voting_stats: VotingStats,
}

impl ResolutionEngine {
    /// Build the standard provider chain over immutable snapshots
    pub fn new(albums: &[AlbumRecord], artist_cache: &ArtistCache, evidence: EvidenceCache) -> Self {
        let profiles = Arc::new(ArtistProfiles::build(artist_cache));
        let fallbacks = Arc::new(CatalogFallbacks::build(albums, &evidence));
        let voting_stats = fallbacks.stats().clone();
        let evidence = Arc::new(evidence);

        info!(
            albums = albums.len(),
            profiles = profiles.len(),
            evidence = evidence.len(),
            fallbacks = fallbacks.len(),
            "Resolution engine ready"
        );

        let providers: Vec<Box<dyn EvidenceProvider>> = vec![
            Box::new(ArtistProfileProvider::new(Arc::clone(&profiles))),
            Box::new(PrimaryArtistProvider::new(profiles)),
            Box::new(DescriptionProvider),
            Box::new(CatalogVoteProvider::new(fallbacks)),
            Box::new(AlbumEvidenceProvider::new(evidence)),
            Box::new(DerivedLanguageProvider),
        ];

        Self {
            providers,
            voting_stats,
        }
    }

    /// Engine over a custom provider chain, consulted in the given order
    pub fn with_providers(providers: Vec<Box<dyn EvidenceProvider>>) -> Self {
        Self {
            providers,
            voting_stats: VotingStats::default(),
        }
    }

    pub fn voting_stats(&self) -> &VotingStats {
        &self.voting_stats
    }

    pub fn resolve(&self, album: &AlbumRecord) -> Resolution {
        let mut resolution = Resolution::default();
        for provider in &self.providers {
            if resolution.is_complete() {
                break;
            }
            let proposal = provider.propose(album, resolution.country.as_ref());
            resolution.apply(proposal, provider.source());
        }
        resolution
    }

    /// Resolve every album in place; each gets non-empty `country` and `language`
    pub fn resolve_all(&self, albums: &mut [AlbumRecord]) -> CoverageReport {
        let mut report = CoverageReport::new();
        for album in albums.iter_mut() {
            let resolution = self.resolve(album);
            debug!(
                artist = %album.artist,
                title = %album.title,
                country = %resolution.country_tag(),
                language = %resolution.language_tag(),
                country_source = ?resolution.country_source,
                language_source = ?resolution.language_source,
                "Resolved album"
            );
            album.country = Some(resolution.country_tag());
            album.language = Some(resolution.language_tag());
            report.record(&resolution);
        }
        report.voting = self.voting_stats.clone();
        info!(
            total = report.total,
            both_known = report.both_known,
            both_unknown = report.both_unknown,
            "Resolution complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlbumEvidence;

    fn album(artist: &str, url: &str, description: &str) -> AlbumRecord {
        AlbumRecord {
            artist: artist.into(),
            url: url.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    fn evidence(entries: &[(&str, Option<&str>, Option<&str>)]) -> EvidenceCache {
        entries
            .iter()
            .map(|(url, c, l)| {
                (
                    url.to_string(),
                    AlbumEvidence {
                        country: c.map(String::from),
                        language: l.map(String::from),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_description_beats_album_evidence() {
        let albums = vec![album("Somebody", "/a", "A Berlin techno record")];
        let engine = ResolutionEngine::new(
            &albums,
            &ArtistCache::new(),
            evidence(&[("/a", Some("US"), Some("eng"))]),
        );
        // The catalog vote for US outranks evidence but not the description
        let r = engine.resolve(&albums[0]);
        assert_eq!(r.country, Some(CountryCode::new("DE")));
        assert_eq!(r.country_source, Some(EvidenceSource::Description));
        assert_eq!(r.language, Some(LanguageCode::new("deu")));
        assert_eq!(r.language_source, Some(EvidenceSource::DerivedFromCountry));
    }

    #[test]
    fn test_untrusted_evidence_language_not_used() {
        let albums = vec![album("Somebody", "/a", "")];
        let engine = ResolutionEngine::new(
            &albums,
            &ArtistCache::new(),
            evidence(&[("/a", Some("XW"), Some("eng"))]),
        );
        let r = engine.resolve(&albums[0]);
        assert_eq!(r.country, None);
        assert_eq!(r.language, None);
        assert_eq!(r.country_tag(), UNKNOWN);
        assert_eq!(r.language_tag(), UNKNOWN);
    }

    #[test]
    fn test_evidence_language_ignored_for_other_country() {
        let provider = AlbumEvidenceProvider::new(Arc::new(evidence(&[("/a", Some("US"), Some("eng"))])));
        let a = album("X", "/a", "");
        let fr = CountryCode::new("FR");
        let p = provider.propose(&a, Some(&fr));
        assert_eq!(p.language, None);
        let p = provider.propose(&a, None);
        assert_eq!(p.language, Some(LanguageCode::new("eng")));
    }

    #[test]
    fn test_missing_url_yields_no_evidence() {
        let provider = AlbumEvidenceProvider::new(Arc::new(evidence(&[("", Some("US"), None)])));
        assert_eq!(provider.propose(&album("X", "", ""), None), Proposal::none());
    }

    #[test]
    fn test_custom_chain_order() {
        let engine = ResolutionEngine::with_providers(vec![
            Box::new(DerivedLanguageProvider),
            Box::new(DescriptionProvider),
        ]);
        // Language derivation ran before any country existed
        let r = engine.resolve(&album("X", "", "Recorded in Paris"));
        assert_eq!(r.country, Some(CountryCode::new("FR")));
        assert_eq!(r.language, None);
    }
}
