//! Artist Profile Resolver
//!
//! Immutable index built once from the artist cache. Cache keys are
//! normalized; a missing country is inferred from the `area` place name and
//! a missing language is derived from the country. Entries with neither
//! field are not indexed.

use super::{artist_key, is_collaboration, primary_artist, EvidenceProvider, EvidenceSource, Proposal};
use crate::codes::{primary_language, CountryCode, CountryResult, LanguageCode};
use crate::inference::infer_from_place_names;
use crate::types::{AlbumRecord, ArtistCache, ArtistCacheEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistProfile {
    pub country: Option<CountryCode>,
    pub language: Option<LanguageCode>,
}

impl ArtistProfile {
    fn from_entry(entry: &ArtistCacheEntry) -> Option<Self> {
        let country = CountryResult::parse(entry.country.as_deref())
            .into_known()
            .or_else(|| {
                entry
                    .area
                    .as_deref()
                    .and_then(infer_from_place_names)
            });
        let language = LanguageCode::parse(entry.language.as_deref())
            .or_else(|| country.as_ref().and_then(primary_language));

        if country.is_none() && language.is_none() {
            return None;
        }
        Some(Self { country, language })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtistProfiles {
    by_key: HashMap<String, ArtistProfile>,
}

impl ArtistProfiles {
    pub fn build(cache: &ArtistCache) -> Self {
        let mut by_key = HashMap::with_capacity(cache.len());
        // Iterate sorted so that keys colliding after normalization resolve the same way every run
        let mut names: Vec<&String> = cache.keys().collect();
        names.sort();
        for name in names {
            let key = artist_key(name);
            if key.is_empty() {
                continue;
            }
            if let Some(profile) = ArtistProfile::from_entry(&cache[name]) {
                by_key.insert(key, profile);
            }
        }
        debug!(cached = cache.len(), indexed = by_key.len(), "Built artist profiles");
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Exact lookup by normalized name
    pub fn get(&self, artist: &str) -> Option<&ArtistProfile> {
        self.by_key.get(&artist_key(artist))
    }

    /// Lookup with one collaboration retry on the first named artist
    pub fn resolve(&self, artist: &str) -> Option<&ArtistProfile> {
        self.get(artist).or_else(|| {
            if is_collaboration(artist) {
                self.get(primary_artist(artist))
            } else {
                None
            }
        })
    }
}

/// Profile of the album's full artist string
pub struct ArtistProfileProvider {
    profiles: Arc<ArtistProfiles>,
}

impl ArtistProfileProvider {
    pub fn new(profiles: Arc<ArtistProfiles>) -> Self {
        Self { profiles }
    }
}

impl EvidenceProvider for ArtistProfileProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::ArtistProfile
    }

    fn propose(&self, album: &AlbumRecord, _resolved_country: Option<&CountryCode>) -> Proposal {
        match self.profiles.resolve(&album.artist) {
            Some(p) => Proposal {
                country: p.country.clone(),
                language: p.language.clone(),
            },
            None => Proposal::none(),
        }
    }
}

/// Profile of the first artist of a collaboration
pub struct PrimaryArtistProvider {
    profiles: Arc<ArtistProfiles>,
}

impl PrimaryArtistProvider {
    pub fn new(profiles: Arc<ArtistProfiles>) -> Self {
        Self { profiles }
    }
}

impl EvidenceProvider for PrimaryArtistProvider {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::PrimaryArtistProfile
    }

    fn propose(&self, album: &AlbumRecord, _resolved_country: Option<&CountryCode>) -> Proposal {
        let primary = primary_artist(&album.artist);
        if primary.is_empty() || primary == album.artist {
            return Proposal::none();
        }
        match self.profiles.resolve(primary) {
            Some(p) => Proposal {
                country: p.country.clone(),
                language: p.language.clone(),
            },
            None => Proposal::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(country: Option<&str>, area: Option<&str>, language: Option<&str>) -> ArtistCacheEntry {
        ArtistCacheEntry {
            country: country.map(String::from),
            area: area.map(String::from),
            language: language.map(String::from),
            ..Default::default()
        }
    }

    fn cache(entries: Vec<(&str, ArtistCacheEntry)>) -> ArtistCache {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_country_from_cache_and_language_derived() {
        let profiles = ArtistProfiles::build(&cache(vec![("Daft Punk", entry(Some("FR"), None, None))]));
        let p = profiles.get("daft punk").unwrap();
        assert_eq!(p.country, Some(CountryCode::new("FR")));
        assert_eq!(p.language, Some(LanguageCode::new("fra")));
    }

    #[test]
    fn test_country_inferred_from_area() {
        let profiles = ArtistProfiles::build(&cache(vec![(
            "Wu-Tang Clan",
            entry(Some("Unknown"), Some("Staten Island, New York"), None),
        )]));
        let p = profiles.get("WU-TANG CLAN").unwrap();
        assert_eq!(p.country, Some(CountryCode::new("US")));
        assert_eq!(p.language, Some(LanguageCode::new("eng")));
    }

    #[test]
    fn test_cached_language_kept_over_derived() {
        let profiles = ArtistProfiles::build(&cache(vec![("Stromae", entry(Some("BE"), None, Some("fra")))]));
        assert_eq!(
            profiles.get("stromae").unwrap().language,
            Some(LanguageCode::new("fra"))
        );
        let profiles = ArtistProfiles::build(&cache(vec![("Sigur Rós", entry(Some("IS"), None, Some("zxx")))]));
        assert_eq!(
            profiles.get("sigur rós").unwrap().language,
            Some(LanguageCode::new("zxx"))
        );
    }

    #[test]
    fn test_empty_profiles_are_dropped() {
        let profiles = ArtistProfiles::build(&cache(vec![
            ("Nobody", entry(None, Some("Atlantis"), None)),
            ("Placeholder", entry(Some("XW"), None, None)),
        ]));
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_collaboration_retry() {
        let profiles = ArtistProfiles::build(&cache(vec![("Drake", entry(Some("CA"), None, None))]));
        let p = profiles.resolve("Drake / 21 Savage").unwrap();
        assert_eq!(p.country, Some(CountryCode::new("CA")));
        assert!(profiles.resolve("21 Savage").is_none());
        assert!(profiles.resolve("Drakeo the Ruler").is_none());
    }

    #[test]
    fn test_primary_provider_skips_solo_artists() {
        let profiles = Arc::new(ArtistProfiles::build(&cache(vec![("Drake", entry(Some("CA"), None, None))])));
        let provider = PrimaryArtistProvider::new(profiles);
        let solo = AlbumRecord {
            artist: "Drake".into(),
            ..Default::default()
        };
        assert_eq!(provider.propose(&solo, None), Proposal::none());

        let collab = AlbumRecord {
            artist: "Drake & Future".into(),
            ..Default::default()
        };
        assert_eq!(
            provider.propose(&collab, None).country,
            Some(CountryCode::new("CA"))
        );
    }
}
