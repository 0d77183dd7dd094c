//! Fusion - merge competing country/language evidence into one answer per album
//!
//! Evidence providers are consulted in a fixed precedence order. Each one may
//! propose a country, a language, or both; the first proposal for a field
//! wins and the provider that made it is recorded as that field's source.
//!
//! Components:
//! - [`artist_profiles`]: artist cache → per-artist (country, language)
//! - [`trust`]: decides whether a per-album lookup is reliable for origin
//! - [`catalog_voting`]: per-artist fallback country from the whole catalog
//! - [`resolver`]: the precedence-ordered engine

pub mod artist_profiles;
pub mod catalog_voting;
pub mod resolver;
pub mod trust;

use crate::codes::{CountryCode, LanguageCode};
use crate::types::AlbumRecord;
use serde::Serialize;
use std::fmt;

/// Normalized artist key (trimmed, lower-cased)
pub fn artist_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// First name of a collaboration ("A / B", "A & B"), trimmed
pub fn primary_artist(name: &str) -> &str {
    name.split(['/', '&']).next().unwrap_or_default().trim()
}

/// True when the artist string names a collaboration
pub fn is_collaboration(name: &str) -> bool {
    name.contains('/') || name.contains('&')
}

/// Which evidence source produced a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    ArtistProfile,
    PrimaryArtistProfile,
    Description,
    CatalogVote,
    AlbumEvidence,
    DerivedFromCountry,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArtistProfile => "artist_profile",
            Self::PrimaryArtistProfile => "primary_artist_profile",
            Self::Description => "description",
            Self::CatalogVote => "catalog_vote",
            Self::AlbumEvidence => "album_evidence",
            Self::DerivedFromCountry => "derived_from_country",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider's guess for one album; either field may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proposal {
    pub country: Option<CountryCode>,
    pub language: Option<LanguageCode>,
}

impl Proposal {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn country(country: Option<CountryCode>) -> Self {
        Self {
            country,
            language: None,
        }
    }

    pub fn language(language: Option<LanguageCode>) -> Self {
        Self {
            country: None,
            language,
        }
    }
}

/// One step in the resolution precedence
///
/// `resolved_country` is the country fixed by earlier providers, if any.
/// Providers never fail; irregular input yields an empty proposal.
pub trait EvidenceProvider: Send + Sync {
    fn source(&self) -> EvidenceSource;

    fn propose(&self, album: &AlbumRecord, resolved_country: Option<&CountryCode>) -> Proposal;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_key() {
        assert_eq!(artist_key("  Ja Rule "), "ja rule");
        assert_eq!(artist_key("BJÖRK"), "björk");
        assert_eq!(artist_key(""), "");
    }

    #[test]
    fn test_primary_artist() {
        assert_eq!(primary_artist("Drake / 21 Savage"), "Drake");
        assert_eq!(primary_artist("Simon & Garfunkel"), "Simon");
        assert_eq!(primary_artist("Madvillain"), "Madvillain");
        assert_eq!(primary_artist(" / B"), "");
    }

    #[test]
    fn test_is_collaboration() {
        assert!(is_collaboration("A/B"));
        assert!(is_collaboration("A & B"));
        assert!(!is_collaboration("Ja Rule"));
    }
}
