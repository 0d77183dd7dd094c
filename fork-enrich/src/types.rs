//! Record and cache types shared by the engine, the store and the jobs
//!
//! Field names follow the on-disk JSON. Fields this crate does not know about
//! are kept in `extra` so a load/save cycle never drops data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One reviewed release
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    #[serde(default)]
    pub id: String,

    /// Display name; collaborations appear as "A / B" or "A & B"
    #[serde(default)]
    pub artist: String,

    #[serde(default)]
    pub title: String,

    /// Review score (0.0-10.0)
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub genres: Vec<String>,

    /// Review path; key into the evidence cache
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub description: String,

    /// Review publish timestamp (as scraped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Set by the resolution engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Set by the resolution engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cached per-album lookup result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// MusicBrainz release ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,

    /// Match score of the chosen release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cached artist lookup result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistCacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Free-text place name (e.g. "Brooklyn")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// MusicBrainz artist ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mbid: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtistCacheEntry {
    /// Overlay `newer` onto `self`; fields absent in `newer` keep their old value
    pub fn merge_from(&mut self, newer: ArtistCacheEntry) {
        if newer.country.is_some() {
            self.country = newer.country;
        }
        if newer.area.is_some() {
            self.area = newer.area;
        }
        if newer.language.is_some() {
            self.language = newer.language;
        }
        if newer.mbid.is_some() {
            self.mbid = newer.mbid;
        }
        self.extra.extend(newer.extra);
    }
}

/// Per-album evidence keyed by album `url`
pub type EvidenceCache = HashMap<String, AlbumEvidence>;

/// Artist lookups keyed by artist name as written in the cache file
pub type ArtistCache = HashMap<String, ArtistCacheEntry>;
