//! MusicBrainz client
//!
//! Artist and release lookups against the MusicBrainz web service (WS/2).
//!
//! # Artist matching
//! Search (limit 5), then score each candidate: the search score, plus 50
//! for an exact normalized name, else 40 for an exact sort name, else 20 when
//! one name contains the other. The best candidate must reach 50. When the
//! search hit lacks a country or area, the artist detail record fills them.
//!
//! # Release matching
//! Up to three query shapes are tried until six distinct candidates are
//! collected. Candidates score their search score plus 35 (exact) / 18
//! (containment) for the title and 30 / 15 for the artist credit. Missing
//! country or language on the winner is filled from the release detail
//! record, then from an artist lookup.
//!
//! All requests share one rate limiter and go through [`RetryPolicy`].

use super::{AlbumLookup, AlbumMatch, ArtistLookup, LookupError, RetryPolicy};
use crate::codes::{primary_language, CountryCode};
use crate::config::LookupSettings;
use crate::types::ArtistCacheEntry;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const ARTIST_SEARCH_LIMIT: usize = 5;
const RELEASE_SEARCH_LIMIT: usize = 6;
const RELEASE_CANDIDATE_TARGET: usize = 6;
const MIN_ARTIST_SCORE: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbArea {
    pub name: Option<String>,
    #[serde(rename = "iso-3166-1-codes", default)]
    pub iso_3166_1_codes: Vec<String>,
}

impl MbArea {
    fn iso_code(&self) -> Option<&str> {
        self.iso_3166_1_codes
            .first()
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbArtist {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "sort-name")]
    pub sort_name: Option<String>,
    pub score: Option<Value>,
    pub country: Option<String>,
    pub area: Option<MbArea>,
    #[serde(rename = "begin-area")]
    pub begin_area: Option<MbArea>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbCreditArtist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbArtistCredit {
    pub name: Option<String>,
    pub artist: Option<MbCreditArtist>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbReleaseEvent {
    pub area: Option<MbArea>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbTextRepresentation {
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MbRelease {
    pub id: Option<String>,
    pub title: Option<String>,
    pub score: Option<Value>,
    pub country: Option<String>,
    #[serde(rename = "release-events", default)]
    pub release_events: Vec<MbReleaseEvent>,
    #[serde(rename = "text-representation")]
    pub text_representation: Option<MbTextRepresentation>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<MbArtistCredit>,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<MbRelease>,
}

/// Lower-case, strip diacritics, collapse everything else to single spaces
pub fn normalize_text(input: &str) -> String {
    let stripped: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove characters that would break a quoted Lucene term
pub fn escape_query_term(input: &str) -> String {
    input.replace(['"', '\\'], " ").trim().to_string()
}

/// Search score as sent by MusicBrainz (number or numeric string)
fn search_score(score: Option<&Value>) -> i64 {
    match score {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Similarity bonus between two normalized strings
fn similarity_bonus(candidate: &str, target: &str, exact: i64, partial: i64) -> i64 {
    if candidate == target {
        exact
    } else if candidate.contains(target) || target.contains(candidate) {
        partial
    } else {
        0
    }
}

/// Combined score of one artist search hit against the requested name
pub fn score_artist(candidate: &MbArtist, target: &str) -> i64 {
    let mut score = search_score(candidate.score.as_ref());
    let name = normalize_text(candidate.name.as_deref().unwrap_or_default());
    let sort_name = normalize_text(candidate.sort_name.as_deref().unwrap_or_default());
    if name == target {
        score += 50;
    } else if sort_name == target {
        score += 40;
    } else if !name.is_empty() && (name.contains(target) || target.contains(name.as_str())) {
        score += 20;
    }
    score
}

/// Highest-scoring artist hit (first on ties), if it clears the threshold
pub fn pick_best_artist<'a>(candidates: &'a [MbArtist], name: &str) -> Option<(&'a MbArtist, i64)> {
    let target = normalize_text(name);
    let mut best: Option<(&MbArtist, i64)> = None;
    for candidate in candidates {
        let score = score_artist(candidate, &target);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.filter(|(_, score)| *score >= MIN_ARTIST_SCORE)
}

/// Combined score of one release hit against the requested album
pub fn score_release(release: &MbRelease, artist: &str, title: &str) -> i64 {
    let target_artist = normalize_text(artist);
    let target_title = normalize_text(title);
    let release_title = normalize_text(release.title.as_deref().unwrap_or_default());
    let credits = release
        .artist_credit
        .iter()
        .map(|credit| {
            credit
                .name
                .as_deref()
                .or_else(|| credit.artist.as_ref().and_then(|a| a.name.as_deref()))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ");
    let release_artists = normalize_text(&credits);

    let mut score = search_score(release.score.as_ref());
    if !release_title.is_empty() && !target_title.is_empty() {
        score += similarity_bonus(&release_title, &target_title, 35, 18);
    }
    if !release_artists.is_empty() && !target_artist.is_empty() {
        score += similarity_bonus(&release_artists, &target_artist, 30, 15);
    }
    score
}

pub fn pick_best_release<'a>(
    releases: &'a [MbRelease],
    artist: &str,
    title: &str,
) -> Option<(&'a MbRelease, i64)> {
    let mut best: Option<(&MbRelease, i64)> = None;
    for release in releases {
        let score = score_release(release, artist, title);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((release, score));
        }
    }
    best
}

/// Release country (or first release event's area) and text language
pub fn release_country_language(release: &MbRelease) -> (Option<String>, Option<String>) {
    let country = non_empty(release.country.as_deref()).or_else(|| {
        release
            .release_events
            .first()
            .and_then(|event| event.area.as_ref())
            .and_then(|area| non_empty(area.iso_code()))
    });
    let language = release
        .text_representation
        .as_ref()
        .and_then(|t| non_empty(t.language.as_deref()));
    (country, language)
}

/// The three release query shapes, most specific first
pub fn release_queries(artist_term: &str, title_term: &str) -> [String; 3] {
    [
        format!("artist:\"{artist_term}\" AND release:\"{title_term}\""),
        format!("release:\"{title_term}\" AND artist:\"{artist_term}\""),
        format!("release:\"{title_term}\""),
    ]
}

fn language_for(country: Option<&str>) -> Option<String> {
    country
        .and_then(|c| primary_language(&CountryCode::new(c)))
        .map(|l| l.as_str().to_string())
}

pub(crate) type DirectLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Limiter admitting one request per `spacing` (at least 1ms)
pub(crate) fn request_limiter(spacing: Duration) -> DirectLimiter {
    let quota = Quota::with_period(spacing.max(Duration::from_millis(1)))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
    RateLimiter::direct(quota)
}

pub(crate) fn build_http_client(user_agent: &str) -> Result<Client, LookupError> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| LookupError::Network(format!("Failed to build HTTP client: {e}")))
}

pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    rate_limiter: DirectLimiter,
    retry: RetryPolicy,
}

impl MusicBrainzClient {
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            base_url: settings.musicbrainz_url.clone(),
            rate_limiter: request_limiter(settings.delay),
            retry: RetryPolicy::new(settings.max_attempts, settings.delay),
        })
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, LookupError> {
        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::from_status(status.as_u16(), url));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Parse(format!("MusicBrainz response for {url}: {e}")))
    }

    /// GET + decode with retry; 404 becomes `Ok(None)`
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, LookupError> {
        match self.retry.run(url, || self.get_once::<T>(url)).await {
            Ok(value) => Ok(Some(value)),
            Err(LookupError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn search_artists(&self, term: &str) -> Result<Vec<MbArtist>, LookupError> {
        let query = format!("artist:\"{term}\"");
        let url = format!(
            "{}/artist/?query={}&fmt=json&limit={}",
            self.base_url,
            urlencoding::encode(&query),
            ARTIST_SEARCH_LIMIT
        );
        let response: Option<ArtistSearchResponse> = self.get_json(&url).await?;
        Ok(response.map(|r| r.artists).unwrap_or_default())
    }

    async fn artist_details(&self, id: &str) -> Option<MbArtist> {
        let url = format!("{}/artist/{}?fmt=json", self.base_url, id);
        match self.get_json(&url).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(artist_id = %id, error = %e, "Artist detail fetch failed");
                None
            }
        }
    }

    async fn search_releases(&self, query: &str) -> Result<Vec<MbRelease>, LookupError> {
        let url = format!(
            "{}/release/?query={}&fmt=json&limit={}",
            self.base_url,
            urlencoding::encode(query),
            RELEASE_SEARCH_LIMIT
        );
        let response: Option<ReleaseSearchResponse> = self.get_json(&url).await?;
        Ok(response.map(|r| r.releases).unwrap_or_default())
    }

    async fn release_details(&self, id: &str) -> Option<MbRelease> {
        let url = format!(
            "{}/release/{}?fmt=json&inc=release-events+artist-credits",
            self.base_url, id
        );
        match self.get_json(&url).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(release_id = %id, error = %e, "Release detail fetch failed");
                None
            }
        }
    }
}

#[async_trait]
impl ArtistLookup for MusicBrainzClient {
    async fn lookup_artist(&self, name: &str) -> Result<Option<ArtistCacheEntry>, LookupError> {
        let term = escape_query_term(name);
        if term.is_empty() {
            return Ok(None);
        }

        let candidates = self.search_artists(&term).await?;
        let Some((best, score)) = pick_best_artist(&candidates, name) else {
            debug!(artist = %name, hits = candidates.len(), "No confident artist match");
            return Ok(None);
        };

        let mut country = non_empty(best.country.as_deref())
            .or_else(|| best.area.as_ref().and_then(|a| non_empty(a.iso_code())));
        let mut area = best
            .area
            .as_ref()
            .and_then(|a| non_empty(a.name.as_deref()))
            .or_else(|| best.begin_area.as_ref().and_then(|a| non_empty(a.name.as_deref())));

        if country.is_none() || area.is_none() {
            if let Some(id) = best.id.as_deref() {
                if let Some(detail) = self.artist_details(id).await {
                    country = country
                        .or_else(|| non_empty(detail.country.as_deref()))
                        .or_else(|| detail.area.as_ref().and_then(|a| non_empty(a.iso_code())))
                        .or_else(|| {
                            detail
                                .begin_area
                                .as_ref()
                                .and_then(|a| non_empty(a.iso_code()))
                        });
                    area = area
                        .or_else(|| detail.area.as_ref().and_then(|a| non_empty(a.name.as_deref())))
                        .or_else(|| {
                            detail
                                .begin_area
                                .as_ref()
                                .and_then(|a| non_empty(a.name.as_deref()))
                        });
                }
            }
        }

        let language = language_for(country.as_deref());
        debug!(
            artist = %name,
            score,
            country = ?country,
            area = ?area,
            "Artist match"
        );

        Ok(Some(ArtistCacheEntry {
            country,
            area,
            language,
            mbid: best.id.clone(),
            ..Default::default()
        }))
    }
}

#[async_trait]
impl AlbumLookup for MusicBrainzClient {
    async fn lookup_album(&self, artist: &str, title: &str) -> Result<Option<AlbumMatch>, LookupError> {
        let artist_term = escape_query_term(artist);
        let title_term = escape_query_term(title);
        if artist_term.is_empty() || title_term.is_empty() {
            return Ok(None);
        }

        let mut candidates: Vec<MbRelease> = Vec::new();
        for query in release_queries(&artist_term, &title_term) {
            for release in self.search_releases(&query).await? {
                let Some(id) = release.id.clone() else {
                    continue;
                };
                match candidates.iter_mut().find(|c| c.id.as_deref() == Some(id.as_str())) {
                    Some(existing) => *existing = release,
                    None => candidates.push(release),
                }
            }
            if candidates.len() >= RELEASE_CANDIDATE_TARGET {
                break;
            }
        }

        let mut result = AlbumMatch::default();
        if let Some((best, score)) = pick_best_release(&candidates, artist, title) {
            let (country, language) = release_country_language(best);
            result.country = country;
            result.language = language;
            result.mbid = best.id.clone();
            result.score = score;

            if result.country.is_none() || result.language.is_none() {
                if let Some(id) = best.id.as_deref() {
                    if let Some(detail) = self.release_details(id).await {
                        let (country, language) = release_country_language(&detail);
                        result.country = result.country.or(country);
                        result.language = result.language.or(language);
                    }
                }
            }
        }

        let worldwide = result.country.as_deref() == Some("XW");
        if result.country.is_none() || worldwide || result.language.is_none() {
            let artist_info = match self.lookup_artist(artist).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(artist = %artist, error = %e, "Artist fallback lookup failed");
                    None
                }
            };
            if let Some(artist_country) = artist_info.and_then(|info| info.country) {
                if result.country.is_none() || worldwide {
                    result.country = Some(artist_country);
                }
            }
            if result.language.is_none() {
                result.language = language_for(result.country.as_deref());
            }
        }

        if result.country.is_none() && result.language.is_none() && result.mbid.is_none() {
            return Ok(None);
        }
        debug!(
            artist = %artist,
            title = %title,
            country = ?result.country,
            language = ?result.language,
            score = result.score,
            "Album match"
        );
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artists(value: Value) -> Vec<MbArtist> {
        serde_json::from_value::<ArtistSearchResponse>(value).unwrap().artists
    }

    fn releases(value: Value) -> Vec<MbRelease> {
        serde_json::from_value::<ReleaseSearchResponse>(value).unwrap().releases
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Sigur Rós "), "sigur ros");
        assert_eq!(normalize_text("Beyoncé"), "beyonce");
        assert_eq!(normalize_text("AC/DC"), "ac dc");
        assert_eq!(normalize_text("Tyler, the Creator!"), "tyler the creator");
        assert_eq!(normalize_text("???"), "");
    }

    #[test]
    fn test_escape_query_term() {
        assert_eq!(escape_query_term(r#" "Weird" Al\ "#), "Weird  Al");
        assert_eq!(escape_query_term("\""), "");
    }

    #[test]
    fn test_release_queries() {
        let q = release_queries("Ja Rule", "Rule 3:36");
        assert_eq!(q[0], r#"artist:"Ja Rule" AND release:"Rule 3:36""#);
        assert_eq!(q[2], r#"release:"Rule 3:36""#);
    }

    #[test]
    fn test_exact_name_beats_higher_search_score() {
        let hits = artists(json!({
            "artists": [
                {"id": "a", "name": "Ja Rule Tribute Band", "sort-name": "Tribute Band", "score": 100},
                {"id": "b", "name": "Ja Rule", "sort-name": "Rule, Ja", "score": "90"}
            ]
        }));
        let (best, score) = pick_best_artist(&hits, "Ja Rule").unwrap();
        assert_eq!(best.id.as_deref(), Some("b"));
        assert_eq!(score, 140);
    }

    #[test]
    fn test_sort_name_match() {
        let hits = artists(json!({
            "artists": [{"id": "a", "name": "Prince Rogers", "sort-name": "Prince", "score": 20}]
        }));
        let (_, score) = pick_best_artist(&hits, "Prince").unwrap();
        // "prince rogers" contains "prince", but sort-name exact is checked first
        assert_eq!(score, 20 + 40);
    }

    #[test]
    fn test_nameless_hit_gets_no_containment_bonus() {
        let hits = artists(json!({
            "artists": [{"id": "a", "score": 45}, {"id": "b", "name": "", "sort-name": "", "score": 45}]
        }));
        assert_eq!(score_artist(&hits[0], "burial"), 45);
        assert_eq!(score_artist(&hits[1], "burial"), 45);
        assert!(pick_best_artist(&hits, "Burial").is_none());
    }

    #[test]
    fn test_weak_artist_match_rejected() {
        let hits = artists(json!({
            "artists": [{"id": "a", "name": "Someone Else", "sort-name": "Else, Someone", "score": 45}]
        }));
        assert!(pick_best_artist(&hits, "Nobody").is_none());
        assert!(pick_best_artist(&[], "Nobody").is_none());
    }

    #[test]
    fn test_release_scoring_prefers_title_and_artist_match() {
        let hits = releases(json!({
            "releases": [
                {"id": "r1", "title": "Venni Vetti Vecci (Deluxe)", "score": 100,
                 "artist-credit": [{"name": "Ja Rule"}]},
                {"id": "r2", "title": "Venni Vetti Vecci", "score": 95,
                 "artist-credit": [{"artist": {"name": "Ja Rule"}}]}
            ]
        }));
        let (best, score) = pick_best_release(&hits, "Ja Rule", "Venni Vetti Vecci").unwrap();
        assert_eq!(best.id.as_deref(), Some("r2"));
        assert_eq!(score, 95 + 35 + 30);
        assert_eq!(score_release(&hits[0], "Ja Rule", "Venni Vetti Vecci"), 100 + 18 + 30);
    }

    #[test]
    fn test_release_country_falls_back_to_event_area() {
        let hits = releases(json!({
            "releases": [
                {"id": "r1", "country": "",
                 "release-events": [{"area": {"name": "Japan", "iso-3166-1-codes": ["JP"]}}],
                 "text-representation": {"language": "jpn"}},
                {"id": "r2", "country": "GB"}
            ]
        }));
        assert_eq!(
            release_country_language(&hits[0]),
            (Some("JP".to_string()), Some("jpn".to_string()))
        );
        assert_eq!(release_country_language(&hits[1]), (Some("GB".to_string()), None));
    }

    #[test]
    fn test_search_score_formats() {
        assert_eq!(search_score(Some(&json!(87))), 87);
        assert_eq!(search_score(Some(&json!("64"))), 64);
        assert_eq!(search_score(Some(&json!("n/a"))), 0);
        assert_eq!(search_score(None), 0);
    }

    #[test]
    fn test_language_for_country() {
        assert_eq!(language_for(Some("BR")), Some("por".to_string()));
        assert_eq!(language_for(Some("XW")), None);
        assert_eq!(language_for(None), None);
    }
}
