//! Wikidata client
//!
//! Artist origin lookups against the Wikidata action API. Entity search
//! (`wbsearchentities`, limit 5) is filtered to hits whose description reads
//! as a musician or band. The first such hit's claims are read in order:
//! country of origin (P495), citizenship (P27), location of formation (P740),
//! place of birth (P19). A claim value that is a known country entity maps
//! straight to its code; any other place is resolved through its own
//! country claim (P17).

use super::musicbrainz_client::{build_http_client, request_limiter, DirectLimiter};
use super::{ArtistLookup, LookupError, RetryPolicy};
use crate::codes::{primary_language, CountryCode};
use crate::config::LookupSettings;
use crate::types::ArtistCacheEntry;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

const SEARCH_LIMIT: usize = 5;

/// Claims consulted for an artist, most specific first
pub const ORIGIN_PROPERTIES: [&str; 4] = ["P495", "P27", "P740", "P19"];

/// Country claim of a place entity
pub const COUNTRY_PROPERTY: &str = "P17";

/// Entity id → country code; constituent countries and a few major cities
/// map to their sovereign state
const COUNTRY_ENTITIES: &[(&str, &str)] = &[
    ("Q30", "US"), ("Q145", "GB"), ("Q16", "CA"), ("Q408", "AU"), ("Q664", "NZ"),
    ("Q27", "IE"), ("Q142", "FR"), ("Q183", "DE"), ("Q34", "SE"), ("Q20", "NO"),
    ("Q35", "DK"), ("Q33", "FI"), ("Q189", "IS"), ("Q55", "NL"), ("Q31", "BE"),
    ("Q38", "IT"), ("Q29", "ES"), ("Q45", "PT"), ("Q17", "JP"), ("Q884", "KR"),
    ("Q155", "BR"), ("Q96", "MX"), ("Q414", "AR"), ("Q739", "CO"), ("Q298", "CL"),
    ("Q241", "CU"), ("Q1183", "PR"), ("Q766", "JM"), ("Q733", "TT"), ("Q1033", "NG"),
    ("Q117", "GH"), ("Q258", "ZA"), ("Q115", "ET"), ("Q912", "ML"), ("Q1041", "SN"),
    ("Q974", "CD"), ("Q1036", "UG"), ("Q114", "KE"), ("Q212", "UA"), ("Q668", "IN"),
    ("Q148", "CN"), ("Q865", "TW"), ("Q252", "ID"), ("Q928", "PH"), ("Q801", "IL"),
    ("Q822", "LB"), ("Q159", "RU"), ("Q36", "PL"), ("Q213", "CZ"), ("Q41", "GR"),
    ("Q43", "TR"), ("Q79", "EG"), ("Q1028", "MA"),
    // Scotland, Wales, Northern Ireland
    ("Q22", "GB"), ("Q25", "GB"), ("Q26", "GB"),
    // Soviet Union
    ("Q15180", "RU"),
    // New York City, Los Angeles, Chicago, London, Berlin, Paris, Tokyo
    ("Q60", "US"), ("Q36704", "US"), ("Q65", "US"), ("Q1297", "US"), ("Q84", "GB"),
    ("Q64", "DE"), ("Q90", "FR"), ("Q1490", "JP"),
];

static COUNTRY_BY_ENTITY: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_ENTITIES.iter().copied().collect());

/// Description fragments marking a search hit as a music act
const MUSIC_TERMS: &[&str] = &[
    "band", "musician", "singer", "rapper", "artist", "group", "duo", "trio",
    "quartet", "composer", "dj", "disc jockey", "producer", "music", "vocalist",
    "guitarist", "drummer", "bassist", "pianist", "songwriter", "hip hop", "rock",
    "pop", "jazz", "electronic", "punk", "metal", "folk", "soul", "r&b", "rap",
    "mc", "emcee",
];

/// Country code for an entity id, when the entity is a mapped country or city
pub fn country_for_entity(qid: &str) -> Option<&'static str> {
    COUNTRY_BY_ENTITY.get(qid).copied()
}

/// True when a search hit description reads as a music act
pub fn is_music_description(description: &str) -> bool {
    let description = description.to_lowercase();
    MUSIC_TERMS.iter().any(|term| description.contains(term))
}

/// Entity id held by the first statement of `property`
pub fn first_claim_entity<'a>(claims: &'a Value, property: &str) -> Option<&'a str> {
    claims
        .get(property)?
        .get(0)?
        .get("mainsnak")?
        .get("datavalue")?
        .get("value")?
        .get("id")?
        .as_str()
}

/// Entity ids of the origin claims, in [`ORIGIN_PROPERTIES`] order
pub fn origin_entities(claims: &Value) -> Vec<&str> {
    ORIGIN_PROPERTIES
        .iter()
        .filter_map(|property| first_claim_entity(claims, property))
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
struct Entity {
    // An entity without statements sends `[]` here, so stay untyped
    #[serde(default)]
    claims: Value,
}

#[derive(Debug, Default, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

pub struct WikidataClient {
    client: Client,
    api_url: String,
    rate_limiter: DirectLimiter,
    retry: RetryPolicy,
}

impl WikidataClient {
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        Ok(Self {
            client: build_http_client(&settings.user_agent)?,
            api_url: settings.wikidata_url.clone(),
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
            .map_err(|e| LookupError::Parse(format!("Wikidata response for {url}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, LookupError> {
        match self.retry.run(url, || self.get_once::<T>(url)).await {
            Ok(value) => Ok(Some(value)),
            Err(LookupError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn search(&self, name: &str) -> Result<Vec<SearchHit>, LookupError> {
        let url = format!(
            "{}?action=wbsearchentities&search={}&language=en&type=item&limit={}&format=json",
            self.api_url,
            urlencoding::encode(name),
            SEARCH_LIMIT
        );
        let response: Option<SearchResponse> = self.get_json(&url).await?;
        Ok(response.map(|r| r.search).unwrap_or_default())
    }

    /// Claims of one entity; `Ok(None)` when the entity is missing
    async fn claims(&self, qid: &str) -> Result<Option<Value>, LookupError> {
        let url = format!(
            "{}?action=wbgetentities&ids={}&props=claims&format=json",
            self.api_url,
            urlencoding::encode(qid)
        );
        let response: Option<EntitiesResponse> = self.get_json(&url).await?;
        Ok(response
            .and_then(|mut r| r.entities.remove(qid))
            .map(|entity| entity.claims)
            .filter(|claims| claims.is_object()))
    }

    /// Country of a place entity through its P17 claim
    async fn place_country(&self, qid: &str) -> Option<&'static str> {
        match self.claims(qid).await {
            Ok(claims) => claims
                .as_ref()
                .and_then(|c| first_claim_entity(c, COUNTRY_PROPERTY))
                .and_then(country_for_entity),
            Err(e) => {
                warn!(entity = %qid, error = %e, "Place lookup failed");
                None
            }
        }
    }

    /// Country of the first music hit that yields one, with its entity id
    async fn artist_country(&self, name: &str) -> Result<Option<(&'static str, String)>, LookupError> {
        let hits = self.search(name).await?;
        for hit in hits
            .iter()
            .filter(|h| is_music_description(h.description.as_deref().unwrap_or_default()))
        {
            let Some(claims) = self.claims(&hit.id).await? else {
                continue;
            };
            for qid in origin_entities(&claims) {
                if let Some(country) = country_for_entity(qid) {
                    return Ok(Some((country, hit.id.clone())));
                }
                if let Some(country) = self.place_country(qid).await {
                    return Ok(Some((country, hit.id.clone())));
                }
            }
            debug!(artist = %name, entity = %hit.id, "Music hit without a mapped origin");
        }
        Ok(None)
    }
}

#[async_trait]
impl ArtistLookup for WikidataClient {
    async fn lookup_artist(&self, name: &str) -> Result<Option<ArtistCacheEntry>, LookupError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let Some((country, qid)) = self.artist_country(name).await? else {
            debug!(artist = %name, "No Wikidata origin");
            return Ok(None);
        };
        debug!(artist = %name, entity = %qid, country, "Wikidata origin");

        let mut entry = ArtistCacheEntry {
            country: Some(country.to_string()),
            language: primary_language(&CountryCode::new(country)).map(|l| l.to_string()),
            ..Default::default()
        };
        entry.extra.insert("wikidata_id".to_string(), Value::String(qid));
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn statement(qid: &str) -> Value {
        json!([{ "mainsnak": { "datavalue": { "value": { "entity-type": "item", "id": qid } } } }])
    }

    #[test]
    fn test_country_entities() {
        assert_eq!(country_for_entity("Q30"), Some("US"));
        assert_eq!(country_for_entity("Q22"), Some("GB"));
        assert_eq!(country_for_entity("Q15180"), Some("RU"));
        assert_eq!(country_for_entity("Q1490"), Some("JP"));
        assert_eq!(country_for_entity("Q99999999"), None);
    }

    #[test]
    fn test_music_description_filter() {
        assert!(is_music_description("American rock band"));
        assert!(is_music_description("Icelandic Singer-Songwriter"));
        assert!(is_music_description("British DJ and record producer"));
        assert!(!is_music_description("species of insect"));
        assert!(!is_music_description(""));
    }

    #[test]
    fn test_origin_entities_follow_property_order() {
        let claims = json!({
            "P19": statement("Q1297"),
            "P27": statement("Q145"),
            "P31": statement("Q5"),
        });
        assert_eq!(origin_entities(&claims), vec!["Q145", "Q1297"]);
        assert_eq!(first_claim_entity(&claims, "P495"), None);
    }

    #[test]
    fn test_malformed_claims_yield_nothing() {
        assert!(origin_entities(&json!([])).is_empty());
        assert!(origin_entities(&Value::Null).is_empty());
        let string_value = json!({
            "P27": [{ "mainsnak": { "datavalue": { "value": "United States" } } }]
        });
        assert!(origin_entities(&string_value).is_empty());
    }

    #[test]
    fn test_entities_response_with_empty_claims() {
        let response: EntitiesResponse = serde_json::from_value(json!({
            "entities": { "Q1": { "id": "Q1", "claims": [] }, "Q2": { "id": "Q2", "missing": "" } }
        }))
        .unwrap();
        assert!(!response.entities["Q1"].claims.is_object());
        assert!(response.entities["Q2"].claims.is_null());
    }
}
