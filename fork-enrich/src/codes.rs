//! Code Tables
//!
//! Static, process-lifetime mappings used by every evidence source:
//! - country code → primary language code
//! - nationality adjective → country code
//! - city / region → country code
//! - US state names
//! - secondary distribution markets
//!
//! Also defines the typed country/language values. Raw cache data mixes real
//! ISO 3166 codes with placeholders (`XW`, `XE`, `XU`) and the literal
//! `"Unknown"`; [`CountryResult`] separates those cases so downstream logic
//! matches on a discriminant instead of comparing strings.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel written to output fields that no evidence source could fill
pub const UNKNOWN: &str = "Unknown";

/// True when `raw` carries a usable tag (non-empty, not "unknown" in any case)
pub fn is_known_tag(raw: Option<&str>) -> bool {
    match raw {
        Some(v) => {
            let v = v.trim();
            !v.is_empty() && !v.eq_ignore_ascii_case(UNKNOWN)
        }
        None => false,
    }
}

/// ISO 3166-1 alpha-2 country code (as found in source data)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 639-3 language code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// Parse an optional raw tag; absent, empty and "Unknown" yield `None`
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        if is_known_tag(raw) {
            raw.map(Self::new)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-geographic country codes found in release data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `XW`
    Worldwide,
    /// `XE`
    Europe,
    /// `XU`
    UnknownRegion,
}

impl PlaceholderKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "XW" => Some(Self::Worldwide),
            "XE" => Some(Self::Europe),
            "XU" => Some(Self::UnknownRegion),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Worldwide => "XW",
            Self::Europe => "XE",
            Self::UnknownRegion => "XU",
        }
    }
}

/// Typed interpretation of a raw country field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CountryResult {
    Known(CountryCode),
    Placeholder(PlaceholderKind),
    Unresolved,
}

impl CountryResult {
    pub fn parse(raw: Option<&str>) -> Self {
        if !is_known_tag(raw) {
            return Self::Unresolved;
        }
        let code = raw.unwrap_or_default().trim();
        match PlaceholderKind::from_code(code) {
            Some(kind) => Self::Placeholder(kind),
            None => Self::Known(CountryCode::new(code)),
        }
    }

    /// The real country, if any
    pub fn known(&self) -> Option<&CountryCode> {
        match self {
            Self::Known(code) => Some(code),
            _ => None,
        }
    }

    pub fn into_known(self) -> Option<CountryCode> {
        match self {
            Self::Known(code) => Some(code),
            _ => None,
        }
    }
}

/// Country → primary language
const COUNTRY_LANGUAGES: &[(&str, &str)] = &[
    ("US", "eng"), ("GB", "eng"), ("AU", "eng"), ("CA", "eng"), ("NZ", "eng"),
    ("IE", "eng"), ("JM", "eng"), ("TT", "eng"), ("BB", "eng"), ("BS", "eng"),
    ("GY", "eng"), ("BZ", "eng"), ("ZA", "eng"), ("NG", "eng"), ("GH", "eng"),
    ("KE", "eng"), ("UG", "eng"), ("SL", "eng"),
    ("FR", "fra"), ("BE", "fra"), ("SN", "fra"), ("CI", "fra"), ("ML", "fra"),
    ("BF", "fra"), ("NE", "fra"), ("TD", "fra"), ("CM", "fra"), ("MG", "fra"),
    ("HT", "fra"), ("LU", "fra"), ("MC", "fra"),
    ("DE", "deu"), ("AT", "deu"), ("CH", "deu"), ("LI", "deu"),
    ("ES", "spa"), ("MX", "spa"), ("AR", "spa"), ("CO", "spa"), ("CL", "spa"),
    ("PE", "spa"), ("CU", "spa"), ("PR", "spa"), ("VE", "spa"), ("EC", "spa"),
    ("DO", "spa"), ("UY", "spa"), ("GT", "spa"), ("HN", "spa"), ("SV", "spa"),
    ("NI", "spa"), ("CR", "spa"), ("PA", "spa"), ("BO", "spa"), ("PY", "spa"),
    ("GQ", "spa"),
    ("BR", "por"), ("PT", "por"), ("AO", "por"), ("MZ", "por"), ("CV", "por"),
    ("IT", "ita"), ("SM", "ita"),
    ("JP", "jpn"), ("KR", "kor"), ("CN", "zho"), ("TW", "zho"), ("HK", "zho"),
    ("MO", "zho"),
    ("RU", "rus"), ("BY", "rus"),
    ("UA", "ukr"), ("PL", "pol"), ("CZ", "ces"), ("SK", "slk"),
    ("SE", "swe"), ("NO", "nor"), ("DK", "dan"), ("FI", "fin"), ("IS", "isl"),
    ("NL", "nld"), ("GR", "ell"), ("TR", "tur"), ("IL", "heb"), ("RO", "ron"),
    ("HU", "hun"), ("BG", "bul"),
    ("HR", "hrv"), ("RS", "srp"), ("BA", "srp"), ("SI", "slv"), ("MK", "mkd"),
    ("AL", "sqi"), ("ME", "srp"),
    ("IN", "hin"), ("PK", "urd"), ("BD", "ben"), ("LK", "sin"), ("NP", "nep"),
    ("TH", "tha"), ("VN", "vie"), ("ID", "ind"), ("MY", "msa"), ("PH", "tgl"),
    ("MM", "mya"), ("KH", "khm"), ("LA", "lao"),
    ("EG", "ara"), ("MA", "ara"), ("DZ", "ara"), ("TN", "ara"), ("LY", "ara"),
    ("SA", "ara"), ("IQ", "ara"), ("SY", "ara"), ("JO", "ara"), ("LB", "ara"),
    ("YE", "ara"), ("OM", "ara"), ("AE", "ara"), ("QA", "ara"), ("BH", "ara"),
    ("KW", "ara"),
    ("IR", "fas"), ("AF", "pus"),
    ("ET", "amh"), ("TZ", "swa"), ("RW", "kin"), ("BI", "run"),
];

static PRIMARY_LANGUAGE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_LANGUAGES.iter().copied().collect());

/// Primary language of a country, if the country is in the table
pub fn primary_language(country: &CountryCode) -> Option<LanguageCode> {
    PRIMARY_LANGUAGE
        .get(country.as_str())
        .map(|lang| LanguageCode::new(*lang))
}

/// English-speaking markets where releases are often catalogued without the
/// artist being from there
pub const SECONDARY_DISTRIBUTION_MARKETS: [&str; 4] = ["CA", "AU", "NZ", "IE"];

pub fn is_secondary_distribution_market(country: &CountryCode) -> bool {
    SECONDARY_DISTRIBUTION_MARKETS.contains(&country.as_str())
}

/// Nationality adjectives, checked in this order
pub const NATIONALITIES: &[(&str, &[&str])] = &[
    ("US", &["american"]),
    ("GB", &["british", "english", "scottish", "welsh"]),
    ("CA", &["canadian"]),
    ("AU", &["australian"]),
    ("NZ", &["new zealand", "kiwi"]),
    ("IE", &["irish"]),
    ("FR", &["french"]),
    ("DE", &["german"]),
    ("SE", &["swedish"]),
    ("NO", &["norwegian"]),
    ("DK", &["danish"]),
    ("FI", &["finnish"]),
    ("IS", &["icelandic"]),
    ("NL", &["dutch"]),
    ("BE", &["belgian"]),
    ("IT", &["italian"]),
    ("ES", &["spanish"]),
    ("PT", &["portuguese"]),
    ("JP", &["japanese"]),
    ("KR", &["korean", "south korean"]),
    ("BR", &["brazilian"]),
    ("MX", &["mexican"]),
    ("AR", &["argentinian", "argentine"]),
    ("CO", &["colombian"]),
    ("CU", &["cuban"]),
    ("JM", &["jamaican"]),
    ("TT", &["trinidadian"]),
    ("NG", &["nigerian"]),
    ("GH", &["ghanaian"]),
    ("ZA", &["south african"]),
    ("ET", &["ethiopian"]),
    ("ML", &["malian"]),
    ("SN", &["senegalese"]),
    ("CD", &["congolese"]),
    ("UG", &["ugandan"]),
    ("KE", &["kenyan"]),
    ("UA", &["ukrainian"]),
    ("IN", &["indian"]),
    ("CN", &["chinese"]),
    ("TW", &["taiwanese"]),
    ("ID", &["indonesian"]),
    ("IL", &["israeli"]),
    ("LB", &["lebanese"]),
    ("RU", &["russian"]),
    ("PL", &["polish"]),
    ("GR", &["greek"]),
    ("TR", &["turkish"]),
    ("EG", &["egyptian"]),
    ("MA", &["moroccan"]),
    ("IR", &["iranian", "persian"]),
    ("ZW", &["zimbabwean"]),
    ("VE", &["venezuelan"]),
    ("HR", &["croatian"]),
    ("RS", &["serbian"]),
    ("RO", &["romanian"]),
    ("HU", &["hungarian"]),
    ("BG", &["bulgarian"]),
    ("TH", &["thai"]),
    ("VN", &["vietnamese"]),
    ("PK", &["pakistani"]),
    ("PE", &["peruvian"]),
    ("CL", &["chilean"]),
    ("PR", &["puerto rican"]),
    ("TZ", &["tanzanian"]),
    ("CM", &["cameroonian"]),
    ("AO", &["angolan"]),
    ("DZ", &["algerian"]),
    ("MG", &["malagasy"]),
    ("HT", &["haitian"]),
    ("MM", &["burmese"]),
    ("BD", &["bangladeshi"]),
    ("LK", &["sri lankan"]),
    ("PH", &["filipino"]),
    ("SG", &["singaporean"]),
    ("NP", &["nepalese", "nepali"]),
];

/// Cities and regions that identify an artist's home country
pub const CITIES: &[(&str, &str)] = &[
    ("new york", "US"), ("nyc", "US"), ("brooklyn", "US"), ("queens", "US"),
    ("bronx", "US"), ("harlem", "US"), ("manhattan", "US"), ("los angeles", "US"),
    ("l.a.", "US"), ("chicago", "US"), ("atlanta", "US"), ("houston", "US"),
    ("detroit", "US"), ("oakland", "US"), ("san francisco", "US"),
    ("philadelphia", "US"), ("philly", "US"), ("seattle", "US"),
    ("new orleans", "US"), ("nashville", "US"), ("dallas", "US"), ("boston", "US"),
    ("minneapolis", "US"), ("portland, ore", "US"), ("portland, or", "US"),
    ("pittsburgh", "US"), ("memphis", "US"), ("cleveland", "US"),
    ("milwaukee", "US"), ("denver", "US"), ("phoenix", "US"), ("austin", "US"),
    ("tucson", "US"), ("san diego", "US"), ("sacramento", "US"),
    ("st. louis", "US"), ("omaha", "US"), ("raleigh", "US"), ("durham", "US"),
    ("richmond", "US"), ("savannah", "US"), ("ann arbor", "US"),
    ("baton rouge", "US"), ("gainesville", "US"), ("chapel hill", "US"),
    ("carrboro", "US"), ("olympia", "US"), ("washington, d.c", "US"),
    ("washington d.c", "US"), ("d.c.", "US"),
    ("london", "GB"), ("manchester", "GB"), ("liverpool", "GB"), ("bristol", "GB"),
    ("brighton", "GB"), ("sheffield", "GB"), ("glasgow", "GB"),
    ("edinburgh", "GB"), ("leeds", "GB"), ("birmingham", "GB"),
    ("nottingham", "GB"), ("cardiff", "GB"), ("newcastle", "GB"),
    ("southampton", "GB"), ("leicester", "GB"), ("coventry", "GB"),
    ("dundee", "GB"), ("aberdeen", "GB"), ("oxford", "GB"), ("cambridge", "GB"),
    ("toronto", "CA"), ("vancouver", "CA"), ("montreal", "CA"), ("montréal", "CA"),
    ("sydney", "AU"), ("melbourne", "AU"), ("brisbane", "AU"),
    ("dublin", "IE"), ("paris", "FR"), ("berlin", "DE"), ("hamburg", "DE"),
    ("cologne", "DE"), ("munich", "DE"), ("stockholm", "SE"),
    ("gothenburg", "SE"), ("oslo", "NO"), ("copenhagen", "DK"),
    ("helsinki", "FI"), ("reykjavik", "IS"), ("reykjavík", "IS"),
    ("amsterdam", "NL"), ("rotterdam", "NL"), ("brussels", "BE"),
    ("tokyo", "JP"), ("osaka", "JP"), ("seoul", "KR"),
    ("são paulo", "BR"), ("sao paulo", "BR"), ("rio de janeiro", "BR"),
    ("mexico city", "MX"), ("buenos aires", "AR"), ("bogotá", "CO"),
    ("havana", "CU"), ("kingston", "JM"), ("lagos", "NG"),
    ("johannesburg", "ZA"), ("cape town", "ZA"), ("nairobi", "KE"),
    ("cairo", "EG"), ("istanbul", "TR"), ("tel aviv", "IL"), ("beirut", "LB"),
    ("moscow", "RU"), ("warsaw", "PL"), ("tehran", "IR"), ("bangkok", "TH"),
    ("jakarta", "ID"), ("addis ababa", "ET"), ("dakar", "SN"), ("bamako", "ML"),
    ("kinshasa", "CD"), ("kampala", "UG"),
];

pub const US_STATES: &[&str] = &[
    "alabama", "alaska", "arizona", "arkansas", "california", "colorado",
    "connecticut", "delaware", "florida", "georgia", "hawaii", "idaho",
    "illinois", "indiana", "iowa", "kansas", "kentucky", "louisiana", "maine",
    "maryland", "massachusetts", "michigan", "minnesota", "mississippi",
    "missouri", "montana", "nebraska", "nevada", "new hampshire", "new jersey",
    "new mexico", "new york", "north carolina", "north dakota", "ohio",
    "oklahoma", "oregon", "pennsylvania", "rhode island", "south carolina",
    "south dakota", "tennessee", "texas", "utah", "vermont", "virginia",
    "washington", "west virginia", "wisconsin", "wyoming",
];
