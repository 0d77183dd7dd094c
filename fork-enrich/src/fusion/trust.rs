//! Trust filter for per-album lookup results
//!
//! Release data often describes the edition (where it was pressed or
//! distributed) rather than where the artist is from. A country is usable
//! as origin evidence only when:
//! 1. it is a real country (not a placeholder, not unresolved)
//! 2. it is not a secondary distribution market
//! 3. it has a primary language in the code table
//! 4. the language is unknown, or equals that primary language

use crate::codes::{
    is_secondary_distribution_market, primary_language, CountryResult, LanguageCode,
};

pub fn can_use_evidence(country: &CountryResult, language: Option<&LanguageCode>) -> bool {
    let CountryResult::Known(code) = country else {
        return false;
    };
    if is_secondary_distribution_market(code) {
        return false;
    }
    let Some(primary) = primary_language(code) else {
        return false;
    };
    match language {
        None => true,
        Some(lang) => *lang == primary,
    }
}

/// [`can_use_evidence`] over raw cache strings
pub fn can_use_raw(country: Option<&str>, language: Option<&str>) -> bool {
    can_use_evidence(
        &CountryResult::parse(country),
        LanguageCode::parse(language).as_ref(),
    )
}
