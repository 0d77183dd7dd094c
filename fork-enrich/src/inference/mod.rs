//! Free-Text Inference
//!
//! Country-of-origin guesses from prose. A [`RuleBook`] is an ordered list of
//! [`Rule`]s, each a compiled matcher tagged with the kind of evidence it
//! looks for and the country it implies. Evaluation is first match wins; no
//! rule outranks another except by position.
//!
//! Two books are provided:
//! - [`RuleBook::place_names`]: bare country/city names, used for album
//!   descriptions and artist `area` strings
//! - [`RuleBook::contextual`]: origin phrases ("Tokyo-based", "hails from
//!   Lagos", "Icelandic singer"), used for full review text

mod contextual;
mod place_names;

use crate::codes::CountryCode;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// What a rule's matcher looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Country, region or city name anywhere in the text
    PlaceName,
    /// Nationality adjective describing a musician ("japanese composer")
    Nationality,
    /// "<city>-based" / "based in <city>"
    CityBased,
    /// "from <city>" / "<city> native"
    CityOrigin,
    /// "<city> band" / "<city>'s scene"
    CityScene,
    /// US state origin phrases
    StateOrigin,
}

/// One `{matcher → country}` pair
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub country: CountryCode,
    matcher: Regex,
}

impl Rule {
    /// Compile a rule; `pattern` is matched against lower-cased text
    pub fn new(kind: RuleKind, pattern: &str, country: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            country: CountryCode::new(country),
            matcher: Regex::new(pattern)?,
        })
    }

    /// `folded` must already be lower-cased
    pub fn matches(&self, folded: &str) -> bool {
        self.matcher.is_match(folded)
    }
}

/// Ordered rule list, evaluated first match wins
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; a pattern that fails to compile is logged and skipped
    pub fn push(&mut self, kind: RuleKind, pattern: &str, country: &str) {
        match Rule::new(kind, pattern, country) {
            Ok(rule) => self.rules.push(rule),
            Err(e) => warn!(?kind, country, error = %e, "Skipping inference rule that failed to compile"),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule matching `text`, if any
    pub fn first_match(&self, text: &str) -> Option<&Rule> {
        if text.trim().is_empty() {
            return None;
        }
        let folded = text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&folded))
    }

    /// Country implied by `text`; empty or whitespace-only text yields `None`
    pub fn infer(&self, text: &str) -> Option<CountryCode> {
        self.first_match(text).map(|rule| rule.country.clone())
    }
}

static PLACE_NAMES: Lazy<RuleBook> = Lazy::new(RuleBook::place_names);
static CONTEXTUAL: Lazy<RuleBook> = Lazy::new(RuleBook::contextual);

/// Place-name inference over short text (descriptions, artist areas)
pub fn infer_from_place_names(text: &str) -> Option<CountryCode> {
    PLACE_NAMES.infer(text)
}

/// Origin-phrase inference over review prose
pub fn infer_from_context(text: &str) -> Option<CountryCode> {
    CONTEXTUAL.infer(text)
}
