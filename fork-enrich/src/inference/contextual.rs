use super::{RuleBook, RuleKind};
use crate::codes::{CITIES, NATIONALITIES, US_STATES};

const MUSIC_WORDS: &str = "(?:artist|band|group|duo|trio|quartet|quintet|ensemble|musician|singer|songwriter|rapper|emcee|mc|producer|dj|composer|multi-instrumentalist|instrumentalist|vocalist|guitarist|bassist|drummer|pianist|trumpeter|saxophonist|violinist|cellist|percussionist|keyboardist|frontman|frontwoman|act|outfit|collective|project|supergroup|icon|legend|pioneer|veteran|native|expat|born)";

const ORIGIN_VERBS: &str =
    "(?:from|hails from|native of|raised in|grew up in|born in|living in|moved to|relocated to)";

const SCENE_NOUNS: &str =
    "(?:band|group|act|outfit|trio|duo|quartet|ensemble|collective|scene|rapper|producer|dj|mc)";

impl RuleBook {
    /// Origin-context rules for review prose
    ///
    /// Groups are evaluated in order (nationalities, city-based, city origin,
    /// city scene, US states); within a group, table order applies.
    pub fn contextual() -> Self {
        let mut book = RuleBook::new();

        for (country, words) in NATIONALITIES {
            for word in words.iter() {
                let w = regex::escape(word);
                let pattern = format!(r"\b{w}[- ]?{MUSIC_WORDS}|\b{w}[- ]born\b|\bthe {w} ");
                book.push(RuleKind::Nationality, &pattern, country);
            }
        }

        for (city, country) in CITIES {
            let c = regex::escape(city);
            let pattern = format!(r"{c}[- ]based|based (?:in|out of) {c}");
            book.push(RuleKind::CityBased, &pattern, country);
        }

        for (city, country) in CITIES {
            let c = regex::escape(city);
            let pattern = format!(r"{ORIGIN_VERBS} {c}\b|\b{c} (?:native|resident|local)");
            book.push(RuleKind::CityOrigin, &pattern, country);
        }

        for (city, country) in CITIES {
            let c = regex::escape(city);
            let pattern = format!(r"\b{c}(?:'s)? {SCENE_NOUNS}\b");
            book.push(RuleKind::CityScene, &pattern, country);
        }

        for state in US_STATES {
            let s = regex::escape(state);
            let pattern = format!(
                r"(?:from|native of|based in|raised in|born in|grew up in) {s}\b|\b{s}[- ](?:based|native|born|raised|bred)\b|\b{s} (?:band|group|act|outfit|trio|duo|native)\b"
            );
            book.push(RuleKind::StateOrigin, &pattern, "US");
        }

        book
    }
}
