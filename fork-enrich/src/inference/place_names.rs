use super::{RuleBook, RuleKind};

/// Place names per country, in evaluation order
const PLACE_NAME_RULES: &[(&str, &[&str])] = &[
    (
        "US",
        &[
            "united states", r"u\.s\.", "usa", "new york", "brooklyn", "queens", "bronx",
            "los angeles", "california", "texas", "florida", "chicago", "atlanta",
            "houston", "detroit", "oakland", "san francisco", "philadelphia", "seattle",
            "new orleans", "nashville", "dallas", "boston", "rhode island", "minnesota",
            "virginia",
        ],
    ),
    (
        "GB",
        &[
            "united kingdom", "england", "scotland", "wales", "london", "manchester",
            "liverpool", "bristol", "brighton", "sheffield",
        ],
    ),
    ("CA", &["canada", "toronto", "vancouver", "montreal", "montréal"]),
    ("AU", &["australia", "sydney", "melbourne"]),
    ("NZ", &["new zealand", "auckland", "wellington"]),
    ("PT", &["portugal", "lisbon", "lisboa"]),
    ("ES", &["spain", "madrid", "barcelona"]),
    ("FR", &["france", "paris"]),
    ("DE", &["germany", "berlin"]),
    ("KR", &["south korea", "seoul"]),
];

impl RuleBook {
    /// One rule per country, matching any of its place names as whole words
    pub fn place_names() -> Self {
        let mut book = RuleBook::new();
        for (country, names) in PLACE_NAME_RULES {
            let pattern = format!(r"\b(?:{})\b", names.join("|"));
            book.push(RuleKind::PlaceName, &pattern, country);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use crate::codes::CountryCode;
    use crate::inference::{infer_from_place_names, RuleBook};

    fn infer(text: &str) -> Option<String> {
        infer_from_place_names(text).map(|c| c.as_str().to_string())
    }

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(RuleBook::place_names().len(), 10);
    }

    #[test]
    fn test_city_names() {
        assert_eq!(infer("Brooklyn"), Some("US".into()));
        assert_eq!(infer("Sheffield, South Yorkshire"), Some("GB".into()));
        assert_eq!(infer("Montréal"), Some("CA".into()));
        assert_eq!(infer("Seoul"), Some("KR".into()));
        assert_eq!(infer("Lisboa"), Some("PT".into()));
    }

    #[test]
    fn test_whole_words_only() {
        // "parisian" is not "paris"; "queensland" is not "queens"
        assert_eq!(infer("a parisian chanson"), None);
        assert_eq!(infer("Queensland"), None);
    }

    #[test]
    fn test_us_checked_before_later_rules() {
        assert_eq!(
            infer_from_place_names("From Atlanta by way of Paris"),
            Some(CountryCode::new("US"))
        );
        assert_eq!(
            infer_from_place_names("From Paris by way of Atlanta"),
            Some(CountryCode::new("US"))
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(infer("Reykjavík"), None);
        assert_eq!(infer(""), None);
    }
}
