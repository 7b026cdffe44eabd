use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

// Outward code (area letters, district digit, optional sub-district) followed
// by the inward code (sector digit, unit letters). Anchored on both ends.
const UK_POSTCODE_PATTERN: &str = r"^[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2}$";

static UK_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(UK_POSTCODE_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("UK postcode pattern is a valid regex")
});

/// Decides whether free text looks like a UK postcode.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcodeShapeClassifier;

impl PostcodeShapeClassifier {
    /// True iff the trimmed text matches the UK postcode grammar.
    pub fn is_postcode(text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && UK_POSTCODE.is_match(trimmed)
    }

    /// Request form for the postcode provider: uppercase, no whitespace.
    pub fn normalize(text: &str) -> String {
        text.chars()
            .filter(|ch| !ch.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect()
    }
}
