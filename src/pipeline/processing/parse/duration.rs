use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;

use super::{capture_or_zero, first_match, text_of, ParseOutcome, PatternRule};

/// Either `<h> hours <m>` or `<m> m...`
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*ho?u?r?s?\s*(\d*)|(\d+)\s*m").unwrap());

static DURATION_RULES: [PatternRule<i64>; 1] = [PatternRule {
    name: "hours_minutes_or_minutes",
    pattern: &DURATION_RE,
    extract: extract_minutes,
}];

fn extract_minutes(caps: &Captures<'_>) -> Option<i64> {
    let hours = capture_or_zero(caps, 1);
    let minutes = capture_or_zero(caps, 2);
    let plain_minutes = capture_or_zero(caps, 3);

    if plain_minutes != 0 {
        Some(plain_minutes)
    } else {
        Some(hours * 60 + minutes)
    }
}

/// What an unrecognizable running time becomes.
///
/// `Zero` is the historical behavior and the default; `Missing` aligns the
/// duration parser with the monetary and date parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFallback {
    #[default]
    Zero,
    Missing,
}

impl DurationFallback {
    pub fn resolve(self, outcome: ParseOutcome<i64>) -> Option<i64> {
        match (outcome, self) {
            (ParseOutcome::Parsed(minutes), _) => Some(minutes),
            (ParseOutcome::Missing, DurationFallback::Zero) => Some(0),
            (ParseOutcome::Missing, DurationFallback::Missing) => None,
        }
    }
}

/// Match a running time without applying any fallback.
pub fn match_duration(text: &str) -> ParseOutcome<i64> {
    first_match(text, &DURATION_RULES)
}

/// Running time in minutes; text that does not look like a duration is 0.
pub fn parse_runtime_minutes(text: &str) -> i64 {
    DurationFallback::Zero
        .resolve(match_duration(text))
        .unwrap_or(0)
}

/// Parse a scraped running-time value under the given fallback policy.
/// Non-text values count as unrecognizable.
pub fn parse_duration_value(value: &Value, fallback: DurationFallback) -> Option<i64> {
    let outcome = match text_of(value) {
        Some(text) => match_duration(&text),
        None => ParseOutcome::Missing,
    };
    fallback.resolve(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(parse_runtime_minutes("1h 30m"), 90);
        assert_eq!(parse_runtime_minutes("2 hours 5 minutes"), 125);
        assert_eq!(parse_runtime_minutes("1 hour"), 60);
    }

    #[test]
    fn test_plain_minutes() {
        assert_eq!(parse_runtime_minutes("45 min"), 45);
        assert_eq!(parse_runtime_minutes("45 m"), 45);
        assert_eq!(parse_runtime_minutes("118 minutes[1]"), 118);
    }

    #[test]
    fn test_unparseable_is_zero_not_missing() {
        assert_eq!(parse_runtime_minutes("unknown"), 0);
        assert_eq!(match_duration("unknown"), ParseOutcome::Missing);
    }

    #[test]
    fn test_fallback_policy() {
        assert_eq!(
            parse_duration_value(&json!("feature length"), DurationFallback::Zero),
            Some(0)
        );
        assert_eq!(
            parse_duration_value(&json!("feature length"), DurationFallback::Missing),
            None
        );
        assert_eq!(
            parse_duration_value(&json!(["102 minutes", "(director's cut)"]), DurationFallback::Missing),
            Some(102)
        );
        assert_eq!(parse_duration_value(&json!(95), DurationFallback::Zero), Some(0));
    }
}
