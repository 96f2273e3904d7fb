//! Free-text field parsers for scraped wiki values
//!
//! Each parser is an ordered list of pattern rules tried in priority order;
//! the first rule whose pattern matches decides the outcome. A non-matching
//! input is not an error, it is reported as [`ParseOutcome::Missing`].

pub mod date;
pub mod duration;
pub mod money;

pub use date::{parse_date, parse_date_value};
pub use duration::{match_duration, parse_duration_value, parse_runtime_minutes, DurationFallback};
pub use money::{clean_budget_text, parse_money, parse_money_value};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Result of parsing one free-text value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Missing,
}

impl<T> ParseOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(v) => Some(v),
            ParseOutcome::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ParseOutcome::Missing)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Parsed(v) => ParseOutcome::Parsed(f(v)),
            ParseOutcome::Missing => ParseOutcome::Missing,
        }
    }
}

impl<T> From<Option<T>> for ParseOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => ParseOutcome::Parsed(v),
            None => ParseOutcome::Missing,
        }
    }
}

/// A matcher paired with the extractor that turns its captures into a value
pub(crate) struct PatternRule<T> {
    pub name: &'static str,
    pub pattern: &'static Lazy<Regex>,
    pub extract: fn(&Captures<'_>) -> Option<T>,
}

/// Evaluate `rules` in order against `text`; the first pattern that matches
/// anywhere wins, even if its extractor then rejects the match.
pub(crate) fn first_match<T>(text: &str, rules: &[PatternRule<T>]) -> ParseOutcome<T> {
    for rule in rules {
        if let Some(caps) = rule.pattern.captures(text) {
            tracing::trace!(rule = rule.name, matched = &caps[0], "pattern matched");
            return (rule.extract)(&caps).into();
        }
    }
    ParseOutcome::Missing
}

/// Flatten a scraped value into one string: strings as-is, lists joined with
/// single spaces. Anything else has no text form.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}

/// Parse a capture group as an integer, treating an absent or empty group as 0.
pub(crate) fn capture_or_zero(caps: &Captures<'_>, group: usize) -> i64 {
    caps.get(group)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}
