use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::borrow::Cow;

use super::{first_match, text_of, ParseOutcome, PatternRule};

/// `$12.5 million`, `$3 bn`, ... anywhere in the text. Full scale words may
/// run on (`millions`); the short forms must end the word.
static SCALED_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s*\d+\.?\d*\s*(?:billi?on|bilion|milli?on|milion|(?:bil|mil|bn|mn)\b)")
        .unwrap()
});

/// `$1,234,567` / `$1.234.567` anywhere in the text
static GROUPED_AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*\d{1,3}(?:[,.]\d{3})+").unwrap());

/// A grouped amount immediately followed by a scale word is not a literal amount
static SCALE_WORD_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s[mb]illion").unwrap());

static MILLIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\$\s*(\d+\.?\d*)\s*(?:milli?on|milion|(?:mil|mn)\b)").unwrap());

static BILLIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\$\s*(\d+\.?\d*)\s*(?:billi?on|bilion|(?:bil|bn)\b)").unwrap());

static GROUPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\s*(\d{1,3}(?:[,.]\d{3})+)").unwrap());

static CITATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]\s*").unwrap());

static AMOUNT_RULES: [PatternRule<f64>; 3] = [
    PatternRule {
        name: "millions",
        pattern: &MILLIONS_RE,
        extract: extract_millions,
    },
    PatternRule {
        name: "billions",
        pattern: &BILLIONS_RE,
        extract: extract_billions,
    },
    PatternRule {
        name: "grouped_digits",
        pattern: &GROUPED_RE,
        extract: extract_grouped,
    },
];

/// Strip everything that is not part of the number and parse it as `f64`.
fn scaled_number(caps: &Captures<'_>, scale: f64) -> Option<f64> {
    let digits: String = caps[1]
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_alphabetic() && *c != '$')
        .collect();
    digits.parse::<f64>().ok().map(|v| v * scale)
}

fn extract_millions(caps: &Captures<'_>) -> Option<f64> {
    scaled_number(caps, 1_000_000.0)
}

fn extract_billions(caps: &Captures<'_>) -> Option<f64> {
    scaled_number(caps, 1_000_000_000.0)
}

fn extract_grouped(caps: &Captures<'_>) -> Option<f64> {
    let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().ok()
}

/// Locate the leftmost dollar amount in `text`. At equal positions the scaled
/// form wins over the grouped form.
fn find_amount(text: &str) -> Option<&str> {
    let scaled = SCALED_AMOUNT_RE.find(text);
    let grouped = GROUPED_AMOUNT_RE
        .find_iter(text)
        .find(|m| !SCALE_WORD_SUFFIX_RE.is_match(&text[m.end()..]));

    match (scaled, grouped) {
        (Some(s), Some(g)) if g.start() < s.start() => Some(g.as_str()),
        (Some(s), _) => Some(s.as_str()),
        (None, Some(g)) => Some(g.as_str()),
        (None, None) => None,
    }
}

/// Parse a free-text monetary expression into dollars.
pub fn parse_money(text: &str) -> ParseOutcome<f64> {
    match find_amount(text) {
        Some(amount) => first_match(amount, &AMOUNT_RULES),
        None => ParseOutcome::Missing,
    }
}

/// Parse a scraped value; lists are joined first and anything that is not
/// text is `Missing`.
pub fn parse_money_value(value: &Value) -> ParseOutcome<f64> {
    match text_of(value) {
        Some(text) => parse_money(&text),
        None => ParseOutcome::Missing,
    }
}

/// Budget cells carry ranges and citation markers: `$1–2 million[3]` becomes
/// `$2 million`.
pub fn clean_budget_text(text: &str) -> Cow<'_, str> {
    let collapsed = collapse_range(text);
    if !CITATION_RE.is_match(&collapsed) {
        return collapsed;
    }
    Cow::Owned(CITATION_RE.replace_all(&collapsed, "").into_owned())
}

/// Apply the range rule to every line: from the first `$` through the last
/// dash not followed by a lowercase letter becomes a single `$`.
fn collapse_range(text: &str) -> Cow<'_, str> {
    if !text.contains('$') {
        return Cow::Borrowed(text);
    }

    let mut changed = false;
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        match collapse_line(line) {
            Some(collapsed) => {
                changed = true;
                out.push_str(&collapsed);
            }
            None => out.push_str(line),
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

fn collapse_line(line: &str) -> Option<String> {
    let dollar = line.find('$')?;

    let (i, len) = line[dollar..]
        .char_indices()
        .filter(|(_, c)| matches!(c, '-' | '—' | '–'))
        .map(|(i, c)| (dollar + i, c.len_utf8()))
        .filter(|(i, len)| {
            !line[i + len..]
                .chars()
                .next()
                .is_some_and(|next| next.is_ascii_lowercase())
        })
        .last()?;

    Some(format!("{}${}", &line[..dollar], &line[i + len..]))
}
