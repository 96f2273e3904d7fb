use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use super::{first_match, text_of, ParseOutcome, PatternRule};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_ALTERNATION: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

/// `July 1, 1994`
static MONTH_DAY_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"({})\s(\d{{1,2}}),\s(\d{{4}})", MONTH_ALTERNATION)).unwrap()
});

/// `1994-07-01`, `1994/07/01`, `1994.07.01`
static NUMERIC_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[^\d]([01]\d)[^\d]([0-3]\d)").unwrap());

/// `July 1994`
static MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"({})\s(\d{{4}})", MONTH_ALTERNATION)).unwrap());

/// `1994`
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

// Reduced-precision dates anchor on the first day of the month / year.
static DATE_RULES: [PatternRule<NaiveDate>; 4] = [
    PatternRule {
        name: "month_day_year",
        pattern: &MONTH_DAY_YEAR_RE,
        extract: extract_month_day_year,
    },
    PatternRule {
        name: "numeric",
        pattern: &NUMERIC_DATE_RE,
        extract: extract_numeric,
    },
    PatternRule {
        name: "month_year",
        pattern: &MONTH_YEAR_RE,
        extract: extract_month_year,
    },
    PatternRule {
        name: "year",
        pattern: &YEAR_RE,
        extract: extract_year,
    },
];

fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

fn group<T: std::str::FromStr>(caps: &Captures<'_>, i: usize) -> Option<T> {
    caps.get(i)?.as_str().parse::<T>().ok()
}

fn extract_month_day_year(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = month_number(&caps[1])?;
    NaiveDate::from_ymd_opt(group(caps, 3)?, month, group(caps, 2)?)
}

fn extract_numeric(caps: &Captures<'_>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(group(caps, 1)?, group(caps, 2)?, group(caps, 3)?)
}

fn extract_month_year(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = month_number(&caps[1])?;
    NaiveDate::from_ymd_opt(group(caps, 2)?, month, 1)
}

fn extract_year(caps: &Captures<'_>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(group(caps, 1)?, 1, 1)
}

/// Parse the first recognizable date out of free text.
///
/// Patterns are tried in priority order (full date, numeric date, month and
/// year, bare year) and the first one found anywhere in the text decides.
/// Month-only precision lands on the 1st, year-only precision on January 1st.
pub fn parse_date(text: &str) -> ParseOutcome<NaiveDate> {
    first_match(text, &DATE_RULES)
}

pub fn parse_date_value(value: &Value) -> ParseOutcome<NaiveDate> {
    match text_of(value) {
        Some(text) => parse_date(&text),
        None => ParseOutcome::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> ParseOutcome<NaiveDate> {
        ParseOutcome::Parsed(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_full_date() {
        assert_eq!(parse_date("January 5, 1999"), ymd(1999, 1, 5));
        assert_eq!(parse_date("Released July 11, 1990 (USA)"), ymd(1990, 7, 11));
    }

    #[test]
    fn test_numeric_date() {
        assert_eq!(parse_date("1999-01-05"), ymd(1999, 1, 5));
        assert_eq!(parse_date("(1999/12/31)"), ymd(1999, 12, 31));
    }

    #[test]
    fn test_reduced_precision_anchors() {
        assert_eq!(parse_date("March 2003"), ymd(2003, 3, 1));
        assert_eq!(parse_date("1999"), ymd(1999, 1, 1));
    }

    #[test]
    fn test_pattern_priority_beats_position() {
        assert_eq!(
            parse_date("1989 (festival), premiered August 4, 1990"),
            ymd(1990, 8, 4)
        );
    }

    #[test]
    fn test_list_is_joined_before_matching() {
        assert_eq!(
            parse_date_value(&json!(["December 25, 1995", "(United States)"])),
            ymd(1995, 12, 25)
        );
    }

    #[test]
    fn test_missing() {
        assert_eq!(parse_date("TBA"), ParseOutcome::Missing);
        assert_eq!(parse_date("February 30, 2001"), ParseOutcome::Missing);
        assert_eq!(parse_date_value(&json!(1999)), ParseOutcome::Missing);
    }
}
