use serde_json::Value;

use crate::domain::RawRecord;

/// Key under which alternate-title variants are collected
pub const ALT_TITLES_KEY: &str = "alt_titles";

/// Localized or alternative title labels found in scraped infoboxes
pub const ALT_TITLE_KEYS: [&str; 20] = [
    "Also known as",
    "Arabic",
    "Cantonese",
    "Chinese",
    "French",
    "Hangul",
    "Hebrew",
    "Hepburn",
    "Japanese",
    "Literally",
    "Mandarin",
    "McCune–Reischauer",
    "Original title",
    "Polish",
    "Revised Romanization",
    "Romanized",
    "Russian",
    "Simplified",
    "Traditional",
    "Yiddish",
];

/// Move the value at `from` to `to`, replacing whatever `to` held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameRule {
    pub from: &'static str,
    pub to: &'static str,
}

const fn rename(from: &'static str, to: &'static str) -> RenameRule {
    RenameRule { from, to }
}

/// Synonym renames. Order is significant: `Released` becomes `Release Date`,
/// which a later rule turns into `Release date`.
pub const RENAME_RULES: [RenameRule; 19] = [
    rename("Adaptation by", "Writer(s)"),
    rename("Country of origin", "Country"),
    rename("Directed by", "Director"),
    rename("Distributed by", "Distributor"),
    rename("Edited by", "Editor(s)"),
    rename("Length", "Running time"),
    rename("Original release", "Release date"),
    rename("Music by", "Composer(s)"),
    rename("Produced by", "Producer(s)"),
    rename("Producer", "Producer(s)"),
    rename("Productioncompanies ", "Production company(s)"),
    rename("Productioncompany ", "Production company(s)"),
    rename("Released", "Release Date"),
    rename("Release Date", "Release date"),
    rename("Screen story by", "Writer(s)"),
    rename("Screenplay by", "Writer(s)"),
    rename("Story by", "Writer(s)"),
    rename("Theme music composer", "Composer(s)"),
    rename("Written by", "Writer(s)"),
];

/// Unify one raw record onto canonical key names.
///
/// Works on a copy: alternate titles are moved into a nested `alt_titles`
/// object (only created when at least one was present), then every rename
/// rule is applied in sequence.
pub fn unify_record(record: &RawRecord) -> RawRecord {
    let mut movie = record.clone();

    let mut alt_titles = serde_json::Map::new();
    for key in ALT_TITLE_KEYS {
        if let Some(value) = movie.remove(key) {
            alt_titles.insert(key.to_string(), value);
        }
    }
    if !alt_titles.is_empty() {
        movie.insert(ALT_TITLES_KEY.to_string(), Value::Object(alt_titles));
    }

    for rule in RENAME_RULES {
        if let Some(value) = movie.remove(rule.from) {
            movie.insert(rule.to.to_string(), value);
        }
    }

    movie
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_alt_titles_are_nested() {
        let raw = record(json!({
            "title": "Raise the Red Lantern",
            "Traditional": "大紅燈籠高高掛",
            "Simplified": "大红灯笼高高挂",
            "Directed by": "Zhang Yimou"
        }));

        let movie = unify_record(&raw);

        assert_eq!(
            movie.get(ALT_TITLES_KEY),
            Some(&json!({
                "Traditional": "大紅燈籠高高掛",
                "Simplified": "大红灯笼高高挂"
            }))
        );
        assert!(movie.get("Traditional").is_none());
        assert_eq!(movie.get("Director"), Some(&json!("Zhang Yimou")));
        // Input untouched
        assert!(raw.contains_key("Directed by"));
    }

    #[test]
    fn test_no_alt_titles_key_without_variants() {
        let movie = unify_record(&record(json!({"title": "Heat"})));
        assert!(!movie.contains_key(ALT_TITLES_KEY));
    }

    #[test]
    fn test_chained_rename() {
        let movie = unify_record(&record(json!({"Released": "1995"})));
        assert_eq!(movie.get("Release date"), Some(&json!("1995")));
        assert!(!movie.contains_key("Released"));
        assert!(!movie.contains_key("Release Date"));
    }

    #[test]
    fn test_later_synonym_wins() {
        let movie = unify_record(&record(json!({
            "Screenplay by": "A",
            "Written by": "B"
        })));
        assert_eq!(movie.get("Writer(s)"), Some(&json!("B")));
    }

    #[test]
    fn test_alt_titles_never_hold_canonical_keys() {
        let movie = unify_record(&record(json!({
            "Original title": "Les Misérables",
            "Directed by": "Robert Hossein",
            "Written by": "Alain Decaux"
        })));
        let alt = movie.get(ALT_TITLES_KEY).and_then(|v| v.as_object()).unwrap();
        assert_eq!(alt.len(), 1);
        assert!(alt.keys().all(|k| ALT_TITLE_KEYS.contains(&k.as_str())));
    }

    #[test]
    fn test_idempotent_on_canonical_record() {
        let raw = record(json!({
            "title": "Heat",
            "Director": "Michael Mann",
            "imdb_link": "https://www.imdb.com/title/tt0113277/"
        }));
        let once = unify_record(&raw);
        let twice = unify_record(&once);
        assert_eq!(once, twice);
        assert_eq!(once, raw);
    }
}
