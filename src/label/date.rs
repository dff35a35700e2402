//! Date and place normalization for label facts

use crate::model::DateFact;
use once_cell::sync::Lazy;
use regex::Regex;

static ABOUT_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^abt\.?\s*(\d{4})").unwrap());
static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s+([A-Za-z]+)\.?\s+(\d{4})$").unwrap());
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z]{3,})\.?\s+(\d{4})$").unwrap());
static ANY_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

const MONTHS: [(&str, &str); 12] = [
    ("january", "JAN"),
    ("february", "FEB"),
    ("march", "MAR"),
    ("april", "APR"),
    ("may", "MAY"),
    ("june", "JUN"),
    ("july", "JUL"),
    ("august", "AUG"),
    ("september", "SEP"),
    ("october", "OCT"),
    ("november", "NOV"),
    ("december", "DEC"),
];

/// GEDCOM month code for an English month name or abbreviation.
///
/// Accepts any prefix of the full name that is at least three letters long,
/// so `Jan`, `Sept` and `September` all work.
pub fn month_code(word: &str) -> Option<&'static str> {
    let word = word.to_ascii_lowercase();
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(full, _)| full.starts_with(&word))
        .map(|(_, code)| *code)
}

/// Normalize a free-text date to `ABT YYYY`, `D MON YYYY`, `MON YYYY` or `YYYY`.
///
/// Returns `None` when no four-digit year can be found.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let text = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ABOUT_YEAR.captures(text) {
        return Some(format!("ABT {}", &caps[1]));
    }
    if let Some(caps) = DAY_MONTH_YEAR.captures(text) {
        if let Some(month) = month_code(&caps[2]) {
            return Some(format!("{} {} {}", &caps[1], month, &caps[3]));
        }
    }
    if let Some(caps) = MONTH_YEAR.captures(text) {
        if let Some(month) = month_code(&caps[1]) {
            return Some(format!("{} {}", month, &caps[2]));
        }
    }
    ANY_YEAR.captures(text).map(|caps| caps[1].to_string())
}

/// Split a fact clause at its first comma into a normalized date and a place
pub fn split_date_place(clause: &str) -> DateFact {
    let clause = clause.trim();
    if clause.is_empty() {
        return DateFact::default();
    }
    match clause.split_once(',') {
        Some((date, place)) => {
            let place = place.trim();
            DateFact {
                date: normalize_date(date),
                place: (!place.is_empty()).then(|| place.to_string()),
            }
        }
        None => DateFact {
            date: normalize_date(clause),
            place: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn about_dates() {
        assert_eq!(normalize_date("Abt. 1842").as_deref(), Some("ABT 1842"));
        assert_eq!(normalize_date("abt 1800").as_deref(), Some("ABT 1800"));
        assert_eq!(normalize_date("ABT1799").as_deref(), Some("ABT 1799"));
    }

    #[test]
    fn day_month_year() {
        assert_eq!(normalize_date("12 Mar 1850").as_deref(), Some("12 MAR 1850"));
        assert_eq!(normalize_date("3 September 1901.").as_deref(), Some("3 SEP 1901"));
        assert_eq!(normalize_date("1 Sept 1777").as_deref(), Some("1 SEP 1777"));
    }

    #[test]
    fn month_year() {
        assert_eq!(normalize_date("June 1901").as_deref(), Some("JUN 1901"));
        assert_eq!(normalize_date("dec 1860").as_deref(), Some("DEC 1860"));
    }

    #[test]
    fn bare_year_anywhere() {
        assert_eq!(normalize_date("before 1700?").as_deref(), Some("1700"));
        assert_eq!(normalize_date("12 Foo 1850").as_deref(), Some("1850"));
        assert_eq!(normalize_date("1999").as_deref(), Some("1999"));
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(normalize_date("unknown"), None);
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("."), None);
    }

    #[test]
    fn month_codes() {
        assert_eq!(month_code("MAR"), Some("MAR"));
        assert_eq!(month_code("march"), Some("MAR"));
        assert_eq!(month_code("ma"), None);
        assert_eq!(month_code("marc"), Some("MAR"));
        assert_eq!(month_code("mary"), None);
    }

    #[test]
    fn place_passes_through() {
        let fact = split_date_place(" 3 Jan 1920,  Dallas, Texas ");
        assert_eq!(fact.date.as_deref(), Some("3 JAN 1920"));
        assert_eq!(fact.place.as_deref(), Some("Dallas, Texas"));

        let fact = split_date_place("unknown, Ohio");
        assert_eq!(fact.date, None);
        assert_eq!(fact.place.as_deref(), Some("Ohio"));

        assert!(split_date_place("  ").is_empty());
    }
}
