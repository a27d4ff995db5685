//! DateExtractor - Date Pattern Matching over Recognized Text
//!
//! ## Responsibilities
//!
//! - Find at most one date-like substring in a block of recognized text
//! - Pattern matching only, no calendar validation
//!
//! The pattern is deliberately permissive: one or two digits, a separator
//! (`/`, `.`, `-`, or space), one or two digits, a separator from the same
//! class, then four or two digits. "40/13/2024" matches textually; the
//! expiration classifier decides whether a match is a usable date.

use regex::Regex;
use std::sync::OnceLock;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Four-digit year alternative first so "05-06-2025" is not cut to
        // "05-06-20".
        Regex::new(r"\d{1,2}[/.\- ]\d{1,2}[/.\- ](?:\d{4}|\d{2})")
            .expect("date pattern is valid")
    })
}

/// Extract the first date-like substring from recognized text
///
/// Returns `None` when no match exists. Pure function.
pub fn extract_date(text: &str) -> Option<String> {
    date_pattern().find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_slash_date() {
        assert_eq!(
            extract_date("Scad. 12/31/2024 conservare al fresco"),
            Some("12/31/2024".to_string())
        );
    }

    #[test]
    fn test_extracts_dash_date_from_label_text() {
        assert_eq!(
            extract_date("Best before 05-06-2025 Lot 22"),
            Some("05-06-2025".to_string())
        );
    }

    #[test]
    fn test_extracts_dotted_and_spaced_dates() {
        assert_eq!(
            extract_date("EXP 3.6.25"),
            Some("3.6.25".to_string())
        );
        assert_eq!(
            extract_date("consumare entro 10 05 2025"),
            Some("10 05 2025".to_string())
        );
    }

    #[test]
    fn test_single_digit_groups() {
        assert_eq!(extract_date("use by 1/2/25"), Some("1/2/25".to_string()));
    }

    #[test]
    fn test_no_calendar_validation() {
        // Textual match only, calendar nonsense still matches
        assert_eq!(
            extract_date("40/13/2024"),
            Some("40/13/2024".to_string())
        );
    }

    #[test]
    fn test_prefers_full_year_over_two_digit_prefix() {
        assert_eq!(
            extract_date("02/01/2025"),
            Some("02/01/2025".to_string())
        );
    }

    #[test]
    fn test_absent_when_no_match() {
        assert_eq!(extract_date("no dates here"), None);
        assert_eq!(extract_date(""), None);
        assert_eq!(extract_date("lot 12345 batch 9"), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            extract_date("prodotto il 01/01/2025, scade il 10/01/2025"),
            Some("01/01/2025".to_string())
        );
    }
}
