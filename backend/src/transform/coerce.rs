//! Scalar coercers: raw cell text to typed values.
//!
//! The classifiers here are best-effort substring heuristics over a
//! case-folded, accent-stripped copy of the input. They are not parsers
//! and never fail: unrecognized text falls through to a default.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{EnrollmentStatus, SchoolCategory, DEFAULT_RATING};
use crate::parser::fold_text;

static DMY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
static LEADING_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap());
static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[+-]?\d+").unwrap());

// =============================================================================
// Dates and numbers
// =============================================================================

/// Canonicalize a date to `DD/MM/YYYY`.
///
/// `YYYY-MM-DD` is rewritten, `DD/MM/YYYY` passes through, and anything
/// else (including impossible calendar dates) is returned unchanged.
pub fn format_date(raw: &str) -> String {
    if raw.is_empty() || DMY_DATE.is_match(raw) {
        return raw.to_string();
    }
    match ISO_DATE.captures(raw) {
        Some(caps) => format!("{}/{}/{}", &caps[3], &caps[2], &caps[1]),
        None => raw.to_string(),
    }
}

/// Leading decimal number of `text`, like a lenient float parse.
fn leading_float(text: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a coordinate, accepting a decimal comma. Unparseable input is 0.
pub fn parse_coordinate(raw: &str) -> f64 {
    if raw.trim().is_empty() {
        return 0.0;
    }
    leading_float(&raw.replacen(',', ".", 1)).unwrap_or(0.0)
}

/// Parse a rating; absent, unparseable or zero ratings become the default.
pub fn parse_rating(raw: &str) -> f64 {
    match leading_float(raw) {
        Some(v) if v != 0.0 => v,
        _ => DEFAULT_RATING,
    }
}

/// Leading integer of `raw`, or 0.
pub fn parse_capacity(raw: &str) -> i64 {
    LEADING_INT
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<i64>().ok())
        .unwrap_or(0)
}

/// Keep only ASCII digits (national ids are often punctuated).
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

// =============================================================================
// Free-text classifiers
// =============================================================================

/// True when the text contains "sim" anywhere, ignoring case and accents.
pub fn parse_affirmative(raw: &str) -> bool {
    fold_text(raw).contains("sim")
}

/// Classify a school "type/modality" text into category tags.
///
/// Multi-label: "Infantil e Fundamental I" yields two tags. The result is
/// never empty; with no signal it is `[EarlyChildhood]`.
pub fn classify_school_categories(raw: &str) -> Vec<SchoolCategory> {
    let text = fold_text(raw);
    let mut types = Vec::new();

    if text.contains("infantil") || text.contains("creche") || text.contains("pre") {
        types.push(SchoolCategory::EarlyChildhood);
    }

    if text.contains("fundamental") {
        let early = text.contains('1') || text.contains('i') || text.contains("inicial");
        let late = text.contains('2') || text.contains("ii") || text.contains("final");
        if early || !late {
            types.push(SchoolCategory::PrimaryEarly);
        }
        if late {
            types.push(SchoolCategory::PrimaryLate);
        }
    }

    if text.contains("medio") {
        types.push(SchoolCategory::Secondary);
    }
    if text.contains("eja") {
        types.push(SchoolCategory::AdultEducation);
    }

    if types.is_empty() {
        types.push(SchoolCategory::EarlyChildhood);
    }
    types
}

/// Classify a free-text status. "analise" wins over "pendente".
pub fn classify_status(raw: &str) -> EnrollmentStatus {
    let text = fold_text(raw);
    if text.contains("analise") {
        EnrollmentStatus::UnderReview
    } else if text.contains("pendente") {
        EnrollmentStatus::Pending
    } else {
        EnrollmentStatus::Enrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SchoolCategory::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05"), "05/03/2024");
        assert_eq!(format_date("05/03/2024"), "05/03/2024");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("2024-13-45"), "45/13/2024");
        assert_eq!(format_date("5/3/24"), "5/3/24");
        assert_eq!(format_date("2024-03-05T00:00"), "2024-03-05T00:00");
    }

    #[test]
    fn test_parse_coordinate() {
        assert!((parse_coordinate("-12,5") + 12.5).abs() < 1e-9);
        assert!((parse_coordinate("-40.2917") + 40.2917).abs() < 1e-9);
        assert_eq!(parse_coordinate(""), 0.0);
        assert_eq!(parse_coordinate("abc"), 0.0);
        assert!((parse_coordinate("12,5 S") - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rating_and_capacity() {
        assert_eq!(parse_rating(""), 4.5);
        assert_eq!(parse_rating("0"), 4.5);
        assert_eq!(parse_rating("ruim"), 4.5);
        assert_eq!(parse_rating("3.8"), 3.8);
        assert_eq!(parse_capacity("120 vagas"), 120);
        assert_eq!(parse_capacity("n/a"), 0);
        assert_eq!(parse_capacity(""), 0);
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("123.456.789-09"), "12345678909");
        assert_eq!(digits_only(""), "");
    }

    #[test]
    fn test_affirmative() {
        assert!(parse_affirmative("Sim"));
        assert!(parse_affirmative("SIM, rural"));
        assert!(!parse_affirmative("Não"));
        assert!(!parse_affirmative(""));
    }

    #[test]
    fn test_categories_multi_label() {
        assert_eq!(classify_school_categories("Creche"), vec![EarlyChildhood]);
        assert_eq!(
            classify_school_categories("Educação Infantil e Ensino Médio"),
            vec![EarlyChildhood, Secondary]
        );
        assert_eq!(classify_school_categories("EJA"), vec![AdultEducation]);
        assert_eq!(
            classify_school_categories("Fundamental II - anos finais"),
            vec![PrimaryEarly, PrimaryLate]
        );
        // "finais" is not "final"
        assert_eq!(classify_school_categories("Fundamental anos finais"), vec![PrimaryEarly]);
        assert_eq!(classify_school_categories("FUNDAMENTAL 2"), vec![PrimaryLate]);
        assert_eq!(classify_school_categories("fundamental"), vec![PrimaryEarly]);
    }

    #[test]
    fn test_categories_never_empty() {
        for text in ["", "xyz", "escola técnica", "12345"] {
            assert!(!classify_school_categories(text).is_empty());
        }
        assert_eq!(classify_school_categories(""), vec![EarlyChildhood]);
    }

    #[test]
    fn test_status() {
        assert_eq!(classify_status("PENDENTE"), EnrollmentStatus::Pending);
        assert_eq!(classify_status("Em Análise"), EnrollmentStatus::UnderReview);
        assert_eq!(classify_status("Matriculado"), EnrollmentStatus::Enrolled);
        assert_eq!(classify_status("transferido"), EnrollmentStatus::Enrolled);
        assert_eq!(classify_status(""), EnrollmentStatus::Enrolled);
    }
}
