//! Compiled value and name patterns shared by the heuristic labeler and the
//! feature extractor.

use regex::Regex;
use std::sync::OnceLock;

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

/// Canonical 8-4-4-4-12 hex UUID text.
pub fn uuid() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
}

/// Integer literal with optional leading minus.
pub fn integer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^-?\d+$")
}

/// Decimal literal, `digits.digits`.
pub fn decimal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^-?\d+\.\d+$")
}

/// Names that usually carry identifiers, counts or paging values.
pub fn int_like_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)id$|_id$|^id$|count|num|size|page|limit")
}

/// Names of boolean flags such as `is_active`, `has_x`, `debug_flag`.
pub fn bool_flag_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)^(is|has|enable|flag)|_flag$")
}

pub fn id_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)\b(id|_id|user|uid)")
}

pub fn date_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)date|day|month|year|dob")
}

pub fn email_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)email|e-mail")
}

/// Boolean-ish prefix words: `is`, `has`, `should`, `enable`, `can`.
pub fn bool_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"(?i)^(is|has|should|enable|can)_?")
}

/// `true` / `false`, any case.
pub fn is_bool_token(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_requires_canonical_form() {
        assert!(uuid().is_match("123e4567-e89b-12d3-a456-426614174000"));
        assert!(uuid().is_match("123E4567-E89B-12D3-A456-426614174000"));
        assert!(!uuid().is_match("123e4567e89b12d3a456426614174000"));
        assert!(!uuid().is_match("{123e4567-e89b-12d3-a456-426614174000}"));
    }

    #[test]
    fn test_numeric_literals() {
        assert!(integer().is_match("42"));
        assert!(integer().is_match("-7"));
        assert!(!integer().is_match("4.2"));
        assert!(!integer().is_match("+7"));
        assert!(decimal().is_match("3.14"));
        assert!(decimal().is_match("-0.5"));
        assert!(!decimal().is_match(".5"));
        assert!(!decimal().is_match("1."));
    }

    #[test]
    fn test_name_patterns() {
        assert!(int_like_name().is_match("user_id"));
        assert!(int_like_name().is_match("PageSize"));
        assert!(!int_like_name().is_match("query"));
        assert!(bool_flag_name().is_match("is_admin"));
        assert!(bool_flag_name().is_match("debug_flag"));
        assert!(!bool_flag_name().is_match("status"));
        assert!(bool_prefix().is_match("can_edit"));
        assert!(id_token().is_match("user_name"));
    }
}
