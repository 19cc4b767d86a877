//! Postal code (PIN) normalization.
//!
//! Datasets carry PIN codes as strings, integers, floats that went through
//! a spreadsheet (`"683572.0"`), or free text (`"PIN 683-572"`). Everything
//! is reduced to a canonical six-digit string or rejected. The function is
//! pure so it can be applied identically at index time and query time.

use regex::Regex;
use std::sync::LazyLock;

/// Six digits, optionally followed by a `.0`-style remainder or a stray dot.
static SIX_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{6})(?:\.0+|\.)?$").expect("valid regex"));

/// Number of digits in an Indian postal code.
pub const POSTAL_CODE_LEN: usize = 6;

/// Normalizes a textual postal code.
///
/// Rules, in order:
/// 1. exactly six digits after trimming: accepted as-is
/// 2. six digits followed by `.0`, `.00`, ... or a bare `.`: remainder stripped
/// 3. otherwise every non-digit is removed and the result is accepted only
///    if exactly six digits remain
///
/// Returns `None` for anything else.
#[must_use]
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if let Some(caps) = SIX_DIGITS_RE.captures(trimmed) {
        return Some(caps[1].to_string());
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == POSTAL_CODE_LEN).then_some(digits)
}

/// Normalizes a postal code straight from a JSON value.
///
/// Strings and numbers are accepted through their textual form; every
/// other JSON type is rejected.
#[must_use]
pub fn normalize_postal_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => normalize_postal_code(s),
        serde_json::Value::Number(n) => normalize_postal_code(&n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_six_digits() {
        assert_eq!(normalize_postal_code("683572").as_deref(), Some("683572"));
        assert_eq!(normalize_postal_code("  110001 ").as_deref(), Some("110001"));
    }

    #[test]
    fn strips_decimal_remainder() {
        assert_eq!(normalize_postal_code("683572.0").as_deref(), Some("683572"));
        assert_eq!(normalize_postal_code("683572.000").as_deref(), Some("683572"));
        assert_eq!(normalize_postal_code("683572.").as_deref(), Some("683572"));
    }

    #[test]
    fn decimal_remainder_holds_for_any_code() {
        for code in ["110001", "560034", "999999", "000000"] {
            let raw = format!("{code}.0");
            assert_eq!(normalize_postal_code(&raw).as_deref(), Some(code));
        }
    }

    #[test]
    fn extracts_digits_from_noise() {
        assert_eq!(normalize_postal_code("PIN 683-572").as_deref(), Some("683572"));
        assert_eq!(normalize_postal_code("683 572").as_deref(), Some("683572"));
        assert_eq!(normalize_postal_code("(68)35-72").as_deref(), Some("683572"));
    }

    #[test]
    fn rejects_wrong_lengths() {
        assert!(normalize_postal_code("68357").is_none());
        assert!(normalize_postal_code("6835721").is_none());
        assert!(normalize_postal_code("683572.5").is_none());
        assert!(normalize_postal_code("").is_none());
        assert!(normalize_postal_code("not a pin").is_none());
    }

    #[test]
    fn ignores_non_ascii_digits() {
        assert!(normalize_postal_code("६८३५७२").is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "683572",
            "683572.0",
            "PIN 683-572",
            " 110 001 ",
            "12345",
            "1234567",
            "abc",
            "",
            "683572.",
            "56-00-34",
        ];
        for input in inputs {
            let once = normalize_postal_code(input);
            let twice = once.as_deref().and_then(normalize_postal_code);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn normalizes_json_values() {
        assert_eq!(
            normalize_postal_value(&serde_json::json!(683_572)).as_deref(),
            Some("683572")
        );
        assert_eq!(
            normalize_postal_value(&serde_json::json!(683_572.0)).as_deref(),
            Some("683572")
        );
        assert_eq!(
            normalize_postal_value(&serde_json::json!("683572")).as_deref(),
            Some("683572")
        );
        assert!(normalize_postal_value(&serde_json::json!(true)).is_none());
        assert!(normalize_postal_value(&serde_json::Value::Null).is_none());
        assert!(normalize_postal_value(&serde_json::json!({"pin": "683572"})).is_none());
    }
}
