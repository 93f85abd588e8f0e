//! Scanned-value classification
//!
//! A single input field at the venue entrance accepts either a ticket barcode
//! or the customer's mobile number. The classifier decides which lookup runs.

use std::sync::LazyLock;

use regex::Regex;

/// Optional leading '+', then 10–15 digits.
const MOBILE_PATTERN: &str = r"^\+?[0-9]{10,15}$";

/// Shortest digit suffix accepted when matching local against international forms.
const MIN_SUFFIX_DIGITS: usize = 10;

static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MOBILE_PATTERN).expect("mobile pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanQuery {
    /// Blank input: the caller clears its search state, no lookup runs
    Reset,
    /// Mobile number, digits only
    Mobile(String),
    Barcode(String),
}

impl ScanQuery {
    pub fn classify(raw: &str) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            return Self::Reset;
        }
        if is_mobile_number(value) {
            return Self::Mobile(normalize_mobile(value));
        }
        Self::Barcode(value.to_string())
    }
}

pub fn is_mobile_number(value: &str) -> bool {
    MOBILE.is_match(value)
}

pub fn normalize_mobile(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Compare two mobile numbers by digits: equal, or one is a suffix of the
/// other with at least ten digits on the shorter side.
pub fn mobile_matches(a: &str, b: &str) -> bool {
    let a = normalize_mobile(a);
    let b = normalize_mobile(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    short.len() >= MIN_SUFFIX_DIGITS && long.ends_with(short.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_resets() {
        assert_eq!(ScanQuery::classify(""), ScanQuery::Reset);
        assert_eq!(ScanQuery::classify("   "), ScanQuery::Reset);
    }

    #[test]
    fn international_mobile_is_classified() {
        assert_eq!(
            ScanQuery::classify("+19995551234"),
            ScanQuery::Mobile("19995551234".into())
        );
        assert_eq!(
            ScanQuery::classify("19995551234"),
            ScanQuery::Mobile("19995551234".into())
        );
    }

    #[test]
    fn short_or_alpha_values_are_barcodes() {
        assert_eq!(ScanQuery::classify("B123"), ScanQuery::Barcode("B123".into()));
        assert_eq!(ScanQuery::classify("123456789"), ScanQuery::Barcode("123456789".into()));
        assert_eq!(
            ScanQuery::classify("1234567890123456"),
            ScanQuery::Barcode("1234567890123456".into())
        );
        assert_eq!(ScanQuery::classify("+1-999-555"), ScanQuery::Barcode("+1-999-555".into()));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(ScanQuery::classify("  B123\n"), ScanQuery::Barcode("B123".into()));
    }

    #[test]
    fn mobile_matching_by_digits_and_suffix() {
        assert!(mobile_matches("+19995551234", "19995551234"));
        assert!(mobile_matches("+19995551234", "9995551234"));
        assert!(!mobile_matches("+19995551234", "5551234"));
        assert!(!mobile_matches("+19995551234", "+19995551235"));
        assert!(!mobile_matches("", "19995551234"));
    }
}
