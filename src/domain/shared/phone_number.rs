//! Phone number helpers: normalization, emergency classification and loose comparison

/// Minimum number of trailing digits that must agree for two numbers written
/// in different formats (with or without country code) to compare equal.
const MIN_MATCH: usize = 7;

/// Emergency numbers used when none are configured
pub const DEFAULT_EMERGENCY_NUMBERS: &[&str] = &["112", "911", "999", "000", "08", "110", "118", "119"];

/// Strip everything except digits, keeping a leading `+`.
pub fn normalize(number: &str) -> String {
    let trimmed = number.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (i == 0 && c == '+') {
            out.push(c);
        }
    }
    out
}

/// Whether `number` exactly matches one of `emergency_numbers` after normalization.
pub fn is_emergency_number<S: AsRef<str>>(number: &str, emergency_numbers: &[S]) -> bool {
    let normalized = normalize(number);
    if normalized.is_empty() || normalized.starts_with('+') {
        return false;
    }
    emergency_numbers
        .iter()
        .any(|e| normalize(e.as_ref()) == normalized)
}

/// Format-tolerant equality.
///
/// `"(650) 555-1234"` equals `"+1 650 555 1234"`. Numbers shorter than
/// [`MIN_MATCH`] digits only compare equal when identical.
pub fn compare(a: &str, b: &str) -> bool {
    let a: Vec<char> = normalize(a).chars().filter(|c| c.is_ascii_digit()).collect();
    let b: Vec<char> = normalize(b).chars().filter(|c| c.is_ascii_digit()).collect();

    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    if a == b {
        return true;
    }
    if a.len() < MIN_MATCH || b.len() < MIN_MATCH {
        return false;
    }

    let matched = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    matched >= MIN_MATCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("+1 (650) 555-1234"), "+16505551234");
        assert_eq!(normalize(" 911 "), "911");
        assert_eq!(normalize("1+2"), "12");
    }

    #[test]
    fn test_emergency_numbers() {
        assert!(is_emergency_number("911", DEFAULT_EMERGENCY_NUMBERS));
        assert!(is_emergency_number("1-1-2", DEFAULT_EMERGENCY_NUMBERS));
        assert!(!is_emergency_number("9110", DEFAULT_EMERGENCY_NUMBERS));
        assert!(!is_emergency_number("", DEFAULT_EMERGENCY_NUMBERS));
        assert!(!is_emergency_number("+911", DEFAULT_EMERGENCY_NUMBERS));
    }

    #[test]
    fn test_compare_is_format_tolerant() {
        assert!(compare("(650) 555-1234", "+1 650 555 1234"));
        assert!(compare("5551234", "555-1234"));
        assert!(!compare("6505551234", "6505551235"));
        assert!(!compare("911", "112"));
        assert!(!compare("", "5551234"));
        assert!(compare("", ""));
    }
}
