//! Boolean-like string parsing for query parameters and environment values.

const TRUTHY: [&str; 5] = ["1", "true", "yes", "y", "t"];
const FALSY: [&str; 5] = ["0", "false", "no", "n", "f"];

/// Parse a boolean-like string, case-insensitively.
///
/// Returns `None` for strings that are neither a truthy nor a falsy form.
pub fn parse_flag(value: &str) -> Option<bool> {
    let lower = value.to_ascii_lowercase();
    if TRUTHY.contains(&lower.as_str()) {
        Some(true)
    } else if FALSY.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// True only when the parameter is present and one of the truthy forms.
///
/// Used for `?silent=`: anything unrecognised leaves logging enabled.
pub fn is_set(value: Option<&str>) -> bool {
    value.and_then(parse_flag) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_forms() {
        for v in ["1", "true", "TRUE", "Yes", "y", "T"] {
            assert_eq!(parse_flag(v), Some(true), "{v}");
        }
    }

    #[test]
    fn test_falsy_forms() {
        for v in ["0", "false", "No", "N", "f"] {
            assert_eq!(parse_flag(v), Some(false), "{v}");
        }
    }

    #[test]
    fn test_other_strings_pass_through() {
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
        assert!(!is_set(Some("maybe")));
        assert!(!is_set(None));
        assert!(is_set(Some("yes")));
    }
}
