//! Utility functions for Tamarind
//!
//! Identifier validation and helpers for keeping user input out of logs.

use std::sync::LazyLock;

/// Regex pattern for validating config names
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]*$").expect("Invalid regex pattern"));

/// Validate a string contains only allowed characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen
///
/// # Examples
///
/// ```
/// use tamarind_common::is_valid;
///
/// assert!(is_valid("db-creds"));
/// assert!(is_valid("app_name:v1"));
/// assert!(!is_valid("invalid/path"));
/// assert!(!is_valid("$where"));
/// ```
pub fn is_valid(str: &str) -> bool {
    VALID_PATTERN.is_match(str)
}

/// Mask a value, keeping at most its first three characters
///
/// # Examples
///
/// ```
/// use tamarind_common::obfuscate;
///
/// assert_eq!(obfuscate("db-creds"), "db-****");
/// assert_eq!(obfuscate("abc"), "****");
/// assert_eq!(obfuscate(""), "");
/// ```
pub fn obfuscate(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 3 {
        let head: String = chars[..3].iter().collect();
        format!("{}****", head)
    } else {
        "****".to_string()
    }
}

/// Prepare a user-supplied value for logging: strips line breaks, then masks it
pub fn sanitize_log_value(value: &str) -> String {
    let single_line: String = value.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    obfuscate(&single_line)
}
